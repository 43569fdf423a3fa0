use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("source fetch failed: {0}")]
    SourceFetch(String),

    #[error("failed to expand members of group '{group}': {message}")]
    GroupExpansion { group: String, message: String },

    #[error("target lookup failed: {0}")]
    TargetLookup(String),

    #[error("target create failed: {0}")]
    TargetCreate(String),

    #[error("repository has no '{protocol}' clone link (available: {available})")]
    MissingCloneLink { protocol: String, available: String },

    #[error("migration did not finish within {0:?}")]
    Timeout(Duration),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
