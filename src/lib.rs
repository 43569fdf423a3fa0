//! # bb2gitea
//!
//! Migrates one Bitbucket Server repository, its parent project and their
//! access grants into a Gitea organization, usable both as a standalone
//! binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! bb2gitea = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bb2gitea::config::{ConnectionConfig, MigrationConfig};
//! use bb2gitea::migration::{ImportAuth, Migrator};
//! use bb2gitea::source::BitbucketClient;
//! use bb2gitea::target::GiteaClient;
//!
//! let conn = ConnectionConfig::load(None)?;
//! let migrator = Migrator::new(
//!     Arc::new(BitbucketClient::new(&conn.bitbucket)?),
//!     Arc::new(GiteaClient::new(&conn.gitea)?),
//!     MigrationConfig::new("ENG", "svc"),
//! )
//! .with_import_auth(ImportAuth {
//!     username: conn.bitbucket.username.clone(),
//!     password: conn.bitbucket.token.clone(),
//! });
//! let report = migrator.run_with_deadline().await?;
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the CLI module. Disable with `default-features = false`.

pub mod aggregate;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod migration;
pub mod provision;
pub mod source;
pub mod target;
pub mod types;
