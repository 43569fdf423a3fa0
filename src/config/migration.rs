use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::PermissionPolicy;

pub const DEFAULT_CLONE_PROTOCOL: &str = "http";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable settings for one migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    pub project_key: String,
    pub repo_slug: String,
    /// Target organization. Falls back to the source project name.
    pub target_owner: Option<String>,
    /// Target repository name. Falls back to the source repository name.
    pub target_repo: Option<String>,
    /// Provenance tag recorded on every created account.
    pub source_id: i64,
    /// Name of the source clone link to import from.
    pub clone_protocol: String,
    pub permission_policy: PermissionPolicy,
    /// Deadline for the whole run.
    pub timeout: Duration,
}

impl MigrationConfig {
    pub fn new(project_key: impl Into<String>, repo_slug: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            repo_slug: repo_slug.into(),
            target_owner: None,
            target_repo: None,
            source_id: 0,
            clone_protocol: DEFAULT_CLONE_PROTOCOL.to_string(),
            permission_policy: PermissionPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.project_key.trim().is_empty() || self.repo_slug.trim().is_empty() {
            return Err(Error::Validation(
                "project-key or repo-slug is empty".to_string(),
            ));
        }
        if self.clone_protocol.trim().is_empty() {
            return Err(Error::Validation("clone protocol is empty".to_string()));
        }
        Ok(())
    }

    /// Organization name to use, given the source project's name.
    #[must_use]
    pub fn resolve_owner(&self, project_name: &str) -> String {
        non_empty(self.target_owner.as_deref()).unwrap_or(project_name).to_string()
    }

    /// Repository name to use, given the source repository's name.
    #[must_use]
    pub fn resolve_repo(&self, repo_name: &str) -> String {
        non_empty(self.target_repo.as_deref()).unwrap_or(repo_name).to_string()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
