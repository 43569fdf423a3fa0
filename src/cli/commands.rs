use std::time::Duration;

use clap::{Args, ValueEnum};

use crate::config::{DEFAULT_CLONE_PROTOCOL, MigrationConfig};
use crate::types::PermissionPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Apply every level a user holds
    All,
    /// Apply only each user's highest level
    Highest,
}

impl From<PolicyArg> for PermissionPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::All => PermissionPolicy::All,
            PolicyArg::Highest => PermissionPolicy::Highest,
        }
    }
}

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// The parent project key
    #[arg(long)]
    pub project_key: String,

    /// The repository slug
    #[arg(long)]
    pub repo_slug: String,

    /// Gitea target owner (defaults to the project name)
    #[arg(long)]
    pub target_owner: Option<String>,

    /// Gitea target repository (defaults to the repository name)
    #[arg(long)]
    pub target_repo: Option<String>,

    /// Authentication source id recorded on every created user
    #[arg(long, default_value_t = 0)]
    pub source_id: i64,

    /// Name of the Bitbucket clone link to import from
    #[arg(long, default_value = DEFAULT_CLONE_PROTOCOL)]
    pub clone_protocol: String,

    /// How to apply users holding several levels at the same scope
    #[arg(long, value_enum, default_value_t = PolicyArg::All)]
    pub permission_policy: PolicyArg,

    /// Deadline for the whole migration, in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,
}

impl MigrateArgs {
    #[must_use]
    pub fn into_config(self) -> MigrationConfig {
        MigrationConfig {
            project_key: self.project_key,
            repo_slug: self.repo_slug,
            target_owner: self.target_owner,
            target_repo: self.target_repo,
            source_id: self.source_id,
            clone_protocol: self.clone_protocol,
            permission_policy: self.permission_policy.into(),
            timeout: Duration::from_secs(self.timeout),
        }
    }
}
