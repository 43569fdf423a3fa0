mod gitea;

pub use gitea::GiteaClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    CreateOrgRequest, CreateUserRequest, MigrateRepoRequest, PermissionLevel, TargetOrganization,
    TargetRepository, TargetUser,
};

/// Write side of the migration: the hosting service receiving the data.
///
/// Lookups return `Ok(None)` for "not found" and
/// [`crate::error::Error::TargetLookup`] for anything else. Creates and grants
/// fail with [`crate::error::Error::TargetCreate`].
#[async_trait]
pub trait TargetClient: Send + Sync {
    async fn get_user(&self, login: &str) -> Result<Option<TargetUser>>;
    async fn create_user(&self, req: &CreateUserRequest) -> Result<TargetUser>;

    async fn get_org(&self, name: &str) -> Result<Option<TargetOrganization>>;
    async fn create_org(&self, req: &CreateOrgRequest) -> Result<TargetOrganization>;

    async fn get_repo(&self, owner: &str, name: &str) -> Result<Option<TargetRepository>>;
    async fn migrate_repo(&self, req: &MigrateRepoRequest) -> Result<TargetRepository>;

    /// Gives `login` access at `level` to every repository of `org`.
    async fn grant_org_permission(
        &self,
        org: &str,
        level: PermissionLevel,
        login: &str,
    ) -> Result<()>;

    /// Gives `login` access at `level` to `owner/repo`.
    async fn grant_repo_permission(
        &self,
        owner: &str,
        repo: &str,
        level: PermissionLevel,
        login: &str,
    ) -> Result<()>;
}
