mod bitbucket;

pub use bitbucket::BitbucketClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{GroupGrant, SourceProject, SourceRepository, SourceUser, UserGrant};

/// Expands a group name to its current members.
#[async_trait]
pub trait GroupMembership: Send + Sync {
    async fn members(&self, group: &str) -> Result<Vec<SourceUser>>;
}

/// Read-only view of the source hosting service.
///
/// Every method fails with [`crate::error::Error::SourceFetch`] when the
/// source cannot be read.
#[async_trait]
pub trait SourceDirectory: GroupMembership {
    async fn get_project(&self, key: &str) -> Result<SourceProject>;
    async fn get_repo(&self, key: &str, slug: &str) -> Result<SourceRepository>;

    async fn project_user_grants(&self, key: &str) -> Result<Vec<UserGrant>>;
    async fn project_group_grants(&self, key: &str) -> Result<Vec<GroupGrant>>;

    async fn repo_user_grants(&self, key: &str, slug: &str) -> Result<Vec<UserGrant>>;
    async fn repo_group_grants(&self, key: &str, slug: &str) -> Result<Vec<GroupGrant>>;
}
