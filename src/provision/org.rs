use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Result;
use crate::target::TargetClient;
use crate::types::{
    CreateOrgRequest, PermissionPolicy, PermissionTable, TargetOrganization, Visibility,
};

pub struct OrgProvisioner {
    target: Arc<dyn TargetClient>,
}

impl OrgProvisioner {
    pub fn new(target: Arc<dyn TargetClient>) -> Self {
        Self { target }
    }

    /// Returns the organization named `name`, creating it when absent.
    ///
    /// Description and visibility are only used on creation; an existing
    /// organization is returned as-is.
    pub async fn create_or_get_org(
        &self,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<TargetOrganization> {
        if let Some(existing) = self.target.get_org(name).await? {
            info!(org = %existing.name, "organization already exists");
            return Ok(existing);
        }

        let req = CreateOrgRequest {
            name: name.to_string(),
            description: description.to_string(),
            visibility: Visibility::from_public(public),
        };
        let created = self.target.create_org(&req).await?;
        info!(org = %created.name, visibility = ?created.visibility, "created organization");
        Ok(created)
    }

    /// Grants each (level, login) pair of the project table on `org`.
    pub async fn apply_permissions(
        &self,
        org: &TargetOrganization,
        table: &PermissionTable,
        policy: PermissionPolicy,
    ) -> Result<usize> {
        let grants = table.resolve(policy);
        for (level, login) in &grants {
            debug!(org = %org.name, %level, login = %login, "granting organization permission");
            self.target
                .grant_org_permission(&org.name, *level, login)
                .await?;
        }
        Ok(grants.len())
    }
}
