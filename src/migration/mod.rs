//! Sequences one migration run: read the source snapshot, aggregate
//! permissions, then provision users, the organization and the repository.

mod stage;

pub use stage::Stage;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::aggregate::{Aggregation, CachedMembership, aggregate};
use crate::config::MigrationConfig;
use crate::error::{Error, Result};
use crate::provision::{OrgProvisioner, PasswordPolicy, RepoProvisioner, UserProvisioner};
use crate::source::SourceDirectory;
use crate::target::TargetClient;
use crate::types::{
    MigrateRepoRequest, NewUser, PermissionTable, Scope, SourceProject, SourceRepository,
    TargetOrganization, TargetRepository, TargetUser,
};
use stage::Progress;

/// Credentials the target uses to clone from the source during import.
#[derive(Clone, Default)]
pub struct ImportAuth {
    pub username: String,
    pub password: String,
}

/// What a successful run produced or found on the target.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub organization: TargetOrganization,
    pub repository: TargetRepository,
    /// Accounts referenced by either scope, keyed by canonical login.
    pub users: BTreeMap<String, TargetUser>,
    pub project_permissions: PermissionTable,
    pub repo_permissions: PermissionTable,
    /// Number of (level, login) grants applied to the organization and repository.
    pub grants_applied: usize,
}

/// Source snapshot read at the start of a run.
struct Snapshot {
    project: SourceProject,
    project_access: Aggregation,
    repo: SourceRepository,
    clone_addr: String,
    repo_access: Aggregation,
}

pub struct Migrator {
    source: Arc<dyn SourceDirectory>,
    target: Arc<dyn TargetClient>,
    config: MigrationConfig,
    import_auth: ImportAuth,
    passwords: PasswordPolicy,
    progress: Progress,
}

impl Migrator {
    pub fn new(
        source: Arc<dyn SourceDirectory>,
        target: Arc<dyn TargetClient>,
        config: MigrationConfig,
    ) -> Self {
        Self {
            source,
            target,
            config,
            import_auth: ImportAuth::default(),
            passwords: PasswordPolicy::default(),
            progress: Progress::new(),
        }
    }

    #[must_use]
    pub fn with_import_auth(mut self, auth: ImportAuth) -> Self {
        self.import_auth = auth;
        self
    }

    #[must_use]
    pub fn with_password_policy(mut self, passwords: PasswordPolicy) -> Self {
        self.passwords = passwords;
        self
    }

    #[must_use]
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Stage of the current or last run.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.progress.get()
    }

    /// Runs the migration bounded by the configured timeout. Expiry drops the
    /// in-flight request; nothing already created is rolled back.
    pub async fn run_with_deadline(&self) -> Result<MigrationReport> {
        let timeout = self.config.timeout;
        match tokio::time::timeout(timeout, self.run()).await {
            Ok(result) => result,
            Err(_) => {
                let err = Error::Timeout(timeout);
                self.progress.fail(&err);
                Err(err)
            }
        }
    }

    /// Runs the migration, stopping at the first error.
    pub async fn run(&self) -> Result<MigrationReport> {
        self.progress.reset();
        match self.execute().await {
            Ok(report) => {
                self.progress.advance(Stage::Done);
                Ok(report)
            }
            Err(e) => {
                self.progress.fail(&e);
                Err(e)
            }
        }
    }

    async fn execute(&self) -> Result<MigrationReport> {
        self.config.validate()?;

        let snapshot = self.read_source().await?;

        self.progress.advance(Stage::ProvisioningUsers);
        let users = self.provision_users(&snapshot).await?;

        self.progress.advance(Stage::ProvisioningOrg);
        let orgs = OrgProvisioner::new(Arc::clone(&self.target));
        let owner = self.config.resolve_owner(&snapshot.project.name);
        let organization = orgs
            .create_or_get_org(
                &owner,
                &snapshot.project.description,
                snapshot.project.public,
            )
            .await?;
        let mut grants_applied = orgs
            .apply_permissions(
                &organization,
                &snapshot.project_access.table,
                self.config.permission_policy,
            )
            .await?;

        self.progress.advance(Stage::ProvisioningRepo);
        let repos = RepoProvisioner::new(Arc::clone(&self.target));
        let req = MigrateRepoRequest {
            owner,
            name: self.config.resolve_repo(&snapshot.repo.name),
            clone_addr: snapshot.clone_addr.clone(),
            private: !snapshot.repo.public,
            description: snapshot.repo.description.clone(),
            auth_username: self.import_auth.username.clone(),
            auth_password: self.import_auth.password.clone(),
        };
        let repository = repos.migrate_repo(&req).await?;
        grants_applied += repos
            .apply_permissions(
                &repository,
                &snapshot.repo_access.table,
                self.config.permission_policy,
            )
            .await?;

        info!(
            name = %repository.name,
            owner = %organization.name,
            users = users.len(),
            grants = grants_applied,
            "migration finished"
        );

        Ok(MigrationReport {
            organization,
            repository,
            users,
            project_permissions: snapshot.project_access.table,
            repo_permissions: snapshot.repo_access.table,
            grants_applied,
        })
    }

    async fn read_source(&self) -> Result<Snapshot> {
        let key = self.config.project_key.as_str();
        let slug = self.config.repo_slug.as_str();
        let membership = CachedMembership::new(self.source.as_ref());

        self.progress.advance(Stage::FetchingProject);
        let project = self.source.get_project(key).await?;
        info!(name = %project.name, "check project success");

        self.progress.advance(Stage::FetchingProjectPermissions);
        let direct = self.source.project_user_grants(key).await?;
        let groups = self.source.project_group_grants(key).await?;
        let project_access = aggregate(Scope::Project, &direct, &groups, &membership).await?;
        info!(permissions = %project_access.table, "aggregated project permissions");

        self.progress.advance(Stage::FetchingRepo);
        let repo = self.source.get_repo(key, slug).await?;
        let clone_addr = repo
            .clone_url(&self.config.clone_protocol)
            .map(str::to_string)
            .ok_or_else(|| Error::MissingCloneLink {
                protocol: self.config.clone_protocol.clone(),
                available: repo
                    .clone_links
                    .iter()
                    .map(|link| link.protocol.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;
        info!(name = %repo.name, "check repo success");

        self.progress.advance(Stage::FetchingRepoPermissions);
        let direct = self.source.repo_user_grants(key, slug).await?;
        let groups = self.source.repo_group_grants(key, slug).await?;
        let repo_access = aggregate(Scope::Repository, &direct, &groups, &membership).await?;
        info!(permissions = %repo_access.table, "aggregated repository permissions");

        Ok(Snapshot {
            project,
            project_access,
            repo,
            clone_addr,
            repo_access,
        })
    }

    /// Ensures every account referenced by either scope exists, once each.
    async fn provision_users(&self, snapshot: &Snapshot) -> Result<BTreeMap<String, TargetUser>> {
        let provisioner = UserProvisioner::new(Arc::clone(&self.target), self.passwords.clone());
        let mut accounts = BTreeMap::new();

        let referenced = snapshot
            .project_access
            .users
            .iter()
            .chain(snapshot.repo_access.users.iter());
        for (login, profile) in referenced {
            if accounts.contains_key(login) {
                continue;
            }
            let account = provisioner
                .create_or_get_user(&NewUser {
                    source_id: self.config.source_id,
                    login_name: login.clone(),
                    username: profile.username.clone(),
                    full_name: profile.display_name.clone(),
                    email: profile.email.clone(),
                })
                .await?;
            accounts.insert(login.clone(), account);
        }

        Ok(accounts)
    }
}
