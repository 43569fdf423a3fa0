use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use bb2gitea::error::{Error, Result};
use bb2gitea::source::{GroupMembership, SourceDirectory};
use bb2gitea::target::TargetClient;
use bb2gitea::types::{
    CreateOrgRequest, CreateUserRequest, GroupGrant, MigrateRepoRequest, PermissionLevel,
    SourceProject, SourceRepository, SourceUser, TargetOrganization, TargetRepository, TargetUser,
    UserGrant,
};

use super::user;

/// In-memory source directory.
#[derive(Default)]
pub struct FakeSource {
    projects: HashMap<String, SourceProject>,
    repos: HashMap<(String, String), SourceRepository>,
    project_users: HashMap<String, Vec<UserGrant>>,
    project_groups: HashMap<String, Vec<GroupGrant>>,
    repo_users: HashMap<(String, String), Vec<UserGrant>>,
    repo_groups: HashMap<(String, String), Vec<GroupGrant>>,
    groups: HashMap<String, Vec<SourceUser>>,
    pub fail_repo_permissions: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn add_project(&mut self, project: SourceProject) {
        self.projects.insert(project.key.clone(), project);
    }

    pub fn add_repo(&mut self, key: &str, repo: SourceRepository) {
        self.repos.insert((key.to_string(), repo.slug.clone()), repo);
    }

    pub fn add_group(&mut self, name: &str, members: &[&str]) {
        self.groups
            .insert(name.to_string(), members.iter().map(|m| user(m)).collect());
    }

    pub fn grant_project_user(&mut self, key: &str, grant: UserGrant) {
        self.project_users.entry(key.to_string()).or_default().push(grant);
    }

    pub fn grant_project_group(&mut self, key: &str, grant: GroupGrant) {
        self.project_groups.entry(key.to_string()).or_default().push(grant);
    }

    pub fn grant_repo_user(&mut self, key: &str, slug: &str, grant: UserGrant) {
        self.repo_users
            .entry((key.to_string(), slug.to_string()))
            .or_default()
            .push(grant);
    }

    pub fn grant_repo_group(&mut self, key: &str, slug: &str, grant: GroupGrant) {
        self.repo_groups
            .entry((key.to_string(), slug.to_string()))
            .or_default()
            .push(grant);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn repo_key(key: &str, slug: &str) -> (String, String) {
        (key.to_string(), slug.to_string())
    }
}

#[async_trait]
impl GroupMembership for FakeSource {
    async fn members(&self, group: &str) -> Result<Vec<SourceUser>> {
        self.record(format!("members {group}"));
        self.groups
            .get(group)
            .cloned()
            .ok_or_else(|| Error::SourceFetch(format!("group {group} not found")))
    }
}

#[async_trait]
impl SourceDirectory for FakeSource {
    async fn get_project(&self, key: &str) -> Result<SourceProject> {
        self.record(format!("get_project {key}"));
        self.projects
            .get(key)
            .cloned()
            .ok_or_else(|| Error::SourceFetch(format!("project {key} not found")))
    }

    async fn get_repo(&self, key: &str, slug: &str) -> Result<SourceRepository> {
        self.record(format!("get_repo {key}/{slug}"));
        self.repos
            .get(&Self::repo_key(key, slug))
            .cloned()
            .ok_or_else(|| Error::SourceFetch(format!("repository {key}/{slug} not found")))
    }

    async fn project_user_grants(&self, key: &str) -> Result<Vec<UserGrant>> {
        self.record(format!("project_user_grants {key}"));
        Ok(self.project_users.get(key).cloned().unwrap_or_default())
    }

    async fn project_group_grants(&self, key: &str) -> Result<Vec<GroupGrant>> {
        self.record(format!("project_group_grants {key}"));
        Ok(self.project_groups.get(key).cloned().unwrap_or_default())
    }

    async fn repo_user_grants(&self, key: &str, slug: &str) -> Result<Vec<UserGrant>> {
        self.record(format!("repo_user_grants {key}/{slug}"));
        if self.fail_repo_permissions {
            return Err(Error::SourceFetch("503 Service Unavailable".to_string()));
        }
        Ok(self
            .repo_users
            .get(&Self::repo_key(key, slug))
            .cloned()
            .unwrap_or_default())
    }

    async fn repo_group_grants(&self, key: &str, slug: &str) -> Result<Vec<GroupGrant>> {
        self.record(format!("repo_group_grants {key}/{slug}"));
        if self.fail_repo_permissions {
            return Err(Error::SourceFetch("503 Service Unavailable".to_string()));
        }
        Ok(self
            .repo_groups
            .get(&Self::repo_key(key, slug))
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Debug, Default)]
pub struct TargetState {
    pub users: BTreeMap<String, TargetUser>,
    pub orgs: BTreeMap<String, TargetOrganization>,
    pub repos: BTreeMap<(String, String), TargetRepository>,
    pub created_users: Vec<CreateUserRequest>,
    pub created_orgs: Vec<CreateOrgRequest>,
    pub migrations: Vec<MigrateRepoRequest>,
    pub org_grants: Vec<(String, PermissionLevel, String)>,
    pub repo_grants: Vec<(String, String, PermissionLevel, String)>,
    next_id: i64,
}

impl TargetState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory target. Names are matched case-insensitively like Gitea does.
#[derive(Default)]
pub struct FakeTarget {
    state: Mutex<TargetState>,
    fail_user_lookup: bool,
    /// Delay applied inside `create_user`, to widen race windows.
    create_user_delay: Option<Duration>,
    /// Delay applied inside `create_org`, to trip deadlines.
    create_org_delay: Option<Duration>,
}

impl FakeTarget {
    pub fn failing_user_lookup() -> Self {
        Self {
            fail_user_lookup: true,
            ..Self::default()
        }
    }

    pub fn with_create_user_delay(mut self, delay: Duration) -> Self {
        self.create_user_delay = Some(delay);
        self
    }

    pub fn with_create_org_delay(mut self, delay: Duration) -> Self {
        self.create_org_delay = Some(delay);
        self
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, TargetState> {
        self.state.lock().unwrap()
    }

    pub fn seed_user(&self, user: TargetUser) {
        self.state().users.insert(user.username.to_lowercase(), user);
    }

    pub fn seed_org(&self, org: TargetOrganization) {
        self.state().orgs.insert(org.name.to_lowercase(), org);
    }

    pub fn seed_repo(&self, repo: TargetRepository) {
        let key = (repo.owner.to_lowercase(), repo.name.to_lowercase());
        self.state().repos.insert(key, repo);
    }
}

fn without_credentials(addr: &str) -> String {
    match Url::parse(addr) {
        Ok(mut url) => {
            let _ = url.set_username("");
            let _ = url.set_password(None);
            url.to_string()
        }
        Err(_) => addr.to_string(),
    }
}

#[async_trait]
impl TargetClient for FakeTarget {
    async fn get_user(&self, login: &str) -> Result<Option<TargetUser>> {
        if self.fail_user_lookup {
            return Err(Error::TargetLookup(format!(
                "user {login}: 500 Internal Server Error"
            )));
        }
        Ok(self.state().users.get(&login.to_lowercase()).cloned())
    }

    async fn create_user(&self, req: &CreateUserRequest) -> Result<TargetUser> {
        if let Some(delay) = self.create_user_delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state();
        let key = req.username.to_lowercase();
        if state.users.contains_key(&key) {
            return Err(Error::TargetCreate(format!(
                "user {}: 422 user already exists",
                req.username
            )));
        }
        let user = TargetUser {
            id: state.next_id(),
            source_id: req.source_id,
            login_name: req.login_name.clone(),
            username: req.username.clone(),
            full_name: req.full_name.clone(),
            email: req.email.clone(),
        };
        state.created_users.push(req.clone());
        state.users.insert(key, user.clone());
        Ok(user)
    }

    async fn get_org(&self, name: &str) -> Result<Option<TargetOrganization>> {
        Ok(self.state().orgs.get(&name.to_lowercase()).cloned())
    }

    async fn create_org(&self, req: &CreateOrgRequest) -> Result<TargetOrganization> {
        if let Some(delay) = self.create_org_delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state();
        let key = req.name.to_lowercase();
        if state.orgs.contains_key(&key) {
            return Err(Error::TargetCreate(format!(
                "organization {}: 422 already exists",
                req.name
            )));
        }
        let org = TargetOrganization {
            id: state.next_id(),
            name: req.name.clone(),
            description: req.description.clone(),
            visibility: req.visibility,
        };
        state.created_orgs.push(req.clone());
        state.orgs.insert(key, org.clone());
        Ok(org)
    }

    async fn get_repo(&self, owner: &str, name: &str) -> Result<Option<TargetRepository>> {
        let key = (owner.to_lowercase(), name.to_lowercase());
        Ok(self.state().repos.get(&key).cloned())
    }

    async fn migrate_repo(&self, req: &MigrateRepoRequest) -> Result<TargetRepository> {
        let mut state = self.state();
        let key = (req.owner.to_lowercase(), req.name.to_lowercase());
        if state.repos.contains_key(&key) {
            return Err(Error::TargetCreate(format!(
                "repository {}/{}: 409 The repository with the same name already exists",
                req.owner, req.name
            )));
        }
        let repo = TargetRepository {
            id: state.next_id(),
            name: req.name.clone(),
            owner: req.owner.clone(),
            clone_addr: without_credentials(&req.clone_addr),
            private: req.private,
            description: req.description.clone(),
        };
        state.migrations.push(req.clone());
        state.repos.insert(key, repo.clone());
        Ok(repo)
    }

    async fn grant_org_permission(
        &self,
        org: &str,
        level: PermissionLevel,
        login: &str,
    ) -> Result<()> {
        self.state()
            .org_grants
            .push((org.to_string(), level, login.to_string()));
        Ok(())
    }

    async fn grant_repo_permission(
        &self,
        owner: &str,
        repo: &str,
        level: PermissionLevel,
        login: &str,
    ) -> Result<()> {
        self.state().repo_grants.push((
            owner.to_string(),
            repo.to_string(),
            level,
            login.to_string(),
        ));
        Ok(())
    }
}
