use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::TargetClient;
use crate::config::GiteaConfig;
use crate::error::{Error, Result};
use crate::http::{ApiClient, ApiResponse, Auth, segment};
use crate::types::{
    CreateOrgRequest, CreateUserRequest, MigrateRepoRequest, PermissionLevel, TargetOrganization,
    TargetRepository, TargetUser, Visibility,
};

const API_PREFIX: &str = "/api/v1";
const TEAM_PAGE_LIMIT: u32 = 50;

/// Repository units granted to the per-level organization teams.
const TEAM_UNITS: &[&str] = &[
    "repo.code",
    "repo.issues",
    "repo.pulls",
    "repo.releases",
    "repo.wiki",
    "repo.projects",
];

/// Gitea REST v1 binding.
pub struct GiteaClient {
    api: ApiClient,
    teams: Mutex<HashMap<(String, PermissionLevel), i64>>,
}

#[derive(Debug, Deserialize)]
struct UserDto {
    id: i64,
    login: String,
    #[serde(default)]
    login_name: Option<String>,
    #[serde(default)]
    source_id: Option<i64>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrgDto {
    id: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    visibility: Option<Visibility>,
}

#[derive(Debug, Deserialize)]
struct OwnerDto {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepoDto {
    id: i64,
    name: String,
    owner: OwnerDto,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    original_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TeamDto {
    id: i64,
    name: String,
}

#[derive(Serialize)]
struct CreateOrgBody<'a> {
    username: &'a str,
    description: &'a str,
    visibility: Visibility,
}

#[derive(Serialize)]
struct MigrateRepoBody<'a> {
    clone_addr: &'a str,
    repo_name: &'a str,
    repo_owner: &'a str,
    service: &'a str,
    mirror: bool,
    private: bool,
    description: &'a str,
    auth_username: &'a str,
    auth_password: &'a str,
}

#[derive(Serialize)]
struct CreateTeamBody<'a> {
    name: &'a str,
    description: String,
    permission: &'a str,
    includes_all_repositories: bool,
    can_create_org_repo: bool,
    units: &'a [&'a str],
}

#[derive(Serialize)]
struct CollaboratorBody<'a> {
    permission: &'a str,
}

impl From<UserDto> for TargetUser {
    fn from(dto: UserDto) -> Self {
        TargetUser {
            id: dto.id,
            source_id: dto.source_id.unwrap_or_default(),
            login_name: dto.login_name.unwrap_or_default(),
            username: dto.login,
            full_name: dto.full_name.unwrap_or_default(),
            email: dto.email.unwrap_or_default(),
        }
    }
}

impl From<OrgDto> for TargetOrganization {
    fn from(dto: OrgDto) -> Self {
        TargetOrganization {
            id: dto.id,
            name: dto.name.or(dto.username).unwrap_or_default(),
            description: dto.description.unwrap_or_default(),
            visibility: dto.visibility.unwrap_or(Visibility::Public),
        }
    }
}

impl From<RepoDto> for TargetRepository {
    fn from(dto: RepoDto) -> Self {
        TargetRepository {
            id: dto.id,
            name: dto.name,
            owner: dto.owner.login,
            clone_addr: dto.original_url.unwrap_or_default(),
            private: dto.private,
            description: dto.description.unwrap_or_default(),
        }
    }
}

/// Name of the organization team that carries project grants at `level`.
#[must_use]
pub fn team_name(level: PermissionLevel) -> String {
    format!("project-{level}")
}

impl GiteaClient {
    pub fn new(config: &GiteaConfig) -> Result<Self> {
        let api = ApiClient::new(
            &config.server,
            Auth::Token(config.token.clone()),
            config.skip_verify,
        )
        .map_err(Error::Config)?;
        Ok(Self {
            api,
            teams: Mutex::new(HashMap::new()),
        })
    }

    async fn lookup<T, D>(&self, path: &str, what: &str) -> Result<Option<T>>
    where
        D: serde::de::DeserializeOwned + Into<T>,
    {
        let resp = self.api.get(path).await.map_err(Error::TargetLookup)?;
        if resp.is_not_found() {
            return Ok(None);
        }
        if !resp.is_success() {
            let message = resp.error_message().await;
            return Err(Error::TargetLookup(format!("{what}: {message}")));
        }
        let dto: D = resp.json().await.map_err(Error::TargetLookup)?;
        Ok(Some(dto.into()))
    }

    async fn created<T, D>(resp: ApiResponse, what: &str) -> Result<T>
    where
        D: serde::de::DeserializeOwned + Into<T>,
    {
        if !resp.is_success() {
            let message = resp.error_message().await;
            return Err(Error::TargetCreate(format!("{what}: {message}")));
        }
        let dto: D = resp.json().await.map_err(Error::TargetCreate)?;
        Ok(dto.into())
    }

    async fn expect_success(resp: ApiResponse, what: &str) -> Result<()> {
        if resp.is_success() {
            Ok(())
        } else {
            let message = resp.error_message().await;
            Err(Error::TargetCreate(format!("{what}: {message}")))
        }
    }

    fn cached_team(&self, org: &str, level: PermissionLevel) -> Option<i64> {
        self.teams
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(org.to_string(), level))
            .copied()
    }

    /// Walks the paged team list of `org` looking for `name`. Gitea caps the
    /// page size server-side, so only an empty page ends the listing.
    async fn find_team(&self, org: &str, path: &str, name: &str) -> Result<Option<i64>> {
        let mut page = 1u32;
        loop {
            let query = [
                ("page", page.to_string()),
                ("limit", TEAM_PAGE_LIMIT.to_string()),
            ];
            let resp = self
                .api
                .get_query(path, &query)
                .await
                .map_err(Error::TargetLookup)?;
            if !resp.is_success() {
                let message = resp.error_message().await;
                return Err(Error::TargetLookup(format!("teams of {org}: {message}")));
            }
            let teams: Vec<TeamDto> = resp.json().await.map_err(Error::TargetLookup)?;
            if teams.is_empty() {
                return Ok(None);
            }
            if let Some(team) = teams.iter().find(|t| t.name.eq_ignore_ascii_case(name)) {
                return Ok(Some(team.id));
            }
            page += 1;
        }
    }

    /// Finds the team for `level` in `org`, creating it on first use.
    async fn ensure_team(&self, org: &str, level: PermissionLevel) -> Result<i64> {
        if let Some(id) = self.cached_team(org, level) {
            return Ok(id);
        }

        let name = team_name(level);
        let path = format!("{API_PREFIX}/orgs/{}/teams", segment(org));

        let id = match self.find_team(org, &path, &name).await? {
            Some(id) => id,
            None => {
                let body = CreateTeamBody {
                    name: &name,
                    description: format!("Migrated project {level} permission"),
                    permission: level.as_str(),
                    includes_all_repositories: true,
                    can_create_org_repo: level == PermissionLevel::Admin,
                    units: TEAM_UNITS,
                };
                let resp = self.api.post(&path, &body).await.map_err(Error::TargetCreate)?;
                let team: TeamDto =
                    Self::created::<TeamDto, TeamDto>(resp, &format!("team {name} in {org}"))
                        .await?;
                tracing::info!(org, team = %name, "created team");
                team.id
            }
        };

        self.teams
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((org.to_string(), level), id);
        Ok(id)
    }
}

#[async_trait]
impl TargetClient for GiteaClient {
    async fn get_user(&self, login: &str) -> Result<Option<TargetUser>> {
        let path = format!("{API_PREFIX}/users/{}", segment(login));
        self.lookup::<TargetUser, UserDto>(&path, &format!("user {login}"))
            .await
    }

    async fn create_user(&self, req: &CreateUserRequest) -> Result<TargetUser> {
        let path = format!("{API_PREFIX}/admin/users");
        let resp = self.api.post(&path, req).await.map_err(Error::TargetCreate)?;
        Self::created::<TargetUser, UserDto>(resp, &format!("user {}", req.login_name)).await
    }

    async fn get_org(&self, name: &str) -> Result<Option<TargetOrganization>> {
        let path = format!("{API_PREFIX}/orgs/{}", segment(name));
        self.lookup::<TargetOrganization, OrgDto>(&path, &format!("organization {name}"))
            .await
    }

    async fn create_org(&self, req: &CreateOrgRequest) -> Result<TargetOrganization> {
        let body = CreateOrgBody {
            username: &req.name,
            description: &req.description,
            visibility: req.visibility,
        };
        let path = format!("{API_PREFIX}/orgs");
        let resp = self.api.post(&path, &body).await.map_err(Error::TargetCreate)?;
        Self::created::<TargetOrganization, OrgDto>(resp, &format!("organization {}", req.name))
            .await
    }

    async fn get_repo(&self, owner: &str, name: &str) -> Result<Option<TargetRepository>> {
        let path = format!("{API_PREFIX}/repos/{}/{}", segment(owner), segment(name));
        self.lookup::<TargetRepository, RepoDto>(&path, &format!("repository {owner}/{name}"))
            .await
    }

    async fn migrate_repo(&self, req: &MigrateRepoRequest) -> Result<TargetRepository> {
        let body = MigrateRepoBody {
            clone_addr: &req.clone_addr,
            repo_name: &req.name,
            repo_owner: &req.owner,
            service: "git",
            mirror: false,
            private: req.private,
            description: &req.description,
            auth_username: &req.auth_username,
            auth_password: &req.auth_password,
        };
        let path = format!("{API_PREFIX}/repos/migrate");
        let resp = self.api.post(&path, &body).await.map_err(Error::TargetCreate)?;
        Self::created::<TargetRepository, RepoDto>(
            resp,
            &format!("repository {}/{}", req.owner, req.name),
        )
        .await
    }

    async fn grant_org_permission(
        &self,
        org: &str,
        level: PermissionLevel,
        login: &str,
    ) -> Result<()> {
        let team_id = self.ensure_team(org, level).await?;
        let path = format!("{API_PREFIX}/teams/{team_id}/members/{}", segment(login));
        let resp = self.api.put_empty(&path).await.map_err(Error::TargetCreate)?;
        Self::expect_success(resp, &format!("add {login} to team {}", team_name(level))).await
    }

    async fn grant_repo_permission(
        &self,
        owner: &str,
        repo: &str,
        level: PermissionLevel,
        login: &str,
    ) -> Result<()> {
        let path = format!(
            "{API_PREFIX}/repos/{}/{}/collaborators/{}",
            segment(owner),
            segment(repo),
            segment(login)
        );
        let body = CollaboratorBody {
            permission: level.as_str(),
        };
        let resp = self.api.put(&path, &body).await.map_err(Error::TargetCreate)?;
        Self::expect_success(resp, &format!("add {login} as {level} collaborator")).await
    }
}
