use async_trait::async_trait;
use serde::{Deserialize, de::DeserializeOwned};

use super::{GroupMembership, SourceDirectory};
use crate::config::BitbucketConfig;
use crate::error::{Error, Result};
use crate::http::{ApiClient, Auth, segment};
use crate::types::{
    CloneLink, GroupGrant, PermissionLevel, SourceProject, SourceRepository, SourceUser, UserGrant,
};

const API_PREFIX: &str = "/rest/api/1.0";
const PAGE_LIMIT: u32 = 100;

/// Bitbucket Server REST 1.0 binding.
#[derive(Clone)]
pub struct BitbucketClient {
    api: ApiClient,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
struct Page<T> {
    #[serde(default)]
    values: Vec<T>,
    #[serde(default = "default_true")]
    is_last_page: bool,
    next_page_start: Option<u32>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ProjectDto {
    key: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    public: bool,
}

#[derive(Debug, Deserialize)]
struct LinkDto {
    href: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LinksDto {
    #[serde(default)]
    clone: Vec<LinkDto>,
}

#[derive(Debug, Deserialize)]
struct RepoDto {
    slug: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    public: bool,
    #[serde(default)]
    links: LinksDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDto {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    email_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroupDto {
    name: String,
}

#[derive(Debug, Deserialize)]
struct UserPermissionDto {
    user: UserDto,
    permission: String,
}

#[derive(Debug, Deserialize)]
struct GroupPermissionDto {
    group: GroupDto,
    permission: String,
}

impl From<UserDto> for SourceUser {
    fn from(dto: UserDto) -> Self {
        SourceUser {
            username: dto.name,
            display_name: dto.display_name.unwrap_or_default(),
            email: dto.email_address.unwrap_or_default(),
        }
    }
}

fn parse_level(permission: &str) -> Result<PermissionLevel> {
    PermissionLevel::parse(permission)
        .ok_or_else(|| Error::SourceFetch(format!("unrecognized permission '{permission}'")))
}

impl BitbucketClient {
    pub fn new(config: &BitbucketConfig) -> Result<Self> {
        let auth = Auth::Basic {
            username: config.username.clone(),
            password: config.token.clone(),
        };
        let api = ApiClient::new(&config.server, auth, config.skip_verify).map_err(Error::Config)?;
        Ok(Self { api })
    }

    async fn get_one<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T> {
        let resp = self
            .api
            .get(path)
            .await
            .map_err(Error::SourceFetch)?;
        if resp.is_not_found() {
            return Err(Error::SourceFetch(format!("{what} not found")));
        }
        if !resp.is_success() {
            let message = resp.error_message().await;
            return Err(Error::SourceFetch(format!("{what}: {message}")));
        }
        resp.json().await.map_err(Error::SourceFetch)
    }

    /// Follows `nextPageStart` until `isLastPage`.
    async fn get_paged<T: DeserializeOwned>(
        &self,
        path: &str,
        extra: &[(&str, String)],
        what: &str,
    ) -> Result<Vec<T>> {
        let mut values = Vec::new();
        let mut start = 0;
        loop {
            let mut query: Vec<(&str, String)> = extra.to_vec();
            query.push(("start", start.to_string()));
            query.push(("limit", PAGE_LIMIT.to_string()));

            let resp = self
                .api
                .get_query(path, &query)
                .await
                .map_err(Error::SourceFetch)?;
            if !resp.is_success() {
                let message = resp.error_message().await;
                return Err(Error::SourceFetch(format!("{what}: {message}")));
            }
            let page: Page<T> = resp.json().await.map_err(Error::SourceFetch)?;
            values.extend(page.values);

            match page.next_page_start {
                Some(next) if !page.is_last_page && next > start => start = next,
                _ => break,
            }
        }
        Ok(values)
    }

    async fn user_grants(&self, path: &str, what: &str) -> Result<Vec<UserGrant>> {
        let rows: Vec<UserPermissionDto> = self.get_paged(path, &[], what).await?;
        rows.into_iter()
            .map(|row| {
                Ok(UserGrant {
                    level: parse_level(&row.permission)?,
                    user: row.user.into(),
                })
            })
            .collect()
    }

    async fn group_grants(&self, path: &str, what: &str) -> Result<Vec<GroupGrant>> {
        let rows: Vec<GroupPermissionDto> = self.get_paged(path, &[], what).await?;
        rows.into_iter()
            .map(|row| {
                Ok(GroupGrant {
                    level: parse_level(&row.permission)?,
                    group: row.group.name,
                })
            })
            .collect()
    }

    fn project_path(key: &str) -> String {
        format!("{API_PREFIX}/projects/{}", segment(key))
    }

    fn repo_path(key: &str, slug: &str) -> String {
        format!("{}/repos/{}", Self::project_path(key), segment(slug))
    }
}

#[async_trait]
impl GroupMembership for BitbucketClient {
    async fn members(&self, group: &str) -> Result<Vec<SourceUser>> {
        let path = format!("{API_PREFIX}/admin/groups/more-members");
        let users: Vec<UserDto> = self
            .get_paged(
                &path,
                &[("context", group.to_string())],
                &format!("members of group {group}"),
            )
            .await?;
        Ok(users.into_iter().map(SourceUser::from).collect())
    }
}

#[async_trait]
impl SourceDirectory for BitbucketClient {
    async fn get_project(&self, key: &str) -> Result<SourceProject> {
        let dto: ProjectDto = self
            .get_one(&Self::project_path(key), &format!("project {key}"))
            .await?;
        Ok(SourceProject {
            key: dto.key,
            name: dto.name,
            description: dto.description.unwrap_or_default(),
            public: dto.public,
        })
    }

    async fn get_repo(&self, key: &str, slug: &str) -> Result<SourceRepository> {
        let dto: RepoDto = self
            .get_one(
                &Self::repo_path(key, slug),
                &format!("repository {key}/{slug}"),
            )
            .await?;
        Ok(SourceRepository {
            slug: dto.slug,
            name: dto.name,
            description: dto.description.unwrap_or_default(),
            public: dto.public,
            clone_links: dto
                .links
                .clone
                .into_iter()
                .filter_map(|link| match link.name {
                    Some(protocol) => Some(CloneLink {
                        protocol,
                        url: link.href,
                    }),
                    None => {
                        tracing::warn!(href = %link.href, "skipping unnamed clone link");
                        None
                    }
                })
                .collect(),
        })
    }

    async fn project_user_grants(&self, key: &str) -> Result<Vec<UserGrant>> {
        let path = format!("{}/permissions/users", Self::project_path(key));
        self.user_grants(&path, &format!("user permissions of project {key}"))
            .await
    }

    async fn project_group_grants(&self, key: &str) -> Result<Vec<GroupGrant>> {
        let path = format!("{}/permissions/groups", Self::project_path(key));
        self.group_grants(&path, &format!("group permissions of project {key}"))
            .await
    }

    async fn repo_user_grants(&self, key: &str, slug: &str) -> Result<Vec<UserGrant>> {
        let path = format!("{}/permissions/users", Self::repo_path(key, slug));
        self.user_grants(&path, &format!("user permissions of repository {key}/{slug}"))
            .await
    }

    async fn repo_group_grants(&self, key: &str, slug: &str) -> Result<Vec<GroupGrant>> {
        let path = format!("{}/permissions/groups", Self::repo_path(key, slug));
        self.group_grants(&path, &format!("group permissions of repository {key}/{slug}"))
            .await
    }
}
