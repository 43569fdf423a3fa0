use serde::{Deserialize, Serialize};

use super::PermissionLevel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceProject {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneLink {
    pub protocol: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRepository {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub public: bool,
    pub clone_links: Vec<CloneLink>,
}

impl SourceRepository {
    /// Returns the clone URL published for `protocol` (e.g. "http", "ssh").
    #[must_use]
    pub fn clone_url(&self, protocol: &str) -> Option<&str> {
        self.clone_links
            .iter()
            .find(|link| link.protocol.eq_ignore_ascii_case(protocol))
            .map(|link| link.url.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUser {
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGrant {
    pub user: SourceUser,
    pub level: PermissionLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupGrant {
    pub group: String,
    pub level: PermissionLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetUser {
    pub id: i64,
    #[serde(default)]
    pub source_id: i64,
    #[serde(default)]
    pub login_name: String,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Limited,
    Private,
}

impl Visibility {
    #[must_use]
    pub fn from_public(public: bool) -> Self {
        if public { Self::Public } else { Self::Private }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOrganization {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRepository {
    pub id: i64,
    pub name: String,
    pub owner: String,
    /// Origin the target recorded for the import, without credentials.
    #[serde(default)]
    pub clone_addr: String,
    pub private: bool,
    #[serde(default)]
    pub description: String,
}

/// Profile for an account that may need to be created on the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub source_id: i64,
    pub login_name: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
}

/// Admin create-user request. `Debug` hides the initial password.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct CreateUserRequest {
    pub source_id: i64,
    pub login_name: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub must_change_password: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOrgRequest {
    pub name: String,
    pub description: String,
    pub visibility: Visibility,
}

/// Import request for a remote clone. The auth fields are only sent with
/// this call and never stored on the resulting [`TargetRepository`].
#[derive(Clone, PartialEq, Eq)]
pub struct MigrateRepoRequest {
    pub owner: String,
    pub name: String,
    pub clone_addr: String,
    pub private: bool,
    pub description: String,
    pub auth_username: String,
    pub auth_password: String,
}

impl std::fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("source_id", &self.source_id)
            .field("login_name", &self.login_name)
            .field("username", &self.username)
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("must_change_password", &self.must_change_password)
            .finish()
    }
}

impl std::fmt::Debug for MigrateRepoRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrateRepoRequest")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("clone_addr", &self.clone_addr)
            .field("private", &self.private)
            .field("description", &self.description)
            .field("auth_username", &self.auth_username)
            .field("auth_password", &"<redacted>")
            .finish()
    }
}
