//! Idempotent create-or-get of users, the organization and the repository on
//! the target, plus application of aggregated permissions.

mod org;
mod password;
mod repo;
mod user;

pub use org::OrgProvisioner;
pub use password::PasswordPolicy;
pub use repo::RepoProvisioner;
pub use user::UserProvisioner;
