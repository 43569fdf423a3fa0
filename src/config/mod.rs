mod connection;
mod migration;

pub use connection::{BitbucketConfig, ConnectionConfig, DEFAULT_CONFIG_FILE, GiteaConfig};
pub use migration::{DEFAULT_CLONE_PROTOCOL, DEFAULT_TIMEOUT, MigrationConfig};
