mod commands;
mod migrate;

pub use commands::MigrateArgs;
pub use migrate::run_migrate;
