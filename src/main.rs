use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bb2gitea::cli::{MigrateArgs, run_migrate};

#[derive(Parser)]
#[command(name = "bb2gitea")]
#[command(about = "Migrate Bitbucket Server repositories into Gitea", long_about = None)]
struct Cli {
    /// Connection settings file (defaults to ./bb2gitea.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate a repository, its project and their permissions
    Migrate(MigrateArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("bb2gitea=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate(args) => run_migrate(cli.config.as_deref(), args).await?,
    }

    Ok(())
}
