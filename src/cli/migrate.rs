use std::path::Path;
use std::sync::Arc;

use crate::config::ConnectionConfig;
use crate::migration::{ImportAuth, Migrator};
use crate::provision::PasswordPolicy;
use crate::source::BitbucketClient;
use crate::target::GiteaClient;

use super::MigrateArgs;

pub async fn run_migrate(config_path: Option<&Path>, args: MigrateArgs) -> anyhow::Result<()> {
    let config = args.into_config();
    config.validate()?;

    let conn = ConnectionConfig::load(config_path)?;
    let source = BitbucketClient::new(&conn.bitbucket)?;
    let target = GiteaClient::new(&conn.gitea)?;

    let migrator = Migrator::new(Arc::new(source), Arc::new(target), config)
        .with_import_auth(ImportAuth {
            username: conn.bitbucket.username.clone(),
            password: conn.bitbucket.token.clone(),
        })
        .with_password_policy(PasswordPolicy::from_config(
            conn.gitea.initial_password.as_deref(),
        ));

    let report = migrator.run_with_deadline().await?;

    println!();
    println!(
        "Migrated {}/{} into {}/{}",
        migrator.config().project_key,
        migrator.config().repo_slug,
        report.organization.name,
        report.repository.name
    );
    println!("  users:   {}", report.users.len());
    println!("  grants:  {}", report.grants_applied);
    println!("  origin:  {}", report.repository.clone_addr);
    println!();

    Ok(())
}
