use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_FILE: &str = "bb2gitea.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BitbucketConfig {
    pub server: String,
    pub username: String,
    pub token: String,
    pub skip_verify: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GiteaConfig {
    pub server: String,
    pub token: String,
    pub skip_verify: bool,
    /// Initial password for created accounts. A random one is generated per
    /// account when unset.
    pub initial_password: Option<String>,
}

/// Endpoints and credentials for both hosting services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub bitbucket: BitbucketConfig,
    pub gitea: GiteaConfig,
}

impl ConnectionConfig {
    /// Loads the TOML file at `path` (or `bb2gitea.toml` in the working
    /// directory if it exists), then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("could not read {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Overrides fields with values returned by `lookup` for the
    /// `BITBUCKET_*` and `GITEA_*` variables.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |target: &mut String, key: &str| {
            if let Some(value) = lookup(key) {
                *target = value;
            }
        };
        set(&mut self.bitbucket.server, "BITBUCKET_SERVER");
        set(&mut self.bitbucket.username, "BITBUCKET_USERNAME");
        set(&mut self.bitbucket.token, "BITBUCKET_TOKEN");
        set(&mut self.gitea.server, "GITEA_SERVER");
        set(&mut self.gitea.token, "GITEA_TOKEN");

        if let Some(value) = lookup("BITBUCKET_SKIP_VERIFY") {
            self.bitbucket.skip_verify = parse_flag(&value);
        }
        if let Some(value) = lookup("GITEA_SKIP_VERIFY") {
            self.gitea.skip_verify = parse_flag(&value);
        }
        if let Some(value) = lookup("GITEA_INITIAL_PASSWORD") {
            self.gitea.initial_password = Some(value).filter(|v| !v.is_empty());
        }
    }

    pub fn normalize(&mut self) {
        self.bitbucket.server = self.bitbucket.server.trim_end_matches('/').to_string();
        self.gitea.server = self.gitea.server.trim_end_matches('/').to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.bitbucket.server.is_empty() || self.bitbucket.token.is_empty() {
            return Err(Error::Config(
                "missing bitbucket server or token".to_string(),
            ));
        }
        if self.gitea.server.is_empty() || self.gitea.token.is_empty() {
            return Err(Error::Config("missing gitea server or token".to_string()));
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
