use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use super::PasswordPolicy;
use crate::error::{Error, Result};
use crate::target::TargetClient;
use crate::types::{CreateUserRequest, NewUser, TargetUser, canonical_login};

type Slot = Arc<tokio::sync::Mutex<Option<TargetUser>>>;

/// Ensures accounts exist on the target, keyed by canonical login.
///
/// Each login gets its own async lock holding the resolved account, so
/// concurrent calls for the same login perform a single lookup/create and
/// later calls in the same run are served from memory. Calls for different
/// logins never wait on each other.
pub struct UserProvisioner {
    target: Arc<dyn TargetClient>,
    passwords: PasswordPolicy,
    slots: Mutex<HashMap<String, Slot>>,
}

impl UserProvisioner {
    pub fn new(target: Arc<dyn TargetClient>, passwords: PasswordPolicy) -> Self {
        Self {
            target,
            passwords,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, login: &str) -> Slot {
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(login.to_string())
            .or_default()
            .clone()
    }

    /// Returns the existing account for `user.login_name`, creating it if absent.
    /// An existing account is returned unchanged.
    pub async fn create_or_get_user(&self, user: &NewUser) -> Result<TargetUser> {
        if user.login_name.is_empty() || user.login_name != canonical_login(&user.login_name) {
            return Err(Error::Validation(format!(
                "login name '{}' is not canonical",
                user.login_name
            )));
        }

        let slot = self.slot(&user.login_name);
        let mut resolved = slot.lock().await;
        if let Some(existing) = resolved.as_ref() {
            return Ok(existing.clone());
        }

        let account = match self.target.get_user(&user.login_name).await? {
            Some(existing) => {
                debug!(login = %user.login_name, id = existing.id, "user already exists");
                existing
            }
            None => {
                let req = CreateUserRequest {
                    source_id: user.source_id,
                    login_name: user.login_name.clone(),
                    username: user.username.clone(),
                    full_name: user.full_name.clone(),
                    email: user.email.clone(),
                    password: self.passwords.initial_password(),
                    must_change_password: true,
                };
                let created = self.target.create_user(&req).await?;
                info!(
                    login = %created.login_name,
                    username = %created.username,
                    source_id = created.source_id,
                    "created user"
                );
                created
            }
        };

        *resolved = Some(account.clone());
        Ok(account)
    }
}
