use rand::Rng;
use rand::distributions::Alphanumeric;

const GENERATED_LENGTH: usize = 24;

/// Initial password given to accounts created on the target. Accounts are
/// always flagged must-change-password.
#[derive(Clone, Default)]
pub enum PasswordPolicy {
    /// A fresh random password per account.
    #[default]
    Generated,
    /// The same operator-supplied password for every account.
    Fixed(String),
}

impl PasswordPolicy {
    #[must_use]
    pub fn from_config(initial_password: Option<&str>) -> Self {
        match initial_password {
            Some(password) if !password.is_empty() => Self::Fixed(password.to_string()),
            _ => Self::Generated,
        }
    }

    #[must_use]
    pub fn initial_password(&self) -> String {
        match self {
            Self::Generated => generate_password(),
            Self::Fixed(password) => password.clone(),
        }
    }
}

impl std::fmt::Debug for PasswordPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generated => f.write_str("Generated"),
            Self::Fixed(_) => f.write_str("Fixed(<redacted>)"),
        }
    }
}

/// Random alphanumeric password from the thread-local CSPRNG.
#[must_use]
fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_LENGTH)
        .map(char::from)
        .collect()
}
