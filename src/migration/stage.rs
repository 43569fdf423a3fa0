use std::fmt;
use std::sync::Mutex;

/// Step of a migration run. Runs only move forward; any error ends in
/// [`Stage::Failed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Validating,
    FetchingProject,
    FetchingProjectPermissions,
    FetchingRepo,
    FetchingRepoPermissions,
    ProvisioningUsers,
    ProvisioningOrg,
    ProvisioningRepo,
    Done,
    Failed { at: Box<Stage>, error: String },
}

impl Stage {
    fn ordinal(&self) -> u8 {
        match self {
            Self::Validating => 0,
            Self::FetchingProject => 1,
            Self::FetchingProjectPermissions => 2,
            Self::FetchingRepo => 3,
            Self::FetchingRepoPermissions => 4,
            Self::ProvisioningUsers => 5,
            Self::ProvisioningOrg => 6,
            Self::ProvisioningRepo => 7,
            Self::Done => 8,
            Self::Failed { .. } => u8::MAX,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed { .. })
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validating => f.write_str("validating"),
            Self::FetchingProject => f.write_str("fetching project"),
            Self::FetchingProjectPermissions => f.write_str("fetching project permissions"),
            Self::FetchingRepo => f.write_str("fetching repository"),
            Self::FetchingRepoPermissions => f.write_str("fetching repository permissions"),
            Self::ProvisioningUsers => f.write_str("provisioning users"),
            Self::ProvisioningOrg => f.write_str("provisioning organization"),
            Self::ProvisioningRepo => f.write_str("provisioning repository"),
            Self::Done => f.write_str("done"),
            Self::Failed { at, error } => write!(f, "failed while {at}: {error}"),
        }
    }
}

/// Current stage of a run, shared so it can be read while the run is in flight.
#[derive(Debug)]
pub(crate) struct Progress {
    stage: Mutex<Stage>,
}

impl Progress {
    pub(crate) fn new() -> Self {
        Self {
            stage: Mutex::new(Stage::Validating),
        }
    }

    pub(crate) fn get(&self) -> Stage {
        self.stage.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub(crate) fn reset(&self) {
        *self.stage.lock().unwrap_or_else(|e| e.into_inner()) = Stage::Validating;
    }

    /// Moves to `next`. Backward moves and moves out of a terminal stage are
    /// ignored.
    pub(crate) fn advance(&self, next: Stage) {
        let mut stage = self.stage.lock().unwrap_or_else(|e| e.into_inner());
        if stage.is_terminal() || next.ordinal() <= stage.ordinal() {
            return;
        }
        tracing::info!(stage = %next, "migration stage");
        *stage = next;
    }

    pub(crate) fn fail(&self, error: &crate::error::Error) {
        let mut stage = self.stage.lock().unwrap_or_else(|e| e.into_inner());
        if stage.is_terminal() {
            return;
        }
        let at = Box::new(stage.clone());
        tracing::error!(stage = %at, %error, "migration failed");
        *stage = Stage::Failed {
            at,
            error: error.to_string(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_advance_is_forward_only() {
        let progress = Progress::new();
        progress.advance(Stage::FetchingRepo);
        progress.advance(Stage::FetchingProject);
        assert_eq!(progress.get(), Stage::FetchingRepo);
    }

    #[test]
    fn test_fail_records_stage() {
        let progress = Progress::new();
        progress.advance(Stage::FetchingRepoPermissions);
        progress.fail(&Error::SourceFetch("boom".to_string()));
        progress.advance(Stage::Done);

        match progress.get() {
            Stage::Failed { at, error } => {
                assert_eq!(*at, Stage::FetchingRepoPermissions);
                assert!(error.contains("boom"));
            }
            other => panic!("unexpected stage {other:?}"),
        }
    }
}
