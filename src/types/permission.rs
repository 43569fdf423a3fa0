use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Access tier granted by the source system.
///
/// Ordering follows implication: admin implies write implies read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    Read,
    Write,
    Admin,
}

impl PermissionLevel {
    pub const ALL: [PermissionLevel; 3] = [Self::Read, Self::Write, Self::Admin];

    /// Converts a source tier string to a level.
    ///
    /// Accepts the scoped names Bitbucket returns (`PROJECT_WRITE`, `REPO_READ`)
    /// as well as the bare tier (`WRITE`), case-insensitively.
    pub fn parse(s: &str) -> Option<PermissionLevel> {
        let upper = s.trim().to_ascii_uppercase();
        let tier = upper
            .strip_prefix("PROJECT_")
            .or_else(|| upper.strip_prefix("REPO_"))
            .unwrap_or(&upper);
        match tier {
            "READ" => Some(Self::Read),
            "WRITE" => Some(Self::Write),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a grant applies in the source system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Project,
    Repository,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => f.write_str("project"),
            Self::Repository => f.write_str("repository"),
        }
    }
}

/// How conflicting levels for the same login are applied on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionPolicy {
    /// Apply every (level, login) pair and let the target's model decide.
    #[default]
    All,
    /// Apply only the highest level held by each login.
    Highest,
}

/// Canonical form of a source username, used as the identity key on the target.
#[must_use]
pub fn canonical_login(username: &str) -> String {
    username.to_lowercase()
}

/// Aggregated permissions for one scope: level -> set of canonical logins.
///
/// A login may appear under several levels when the source grants it access
/// through more than one path. No precedence is applied here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionTable {
    scope: Scope,
    levels: BTreeMap<PermissionLevel, BTreeSet<String>>,
}

impl PermissionTable {
    #[must_use]
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            levels: BTreeMap::new(),
        }
    }

    /// Records `username` at `level`, lower-casing it first.
    pub fn insert(&mut self, level: PermissionLevel, username: &str) {
        self.levels
            .entry(level)
            .or_default()
            .insert(canonical_login(username));
    }

    /// Logins granted exactly `level` (not implied levels).
    #[must_use]
    pub fn logins(&self, level: PermissionLevel) -> Option<&BTreeSet<String>> {
        self.levels.get(&level)
    }

    #[must_use]
    pub fn contains(&self, level: PermissionLevel, login: &str) -> bool {
        self.levels
            .get(&level)
            .is_some_and(|logins| logins.contains(login))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.values().all(BTreeSet::is_empty)
    }

    /// Iterates every (level, login) pair in the table.
    pub fn iter(&self) -> impl Iterator<Item = (PermissionLevel, &str)> + '_ {
        self.levels
            .iter()
            .flat_map(|(level, logins)| logins.iter().map(move |login| (*level, login.as_str())))
    }

    /// The pairs to apply on the target under `policy`.
    #[must_use]
    pub fn resolve(&self, policy: PermissionPolicy) -> Vec<(PermissionLevel, String)> {
        match policy {
            PermissionPolicy::All => self
                .iter()
                .map(|(level, login)| (level, login.to_string()))
                .collect(),
            PermissionPolicy::Highest => {
                let mut highest: BTreeMap<&str, PermissionLevel> = BTreeMap::new();
                for (level, login) in self.iter() {
                    let entry = highest.entry(login).or_insert(level);
                    if level > *entry {
                        *entry = level;
                    }
                }
                highest
                    .into_iter()
                    .map(|(login, level)| (level, login.to_string()))
                    .collect()
            }
        }
    }
}

impl fmt::Display for PermissionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .levels
            .iter()
            .filter(|(_, logins)| !logins.is_empty())
            .map(|(level, logins)| {
                let names: Vec<&str> = logins.iter().map(String::as_str).collect();
                format!("{}: {}", level, names.join(", "))
            })
            .collect();
        write!(f, "{} {{{}}}", self.scope, parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(
            PermissionLevel::parse("PROJECT_WRITE"),
            Some(PermissionLevel::Write)
        );
        assert_eq!(
            PermissionLevel::parse("REPO_ADMIN"),
            Some(PermissionLevel::Admin)
        );
        assert_eq!(PermissionLevel::parse("read"), Some(PermissionLevel::Read));
        assert_eq!(PermissionLevel::parse("PROJECT_CREATE"), None);
        assert_eq!(PermissionLevel::parse(""), None);
    }

    #[test]
    fn test_level_ordering() {
        assert!(PermissionLevel::Admin > PermissionLevel::Write);
        assert!(PermissionLevel::Write > PermissionLevel::Read);
    }

    #[test]
    fn test_insert_lowercases() {
        let mut table = PermissionTable::new(Scope::Project);
        table.insert(PermissionLevel::Write, "Alice");
        table.insert(PermissionLevel::Write, "ALICE");
        assert!(table.contains(PermissionLevel::Write, "alice"));
        assert_eq!(table.logins(PermissionLevel::Write).map(BTreeSet::len), Some(1));
    }

    #[test]
    fn test_conflicting_levels_are_kept() {
        let mut table = PermissionTable::new(Scope::Project);
        table.insert(PermissionLevel::Write, "bob");
        table.insert(PermissionLevel::Admin, "bob");
        assert!(table.contains(PermissionLevel::Write, "bob"));
        assert!(table.contains(PermissionLevel::Admin, "bob"));
        assert_eq!(table.resolve(PermissionPolicy::All).len(), 2);
    }

    #[test]
    fn test_resolve_highest() {
        let mut table = PermissionTable::new(Scope::Repository);
        table.insert(PermissionLevel::Read, "bob");
        table.insert(PermissionLevel::Admin, "bob");
        table.insert(PermissionLevel::Read, "carol");

        let resolved = table.resolve(PermissionPolicy::Highest);
        assert_eq!(
            resolved,
            vec![
                (PermissionLevel::Admin, "bob".to_string()),
                (PermissionLevel::Read, "carol".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_table() {
        let table = PermissionTable::new(Scope::Project);
        assert!(table.is_empty());
        assert!(table.resolve(PermissionPolicy::All).is_empty());
    }
}
