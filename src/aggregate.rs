//! Merges direct and group-derived grants into one [`PermissionTable`] per scope.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::source::GroupMembership;
use crate::types::{
    GroupGrant, PermissionLevel, PermissionTable, Scope, SourceUser, UserGrant, canonical_login,
};

/// Result of aggregating one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    pub table: PermissionTable,
    /// Every account referenced by the table, keyed by canonical login. The
    /// first profile seen for a login wins.
    pub users: BTreeMap<String, SourceUser>,
}

impl Aggregation {
    fn new(scope: Scope) -> Self {
        Self {
            table: PermissionTable::new(scope),
            users: BTreeMap::new(),
        }
    }

    fn record(&mut self, level: PermissionLevel, user: &SourceUser) {
        self.table.insert(level, &user.username);
        self.users
            .entry(canonical_login(&user.username))
            .or_insert_with(|| user.clone());
    }
}

/// Builds the permission table for `scope`.
///
/// Direct grants are inserted as-is; each group grant is expanded through
/// `resolver` and every member inserted at the group's level. A failure to
/// expand any group fails the whole aggregation.
pub async fn aggregate<R>(
    scope: Scope,
    direct: &[UserGrant],
    groups: &[GroupGrant],
    resolver: &R,
) -> Result<Aggregation>
where
    R: GroupMembership + ?Sized,
{
    let mut aggregation = Aggregation::new(scope);

    for grant in direct {
        tracing::debug!(
            %scope,
            account = %grant.user.username,
            display = %grant.user.display_name,
            permission = %grant.level,
            "direct permission"
        );
        aggregation.record(grant.level, &grant.user);
    }

    for grant in groups {
        let members = resolver
            .members(&grant.group)
            .await
            .map_err(|e| match e {
                Error::GroupExpansion { .. } => e,
                other => Error::GroupExpansion {
                    group: grant.group.clone(),
                    message: other.to_string(),
                },
            })?;
        if members.is_empty() {
            tracing::warn!(%scope, group = %grant.group, "group has no members");
        }

        for user in &members {
            tracing::debug!(
                %scope,
                group = %grant.group,
                account = %user.username,
                display = %user.display_name,
                permission = %grant.level,
                "group permission"
            );
            aggregation.record(grant.level, user);
        }
    }

    Ok(aggregation)
}

/// Memoizes group expansion for the duration of one run, so a group granted
/// at both scopes is fetched once. Failures are not cached.
pub struct CachedMembership<'a, R: ?Sized> {
    inner: &'a R,
    cache: Mutex<HashMap<String, Vec<SourceUser>>>,
}

impl<'a, R: GroupMembership + ?Sized> CachedMembership<'a, R> {
    pub fn new(inner: &'a R) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<'a, R: GroupMembership + ?Sized> GroupMembership for CachedMembership<'a, R> {
    async fn members(&self, group: &str) -> Result<Vec<SourceUser>> {
        let mut cache = self.cache.lock().await;
        if let Some(members) = cache.get(group) {
            return Ok(members.clone());
        }
        let members = self.inner.members(group).await?;
        cache.insert(group.to_string(), members.clone());
        Ok(members)
    }
}
