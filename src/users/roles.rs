use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::contexts::Db;
use crate::error::Result;
use crate::identifier;
use crate::users::UserId;

identifier!(RoleId);

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Hash)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

impl Role {
    pub const fn admin_role_id() -> RoleId {
        RoleId::from_u128(0xd532_8854_6190_4af9_ad69_4e74_b096_1ac9)
    }
}

/// Management and lookup of role assignments.
#[async_trait]
pub trait RoleDb: Send + Sync {
    /// Answers whether `user` holds `role`.
    async fn has_role(&self, user: UserId, role: RoleId) -> Result<bool>;

    async fn assign_role(&mut self, user: UserId, role: RoleId) -> Result<()>;

    async fn revoke_role(&mut self, user: UserId, role: RoleId) -> Result<()>;
}

#[derive(Default)]
pub struct HashMapRoleDb {
    roles: HashMap<UserId, HashSet<RoleId>>,
}

#[async_trait]
impl RoleDb for HashMapRoleDb {
    async fn has_role(&self, user: UserId, role: RoleId) -> Result<bool> {
        Ok(self
            .roles
            .get(&user)
            .is_some_and(|roles| roles.contains(&role)))
    }

    async fn assign_role(&mut self, user: UserId, role: RoleId) -> Result<()> {
        self.roles.entry(user).or_default().insert(role);
        Ok(())
    }

    async fn revoke_role(&mut self, user: UserId, role: RoleId) -> Result<()> {
        if let Some(roles) = self.roles.get_mut(&user) {
            roles.remove(&role);
        }
        Ok(())
    }
}

/// Capability interface for the single question the session resolver and the
/// admin gate ask. Keeping it separate from [`RoleDb`] allows swapping or
/// mocking the role backend without touching its consumers.
#[async_trait]
pub trait RoleChecker: Send + Sync + 'static {
    async fn is_admin(&self, user: UserId) -> Result<bool>;
}

#[async_trait]
impl<R> RoleChecker for Db<R>
where
    R: RoleDb + 'static,
{
    async fn is_admin(&self, user: UserId) -> Result<bool> {
        self.read()
            .await
            .has_role(user, Role::admin_role_id())
            .await
    }
}

/// Resolves the admin flag, treating errors and timeouts as non-admin.
/// Failures are logged and never surfaced.
pub async fn is_admin_fail_closed<C: RoleChecker + ?Sized>(
    checker: &C,
    user: UserId,
    timeout: Duration,
) -> bool {
    match tokio::time::timeout(timeout, checker.is_admin(user)).await {
        Ok(Ok(is_admin)) => is_admin,
        Ok(Err(error)) => {
            tracing::warn!(%user, %error, "role lookup failed, assuming non-admin");
            false
        }
        Err(_elapsed) => {
            tracing::warn!(%user, "role lookup timed out, assuming non-admin");
            false
        }
    }
}
