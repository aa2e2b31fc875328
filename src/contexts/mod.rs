use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::blobs::BlobStore;
use crate::config;
use crate::content::db::{BlogDb, PortfolioDb};
use crate::error::Result;
use crate::users::roles::{is_admin_fail_closed, RoleDb};
use crate::users::session::{SessionId, UserSession};
use crate::users::user::UserId;
use crate::users::userdb::UserDb;

mod in_memory;

pub use in_memory::InMemoryContext;

pub type Db<T> = Arc<RwLock<T>>;

const DEFAULT_LOOKUP_TIMEOUT_SECONDS: u64 = 5;

/// A context bundles access to the shared stores to pass to the service
/// handlers.
#[async_trait]
pub trait Context: 'static + Send + Sync + Clone {
    type UserDb: UserDb;
    type RoleDb: RoleDb + 'static;
    type PortfolioDb: PortfolioDb;
    type BlogDb: BlogDb;
    type BlobStore: BlobStore;

    fn user_db(&self) -> Db<Self::UserDb>;
    async fn user_db_ref(&self) -> RwLockReadGuard<'_, Self::UserDb>;
    async fn user_db_ref_mut(&self) -> RwLockWriteGuard<'_, Self::UserDb>;

    fn role_db(&self) -> Db<Self::RoleDb>;
    async fn role_db_ref(&self) -> RwLockReadGuard<'_, Self::RoleDb>;
    async fn role_db_ref_mut(&self) -> RwLockWriteGuard<'_, Self::RoleDb>;

    fn portfolio_db(&self) -> Db<Self::PortfolioDb>;
    async fn portfolio_db_ref(&self) -> RwLockReadGuard<'_, Self::PortfolioDb>;
    async fn portfolio_db_ref_mut(&self) -> RwLockWriteGuard<'_, Self::PortfolioDb>;

    fn blog_db(&self) -> Db<Self::BlogDb>;
    async fn blog_db_ref(&self) -> RwLockReadGuard<'_, Self::BlogDb>;
    async fn blog_db_ref_mut(&self) -> RwLockWriteGuard<'_, Self::BlogDb>;

    fn blob_store(&self) -> Arc<Self::BlobStore>;

    async fn session_by_id(&self, session: SessionId) -> Result<UserSession> {
        self.user_db_ref().await.session(session).await
    }

    /// Admin check for request gating; errors and timeouts count as
    /// non-admin.
    async fn is_admin(&self, user: UserId) -> bool {
        let timeout = config::get_config_element::<config::RoleLookup>()
            .map(|roles| Duration::from_secs(roles.timeout_seconds))
            .unwrap_or(Duration::from_secs(DEFAULT_LOOKUP_TIMEOUT_SECONDS));

        is_admin_fail_closed(&self.role_db(), user, timeout).await
    }
}
