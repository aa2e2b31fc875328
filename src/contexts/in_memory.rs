use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLockReadGuard, RwLockWriteGuard};

use super::{Context, Db};
use crate::blobs::FileSystemBlobStore;
use crate::content::in_memory::{HashMapBlogDb, HashMapPortfolioDb};
use crate::error::Result;
use crate::users::hashmap_userdb::HashMapUserDb;
use crate::users::roles::{HashMapRoleDb, Role, RoleDb};
use crate::users::user::{UserId, UserRegistration};
use crate::users::userdb::UserDb;
use crate::util::user_input::UserInput;

/// A context with references to in-memory versions of the individual stores.
#[derive(Clone)]
pub struct InMemoryContext {
    user_db: Db<HashMapUserDb>,
    role_db: Db<HashMapRoleDb>,
    portfolio_db: Db<HashMapPortfolioDb>,
    blog_db: Db<HashMapBlogDb>,
    blob_store: Arc<FileSystemBlobStore>,
}

impl InMemoryContext {
    pub fn new(blob_store: FileSystemBlobStore) -> Self {
        Self {
            user_db: Db::default(),
            role_db: Db::default(),
            portfolio_db: Db::default(),
            blog_db: Db::default(),
            blob_store: Arc::new(blob_store),
        }
    }

    pub fn from_config() -> Result<Self> {
        Ok(Self::new(FileSystemBlobStore::from_config()?))
    }

    /// Provisions the admin account the hosted deployment is seeded with.
    pub async fn seed_admin(&self, email: &str, password: &str) -> Result<UserId> {
        let user_id = self
            .user_db
            .write()
            .await
            .register(
                UserRegistration {
                    email: email.to_string(),
                    password: password.to_string(),
                }
                .validated()?,
            )
            .await?;

        self.role_db
            .write()
            .await
            .assign_role(user_id, Role::admin_role_id())
            .await?;

        Ok(user_id)
    }
}

impl Default for InMemoryContext {
    fn default() -> Self {
        let directory = std::env::temp_dir().join(format!("agency-uploads-{}", uuid::Uuid::new_v4()));
        let public_base_url =
            url::Url::parse("http://localhost:3030/files/").expect("valid base url");
        Self::new(FileSystemBlobStore::new(directory, public_base_url))
    }
}

#[async_trait]
impl Context for InMemoryContext {
    type UserDb = HashMapUserDb;
    type RoleDb = HashMapRoleDb;
    type PortfolioDb = HashMapPortfolioDb;
    type BlogDb = HashMapBlogDb;
    type BlobStore = FileSystemBlobStore;

    fn user_db(&self) -> Db<Self::UserDb> {
        self.user_db.clone()
    }
    async fn user_db_ref(&self) -> RwLockReadGuard<'_, Self::UserDb> {
        self.user_db.read().await
    }
    async fn user_db_ref_mut(&self) -> RwLockWriteGuard<'_, Self::UserDb> {
        self.user_db.write().await
    }

    fn role_db(&self) -> Db<Self::RoleDb> {
        self.role_db.clone()
    }
    async fn role_db_ref(&self) -> RwLockReadGuard<'_, Self::RoleDb> {
        self.role_db.read().await
    }
    async fn role_db_ref_mut(&self) -> RwLockWriteGuard<'_, Self::RoleDb> {
        self.role_db.write().await
    }

    fn portfolio_db(&self) -> Db<Self::PortfolioDb> {
        self.portfolio_db.clone()
    }
    async fn portfolio_db_ref(&self) -> RwLockReadGuard<'_, Self::PortfolioDb> {
        self.portfolio_db.read().await
    }
    async fn portfolio_db_ref_mut(&self) -> RwLockWriteGuard<'_, Self::PortfolioDb> {
        self.portfolio_db.write().await
    }

    fn blog_db(&self) -> Db<Self::BlogDb> {
        self.blog_db.clone()
    }
    async fn blog_db_ref(&self) -> RwLockReadGuard<'_, Self::BlogDb> {
        self.blog_db.read().await
    }
    async fn blog_db_ref_mut(&self) -> RwLockWriteGuard<'_, Self::BlogDb> {
        self.blog_db.write().await
    }

    fn blob_store(&self) -> Arc<Self::BlobStore> {
        self.blob_store.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_admin_can_log_in_and_holds_the_role() {
        let ctx = InMemoryContext::default();
        let user_id = ctx
            .seed_admin("admin@agency.example", "change-me-please")
            .await
            .unwrap();

        let session = ctx
            .user_db_ref_mut()
            .await
            .login(crate::users::user::UserCredentials {
                email: "admin@agency.example".into(),
                password: "change-me-please".into(),
            })
            .await
            .unwrap();

        assert_eq!(session.user.id, user_id);
        assert!(ctx
            .role_db_ref()
            .await
            .has_role(user_id, Role::admin_role_id())
            .await
            .unwrap());
        assert!(ctx.is_admin(user_id).await);
    }
}
