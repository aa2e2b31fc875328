use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::content::blog::{AddBlogPost, BlogPost, BlogPostId};
use crate::content::portfolio::{AddPortfolioItem, PortfolioItem, PortfolioItemId};
use crate::error::Result;
use crate::util::user_input::Validated;

/// Listing options shared by both collections. Rows are always returned
/// newest first; the public site never sees unpublished rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentListOptions {
    #[serde(default)]
    pub include_unpublished: bool,
}

#[async_trait]
pub trait PortfolioDb: Send + Sync {
    async fn list(&self, options: ContentListOptions) -> Result<Vec<PortfolioItem>>;

    /// # Errors
    ///
    /// This call fails if the id is unknown.
    ///
    async fn load(&self, item: PortfolioItemId) -> Result<PortfolioItem>;

    async fn add(&mut self, item: Validated<AddPortfolioItem>) -> Result<PortfolioItem>;

    /// Replaces the mutable fields of an existing item.
    ///
    /// # Errors
    ///
    /// This call fails if the id is unknown.
    ///
    async fn update(
        &mut self,
        item: PortfolioItemId,
        update: Validated<AddPortfolioItem>,
    ) -> Result<PortfolioItem>;

    /// # Errors
    ///
    /// This call fails if the id is unknown.
    ///
    async fn remove(&mut self, item: PortfolioItemId) -> Result<()>;
}

#[async_trait]
pub trait BlogDb: Send + Sync {
    async fn list(&self, options: ContentListOptions) -> Result<Vec<BlogPost>>;

    /// # Errors
    ///
    /// This call fails if the id is unknown.
    ///
    async fn load(&self, post: BlogPostId) -> Result<BlogPost>;

    async fn add(&mut self, post: Validated<AddBlogPost>) -> Result<BlogPost>;

    /// Replaces the mutable fields of an existing post.
    ///
    /// # Errors
    ///
    /// This call fails if the id is unknown.
    ///
    async fn update(
        &mut self,
        post: BlogPostId,
        update: Validated<AddBlogPost>,
    ) -> Result<BlogPost>;

    /// # Errors
    ///
    /// This call fails if the id is unknown.
    ///
    async fn remove(&mut self, post: BlogPostId) -> Result<()>;
}
