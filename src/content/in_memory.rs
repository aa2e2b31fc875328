use std::collections::HashMap;

use async_trait::async_trait;

use crate::content::blog::{AddBlogPost, BlogPost, BlogPostId};
use crate::content::db::{BlogDb, ContentListOptions, PortfolioDb};
use crate::content::portfolio::{AddPortfolioItem, PortfolioItem, PortfolioItemId};
use crate::error;
use crate::error::Result;
use crate::util::user_input::Validated;

#[derive(Default)]
pub struct HashMapPortfolioDb {
    items: HashMap<PortfolioItemId, PortfolioItem>,
}

#[async_trait]
impl PortfolioDb for HashMapPortfolioDb {
    async fn list(&self, options: ContentListOptions) -> Result<Vec<PortfolioItem>> {
        let mut items: Vec<PortfolioItem> = self
            .items
            .values()
            .filter(|item| options.include_unpublished || item.published)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn load(&self, item: PortfolioItemId) -> Result<PortfolioItem> {
        self.items
            .get(&item)
            .cloned()
            .ok_or(error::Error::UnknownPortfolioItemId)
    }

    async fn add(&mut self, item: Validated<AddPortfolioItem>) -> Result<PortfolioItem> {
        let item = PortfolioItem::from(item.user_input);
        self.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update(
        &mut self,
        item: PortfolioItemId,
        update: Validated<AddPortfolioItem>,
    ) -> Result<PortfolioItem> {
        match self.items.get_mut(&item) {
            Some(item) => {
                item.apply_update(update.user_input);
                Ok(item.clone())
            }
            None => Err(error::Error::UnknownPortfolioItemId),
        }
    }

    async fn remove(&mut self, item: PortfolioItemId) -> Result<()> {
        match self.items.remove(&item) {
            Some(_) => Ok(()),
            None => Err(error::Error::UnknownPortfolioItemId),
        }
    }
}

#[derive(Default)]
pub struct HashMapBlogDb {
    posts: HashMap<BlogPostId, BlogPost>,
}

#[async_trait]
impl BlogDb for HashMapBlogDb {
    async fn list(&self, options: ContentListOptions) -> Result<Vec<BlogPost>> {
        let mut posts: Vec<BlogPost> = self
            .posts
            .values()
            .filter(|post| options.include_unpublished || post.published)
            .cloned()
            .collect();
        // the public listing is ordered by publication date, drafts sort
        // by creation date among them
        posts.sort_by(|a, b| {
            b.published_at
                .unwrap_or(b.created_at)
                .cmp(&a.published_at.unwrap_or(a.created_at))
        });
        Ok(posts)
    }

    async fn load(&self, post: BlogPostId) -> Result<BlogPost> {
        self.posts
            .get(&post)
            .cloned()
            .ok_or(error::Error::UnknownBlogPostId)
    }

    async fn add(&mut self, post: Validated<AddBlogPost>) -> Result<BlogPost> {
        let post = BlogPost::from(post.user_input);
        self.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(
        &mut self,
        post: BlogPostId,
        update: Validated<AddBlogPost>,
    ) -> Result<BlogPost> {
        match self.posts.get_mut(&post) {
            Some(post) => {
                post.apply_update(update.user_input);
                Ok(post.clone())
            }
            None => Err(error::Error::UnknownBlogPostId),
        }
    }

    async fn remove(&mut self, post: BlogPostId) -> Result<()> {
        match self.posts.remove(&post) {
            Some(_) => Ok(()),
            None => Err(error::Error::UnknownBlogPostId),
        }
    }
}
