use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snafu::ensure;
use url::Url;

use crate::content::text::{estimate_read_time, slugify};
use crate::error::{self, Error, Result};
use crate::identifier;
use crate::util::user_input::UserInput;
use crate::util::Identifier;

identifier!(BlogPostId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: BlogPostId,
    pub title: String,
    pub slug: String,
    pub subtitle: Option<String>,
    pub content: String,
    pub excerpt: Option<String>,
    pub cover_image: Url,
    pub tags: Vec<String>,
    pub author: String,
    pub category: String,
    /// minutes, derived from the content word count
    pub read_time: u32,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a blog post and for replacing the mutable fields of
/// an existing one. Slug and read time are always re-derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBlogPost {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub cover_image: Url,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author: String,
    pub category: String,
    #[serde(default)]
    pub seo_title: Option<String>,
    #[serde(default)]
    pub seo_description: Option<String>,
    #[serde(default)]
    pub published: bool,
}

impl UserInput for AddBlogPost {
    fn validate(&self) -> Result<(), Error> {
        ensure!(
            !self.title.trim().is_empty(),
            error::ValidationFailedSnafu {
                reason: "Title must not be empty"
            }
        );
        ensure!(
            !self.content.trim().is_empty(),
            error::ValidationFailedSnafu {
                reason: "Content must not be empty"
            }
        );
        ensure!(
            !self.author.trim().is_empty(),
            error::ValidationFailedSnafu {
                reason: "Author must not be empty"
            }
        );
        ensure!(
            !self.category.trim().is_empty(),
            error::ValidationFailedSnafu {
                reason: "Category must not be empty"
            }
        );

        Ok(())
    }
}

impl From<AddBlogPost> for BlogPost {
    fn from(add: AddBlogPost) -> Self {
        let slug = slugify(&add.title);
        let read_time = estimate_read_time(&add.content);
        let published_at = add.published.then(Utc::now);

        Self {
            id: BlogPostId::new(),
            title: add.title,
            slug,
            subtitle: add.subtitle,
            content: add.content,
            excerpt: add.excerpt,
            cover_image: add.cover_image,
            tags: add.tags,
            author: add.author,
            category: add.category,
            read_time,
            seo_title: add.seo_title,
            seo_description: add.seo_description,
            published: add.published,
            published_at,
            created_at: Utc::now(),
        }
    }
}

impl BlogPost {
    /// Replaces the mutable fields, keeping id and creation timestamp.
    /// The publication timestamp is set when the post first goes live and
    /// cleared when it is taken down.
    pub fn apply_update(&mut self, update: AddBlogPost) {
        self.slug = slugify(&update.title);
        self.read_time = estimate_read_time(&update.content);

        self.published_at = match (self.published, update.published) {
            (false, true) => Some(Utc::now()),
            (_, false) => None,
            (true, true) => self.published_at,
        };

        self.title = update.title;
        self.subtitle = update.subtitle;
        self.content = update.content;
        self.excerpt = update.excerpt;
        self.cover_image = update.cover_image;
        self.tags = update.tags;
        self.author = update.author;
        self.category = update.category;
        self.seo_title = update.seo_title;
        self.seo_description = update.seo_description;
        self.published = update.published;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_post() -> AddBlogPost {
        AddBlogPost {
            title: "Métricas que Importam".to_string(),
            subtitle: None,
            content: "<p>Some words about metrics.</p>".to_string(),
            excerpt: None,
            cover_image: Url::parse("http://files.agency.example/cover.png").unwrap(),
            tags: vec!["analytics".to_string()],
            author: "Ana".to_string(),
            category: "Marketing".to_string(),
            seo_title: None,
            seo_description: None,
            published: false,
        }
    }

    #[test]
    fn derives_slug_and_read_time() {
        let post = BlogPost::from(add_post());
        assert_eq!(post.slug, "metricas-que-importam");
        assert_eq!(post.read_time, 1);
        assert!(post.published_at.is_none());
    }

    #[test]
    fn long_content_increases_read_time() {
        let mut add = add_post();
        add.content = vec!["word"; 401].join(" ");
        let post = BlogPost::from(add);
        assert_eq!(post.read_time, 3);
    }

    #[test]
    fn publishing_sets_the_publication_timestamp_once() {
        let mut post = BlogPost::from(add_post());
        assert!(post.published_at.is_none());

        let mut publish = add_post();
        publish.published = true;
        post.apply_update(publish.clone());
        let first_published_at = post.published_at;
        assert!(first_published_at.is_some());

        // staying published keeps the original timestamp
        post.apply_update(publish);
        assert_eq!(post.published_at, first_published_at);

        // unpublishing clears it
        post.apply_update(add_post());
        assert!(post.published_at.is_none());
    }

    #[test]
    fn missing_required_fields_fail_validation() {
        let mut add = add_post();
        add.author = String::new();
        assert!(add.validate().is_err());

        let mut add = add_post();
        add.content = "   ".to_string();
        assert!(add.validate().is_err());

        assert!(add_post().validate().is_ok());
    }
}
