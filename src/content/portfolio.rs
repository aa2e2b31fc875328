use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snafu::ensure;
use url::Url;

use crate::content::text::slugify;
use crate::error::{self, Error, Result};
use crate::identifier;
use crate::util::user_input::UserInput;
use crate::util::Identifier;

identifier!(PortfolioItemId);

/// A case-study card shown on the portfolio page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    pub id: PortfolioItemId,
    pub title: String,
    pub slug: String,
    pub short_description: String,
    pub full_description: String,
    pub cover_image: Url,
    pub project_link: Option<Url>,
    pub tags: Vec<String>,
    pub category: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a portfolio item and for replacing the mutable
/// fields of an existing one. The slug is always re-derived from the title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPortfolioItem {
    pub title: String,
    pub short_description: String,
    pub full_description: String,
    pub cover_image: Url,
    #[serde(default)]
    pub project_link: Option<Url>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category: String,
    #[serde(default)]
    pub published: bool,
}

impl UserInput for AddPortfolioItem {
    fn validate(&self) -> Result<(), Error> {
        ensure!(
            !self.title.trim().is_empty(),
            error::ValidationFailedSnafu {
                reason: "Title must not be empty"
            }
        );
        ensure!(
            !self.short_description.trim().is_empty(),
            error::ValidationFailedSnafu {
                reason: "Short description must not be empty"
            }
        );
        ensure!(
            !self.full_description.trim().is_empty(),
            error::ValidationFailedSnafu {
                reason: "Full description must not be empty"
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

impl From<AddPortfolioItem> for PortfolioItem {
    fn from(add: AddPortfolioItem) -> Self {
        let slug = slugify(&add.title);
        Self {
            id: PortfolioItemId::new(),
            title: add.title,
            slug,
            short_description: add.short_description,
            full_description: add.full_description,
            cover_image: add.cover_image,
            project_link: add.project_link,
            tags: add.tags,
            category: add.category,
            published: add.published,
            created_at: Utc::now(),
        }
    }
}

impl PortfolioItem {
    /// Replaces the mutable fields, keeping id and creation timestamp.
    pub fn apply_update(&mut self, update: AddPortfolioItem) {
        self.slug = slugify(&update.title);
        self.title = update.title;
        self.short_description = update.short_description;
        self.full_description = update.full_description;
        self.cover_image = update.cover_image;
        self.project_link = update.project_link;
        self.tags = update.tags;
        self.category = update.category;
        self.published = update.published;
    }
}
