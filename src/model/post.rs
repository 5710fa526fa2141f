use super::GroupedBlock;
use crate::types::ValidationError;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DATE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("date prefix regex is valid"));

/// Whether `value` starts with a `YYYY-MM-DD` date.
pub fn has_date_prefix(value: &str) -> bool {
    DATE_PREFIX.is_match(value)
}

/// A post as it appears in listings and navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListItem {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    /// Publication date; always starts with `YYYY-MM-DD`.
    pub first_published: String,
    pub featured_image: Option<String>,
    pub feed_id: Option<String>,
}

impl PostListItem {
    /// Checks the invariants every list item must hold.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::EmptyField("id"));
        }
        if self.slug.is_empty() {
            return Err(ValidationError::EmptyField("slug"));
        }
        if self.title.is_empty() {
            return Err(ValidationError::EmptyField("title"));
        }
        if !has_date_prefix(&self.first_published) {
            return Err(ValidationError::schema(
                "firstPublished",
                format!("'{}' does not start with YYYY-MM-DD", self.first_published),
            ));
        }
        Ok(())
    }
}

/// A full post. `blocks`, `prev_post` and `next_post` stay empty unless the
/// caller asked for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(flatten)]
    pub item: PostListItem,
    pub last_edited_time: DateTime<Utc>,
    pub blocks: Vec<GroupedBlock>,
    pub prev_post: Option<PostListItem>,
    pub next_post: Option<PostListItem>,
}

impl Post {
    pub fn new(item: PostListItem, last_edited_time: DateTime<Utc>) -> Self {
        Self {
            item,
            last_edited_time,
            blocks: Vec::new(),
            prev_post: None,
            next_post: None,
        }
    }

    pub fn slug(&self) -> &str {
        &self.item.slug
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.item.validate()?;
        for neighbour in self.prev_post.iter().chain(self.next_post.iter()) {
            neighbour.validate()?;
        }
        for (i, block) in self.blocks.iter().enumerate() {
            block
                .validate()
                .map_err(|e| e.nested(&format!("blocks[{}]", i)))?;
        }
        Ok(())
    }
}

/// Sort direction for post listings, by first-published date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// The direction name the Notion query API expects.
    pub fn as_api_str(self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }
}

/// Finds the neighbours of `slug` in a list already sorted ascending.
///
/// Returns `(None, None)` when the slug is not in the list.
pub fn adjacent_posts(
    ascending: &[PostListItem],
    slug: &str,
) -> (Option<PostListItem>, Option<PostListItem>) {
    let Some(index) = ascending.iter().position(|item| item.slug == slug) else {
        return (None, None);
    };
    let prev = index
        .checked_sub(1)
        .and_then(|i| ascending.get(i))
        .cloned();
    let next = ascending.get(index + 1).cloned();
    (prev, next)
}
