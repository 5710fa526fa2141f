// src/schema/mod.rs
//! Boundary validation for everything the Notion API hands back.
//!
//! Raw JSON goes in, domain values come out. Any shape the validator does not
//! recognise rejects the whole value with a [`ValidationError`] naming where.

mod blocks;
mod properties;
mod records;

pub use blocks::wants_children;

use crate::model::{Block, MediaItem, Post, PostListItem};
use crate::types::{ValidatedUrl, ValidationError};
use serde_json::Value;
use url::Url;

/// Which image URLs the content may reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePolicy {
    /// Accepted URL prefixes. Empty accepts any http(s) URL.
    pub allowed_url_prefixes: Vec<String>,
    pub require_alt_text: bool,
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self {
            allowed_url_prefixes: Vec::new(),
            require_alt_text: true,
        }
    }
}

impl ImagePolicy {
    pub fn check(&self, url: &str, alt: &str) -> Result<(), ValidationError> {
        let parsed = ValidatedUrl::parse(url).map_err(|e| e.nested("url"))?;
        if !self.allowed_url_prefixes.is_empty()
            && !self
                .allowed_url_prefixes
                .iter()
                .any(|prefix| under_prefix(parsed.as_url(), prefix))
        {
            return Err(ValidationError::schema(
                "url",
                format!("'{}' is not under an allowed image prefix", url),
            ));
        }
        if self.require_alt_text && alt.trim().is_empty() {
            return Err(ValidationError::schema("alt", "alt text is required"));
        }
        Ok(())
    }
}

/// Whether `url` lives under `prefix`: same scheme, host and port, and a path
/// that extends the prefix's path at a `/` boundary. Unparseable prefixes
/// match nothing.
fn under_prefix(url: &Url, prefix: &str) -> bool {
    let Ok(prefix) = Url::parse(prefix) else {
        return false;
    };
    if url.scheme() != prefix.scheme()
        || url.host_str() != prefix.host_str()
        || url.port_or_known_default() != prefix.port_or_known_default()
    {
        return false;
    }

    let base = prefix.path();
    let path = url.path();
    match path.strip_prefix(base) {
        Some(rest) => base.ends_with('/') || rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Validates raw records, property bags and blocks into domain shapes.
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator {
    images: ImagePolicy,
}

impl SchemaValidator {
    pub fn new(images: ImagePolicy) -> Self {
        Self { images }
    }

    pub fn post_list_item(&self, raw: &Value) -> Result<PostListItem, ValidationError> {
        records::parse_post_list_item(raw)
    }

    pub fn post(&self, raw: &Value) -> Result<Post, ValidationError> {
        records::parse_post(raw)
    }

    pub fn media_item(&self, raw: &Value) -> Result<MediaItem, ValidationError> {
        records::parse_media_item(raw)
    }

    pub fn block(&self, raw: &Value) -> Result<Block, ValidationError> {
        blocks::parse_block(raw, &self.images)
    }

    /// Validates every element of a listing, failing on the first bad one.
    /// Errors are located as `<label>[index]`.
    pub fn all<T>(
        &self,
        label: &str,
        raw: &[Value],
        parse: impl Fn(&Self, &Value) -> Result<T, ValidationError>,
    ) -> Result<Vec<T>, ValidationError> {
        raw.iter()
            .enumerate()
            .map(|(i, value)| {
                parse(self, value).map_err(|e| e.nested(&format!("{}[{}]", label, i)))
            })
            .collect()
    }
}
