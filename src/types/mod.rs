use thiserror::Error;

mod domain_types;
mod ids;

pub use domain_types::*;
pub use ids::*;

/// Why a value coming across the API boundary (or out of the cache) was rejected.
///
/// Validation never partially accepts: the first violation rejects the whole
/// value, and the variant says where it happened.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid Notion ID format: {0}")]
    InvalidId(String),

    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Empty required field: {0}")]
    EmptyField(&'static str),

    #[error("Invalid API key format: {reason}")]
    InvalidApiKey { reason: String },

    /// A field did not match the expected shape. `path` locates it inside the
    /// record, e.g. `properties.Slug` or `blocks[2].children[0].image`.
    #[error("Schema mismatch at {path}: {reason}")]
    Schema { path: String, reason: String },
}

impl ValidationError {
    /// Builds a [`ValidationError::Schema`] for the given field path.
    pub fn schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schema {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Prefixes the field path with an outer location, so errors raised deep in a
    /// tree read `blocks[3].children[1].toggle` instead of just `toggle`.
    pub fn nested(self, outer: &str) -> Self {
        match self {
            Self::Schema { path, reason } => Self::Schema {
                path: if path.is_empty() {
                    outer.to_string()
                } else {
                    format!("{}.{}", outer, path)
                },
                reason,
            },
            other => Self::Schema {
                path: outer.to_string(),
                reason: other.to_string(),
            },
        }
    }
}
