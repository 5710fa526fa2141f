// src/api/types.rs
//! Wire types shared by the client and the pagination loop.

use serde::Deserialize;
use serde_json::Value;

/// Generic paginated response from Notion API.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default)]
    pub object: String,
    pub results: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl<T> PaginatedResponse<T> {
    /// A single, final page.
    pub fn last(results: Vec<T>) -> Self {
        Self {
            object: "list".to_string(),
            results,
            next_cursor: None,
            has_more: false,
        }
    }

    /// A page followed by more results at `cursor`.
    pub fn with_more(results: Vec<T>, cursor: impl Into<String>) -> Self {
        Self {
            object: "list".to_string(),
            results,
            next_cursor: Some(cursor.into()),
            has_more: true,
        }
    }
}

/// One page of raw, unvalidated records.
pub type RecordPage = PaginatedResponse<Value>;

/// Error response from Notion API.
#[derive(Debug, Clone, Deserialize)]
pub struct NotionApiErrorResponse {
    #[serde(default)]
    pub status: u16,
    pub code: String,
    pub message: String,
}
