// src/api/mod.rs
//! Notion API interaction: the ability to retrieve raw content records.
//!
//! Everything returned from here is unvalidated JSON. The repository runs it
//! through the schema layer before anything else sees it.

pub mod client;
mod pagination;
mod parser;
mod query;
mod types;

pub use client::NotionHttpClient;
pub use pagination::fetch_all_pages;
pub use query::{Condition, DatabaseQuery, Filter, Sort};
pub use types::{NotionApiErrorResponse, PaginatedResponse, RecordPage};

use crate::error::AppError;
use crate::types::{BlockId, DatabaseId, PageId};
use serde_json::Value;

/// The subset of the Notion API the content pipeline needs.
///
/// Each call is a single request for a single page of results. Business
/// logic depends on this trait, never on HTTP details.
#[async_trait::async_trait]
pub trait ContentApi: Send + Sync {
    async fn query_database(
        &self,
        database: &DatabaseId,
        query: &DatabaseQuery,
        cursor: Option<&str>,
    ) -> Result<RecordPage, AppError>;

    async fn list_block_children(
        &self,
        block: &BlockId,
        cursor: Option<&str>,
    ) -> Result<RecordPage, AppError>;

    async fn retrieve_page(&self, page: &PageId) -> Result<Value, AppError>;
}
