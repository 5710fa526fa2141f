// src/lib.rs
//! notion-content library: retrieves blog posts, media items and block trees
//! from Notion databases and turns them into validated domain values.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Repository**: `ContentRepository` and its query types
//! - **Error handling**: `AppError`, `ContentError`, `ValidationError`
//! - **Configuration**: `ContentConfig`, `RuntimeMode`
//! - **Domain model**: `Post`, `PostListItem`, `Block`, `GroupedBlock`, `MediaItem`
//! - **Boundary validation**: `SchemaValidator`, `ImagePolicy`, block grouping
//! - **Caching**: `ContentCache` and its file, memory and gated stores
//! - **API client**: `ContentApi`, `NotionHttpClient`, query builder
//! - **Retries**: `RetryPolicy`, `retry_with_backoff`

mod api;
mod cache;
mod config;
mod constants;
mod error;
mod error_recovery;
mod model;
mod repository;
mod schema;
mod transform;
mod types;

// --- Repository ---
pub use crate::repository::{
    BlockQuery, ContentRepository, DataSources, MediaQuery, PostListQuery, PostQuery,
};

// --- Error Handling ---
pub use crate::error::{
    AppError, ContentError, ContentResult, NotionErrorCode, TransportErrorKind,
};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{
    CommandLineInput, ContentCommand, ContentConfig, MediaSelection, RuntimeMode,
};

// --- Domain Model ---
pub use crate::model::{
    adjacent_posts, plain_text, Annotations, Block, ChildPageBlock, CodeBlock, GroupedBlock,
    ImageBlock, ListBlock, ListKind, MediaCategory, MediaItem, Post, PostListItem, RichText,
    SortDirection, TextBlock, ToggleBlock, VideoBlock,
};

// --- Domain Types ---
pub use crate::types::{ApiKey, BlockId, DatabaseId, Id, PageId, ValidatedUrl};

// --- Boundary Validation ---
pub use crate::schema::{wants_children, ImagePolicy, SchemaValidator};
pub use crate::transform::{group_blocks, transform_blocks, validate_blocks};

// --- Caching ---
pub use crate::cache::{
    keys as cache_keys, read_cached, write_cached, CacheRecord, ContentCache, DevOnlyCache,
    FileCache, MemoryCache, NoCache,
};

// --- API Client ---
pub use crate::api::{
    client::API_BASE_URL, fetch_all_pages, Condition, ContentApi, DatabaseQuery, Filter,
    NotionApiErrorResponse, NotionHttpClient, PaginatedResponse, RecordPage, Sort,
};

// --- Retries ---
pub use crate::error_recovery::{log_retry, retry_with_backoff, RetryPolicy, Transient};

// --- Constants ---
pub use crate::constants::{media_properties, post_properties};
