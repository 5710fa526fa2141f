// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role.

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// How many objects the Notion API returns per page of results.
///
/// The Notion API maximum is 100. We use the maximum to minimize
/// round-trips while paginating.
pub const NOTION_API_PAGE_SIZE: usize = 100;

/// How deep container blocks (toggles) are followed when assembling a block tree.
pub const BLOCK_TREE_MAX_DEPTH: usize = 8;

/// Block types whose children are fetched and nested into the tree.
pub const CONTAINER_BLOCK_TYPES: &[&str] = &["toggle"];

/// Client-level request timeout. A hung call surfaces as a transient timeout
/// instead of blocking the retry layer forever.
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Retry policy defaults
// ---------------------------------------------------------------------------

pub const RETRY_MAX_ATTEMPTS: u32 = 3;
pub const RETRY_INITIAL_DELAY_MS: u64 = 2_000;
pub const RETRY_MAX_DELAY_MS: u64 = 10_000;
pub const RETRY_BACKOFF_MULTIPLIER: f64 = 2.0;

// ---------------------------------------------------------------------------
// Cache layout
// ---------------------------------------------------------------------------

pub const CACHE_NAMESPACE_POST: &str = "post";
pub const CACHE_NAMESPACE_POSTS: &str = "posts";
pub const CACHE_NAMESPACE_MEDIA: &str = "media";
pub const CACHE_NAMESPACE_BLOCKS: &str = "blocks";

/// Hex characters kept from the sha256 of a sorted id list in a cache key.
pub const CACHE_KEY_HASH_LENGTH: usize = 16;

// ---------------------------------------------------------------------------
// Posts database schema
// ---------------------------------------------------------------------------

pub mod post_properties {
    pub const TITLE: &str = "Title";
    pub const SLUG: &str = "Slug";
    pub const DESCRIPTION: &str = "Description";
    pub const FIRST_PUBLISHED: &str = "First Published";
    pub const FEATURED_IMAGE: &str = "Featured Image";
    pub const FEED_ID: &str = "Feed ID";
    pub const STATUS: &str = "Status";
    pub const DESTINATION: &str = "Destination";

    /// `Status` value of posts that are live.
    pub const PUBLISHED_STATUS: &str = "Published";
    /// `Destination` option of posts meant for the public blog.
    pub const PUBLIC_DESTINATION: &str = "Blog";
}

// ---------------------------------------------------------------------------
// Media databases schema (books, albums, podcasts share one shape)
// ---------------------------------------------------------------------------

pub mod media_properties {
    pub const NAME: &str = "Name";
    pub const APPLE_ID: &str = "Apple ID";
    pub const DATE: &str = "Date";
}
