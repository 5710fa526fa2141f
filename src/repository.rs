// src/repository.rs
//! The content repository: posts, media and block trees, fetched, validated,
//! shaped and cached.
//!
//! Every public operation returns a [`ContentResult`]. Internally the steps
//! are cache check, paginated fetch with per-request retries, schema
//! validation, optional composition with dependent operations, then a cache
//! write. A `skip_cache` request bypasses the read but still writes the fresh
//! result back.

use crate::api::{fetch_all_pages, Condition, ContentApi, DatabaseQuery, Filter};
use crate::cache::{keys, read_cached, write_cached, CacheRecord, ContentCache};
use crate::constants::{
    media_properties, post_properties, BLOCK_TREE_MAX_DEPTH, CACHE_NAMESPACE_BLOCKS,
    CACHE_NAMESPACE_MEDIA, CACHE_NAMESPACE_POST, CACHE_NAMESPACE_POSTS,
};
use crate::error::{AppError, ContentError, ContentResult};
use crate::error_recovery::{log_retry, retry_with_backoff, RetryPolicy};
use crate::model::{
    adjacent_posts, GroupedBlock, MediaCategory, MediaItem, Post, PostListItem, SortDirection,
};
use crate::schema::{wants_children, SchemaValidator};
use crate::transform::transform_blocks;
use crate::types::{BlockId, DatabaseId, PageId};
use chrono::{NaiveDate, Utc};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

const OP_FETCH_POST: &str = "fetch_post";
const OP_FETCH_POSTS: &str = "fetch_posts";
const OP_FETCH_POSTS_BY_IDS: &str = "fetch_posts_by_ids";
const OP_FETCH_MEDIA_ITEMS: &str = "fetch_media_items";
const OP_FETCH_MEDIA_LIBRARY: &str = "fetch_media_library";
const OP_FETCH_BLOCK_CHILDREN: &str = "fetch_block_children";

/// The databases content is read from. Unset sources fail the operations
/// that need them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSources {
    pub posts: Option<DatabaseId>,
    pub books: Option<DatabaseId>,
    pub albums: Option<DatabaseId>,
    pub podcasts: Option<DatabaseId>,
}

impl DataSources {
    fn posts(&self) -> Result<&DatabaseId, AppError> {
        self.posts.as_ref().ok_or_else(|| {
            AppError::MissingConfiguration("no posts database configured".to_string())
        })
    }

    fn media(&self, category: MediaCategory) -> Result<&DatabaseId, AppError> {
        let source = match category {
            MediaCategory::Books => &self.books,
            MediaCategory::Albums => &self.albums,
            MediaCategory::Podcasts => &self.podcasts,
        };
        source.as_ref().ok_or_else(|| {
            AppError::MissingConfiguration(format!("no {} database configured", category))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub slug: String,
    pub include_navigation: bool,
    pub include_blocks: bool,
    pub skip_cache: bool,
}

impl PostQuery {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            include_navigation: false,
            include_blocks: false,
            skip_cache: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostListQuery {
    pub sort: SortDirection,
    pub skip_cache: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaQuery {
    pub category: MediaCategory,
    pub skip_cache: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockQuery {
    pub block_id: BlockId,
    pub skip_cache: bool,
}

pub struct ContentRepository {
    api: Arc<dyn ContentApi>,
    cache: Arc<dyn ContentCache>,
    sources: DataSources,
    retry: RetryPolicy,
    validator: SchemaValidator,
    today: Option<NaiveDate>,
}

impl ContentRepository {
    pub fn new(
        api: Arc<dyn ContentApi>,
        cache: Arc<dyn ContentCache>,
        sources: DataSources,
    ) -> Self {
        Self {
            api,
            cache,
            sources,
            retry: RetryPolicy::default(),
            validator: SchemaValidator::default(),
            today: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_validator(mut self, validator: SchemaValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Pins the date media items are compared against. Defaults to today in UTC.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    // -----------------------------------------------------------------------
    // Public operations
    // -----------------------------------------------------------------------

    /// Fetches one published post by slug.
    ///
    /// No match is `Ok(None)`. Several matches fail with
    /// [`AppError::DuplicateRecords`]. Navigation and blocks are fetched after
    /// the post itself, and either failing fails the call.
    pub async fn fetch_post(&self, query: &PostQuery) -> ContentResult<Option<Post>> {
        self.fetch_post_inner(query)
            .await
            .map_err(|e| ContentError::new(OP_FETCH_POST, e))
    }

    /// Lists every published post, sorted by first-published date.
    pub async fn fetch_posts(&self, query: &PostListQuery) -> ContentResult<Vec<PostListItem>> {
        self.fetch_posts_inner(query)
            .await
            .map_err(|e| ContentError::new(OP_FETCH_POSTS, e))
    }

    /// Lists one media category, newest first, leaving out items dated in the future.
    pub async fn fetch_media_items(&self, query: &MediaQuery) -> ContentResult<Vec<MediaItem>> {
        self.fetch_media_items_inner(query)
            .await
            .map_err(|e| ContentError::new(OP_FETCH_MEDIA_ITEMS, e))
    }

    /// Fetches the grouped block tree under a page or block.
    pub async fn fetch_block_children(
        &self,
        query: &BlockQuery,
    ) -> ContentResult<Vec<GroupedBlock>> {
        self.fetch_block_children_inner(query)
            .await
            .map_err(|e| ContentError::new(OP_FETCH_BLOCK_CHILDREN, e))
    }

    /// Fetches list items for an explicit set of post page ids, sorted by
    /// first-published date. The pages are retrieved concurrently and any
    /// failure fails the whole set.
    pub async fn fetch_posts_by_ids(
        &self,
        ids: &[String],
        skip_cache: bool,
    ) -> ContentResult<Vec<PostListItem>> {
        self.fetch_posts_by_ids_inner(ids, skip_cache)
            .await
            .map_err(|e| ContentError::new(OP_FETCH_POSTS_BY_IDS, e))
    }

    /// Fetches several media categories concurrently. Any failing category
    /// fails the whole library.
    pub async fn fetch_media_library(
        &self,
        categories: &[MediaCategory],
        skip_cache: bool,
    ) -> ContentResult<BTreeMap<MediaCategory, Vec<MediaItem>>> {
        let fetches = categories.iter().map(|&category| async move {
            let items = self
                .fetch_media_items(&MediaQuery {
                    category,
                    skip_cache,
                })
                .await?;
            Ok::<_, ContentError>((category, items))
        });

        let library = try_join_all(fetches)
            .await
            .map_err(|e| ContentError::new(OP_FETCH_MEDIA_LIBRARY, e))?;
        Ok(library.into_iter().collect())
    }

    // -----------------------------------------------------------------------
    // Operation bodies
    // -----------------------------------------------------------------------

    async fn fetch_post_inner(&self, query: &PostQuery) -> Result<Option<Post>, AppError> {
        let key = keys::post_key(&query.slug, query.include_navigation, query.include_blocks);
        if let Some(post) = self
            .cached::<Post>(query.skip_cache, &key, CACHE_NAMESPACE_POST)
            .await?
        {
            return Ok(Some(post));
        }

        let database = self.sources.posts()?;
        let db_query = DatabaseQuery::new().filter(Filter::And(vec![
            published_posts_filter(),
            Filter::property(
                post_properties::SLUG,
                Condition::RichTextEquals(query.slug.clone()),
            ),
        ]));
        let records = self.query_all(OP_FETCH_POST, database, &db_query).await?;

        let mut post = match records.as_slice() {
            [] => {
                log::info!("No published post with slug '{}'", query.slug);
                return Ok(None);
            }
            [record] => self.validator.post(record)?,
            many => {
                return Err(AppError::DuplicateRecords {
                    key: query.slug.clone(),
                    count: many.len(),
                })
            }
        };

        if query.include_navigation {
            let posts = self
                .fetch_posts(&PostListQuery {
                    sort: SortDirection::Ascending,
                    skip_cache: query.skip_cache,
                })
                .await?;
            let (prev, next) = adjacent_posts(&posts, post.slug());
            post.prev_post = prev;
            post.next_post = next;
        }

        if query.include_blocks {
            let block_id = BlockId::parse(&post.item.id)?;
            post.blocks = self
                .fetch_block_children(&BlockQuery {
                    block_id,
                    skip_cache: query.skip_cache,
                })
                .await?;
        }

        write_cached(self.cache.as_ref(), &key, CACHE_NAMESPACE_POST, &post).await;
        log::info!("Fetched post '{}'", post.slug());
        Ok(Some(post))
    }

    async fn fetch_posts_inner(
        &self,
        query: &PostListQuery,
    ) -> Result<Vec<PostListItem>, AppError> {
        let key = keys::posts_key(query.sort);
        if let Some(posts) = self
            .cached::<Vec<PostListItem>>(query.skip_cache, &key, CACHE_NAMESPACE_POSTS)
            .await?
        {
            return Ok(posts);
        }

        let database = self.sources.posts()?;
        let db_query = DatabaseQuery::new()
            .filter(published_posts_filter())
            .sort(post_properties::FIRST_PUBLISHED, query.sort);
        let records = self.query_all(OP_FETCH_POSTS, database, &db_query).await?;

        let mut posts = self
            .validator
            .all("results", &records, SchemaValidator::post_list_item)?;
        ensure_unique_slugs(&posts)?;
        // Stable, so posts sharing a date keep the API's order.
        match query.sort {
            SortDirection::Ascending => {
                posts.sort_by(|a, b| a.first_published.cmp(&b.first_published))
            }
            SortDirection::Descending => {
                posts.sort_by(|a, b| b.first_published.cmp(&a.first_published))
            }
        }

        write_cached(self.cache.as_ref(), &key, CACHE_NAMESPACE_POSTS, &posts).await;
        log::info!("Fetched {} posts", posts.len());
        Ok(posts)
    }

    async fn fetch_media_items_inner(
        &self,
        query: &MediaQuery,
    ) -> Result<Vec<MediaItem>, AppError> {
        let key = keys::media_key(query.category);
        if let Some(items) = self
            .cached::<Vec<MediaItem>>(query.skip_cache, &key, CACHE_NAMESPACE_MEDIA)
            .await?
        {
            return Ok(items);
        }

        let database = self.sources.media(query.category)?;
        let today = self.today();
        let db_query = DatabaseQuery::new()
            .filter(Filter::And(vec![
                Filter::property(media_properties::NAME, Condition::TitleIsNotEmpty),
                Filter::property(media_properties::APPLE_ID, Condition::NumberIsNotEmpty),
                Filter::property(media_properties::DATE, Condition::DateOnOrBefore(today)),
            ]))
            .sort(media_properties::DATE, SortDirection::Descending);
        let records = self
            .query_all(OP_FETCH_MEDIA_ITEMS, database, &db_query)
            .await?;

        let mut items = self
            .validator
            .all("results", &records, SchemaValidator::media_item)?;
        let before = items.len();
        items.retain(|item| item.date <= today);
        if items.len() < before {
            log::debug!(
                "Dropped {} {} dated after {}",
                before - items.len(),
                query.category,
                today
            );
        }

        write_cached(self.cache.as_ref(), &key, CACHE_NAMESPACE_MEDIA, &items).await;
        log::info!("Fetched {} {}", items.len(), query.category);
        Ok(items)
    }

    async fn fetch_block_children_inner(
        &self,
        query: &BlockQuery,
    ) -> Result<Vec<GroupedBlock>, AppError> {
        let key = keys::blocks_key(&query.block_id);
        if let Some(blocks) = self
            .cached::<Vec<GroupedBlock>>(query.skip_cache, &key, CACHE_NAMESPACE_BLOCKS)
            .await?
        {
            return Ok(blocks);
        }

        let raw = self.collect_block_tree(&query.block_id, 0).await?;
        let blocks = transform_blocks(&self.validator, &raw)?;

        write_cached(self.cache.as_ref(), &key, CACHE_NAMESPACE_BLOCKS, &blocks).await;
        log::info!("Fetched {} blocks under {}", blocks.len(), query.block_id);
        Ok(blocks)
    }

    async fn fetch_posts_by_ids_inner(
        &self,
        ids: &[String],
        skip_cache: bool,
    ) -> Result<Vec<PostListItem>, AppError> {
        let key = keys::ids_key(ids);
        if let Some(posts) = self
            .cached::<Vec<PostListItem>>(skip_cache, &key, CACHE_NAMESPACE_POSTS)
            .await?
        {
            return Ok(posts);
        }

        let page_ids = ids
            .iter()
            .map(|id| PageId::parse(id))
            .collect::<Result<Vec<_>, _>>()?;
        let pages = try_join_all(page_ids.iter().map(|page_id| {
            retry_with_backoff(
                move || self.api.retrieve_page(page_id),
                &self.retry,
                log_retry::<AppError>(OP_FETCH_POSTS_BY_IDS),
            )
        }))
        .await?;

        let mut posts = self
            .validator
            .all("pages", &pages, SchemaValidator::post_list_item)?;
        posts.sort_by(|a, b| a.first_published.cmp(&b.first_published));

        write_cached(self.cache.as_ref(), &key, CACHE_NAMESPACE_POSTS, &posts).await;
        Ok(posts)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn cached<T: CacheRecord>(
        &self,
        skip_cache: bool,
        key: &str,
        namespace: &str,
    ) -> Result<Option<T>, AppError> {
        if skip_cache {
            log::debug!("Cache bypassed: {}/{}", namespace, key);
            return Ok(None);
        }
        read_cached(self.cache.as_ref(), key, namespace).await
    }

    async fn query_all(
        &self,
        label: &str,
        database: &DatabaseId,
        query: &DatabaseQuery,
    ) -> Result<Vec<Value>, AppError> {
        fetch_all_pages(label, &self.retry, |cursor| async move {
            self.api
                .query_database(database, query, cursor.as_deref())
                .await
        })
        .await
    }

    async fn list_children(&self, block: &BlockId) -> Result<Vec<Value>, AppError> {
        fetch_all_pages(OP_FETCH_BLOCK_CHILDREN, &self.retry, |cursor| async move {
            self.api.list_block_children(block, cursor.as_deref()).await
        })
        .await
    }

    /// Lists a block's children and, for containers, attaches their own
    /// children under `children`, down to [`BLOCK_TREE_MAX_DEPTH`].
    fn collect_block_tree<'a>(
        &'a self,
        block: &'a BlockId,
        depth: usize,
    ) -> BoxFuture<'a, Result<Vec<Value>, AppError>> {
        async move {
            if depth > BLOCK_TREE_MAX_DEPTH {
                return Err(AppError::RecursionLimitExceeded(BLOCK_TREE_MAX_DEPTH));
            }

            let mut records = self.list_children(block).await?;
            for record in records.iter_mut().filter(|r| wants_children(r)) {
                let child_id = record
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        AppError::MalformedResponse("container block without an id".to_string())
                    })
                    .and_then(|id| BlockId::parse(id).map_err(AppError::from))?;
                let children = self.collect_block_tree(&child_id, depth + 1).await?;
                record["children"] = Value::Array(children);
            }
            Ok(records)
        }
        .boxed()
    }
}

fn published_posts_filter() -> Filter {
    Filter::And(vec![
        Filter::property(
            post_properties::STATUS,
            Condition::StatusEquals(post_properties::PUBLISHED_STATUS.to_string()),
        ),
        Filter::property(
            post_properties::DESTINATION,
            Condition::MultiSelectContains(post_properties::PUBLIC_DESTINATION.to_string()),
        ),
    ])
}

/// Fails on the first slug, in listing order, that appears more than once.
fn ensure_unique_slugs(posts: &[PostListItem]) -> Result<(), AppError> {
    let mut seen: HashSet<&str> = HashSet::new();
    let repeated = posts
        .iter()
        .map(|post| post.slug.as_str())
        .find(|slug| !seen.insert(*slug));

    match repeated {
        Some(slug) => Err(AppError::DuplicateRecords {
            key: slug.to_string(),
            count: posts.iter().filter(|post| post.slug == slug).count(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(slug: &str) -> PostListItem {
        PostListItem {
            id: format!("id-{}", slug),
            slug: slug.to_string(),
            title: slug.to_string(),
            description: None,
            first_published: "2024-01-01".to_string(),
            featured_image: None,
            feed_id: None,
        }
    }

    #[test]
    fn unique_slugs_pass() {
        assert!(ensure_unique_slugs(&[item("a"), item("b"), item("c")]).is_ok());
        assert!(ensure_unique_slugs(&[]).is_ok());
    }

    #[test]
    fn the_first_repeated_slug_is_reported() {
        let posts = [
            item("a"),
            item("b"),
            item("c"),
            item("b"),
            item("a"),
            item("b"),
        ];
        for _ in 0..16 {
            match ensure_unique_slugs(&posts) {
                Err(AppError::DuplicateRecords { key, count }) => {
                    assert_eq!((key.as_str(), count), ("b", 3));
                }
                other => panic!("unexpected result {:?}", other),
            }
        }
    }
}
