// src/cache/keys.rs
//! Cache keys. Each is a deterministic function of one query's parameters.

use crate::constants::CACHE_KEY_HASH_LENGTH;
use crate::model::{MediaCategory, SortDirection};
use crate::types::BlockId;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

static UNSAFE_KEY_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]").expect("key sanitizer regex is valid"));

/// Makes a key safe to use as a file name.
pub fn sanitize(key: &str) -> String {
    UNSAFE_KEY_CHARS.replace_all(key, "_").into_owned()
}

pub fn post_key(slug: &str, include_navigation: bool, include_blocks: bool) -> String {
    format!(
        "{}-nav-{}-blocks-{}",
        slug, include_navigation, include_blocks
    )
}

pub fn posts_key(sort: SortDirection) -> String {
    format!("all-{}", sort.as_api_str())
}

pub fn media_key(category: MediaCategory) -> String {
    category.as_str().to_string()
}

pub fn blocks_key(block_id: &BlockId) -> String {
    block_id.as_str().to_string()
}

/// A fixed-length key for a set of ids: order and duplicates do not matter.
pub fn ids_key(ids: &[String]) -> String {
    let mut sorted: Vec<&str> = ids.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();

    let digest = Sha256::digest(sorted.join(",").as_bytes());
    let hex = hex::encode(digest);
    format!("ids-{}", &hex[..CACHE_KEY_HASH_LENGTH])
}
