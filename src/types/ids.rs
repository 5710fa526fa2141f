use super::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Strong typing for Notion ids with phantom markers.
///
/// The stored value is always the canonical 32-character lowercase hex form;
/// [`Id::to_dashed`] produces the hyphenated form the API expects in paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Id<T> {
    value: String,
    _phantom: PhantomData<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DatabaseMarker;

pub type PageId = Id<PageMarker>;
pub type BlockId = Id<BlockMarker>;
pub type DatabaseId = Id<DatabaseMarker>;

static URL_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:[/-])([a-fA-F0-9]{32}|[a-fA-F0-9]{8}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{12})(?:[/?#]|$)",
    )
    .expect("Notion id regex is valid")
});

impl<T> Id<T> {
    /// Parses a dashed id, an undashed id, or a Notion URL ending in an id.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            value: normalize_notion_id(input)?,
            _phantom: PhantomData,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The hyphenated UUID form used in API paths.
    pub fn to_dashed(&self) -> String {
        format!(
            "{}-{}-{}-{}-{}",
            &self.value[0..8],
            &self.value[8..12],
            &self.value[12..16],
            &self.value[16..20],
            &self.value[20..32]
        )
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(serde::de::Error::custom)
    }
}

fn normalize_notion_id(input: &str) -> Result<String, ValidationError> {
    let input = input.trim().trim_end_matches('/');

    if input.starts_with("http://") || input.starts_with("https://") {
        let id = URL_ID
            .captures(input)
            .and_then(|captures| captures.get(1))
            .ok_or_else(|| {
                ValidationError::InvalidId(format!("Could not extract ID from URL: {}", input))
            })?;
        return normalize_notion_id(id.as_str());
    }

    let normalized = input.replace('-', "");

    if normalized.len() != 32 {
        return Err(ValidationError::InvalidId(format!(
            "Invalid ID length: expected 32 characters, got {}",
            normalized.len()
        )));
    }

    if !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidId(
            "ID must contain only hexadecimal characters".to_string(),
        ));
    }

    Ok(normalized.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_parsing() {
        let id = PageId::parse("550e8400e29b41d4a716446655440000").unwrap();
        assert_eq!(id.as_str(), "550e8400e29b41d4a716446655440000");

        let id = PageId::parse("550E8400-E29B-41D4-A716-446655440000").unwrap();
        assert_eq!(id.as_str(), "550e8400e29b41d4a716446655440000");

        let id = DatabaseId::parse(
            "https://www.notion.so/team/Posts-550e8400e29b41d4a716446655440000?v=1",
        )
        .unwrap();
        assert_eq!(id.as_str(), "550e8400e29b41d4a716446655440000");
    }

    #[test]
    fn test_invalid_ids() {
        assert!(PageId::parse("too-short").is_err());
        assert!(PageId::parse("zzzz8400e29b41d4a716446655440000").is_err());
        assert!(PageId::parse("").is_err());
        assert!(PageId::parse("https://www.notion.so/no-id-here").is_err());
    }

    #[test]
    fn test_to_dashed() {
        let block = BlockId::parse("550e8400e29b41d4a716446655440000").unwrap();
        assert_eq!(block.to_dashed(), "550e8400-e29b-41d4-a716-446655440000");
    }
}
