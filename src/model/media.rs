use crate::types::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which media shelf an item belongs to. Each category lives in its own database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Books,
    Albums,
    Podcasts,
}

impl MediaCategory {
    pub const ALL: [MediaCategory; 3] = [Self::Books, Self::Albums, Self::Podcasts];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Books => "books",
            Self::Albums => "albums",
            Self::Podcasts => "podcasts",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "books" => Ok(Self::Books),
            "albums" => Ok(Self::Albums),
            "podcasts" => Ok(Self::Podcasts),
            other => Err(ValidationError::schema(
                "category",
                format!("unknown media category '{}'", other),
            )),
        }
    }
}

/// A book, album or podcast with its Apple catalogue id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub name: String,
    pub apple_id: u64,
    pub date: NaiveDate,
}

impl MediaItem {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::EmptyField("id"));
        }
        if self.name.is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }
        if self.apple_id == 0 {
            return Err(ValidationError::schema("appleId", "must be positive"));
        }
        Ok(())
    }
}
