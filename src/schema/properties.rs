// src/schema/properties.rs
//! Typed access to a Notion property bag.
//!
//! Only the properties a record type actually reads are validated; other
//! entries in the bag are ignored. A property that is read must exist and
//! carry one of the expected types.

use crate::model::{plain_text, RichText};
use crate::types::{ValidatedUrl, ValidationError};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawProperty {
    Title {
        title: Vec<RichText>,
    },
    RichText {
        rich_text: Vec<RichText>,
    },
    Number {
        number: Option<f64>,
    },
    Date {
        date: Option<RawDate>,
    },
    Url {
        url: Option<String>,
    },
    Files {
        files: Vec<RawFileSource>,
    },
    #[serde(other)]
    Unsupported,
}

impl RawProperty {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Title { .. } => "title",
            Self::RichText { .. } => "rich_text",
            Self::Number { .. } => "number",
            Self::Date { .. } => "date",
            Self::Url { .. } => "url",
            Self::Files { .. } => "files",
            Self::Unsupported => "unsupported",
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDate {
    start: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawFileUrl {
    pub url: String,
}

/// Where a file-like value is hosted: an external link or a Notion upload.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum RawFileSource {
    External { external: RawFileUrl },
    File { file: RawFileUrl },
}

impl RawFileSource {
    pub fn into_url(self) -> String {
        match self {
            Self::External { external } => external.url,
            Self::File { file } => file.url,
        }
    }
}

/// A borrowed view over `properties` that reads values by name.
pub struct Properties<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Properties<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    fn path(name: &str) -> String {
        format!("properties.{}", name)
    }

    fn get(&self, name: &str) -> Result<RawProperty, ValidationError> {
        let raw = self
            .map
            .get(name)
            .ok_or_else(|| ValidationError::schema(Self::path(name), "property is missing"))?;
        RawProperty::deserialize(raw)
            .map_err(|e| ValidationError::schema(Self::path(name), e.to_string()))
    }

    fn mismatch(name: &str, expected: &str, found: &RawProperty) -> ValidationError {
        ValidationError::schema(
            Self::path(name),
            format!("expected {} property, found {}", expected, found.type_name()),
        )
    }

    /// A title or rich-text property joined into one string; `None` when empty.
    pub fn text(&self, name: &str) -> Result<Option<String>, ValidationError> {
        let runs = match self.get(name)? {
            RawProperty::Title { title } => title,
            RawProperty::RichText { rich_text } => rich_text,
            other => return Err(Self::mismatch(name, "title or rich_text", &other)),
        };
        let joined = plain_text(&runs);
        Ok((!joined.is_empty()).then_some(joined))
    }

    /// Like [`Properties::text`] but absence of a value is a failure.
    pub fn required_text(&self, name: &str) -> Result<String, ValidationError> {
        self.text(name)?
            .ok_or_else(|| ValidationError::schema(Self::path(name), "value is required"))
    }

    pub fn number(&self, name: &str) -> Result<Option<f64>, ValidationError> {
        match self.get(name)? {
            RawProperty::Number { number } => Ok(number),
            other => Err(Self::mismatch(name, "number", &other)),
        }
    }

    /// The start of a date property, as the API wrote it.
    pub fn date(&self, name: &str) -> Result<Option<String>, ValidationError> {
        match self.get(name)? {
            RawProperty::Date { date } => Ok(date.map(|d| d.start)),
            other => Err(Self::mismatch(name, "date", &other)),
        }
    }

    pub fn url(&self, name: &str) -> Result<Option<String>, ValidationError> {
        match self.get(name)? {
            RawProperty::Url { url } => Ok(url.filter(|u| !u.is_empty())),
            other => Err(Self::mismatch(name, "url", &other)),
        }
    }

    /// An image reference stored either as a url property or as files; the
    /// first file wins.
    pub fn image(&self, name: &str) -> Result<Option<String>, ValidationError> {
        let url = match self.get(name)? {
            RawProperty::Url { url } => url.filter(|u| !u.is_empty()),
            RawProperty::Files { files } => files.into_iter().next().map(RawFileSource::into_url),
            other => return Err(Self::mismatch(name, "url or files", &other)),
        };
        // Validated, but handed back exactly as stored.
        url.map(|u| match ValidatedUrl::parse(&u) {
            Ok(_) => Ok(u),
            Err(e) => Err(e.nested(&Self::path(name))),
        })
        .transpose()
    }
}
