// src/schema/records.rs
//! Database rows (Notion pages) into posts and media items.

use super::properties::Properties;
use crate::constants::{media_properties, post_properties};
use crate::model::{has_date_prefix, MediaItem, Post, PostListItem};
use crate::types::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
struct RawRecord {
    id: String,
    last_edited_time: Option<DateTime<Utc>>,
    properties: Map<String, Value>,
}

fn record(raw: &Value) -> Result<RawRecord, ValidationError> {
    let record =
        RawRecord::deserialize(raw).map_err(|e| ValidationError::schema("", e.to_string()))?;
    if record.id.is_empty() {
        return Err(ValidationError::EmptyField("id"));
    }
    Ok(record)
}

fn list_item(id: String, props: &Properties<'_>) -> Result<PostListItem, ValidationError> {
    let first_published = props
        .date(post_properties::FIRST_PUBLISHED)?
        .ok_or_else(|| {
            ValidationError::schema(
                format!("properties.{}", post_properties::FIRST_PUBLISHED),
                "value is required",
            )
        })?;
    if !has_date_prefix(&first_published) {
        return Err(ValidationError::schema(
            format!("properties.{}", post_properties::FIRST_PUBLISHED),
            format!("'{}' does not start with YYYY-MM-DD", first_published),
        ));
    }

    let item = PostListItem {
        id,
        slug: props.required_text(post_properties::SLUG)?,
        title: props.required_text(post_properties::TITLE)?,
        description: props.text(post_properties::DESCRIPTION)?,
        first_published,
        featured_image: props.image(post_properties::FEATURED_IMAGE)?,
        feed_id: props.text(post_properties::FEED_ID)?,
    };
    item.validate()?;
    Ok(item)
}

pub fn parse_post_list_item(raw: &Value) -> Result<PostListItem, ValidationError> {
    let record = record(raw)?;
    list_item(record.id, &Properties::new(&record.properties))
}

/// A post without blocks or navigation; the caller attaches those.
pub fn parse_post(raw: &Value) -> Result<Post, ValidationError> {
    let record = record(raw)?;
    let last_edited_time = record
        .last_edited_time
        .ok_or_else(|| ValidationError::schema("last_edited_time", "value is required"))?;
    let item = list_item(record.id, &Properties::new(&record.properties))?;
    Ok(Post::new(item, last_edited_time))
}

pub fn parse_media_item(raw: &Value) -> Result<MediaItem, ValidationError> {
    let record = record(raw)?;
    let props = Properties::new(&record.properties);

    let apple_id_path = format!("properties.{}", media_properties::APPLE_ID);
    let apple_id = props
        .number(media_properties::APPLE_ID)?
        .ok_or_else(|| ValidationError::schema(apple_id_path.as_str(), "value is required"))?;
    if !(apple_id.is_finite() && apple_id >= 1.0 && apple_id.fract() == 0.0) {
        return Err(ValidationError::schema(
            apple_id_path,
            format!("{} is not a positive integer", apple_id),
        ));
    }

    let date_path = format!("properties.{}", media_properties::DATE);
    let date = props
        .date(media_properties::DATE)?
        .ok_or_else(|| ValidationError::schema(date_path.as_str(), "value is required"))?;
    let date = date
        .get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .ok_or_else(|| ValidationError::schema(date_path, format!("'{}' is not a date", date)))?;

    let item = MediaItem {
        id: record.id,
        name: props.required_text(media_properties::NAME)?,
        apple_id: apple_id as u64,
        date,
    };
    item.validate()?;
    Ok(item)
}
