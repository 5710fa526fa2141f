// src/api/query.rs
//! Database query bodies: server-side filters and sorts.

use chrono::NaiveDate;
use serde_json::{json, Map, Value};

use crate::model::SortDirection;

/// A filter condition on a single property.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    StatusEquals(String),
    MultiSelectContains(String),
    RichTextEquals(String),
    TitleIsNotEmpty,
    NumberIsNotEmpty,
    DateOnOrBefore(NaiveDate),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Property { name: String, condition: Condition },
}

impl Filter {
    pub fn property(name: &str, condition: Condition) -> Self {
        Filter::Property {
            name: name.to_string(),
            condition,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Filter::And(filters) => {
                json!({ "and": filters.iter().map(Filter::to_json).collect::<Vec<_>>() })
            }
            Filter::Property { name, condition } => {
                let (kind, test) = match condition {
                    Condition::StatusEquals(v) => ("status", json!({ "equals": v })),
                    Condition::MultiSelectContains(v) => {
                        ("multi_select", json!({ "contains": v }))
                    }
                    Condition::RichTextEquals(v) => ("rich_text", json!({ "equals": v })),
                    Condition::TitleIsNotEmpty => ("title", json!({ "is_not_empty": true })),
                    Condition::NumberIsNotEmpty => ("number", json!({ "is_not_empty": true })),
                    Condition::DateOnOrBefore(d) => (
                        "date",
                        json!({ "on_or_before": d.format("%Y-%m-%d").to_string() }),
                    ),
                };
                let mut object = Map::new();
                object.insert("property".to_string(), json!(name));
                object.insert(kind.to_string(), test);
                Value::Object(object)
            }
        }
    }

    /// The value a text property is required to equal, if this filter pins one.
    pub fn text_equality(&self, property: &str) -> Option<&str> {
        match self {
            Filter::And(filters) => filters.iter().find_map(|f| f.text_equality(property)),
            Filter::Property {
                name,
                condition: Condition::RichTextEquals(value),
            } if name == property => Some(value.as_str()),
            Filter::Property { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub property: String,
    pub direction: SortDirection,
}

/// The body of `POST /databases/{id}/query`, minus pagination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseQuery {
    pub filter: Option<Filter>,
    pub sorts: Vec<Sort>,
}

impl DatabaseQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sort(mut self, property: &str, direction: SortDirection) -> Self {
        self.sorts.push(Sort {
            property: property.to_string(),
            direction,
        });
        self
    }

    pub fn to_body(&self, page_size: usize, cursor: Option<&str>) -> Value {
        let mut body = json!({ "page_size": page_size });
        if let Some(filter) = &self.filter {
            body["filter"] = filter.to_json();
        }
        if !self.sorts.is_empty() {
            body["sorts"] = self
                .sorts
                .iter()
                .map(|s| json!({ "property": s.property, "direction": s.direction.as_api_str() }))
                .collect();
        }
        if let Some(cursor) = cursor {
            body["start_cursor"] = json!(cursor);
        }
        body
    }
}
