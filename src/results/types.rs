//! Result page type definitions

use crate::query::OUTPUT_SEPARATOR;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Item field holding the number of times an item was reported
pub const ITEM_COUNT: &str = "count";
pub const ITEM_CREATED_AT: &str = "created_at";
pub const ITEM_ID: &str = "id";
pub const ITEM_OUTPUT: &str = "output";
pub const ITEMS: &str = "items";
pub const START_INDEX: &str = "startIndex";
pub const TOTAL_ITEMS: &str = "totalItems";
pub const ITEMS_PER_PAGE: &str = "itemsPerPage";
pub const CURRENT_ITEM_COUNT: &str = "currentItemCount";

/// Default number of items per page
pub const DEFAULT_LIMIT: u64 = 20;

/// Sort order of a result page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

/// Paging, sorting and filtering of a results request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultOptions {
    /// Zero-based index of the first item
    pub offset: u64,
    /// Maximum number of items returned
    pub limit: u64,
    /// Free-text filter applied by the service
    pub text_filter: String,
    /// Field to sort on
    pub sort_by: String,
    pub sort_direction: SortDirection,
}

impl Default for ResultOptions {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
            text_filter: String::new(),
            sort_by: ITEM_COUNT.to_string(),
            sort_direction: SortDirection::Desc,
        }
    }
}

impl ResultOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn text_filter(mut self, filter: impl Into<String>) -> Self {
        self.text_filter = filter.into();
        self
    }

    /// Sort on an item field or on a `Collector|output` key
    pub fn sort_by(mut self, key: impl Into<String>) -> Self {
        self.sort_by = key.into();
        self
    }

    pub fn sort_direction(mut self, direction: SortDirection) -> Self {
        self.sort_direction = direction;
        self
    }
}

/// One page of a completed search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_index: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_items: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items_per_page: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_item_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<ResultItem>,
}

impl ResultPage {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether items exist beyond this page
    pub fn has_more(&self) -> bool {
        self.start_index + (self.items.len() as u64) < self.total_items
    }
}

/// A single result item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    /// How many times the item was reported
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    /// Values keyed by `Collector|output`
    #[serde(default, deserialize_with = "null_as_default")]
    pub output: BTreeMap<String, Value>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Treat an explicit `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Key under which an output value appears in [`ResultItem::output`]
pub fn output_key(collector: &str, output: &str) -> String {
    format!("{}{}{}", collector, OUTPUT_SEPARATOR, output)
}

impl ResultItem {
    /// Value of a collector output in this item
    pub fn output_value(&self, collector: &str, output: &str) -> Option<&Value> {
        self.output.get(&output_key(collector, output))
    }

    /// Parsed creation timestamp, if it is RFC 3339
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}
