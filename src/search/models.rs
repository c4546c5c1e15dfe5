//! Search request and status models

use crate::query::{Condition, Projection};
use crate::results::null_as_default;
use serde::{Deserialize, Serialize};

/// Status reported by the service once a search has completed
pub const STATUS_FINISHED: &str = "FINISHED";

/// Body of a "create search" request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub projections: Vec<Projection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl SearchRequest {
    pub fn new(projections: Vec<Projection>, condition: Option<Condition>) -> Self {
        Self {
            projections,
            condition,
        }
    }

    /// Add a projection
    pub fn project(mut self, projection: Projection) -> Self {
        self.projections.push(projection);
        self
    }

    /// Set the condition; an empty condition is omitted from the request
    pub fn filter(mut self, condition: Condition) -> Self {
        self.condition = if condition.is_empty() {
            None
        } else {
            Some(condition)
        };
        self
    }
}

/// Body of a "status" response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hosts: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subscribed_hosts: u64,
}

impl SearchStatus {
    /// Status without counts, used until the search reports `FINISHED`
    pub fn pending(status: Option<String>) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status.as_deref() == Some(STATUS_FINISHED)
    }
}
