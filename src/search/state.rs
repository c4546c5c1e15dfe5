//! Search lifecycle states

use crate::error::MarError;
use crate::results::ResultsContext;
use tokio::time::Instant;

/// Where a search is in its create → start → poll lifecycle
#[derive(Debug)]
pub enum SearchState {
    /// The service assigned an id
    Created { search_id: String },
    /// The search was started
    Started { search_id: String },
    /// Waiting for the service to report `FINISHED`
    Polling {
        search_id: String,
        /// Status checks made so far
        polls: u32,
        /// No wait is scheduled past this instant
        deadline: Option<Instant>,
    },
    Finished(ResultsContext),
    Failed(MarError),
}

impl SearchState {
    pub fn name(&self) -> &'static str {
        match self {
            SearchState::Created { .. } => "created",
            SearchState::Started { .. } => "started",
            SearchState::Polling { .. } => "polling",
            SearchState::Finished(_) => "finished",
            SearchState::Failed(_) => "failed",
        }
    }

    pub fn search_id(&self) -> Option<&str> {
        match self {
            SearchState::Created { search_id }
            | SearchState::Started { search_id }
            | SearchState::Polling { search_id, .. } => Some(search_id),
            SearchState::Finished(ctx) => Some(ctx.search_id()),
            SearchState::Failed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names() {
        let created = SearchState::Created {
            search_id: "a".to_string(),
        };
        assert_eq!(created.name(), "created");
        assert_eq!(created.search_id(), Some("a"));

        let polling = SearchState::Polling {
            search_id: "a".to_string(),
            polls: 2,
            deadline: None,
        };
        assert_eq!(polling.name(), "polling");

        let failed = SearchState::Failed(MarError::MissingSearchId);
        assert_eq!(failed.name(), "failed");
        assert!(failed.search_id().is_none());
    }
}
