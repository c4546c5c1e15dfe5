//! Error types for the search client

use std::time::Duration;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, MarError>;

/// Failure of the underlying fabric call itself
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP request to the gateway could not be completed
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The gateway answered with a non-success HTTP status
    #[error("gateway returned HTTP {status}")]
    Gateway { status: u16 },
    /// The envelope could not be encoded or the reply decoded
    #[error("payload codec error: {0}")]
    Codec(#[from] serde_json::Error),
    /// Any other transport-level failure (connection down, auth, timeout)
    #[error("{0}")]
    Unavailable(String),
}

/// Every failure a search or page fetch can surface to its caller
#[derive(Debug, Error)]
pub enum MarError {
    #[error("Error: {0}")]
    Transport(#[from] TransportError),

    #[error("Error: unable to find response code")]
    MissingResponseCode,

    /// First entry of the remote `applicationErrorList`
    #[error("{message}: {code}")]
    RemoteApplication { message: String, code: i64 },

    /// Non-success code with a body carrying no error list
    #[error("{body}: {code}")]
    RemoteGeneric { body: String, code: i64 },

    #[error("Error: Received failure response code: {code}")]
    RemoteFailureCode { code: i64 },

    #[error("Error: Did not find id in create search response")]
    MissingSearchId,

    #[error("Unable to find 'body' in search result")]
    MissingResultBody,

    #[error("Poll interval must be greater than or equal to {minimum:?} (got {requested:?})")]
    InvalidPollInterval {
        requested: Duration,
        minimum: Duration,
    },

    #[error("Search {search_id} did not finish after {polls} status checks")]
    Timeout { search_id: String, polls: u32 },

    #[error("Search cancelled")]
    Cancelled,

    /// A success body that does not have the expected shape
    #[error("Invalid response body: {0}")]
    InvalidResponse(String),

    #[error("Invalid settings: {0}")]
    Settings(String),
}

impl MarError {
    /// Whether the remote service (rather than the client or transport) reported the failure
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            MarError::RemoteApplication { .. }
                | MarError::RemoteGeneric { .. }
                | MarError::RemoteFailureCode { .. }
        )
    }

    /// Status code attached to a remote failure, if any
    pub fn remote_code(&self) -> Option<i64> {
        match self {
            MarError::RemoteGeneric { code, .. } | MarError::RemoteFailureCode { code } => {
                Some(*code)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_remote_format() {
        let err = MarError::RemoteApplication {
            message: "Invalid projection".to_string(),
            code: 7,
        };
        assert_eq!(err.to_string(), "Invalid projection: 7");

        let err = MarError::RemoteFailureCode { code: 500 };
        assert_eq!(
            err.to_string(),
            "Error: Received failure response code: 500"
        );
    }

    #[test]
    fn test_remote_classification() {
        assert!(MarError::RemoteFailureCode { code: 503 }.is_remote());
        assert_eq!(
            MarError::RemoteGeneric {
                body: "\"nope\"".to_string(),
                code: 400
            }
            .remote_code(),
            Some(400)
        );
        assert!(!MarError::MissingSearchId.is_remote());
        assert!(!MarError::Transport(TransportError::Unavailable("down".into())).is_remote());
    }
}
