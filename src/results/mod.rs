//! Result retrieval for completed searches
//!
//! A [`ResultsContext`] is handed out once a search has finished. Pages are
//! fetched from it with offset, limit, sort and text filter parameters.

mod context;
mod types;

pub use context::ResultsContext;
pub use types::*;
pub(crate) use types::null_as_default;
