//! Search orchestration module
//!
//! Drives a search through create, start and status polling until the
//! service reports it finished, then hands out a [`ResultsContext`].
//!
//! [`ResultsContext`]: crate::results::ResultsContext

pub(crate) mod api;
mod client;
mod models;
pub mod response;
mod state;

pub use client::MarClient;
pub use models::*;
pub use state::SearchState;
