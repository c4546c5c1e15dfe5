//! HTTP networking module
//!
//! Provides a [`Transport`](crate::transport::Transport) that reaches the
//! message fabric through an HTTP gateway.

mod client;

pub use client::{HttpTransport, MESSAGE_ID_HEADER};
