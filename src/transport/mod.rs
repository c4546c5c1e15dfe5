//! Message fabric transport
//!
//! The client never talks to the fabric directly. Every remote call goes through
//! a [`Transport`], which sends one request envelope to a topic and delivers
//! either a transport failure or the response envelope.

pub mod codec;
mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use traits::*;
