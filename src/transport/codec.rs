//! JSON payload codec for fabric messages

use super::{RequestEnvelope, ResponseEnvelope};
use crate::error::TransportError;

/// Encode a request envelope as a message payload
pub fn encode_request(request: &RequestEnvelope) -> Result<Vec<u8>, TransportError> {
    Ok(serde_json::to_vec(request)?)
}

/// Decode a response message payload
///
/// An empty payload decodes to an envelope with neither code nor body, which
/// the client reports as a missing response code.
pub fn decode_response(payload: &[u8]) -> Result<ResponseEnvelope, TransportError> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(ResponseEnvelope::default());
    }
    Ok(serde_json::from_slice(payload)?)
}
