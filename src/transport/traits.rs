//! Transport trait and envelope types

use crate::error::TransportError;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Method of the remote search API operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
}

/// Request sent to the search service topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// API path, e.g. `/v1/simple`
    pub target: String,
    pub method: Method,
    /// Query parameters
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Request body (`{}` when the operation takes none)
    #[serde(default = "empty_object")]
    pub body: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl RequestEnvelope {
    fn new(target: impl Into<String>, method: Method) -> Self {
        Self {
            target: target.into(),
            method,
            parameters: Map::new(),
            body: empty_object(),
        }
    }

    /// Create a GET request
    pub fn get(target: impl Into<String>) -> Self {
        Self::new(target, Method::Get)
    }

    /// Create a POST request
    pub fn post(target: impl Into<String>) -> Self {
        Self::new(target, Method::Post)
    }

    /// Create a PUT request
    pub fn put(target: impl Into<String>) -> Self {
        Self::new(target, Method::Put)
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Set the JSON body
    pub fn json(mut self, body: Value) -> Self {
        self.body = body;
        self
    }
}

/// Response delivered by the fabric
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// HTTP-style status code reported by the service
    #[serde(default)]
    pub code: Option<i64>,
    /// Response body; JSON `null` is treated as absent
    #[serde(default, deserialize_with = "non_null")]
    pub body: Option<Value>,
}

fn non_null<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        value => Some(value),
    })
}

impl ResponseEnvelope {
    pub fn new(code: i64) -> Self {
        Self {
            code: Some(code),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Check if the code is in the success range (2xx)
    pub fn is_success(&self) -> bool {
        matches!(self.code, Some(code) if (200..300).contains(&code))
    }
}

/// Capability to deliver a request to a fabric topic
///
/// Implementations must allow several requests to be outstanding at once;
/// independent searches share a single transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` to `topic` and wait for the matching response
    async fn request(
        &self,
        topic: &str,
        request: RequestEnvelope,
    ) -> Result<ResponseEnvelope, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_envelope_wire_format() {
        let request = RequestEnvelope::get("/v1/abc/results")
            .param("$offset", 0)
            .param("sortDirection", "desc");

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "target": "/v1/abc/results",
                "method": "GET",
                "parameters": {"$offset": 0, "sortDirection": "desc"},
                "body": {}
            })
        );
    }

    #[test]
    fn test_response_envelope_null_body() {
        let response: ResponseEnvelope =
            serde_json::from_value(json!({"code": 200, "body": null})).unwrap();
        assert_eq!(response.code, Some(200));
        assert!(response.body.is_none());

        let response: ResponseEnvelope = serde_json::from_value(json!({})).unwrap();
        assert!(response.code.is_none());
        assert!(!response.is_success());
    }

    #[test]
    fn test_success_range() {
        assert!(ResponseEnvelope::new(200).is_success());
        assert!(ResponseEnvelope::new(299).is_success());
        assert!(!ResponseEnvelope::new(300).is_success());
        assert!(!ResponseEnvelope::new(199).is_success());
    }
}
