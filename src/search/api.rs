//! Remote operations of the search API

use super::models::{SearchRequest, SearchStatus, STATUS_FINISHED};
use super::response::interpret;
use crate::error::{MarError, Result, TransportError};
use crate::metrics::{ClientMetrics, Operation};
use crate::results::{ResultOptions, ResultPage};
use crate::transport::{RequestEnvelope, Transport};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Capability to issue search API calls over a shared transport
///
/// Cloning is cheap; clones share the transport and metrics.
#[derive(Clone)]
pub(crate) struct SearchApi {
    transport: Arc<dyn Transport>,
    topic: Arc<str>,
    metrics: Arc<ClientMetrics>,
}

impl SearchApi {
    pub fn new(transport: Arc<dyn Transport>, topic: &str, metrics: Arc<ClientMetrics>) -> Self {
        Self {
            transport,
            topic: Arc::from(topic),
            metrics,
        }
    }

    /// Same transport and metrics, different topic
    pub fn with_topic(&self, topic: &str) -> Self {
        Self::new(self.transport.clone(), topic, self.metrics.clone())
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn metrics(&self) -> &Arc<ClientMetrics> {
        &self.metrics
    }

    /// Send one request and interpret the response envelope
    async fn invoke(&self, operation: Operation, request: RequestEnvelope) -> Result<Option<Value>> {
        debug!(
            "Sending {} {:?} {} to {}",
            operation, request.method, request.target, self.topic
        );
        let start = Instant::now();

        let result = match self.transport.request(&self.topic, request).await {
            Ok(response) => interpret(response),
            Err(e) => Err(MarError::Transport(e)),
        };

        let elapsed = start.elapsed().as_millis() as u64;
        self.metrics.record_call(operation, elapsed, result.is_ok());
        if let Err(ref e) = result {
            warn!("{} request failed: {}", operation, e);
        }
        result
    }

    /// POST /v1/simple, returning the new search id
    pub async fn create(&self, request: &SearchRequest) -> Result<String> {
        let envelope = RequestEnvelope::post("/v1/simple").json(encode(request)?);

        let body = self.invoke(Operation::Create, envelope).await?;
        body.as_ref()
            .and_then(|b| b.get("id"))
            .and_then(id_string)
            .ok_or(MarError::MissingSearchId)
    }

    /// PUT /v1/{id}/start
    pub async fn start(&self, search_id: &str) -> Result<()> {
        let envelope = RequestEnvelope::put(format!("/v1/{}/start", search_id));
        self.invoke(Operation::Start, envelope).await?;
        Ok(())
    }

    /// GET /v1/{id}/status
    pub async fn status(&self, search_id: &str) -> Result<SearchStatus> {
        let envelope = RequestEnvelope::get(format!("/v1/{}/status", search_id));
        let body = match self.invoke(Operation::Status, envelope).await? {
            Some(body) => body,
            None => return Ok(SearchStatus::default()),
        };
        if !body.is_object() {
            return Err(MarError::InvalidResponse(format!(
                "expected a status object, got {}",
                body
            )));
        }

        // Counts are only meaningful once the search has finished
        let status = body.get("status").and_then(Value::as_str);
        if status == Some(STATUS_FINISHED) {
            decode(body)
        } else {
            Ok(SearchStatus::pending(status.map(str::to_string)))
        }
    }

    /// GET /v1/{id}/results
    pub async fn results(&self, search_id: &str, options: &ResultOptions) -> Result<ResultPage> {
        let envelope = RequestEnvelope::get(format!("/v1/{}/results", search_id))
            .param("$offset", options.offset)
            .param("$limit", options.limit)
            .param("filter", options.text_filter.as_str())
            .param("sortBy", options.sort_by.as_str())
            .param("sortDirection", options.sort_direction.as_str());

        match self.invoke(Operation::Results, envelope).await? {
            Some(body) => decode(body),
            None => Err(MarError::MissingResultBody),
        }
    }
}

/// Non-empty id, accepting numeric ids as well
fn id_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Request bodies that fail to encode are a codec failure, not a bad reply
fn encode<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| MarError::Transport(TransportError::Codec(e)))
}

fn decode<T: DeserializeOwned>(body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|e| MarError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::{ok, ScriptedTransport};
    use serde_json::json;
    use std::collections::HashMap;

    fn api(body: Value) -> SearchApi {
        let transport = Arc::new(ScriptedTransport::new(move |_, _| Ok(ok(body.clone()))));
        SearchApi::new(transport, crate::DEFAULT_TOPIC, Arc::new(ClientMetrics::new()))
    }

    #[test]
    fn test_encode_failure_is_codec_error() {
        let mut unencodable = HashMap::new();
        unencodable.insert((1, 2), "tuple keys are not JSON object keys");

        let err = encode(&unencodable).unwrap_err();
        assert!(matches!(err, MarError::Transport(TransportError::Codec(_))));
    }

    #[tokio::test]
    async fn test_pending_status_ignores_counts() {
        let status = api(json!({"status": "RUNNING", "results": "many", "hosts": null}))
            .status("s1")
            .await
            .unwrap();
        assert_eq!(status, SearchStatus::pending(Some("RUNNING".to_string())));
    }

    #[tokio::test]
    async fn test_status_must_be_an_object() {
        let err = api(json!(["FINISHED"])).status("s1").await.unwrap_err();
        assert!(matches!(err, MarError::InvalidResponse(_)));

        let err = api(json!({"status": "FINISHED", "results": "many"}))
            .status("s1")
            .await
            .unwrap_err();
        assert!(matches!(err, MarError::InvalidResponse(_)));
    }
}
