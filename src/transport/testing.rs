//! Scripted transport for unit tests

use super::{RequestEnvelope, ResponseEnvelope, Transport};
use crate::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use tokio::time::Instant;

type Handler =
    Box<dyn Fn(&RequestEnvelope, usize) -> Result<ResponseEnvelope, TransportError> + Send + Sync>;

/// A request observed by [`ScriptedTransport`]
#[derive(Debug, Clone)]
pub struct Recorded {
    pub topic: String,
    pub request: RequestEnvelope,
    pub at: Instant,
}

/// Answers each request through a handler and records what was sent
pub struct ScriptedTransport {
    handler: Handler,
    calls: Mutex<Vec<Recorded>>,
}

impl ScriptedTransport {
    /// The handler receives the request and the number of earlier calls to the same target
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&RequestEnvelope, usize) -> Result<ResponseEnvelope, TransportError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Standard lifecycle: create returns `search_id`, start succeeds, and status
    /// reports `FINISHED` with `status_body` once `pending_polls` checks have passed
    pub fn lifecycle(search_id: &str, pending_polls: usize, status_body: Value) -> Self {
        let id = search_id.to_string();
        Self::new(move |request, seen| {
            let target = request.target.as_str();
            if target == "/v1/simple" {
                Ok(ok(serde_json::json!({ "id": id })))
            } else if target.ends_with("/start") {
                Ok(ok(serde_json::json!({})))
            } else if target.ends_with("/status") {
                if seen < pending_polls {
                    Ok(ok(serde_json::json!({ "status": "RUNNING" })))
                } else {
                    let mut body = status_body.clone();
                    body["status"] = "FINISHED".into();
                    Ok(ok(body))
                }
            } else {
                Ok(ResponseEnvelope::new(404))
            }
        })
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    pub fn targets(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|c| c.request.target)
            .collect()
    }

    pub fn calls_to(&self, suffix: &str) -> Vec<Recorded> {
        self.calls()
            .into_iter()
            .filter(|c| c.request.target.ends_with(suffix))
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn request(
        &self,
        topic: &str,
        request: RequestEnvelope,
    ) -> Result<ResponseEnvelope, TransportError> {
        let seen = {
            let mut calls = self.calls.lock().unwrap();
            let seen = calls
                .iter()
                .filter(|c| c.request.target == request.target)
                .count();
            calls.push(Recorded {
                topic: topic.to_string(),
                request: request.clone(),
                at: Instant::now(),
            });
            seen
        };
        (self.handler)(&request, seen)
    }
}

/// 200 response carrying `body`
pub fn ok(body: Value) -> ResponseEnvelope {
    ResponseEnvelope::new(200).with_body(body)
}
