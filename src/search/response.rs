//! Interpretation of search service response envelopes

use crate::error::{MarError, Result};
use crate::transport::ResponseEnvelope;
use serde::Deserialize;
use serde_json::Value;

/// Entry of the `applicationErrorList` carried by failure bodies
#[derive(Debug, Deserialize)]
struct ApplicationError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<Value>,
}

/// Turn a response envelope into its body or the error it describes
///
/// A 2xx code passes the body through unchanged (it may be absent). For other
/// codes only the first entry of `applicationErrorList` is reported; further
/// entries are dropped.
pub fn interpret(response: ResponseEnvelope) -> Result<Option<Value>> {
    let code = match response.code {
        Some(code) if code != 0 => code,
        _ => return Err(MarError::MissingResponseCode),
    };

    if (200..300).contains(&code) {
        return Ok(response.body);
    }

    let body = match response.body {
        Some(body) => body,
        None => return Err(MarError::RemoteFailureCode { code }),
    };

    if let Some(first) = first_application_error(&body) {
        return Err(MarError::RemoteApplication {
            message: first.message.unwrap_or_default(),
            code: first.code.as_ref().and_then(code_value).unwrap_or_default(),
        });
    }

    let body = match body {
        Value::String(s) => s,
        other => other.to_string(),
    };
    Err(MarError::RemoteGeneric { body, code })
}

fn first_application_error(body: &Value) -> Option<ApplicationError> {
    body.get("applicationErrorList")?
        .as_array()?
        .first()
        .and_then(|entry| ApplicationError::deserialize(entry).ok())
}

fn code_value(code: &Value) -> Option<i64> {
    match code {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
