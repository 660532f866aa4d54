use crate::domain::errors::{ServiceError, ServiceResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

const MAX_ERROR_BODY_CHARS: usize = 500;

/// Body of a successful response, classified the way the dashboard needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// 204 No Content
    Empty,
    /// Raw body text, known to be valid JSON. Kept as text so object key
    /// order survives decoding.
    Json(String),
    /// Success status with a body that is not JSON
    Text(String),
}

impl Payload {
    pub fn json<T: DeserializeOwned>(&self) -> ServiceResult<T> {
        match self {
            Payload::Json(raw) => serde_json::from_str(raw)
                .map_err(|e| ServiceError::Decode(format!("Invalid response body: {}", e))),
            Payload::Text(text) => Err(ServiceError::Decode(format!(
                "Expected JSON, got text: {}",
                truncate(text)
            ))),
            Payload::Empty => Err(ServiceError::Decode("Empty response body".to_string())),
        }
    }
}

/// Classify a response by status and body.
///
/// - 204 is success without payload.
/// - Non-success with a JSON body surfaces `detail`, `message` or `error`.
/// - Non-success with any other body surfaces the raw text, or
///   `HTTP error! status: N` when there is nothing to show.
/// - Success with a non-JSON body is a plain-text success, not an error.
pub fn decode_response(status: u16, body: &str) -> ServiceResult<Payload> {
    if status == 204 {
        return Ok(Payload::Empty);
    }

    let success = (200..300).contains(&status);

    match serde_json::from_str::<Value>(body) {
        Ok(json) => {
            if success {
                Ok(Payload::Json(body.to_string()))
            } else {
                let message = error_message(&json)
                    .unwrap_or_else(|| format!("HTTP error! status: {}", status));
                Err(ServiceError::Status { status, message })
            }
        }
        Err(_) => {
            if success {
                Ok(Payload::Text(body.to_string()))
            } else {
                let message = if body.trim().is_empty() {
                    format!("HTTP error! status: {}", status)
                } else {
                    truncate(body)
                };
                Err(ServiceError::Status { status, message })
            }
        }
    }
}

fn error_message(json: &Value) -> Option<String> {
    ["detail", "message", "error"]
        .iter()
        .find_map(|field| match json.get(*field) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        })
}

fn truncate(text: &str) -> String {
    if text.chars().count() > MAX_ERROR_BODY_CHARS {
        text.chars().take(MAX_ERROR_BODY_CHARS).collect()
    } else {
        text.to_string()
    }
}
