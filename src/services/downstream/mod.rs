//! Downstream adapter access
//!
//! Every adapter in the platform answers plain HTTP with JSON: raw payloads on
//! success, `{status, message, data}` envelopes on failure. This module turns
//! both into a single tagged result so orchestrators pattern-match instead of
//! probing the payload shape.
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::models::ServiceResponse;

pub mod http;

pub use http::HttpDownstream;

pub type FetchResult = Result<Value, ServiceError>;

/// Query parameters for one downstream call
pub type Params = Vec<(&'static str, String)>;

/// Retry and timeout policy applied to every downstream call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Total attempts, first try included. Values below 1 behave as 1.
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub timeout: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Failure of a single downstream call
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ServiceError {
    /// Connection failures or timeouts on every attempt
    #[error("Service temporarily unavailable")]
    Unavailable { attempts: u32 },

    /// The adapter answered with an error envelope
    #[error("{message}")]
    Reported {
        status: StatusCode,
        message: String,
        data: Option<Value>,
    },

    /// The payload could not be parsed or lacks an expected key
    #[error("Malformed downstream payload: {0}")]
    Malformed(String),
}

impl ServiceError {
    /// Envelope sent to our own caller when this error is passed through
    pub fn to_response(&self) -> ServiceResponse {
        match self {
            ServiceError::Unavailable { .. } => {
                ServiceResponse::unavailable("Service temporarily unavailable")
            }
            ServiceError::Reported {
                status,
                message,
                data,
            } => ServiceResponse::new(*status, message.clone(), data.clone()),
            ServiceError::Malformed(_) => ServiceResponse::unavailable(self.to_string()),
        }
    }
}

/// Uniform access to the adapter services
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Downstream: Send + Sync {
    /// GET `url` with query parameters
    async fn get(&self, url: &str, params: Params) -> FetchResult;

    /// PUT a JSON body to `url` with query parameters
    async fn put(&self, url: &str, params: Params, body: Value) -> FetchResult;
}

/// Loose reading of an adapter error body
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
}

impl ErrorBody {
    fn message_or(&self, fallback: impl FnOnce() -> String) -> String {
        self.message
            .clone()
            .or_else(|| match &self.detail {
                Some(Value::String(detail)) => Some(detail.clone()),
                _ => None,
            })
            .unwrap_or_else(fallback)
    }

    /// Falsy payloads are dropped the way the adapters drop them
    fn data(self) -> Option<Value> {
        self.data.filter(|data| match data {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            Value::Array(items) => !items.is_empty(),
            _ => true,
        })
    }
}

fn is_error_discriminator(status: Option<&str>) -> bool {
    matches!(status, Some("error") | Some("fail"))
}

/// Classifies a completed HTTP exchange
///
/// 2xx bodies are returned as parsed JSON unless they carry an error
/// discriminator; 4xx/5xx bodies become `Reported` with the original status.
pub fn classify(status: StatusCode, body: &[u8]) -> FetchResult {
    if status.is_success() {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ServiceError::Malformed(format!("invalid JSON body: {}", e)))?;

        if is_error_discriminator(value.get("status").and_then(Value::as_str)) {
            let envelope: ErrorBody = serde_json::from_value(value).unwrap_or_default();
            let reported = envelope
                .code
                .and_then(|code| StatusCode::from_u16(code).ok())
                .filter(|code| code.as_u16() >= 400)
                .unwrap_or(StatusCode::BAD_GATEWAY);
            return Err(ServiceError::Reported {
                status: reported,
                message: envelope.message_or(|| "Downstream reported an error".to_string()),
                data: envelope.data(),
            });
        }

        return Ok(value);
    }

    let envelope: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    let status = if status.as_u16() >= 400 {
        status
    } else {
        StatusCode::BAD_GATEWAY
    };
    tracing::debug!(
        status = %status,
        envelope_status = ?envelope.status,
        "Downstream returned error status"
    );

    Err(ServiceError::Reported {
        status,
        message: envelope.message_or(|| format!("HTTP error {}", status)),
        data: envelope.data(),
    })
}

/// Looks up a JSON pointer, treating absence as a malformed payload
pub fn require<'a>(value: &'a Value, pointer: &str) -> Result<&'a Value, ServiceError> {
    value
        .pointer(pointer)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ServiceError::Malformed(format!("missing '{}'", pointer)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_success_returns_body() {
        let body = br#"{"Title": "Inception", "Year": "2010"}"#;
        let value = classify(StatusCode::OK, body).unwrap();
        assert_eq!(value["Title"], "Inception");
    }

    #[test]
    fn test_classify_no_content_is_null() {
        assert_eq!(classify(StatusCode::NO_CONTENT, b"").unwrap(), Value::Null);
    }

    #[test]
    fn test_classify_success_with_error_envelope() {
        let body = br#"{"status": "error", "code": 404, "message": "Movie not found"}"#;
        let err = classify(StatusCode::OK, body).unwrap_err();
        assert_eq!(
            err,
            ServiceError::Reported {
                status: StatusCode::NOT_FOUND,
                message: "Movie not found".to_string(),
                data: None,
            }
        );
    }

    #[test]
    fn test_classify_fail_discriminator_without_code() {
        let body = br#"{"status": "fail", "message": "Incorrect IMDb ID."}"#;
        match classify(StatusCode::OK, body).unwrap_err() {
            ServiceError::Reported { status, message, .. } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(message, "Incorrect IMDb ID.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_classify_success_envelope_passes() {
        let body = br#"{"status": "success", "data": {"genres": []}}"#;
        let value = classify(StatusCode::OK, body).unwrap();
        assert_eq!(value["data"]["genres"], json!([]));
    }

    #[test]
    fn test_classify_invalid_json_is_malformed() {
        let err = classify(StatusCode::OK, b"<html>").unwrap_err();
        assert!(matches!(err, ServiceError::Malformed(_)));
    }

    #[test]
    fn test_classify_error_status_preserves_envelope() {
        let body = br#"{"status": "error", "message": "User not found", "data": {"id": "42"}}"#;
        let err = classify(StatusCode::NOT_FOUND, body).unwrap_err();
        assert_eq!(
            err,
            ServiceError::Reported {
                status: StatusCode::NOT_FOUND,
                message: "User not found".to_string(),
                data: Some(json!({"id": "42"})),
            }
        );
    }

    #[test]
    fn test_classify_error_status_uses_detail() {
        let body = br#"{"detail": "Not Found"}"#;
        let err = classify(StatusCode::NOT_FOUND, body).unwrap_err();
        assert_eq!(err.to_string(), "Not Found");
    }

    #[test]
    fn test_classify_error_status_without_body() {
        let err = classify(StatusCode::INTERNAL_SERVER_ERROR, b"boom").unwrap_err();
        assert_eq!(err.to_string(), "HTTP error 500 Internal Server Error");
    }

    #[test]
    fn test_error_drops_empty_data() {
        let body = br#"{"status": "error", "message": "bad", "data": {}}"#;
        match classify(StatusCode::BAD_REQUEST, body).unwrap_err() {
            ServiceError::Reported { data, .. } => assert_eq!(data, None),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_to_response_unavailable() {
        let response = ServiceError::Unavailable { attempts: 3 }.to_response();
        assert_eq!(response.code, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.body.message, "Service temporarily unavailable");
    }

    #[test]
    fn test_to_response_reported_passes_status() {
        let response = ServiceError::Reported {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "Invalid language".to_string(),
            data: Some(json!({"field": "language"})),
        }
        .to_response();
        assert_eq!(response.code, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.body.message, "Invalid language");
        assert_eq!(response.body.data, Some(json!({"field": "language"})));
        assert_eq!(response.body.status, crate::models::ResponseStatus::Error);
    }

    #[test]
    fn test_require_pointer() {
        let value = json!({"data": {"movie_list": [1, 2]}, "empty": null});
        assert_eq!(require(&value, "/data/movie_list").unwrap(), &json!([1, 2]));
        assert!(matches!(
            require(&value, "/data/genres"),
            Err(ServiceError::Malformed(_))
        ));
        assert!(require(&value, "/empty").is_err());
    }
}
