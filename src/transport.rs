//! HTTP transport port
//!
//! Adapters never talk to `reqwest` directly: they go through the
//! [`HttpTransport`] trait, which hands back a status code plus raw body.
//! This keeps the translation layer testable against a scripted transport
//! and keeps retry/pooling/TLS policy out of the core entirely.

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::error::{Error, Result};

// =============================================================================
// Wire Types
// =============================================================================

/// Request body shapes the backends use.
#[derive(Debug, Clone)]
pub enum Payload {
    /// JSON document (`application/json`)
    Json(Value),
    /// Raw body with an explicit content type (e.g. TOSCA YAML, form data)
    Raw {
        content_type: &'static str,
        body: String,
    },
}

/// Raw backend response: status code plus body bytes.
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl WireResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Body as text, lossy.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Best-effort human-readable error detail: the backend's `message`
    /// field when the body is a JSON object, the raw text otherwise.
    pub fn error_detail(&self) -> String {
        if let Ok(value) = serde_json::from_slice::<Value>(&self.body) {
            if let Some(message) = value.get("message").and_then(Value::as_str) {
                return message.to_string();
            }
        }
        let text = self.text();
        if text.is_empty() {
            "no detail provided".to_string()
        } else {
            text
        }
    }
}

/// Transport-level failures, pre-classified for status translation.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        // Timeouts and connection failures map to ServiceUnavailable,
        // same as a backend 503.
        Error::ServiceUnavailable(err.to_string())
    }
}

// =============================================================================
// Transport Port
// =============================================================================

/// Port for performing a single HTTP round trip.
///
/// Implementations must be safe for concurrent use; adapters hold them
/// behind `Arc` and keep no call-scoped state of their own.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn request(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
        body: Option<Payload>,
    ) -> std::result::Result<WireResponse, TransportError>;
}

pub type TransportRef = Arc<dyn HttpTransport>;

// =============================================================================
// Reqwest Transport
// =============================================================================

/// Production transport backed by a shared `reqwest` client.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("camara-adapters/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(15))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn request(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
        body: Option<Payload>,
    ) -> std::result::Result<WireResponse, TransportError> {
        let mut request = self
            .client
            .request(method.clone(), url)
            .header("accept", "application/json");

        for (name, value) in headers {
            request = request.header(name, value);
        }

        request = match body {
            Some(Payload::Json(value)) => request.json(&value),
            Some(Payload::Raw { content_type, body }) => {
                request.header("content-type", content_type).body(body)
            }
            None => request,
        };

        debug!("{} {}", method, url);

        let response = request.send().await.map_err(classify_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(classify_reqwest_error)?
            .to_vec();

        Ok(WireResponse { status, body })
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else {
        TransportError::Connect(err.to_string())
    }
}

// =============================================================================
// Status Helpers
// =============================================================================

/// Require a 2xx response, translating any failure status through the
/// canonical table.
pub fn error_for_status(response: WireResponse, context: &str) -> Result<WireResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(Error::from_status(
            response.status,
            format!("{}: {}", context, response.error_detail()),
        ))
    }
}

/// Require one exact status (some dialects signal success with a specific
/// code, e.g. 201 for onboarding, 202 for deployment). A different success
/// code is still a platform error, named with both codes.
pub fn expect_status(response: WireResponse, expected: u16, context: &str) -> Result<WireResponse> {
    if response.status == expected {
        return Ok(response);
    }
    if response.is_success() {
        return Err(Error::PlatformError {
            status: Some(response.status),
            message: format!(
                "{}: expected status {}, got {}",
                context, expected, response.status
            ),
        });
    }
    Err(Error::from_status(
        response.status,
        format!("{}: {}", context, response.error_detail()),
    ))
}

// =============================================================================
// Scripted Transport (test support)
// =============================================================================


#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_error_detail_prefers_message_field() {
        let response = WireResponse {
            status: 400,
            body: serde_json::to_vec(&json!({"message": "bad zone", "detail": {}})).unwrap(),
        };
        assert_eq!(response.error_detail(), "bad zone");

        let plain = WireResponse {
            status: 500,
            body: b"boom".to_vec(),
        };
        assert_eq!(plain.error_detail(), "boom");
    }

    #[test]
    fn test_transport_errors_map_to_service_unavailable() {
        let err: Error = TransportError::Timeout("15s".into()).into();
        assert_matches!(err, Error::ServiceUnavailable(_));
        let err: Error = TransportError::Connect("refused".into()).into();
        assert_matches!(err, Error::ServiceUnavailable(_));
    }

    #[test]
    fn test_expect_status_flags_unexpected_success() {
        let response = WireResponse {
            status: 200,
            body: Vec::new(),
        };
        let err = expect_status(response, 201, "onboard").unwrap_err();
        assert_matches!(
            err,
            Error::PlatformError {
                status: Some(200),
                ..
            }
        );
    }
}
