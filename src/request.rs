//! Typed HTTP request helper: one call, one deadline, classified errors.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ClientConfig;

/// Status code used for client-side deadline expiry. Reserved so callers can
/// tell a local timeout apart from anything the server actually sent.
pub const TIMEOUT_STATUS: u16 = 408;

/// A server-classified failure: the backend replied, and the reply was not a
/// success. Also produced locally with [`TIMEOUT_STATUS`] when a deadline
/// elapses before any reply arrives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("HTTP {status}: {message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn timed_out(deadline: Deadline) -> Self {
        Self {
            status: TIMEOUT_STATUS,
            message: format!("request timed out after {:?}", deadline.duration()),
        }
    }

    /// True when this error is the client-side timeout sentinel rather than
    /// a status the server reported.
    pub fn is_timeout(&self) -> bool {
        self.status == TIMEOUT_STATUS
    }
}

/// Everything that can go wrong with one request.
///
/// `Api` covers both server-rejected requests and local deadline expiry;
/// `Transport` and `Decode` are generic failures that carry no HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error(transparent)]
    Api(#[from] ApiError),
    /// No usable HTTP response at all (DNS, refused connection, reset).
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    /// A 2xx reply whose body was not the expected JSON shape.
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl RequestError {
    /// The classified `ApiError`, if this failure carries one.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            RequestError::Api(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.as_api().is_some_and(ApiError::is_timeout)
    }
}

/// How long one request may take, end to end: connect, send, and body read
/// all count against the same clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Duration);

impl Deadline {
    pub const fn new(duration: Duration) -> Self {
        Self(duration)
    }

    pub const fn duration(self) -> Duration {
        self.0
    }
}

impl From<Duration> for Deadline {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

/// FastAPI-style structured error body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Extract the human-readable detail from a non-2xx reply body, falling back
/// to the transport status phrase.
fn error_detail(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .map(|e| e.detail)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        })
}

/// Owns the HTTP connection pool and the base URL. Stateless across calls;
/// any number of requests may be in flight concurrently.
#[derive(Debug, Clone)]
pub struct Backend {
    client: reqwest::Client,
    base_url: String,
}

impl Backend {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and parse the reply as `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        deadline: Deadline,
    ) -> Result<T, RequestError> {
        self.request(Method::GET, path, None::<&()>, deadline).await
    }

    /// POST `body` as JSON to `path` and parse the reply as `T`.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        deadline: Deadline,
    ) -> Result<T, RequestError> {
        self.request(Method::POST, path, Some(body), deadline).await
    }

    /// Issue one request under `deadline`.
    ///
    /// - 2xx with body → parsed as `T`.
    /// - 204 → `T` decoded from the empty JSON object (no body read).
    /// - non-2xx → `RequestError::Api` with the detail field when present.
    /// - deadline elapsed → `RequestError::Api` with the timeout sentinel.
    /// - no response at all → `RequestError::Transport`.
    pub async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        deadline: Deadline,
    ) -> Result<T, RequestError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, deadline = ?deadline.duration(), "issuing request");

        let mut builder = self.client.request(method, &url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let call = async {
            let response = builder.send().await?;
            let status = response.status();

            if status == StatusCode::NO_CONTENT {
                return Ok(serde_json::from_value(serde_json::Value::Object(
                    serde_json::Map::new(),
                ))?);
            }

            let bytes = response.bytes().await?;
            if status.is_success() {
                Ok(serde_json::from_slice(&bytes)?)
            } else {
                let detail = error_detail(status, &bytes);
                warn!(status = status.as_u16(), %url, %detail, "request rejected");
                Err(RequestError::Api(ApiError::new(status.as_u16(), detail)))
            }
        };

        match tokio::time::timeout(deadline.duration(), call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%url, deadline = ?deadline.duration(), "request deadline elapsed");
                Err(RequestError::Api(ApiError::timed_out(deadline)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_error_uses_reserved_status() {
        let err = ApiError::timed_out(Deadline::new(Duration::from_millis(50)));
        assert_eq!(err.status, TIMEOUT_STATUS);
        assert!(err.is_timeout());
        assert!(err.message.contains("timed out"));
    }

    #[test]
    fn test_server_error_is_not_timeout() {
        let err = ApiError::new(500, "boom");
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_request_error_as_api() {
        let err = RequestError::Api(ApiError::new(401, "expired"));
        assert_eq!(err.as_api().map(|e| e.status), Some(401));
    }

    #[test]
    fn test_request_error_decode_is_not_api() {
        let inner = serde_json::from_str::<u32>("not json").unwrap_err();
        let err = RequestError::Decode(inner);
        assert!(err.as_api().is_none());
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_error_detail_prefers_structured_body() {
        let detail = error_detail(
            StatusCode::INTERNAL_SERVER_ERROR,
            br#"{"detail":"orchestration failed"}"#,
        );
        assert_eq!(detail, "orchestration failed");
    }

    #[test]
    fn test_error_detail_falls_back_to_status_phrase() {
        let detail = error_detail(StatusCode::INTERNAL_SERVER_ERROR, b"<html>oops</html>");
        assert_eq!(detail, "Internal Server Error");
    }

    #[test]
    fn test_error_detail_empty_body() {
        let detail = error_detail(StatusCode::UNAUTHORIZED, b"");
        assert_eq!(detail, "Unauthorized");
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::new(401, "session expired");
        assert_eq!(err.to_string(), "HTTP 401: session expired");
    }

    #[test]
    fn test_deadline_from_duration() {
        let deadline: Deadline = Duration::from_millis(250).into();
        assert_eq!(deadline.duration(), Duration::from_millis(250));
    }
}
