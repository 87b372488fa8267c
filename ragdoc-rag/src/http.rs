//! Shared HTTP plumbing for the REST-backed gateways.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{FailureKind, RagError, Result};

/// Build a client whose every request fails after `timeout`.
pub(crate) fn client_with_timeout(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("ragdoc/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| RagError::ConfigError(format!("failed to build HTTP client: {e}")))
}

/// A failed HTTP exchange, before it is attributed to a service.
#[derive(Debug)]
pub(crate) struct HttpFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl HttpFailure {
    fn from_reqwest(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() { FailureKind::Timeout } else { FailureKind::Transport };
        Self { kind, message: format!("request failed: {e}") }
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Send a request and decode a JSON body of type `T`.
///
/// Transport errors, timeouts, non-success statuses, and bodies that do not
/// match `T` each map to their own [`FailureKind`].
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> std::result::Result<T, HttpFailure> {
    let response = request.send().await.map_err(HttpFailure::from_reqwest)?;
    let status = response.status();
    let body = response.text().await.map_err(HttpFailure::from_reqwest)?;

    if !status.is_success() {
        let detail =
            serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);
        return Err(HttpFailure {
            kind: FailureKind::Status(status.as_u16()),
            message: format!("API returned {status}: {detail}"),
        });
    }

    serde_json::from_str(&body).map_err(|e| HttpFailure {
        kind: FailureKind::MalformedResponse,
        message: format!("failed to parse response: {e}"),
    })
}
