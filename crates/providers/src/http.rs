//! HTTP plumbing shared by the network adapters.

use agentflow_core::ProviderError;
use reqwest::header::RETRY_AFTER;
use std::time::Duration;
use tracing::warn;

const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Build the HTTP client used by an adapter.
pub(crate) fn client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Pass 2xx responses through, turn everything else into a [`ProviderError`].
pub(crate) async fn ensure_success(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    let body = response.text().await.unwrap_or_default();

    warn!(provider, status = status.as_u16(), body = %body, "Provider returned error");
    Err(status_error(status.as_u16(), &body, retry_after))
}

/// Map a non-success status and body to the error taxonomy.
pub(crate) fn status_error(status: u16, body: &str, retry_after_secs: u64) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited { retry_after_secs },
        401 | 403 => ProviderError::AuthenticationFailed(error_message(body)),
        _ => ProviderError::ApiError {
            status_code: status,
            message: error_message(body),
        },
    }
}

/// Pull a human-readable message out of an error body.
///
/// Tries `error.message`, then `message`, then the raw body.
pub fn error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let nested = json
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str());
        let flat = json.get("message").and_then(|m| m.as_str());
        if let Some(msg) = nested.or(flat).filter(|m| !m.trim().is_empty()) {
            return msg.to_string();
        }
    }

    let raw = body.trim();
    if raw.is_empty() {
        "Unknown error".into()
    } else {
        raw.to_string()
    }
}

/// Convert a transport failure.
pub(crate) fn network_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_error_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(error_message(body), "Incorrect API key provided");
    }

    #[test]
    fn flat_error_message() {
        assert_eq!(error_message(r#"{"message":"quota exceeded"}"#), "quota exceeded");
    }

    #[test]
    fn raw_body_and_unknown() {
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message("  "), "Unknown error");
        assert_eq!(error_message(r#"{"detail":"x"}"#), r#"{"detail":"x"}"#);
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            status_error(429, "", 7),
            ProviderError::RateLimited { retry_after_secs: 7 }
        ));
        assert!(matches!(status_error(403, "", 5), ProviderError::AuthenticationFailed(_)));
        match status_error(500, r#"{"error":{"message":"boom"}}"#, 5) {
            ProviderError::ApiError { status_code, message } => {
                assert_eq!(status_code, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
