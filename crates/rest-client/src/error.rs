//! REST client error types.

use thiserror::Error;

/// Errors that can occur during REST API calls.
#[derive(Debug, Error)]
pub enum RestError {
    /// Non-success HTTP status. `body` is kept verbatim so callers can decode
    /// exchange-specific error payloads.
    #[error("HTTP error: {status} - {body}")]
    HttpError {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Request timed out.
    #[error("Request timeout")]
    Timeout,

    /// Connection error (network issue).
    #[error("Connection error: {0}")]
    Connection(String),

    /// Failed to parse response body as JSON.
    #[error("JSON parse error: {0}")]
    Parse(String),

    /// Rate limited (or IP banned) by the server.
    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited {
        /// Suggested wait time before retrying.
        retry_after_ms: u64,
    },

    /// Failed to build the HTTP client or request.
    #[error("Request build error: {0}")]
    RequestBuild(String),
}

impl RestError {
    /// Transport-level failures worth another try.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RestError::Timeout | RestError::Connection(_) | RestError::RateLimited { .. }
        ) || matches!(self, RestError::HttpError { status, .. } if *status >= 500)
    }
}

impl From<reqwest::Error> for RestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RestError::Timeout
        } else if err.is_decode() {
            RestError::Parse(err.to_string())
        } else if err.is_builder() {
            RestError::RequestBuild(err.to_string())
        } else {
            RestError::Connection(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(RestError::Timeout.is_retryable());
        assert!(RestError::Connection("reset".into()).is_retryable());
        assert!(RestError::RateLimited { retry_after_ms: 1000 }.is_retryable());
        assert!(RestError::HttpError { status: 503, body: String::new() }.is_retryable());

        assert!(!RestError::HttpError { status: 400, body: String::new() }.is_retryable());
        assert!(!RestError::Parse("eof".into()).is_retryable());
    }
}
