//! Binance REST API error types.

use auth::AuthError;
use execution_core::ExchangeError;
use rest_client::RestError;
use thiserror::Error;

/// Code Binance uses for "too many requests".
const RATE_LIMIT_CODE: i32 = -1003;

/// Errors that can occur when interacting with the Binance REST API.
#[derive(Debug, Error)]
pub enum BinanceRestError {
    /// REST client error (network, timeout, etc.).
    #[error("REST client error: {0}")]
    Rest(RestError),

    /// Authentication error.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Binance API error (returned by the exchange).
    #[error("Binance API error {code}: {message}")]
    ApiError {
        /// Binance error code.
        code: i32,
        /// Error message.
        message: String,
    },

    /// Order parameters refused by a symbol filter or precision rule.
    #[error("Invalid order ({code}): {message}")]
    InvalidOrder { code: i32, message: String },

    /// Order not found.
    #[error("Order not found ({code}): {message}")]
    OrderNotFound { code: i32, message: String },

    /// Insufficient balance for the order.
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// Too many requests or IP ban.
    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// The exchange does not list the requested symbol.
    #[error("Unknown symbol {0}")]
    SymbolNotFound(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<RestError> for BinanceRestError {
    /// Decode Binance's `{"code": .., "msg": ..}` payloads out of HTTP errors.
    fn from(err: RestError) -> Self {
        match err {
            RestError::HttpError { status, body } => Self::from_api_response(status, &body),
            RestError::RateLimited { retry_after_ms } => Self::RateLimited { retry_after_ms },
            other => Self::Rest(other),
        }
    }
}

impl BinanceRestError {
    /// Parse a Binance API error response.
    ///
    /// Binance returns errors in the format: `{"code": -1000, "msg": "..."}`.
    /// Bodies in any other shape keep the raw HTTP error.
    pub fn from_api_response(status: u16, body: &str) -> Self {
        #[derive(serde::Deserialize)]
        struct ApiError {
            code: i32,
            msg: String,
        }

        match serde_json::from_str::<ApiError>(body) {
            Ok(err) => Self::classify_api_error(err.code, err.msg),
            Err(_) => Self::Rest(RestError::HttpError {
                status,
                body: body.to_string(),
            }),
        }
    }

    /// Classify a Binance API error code into a more specific error.
    fn classify_api_error(code: i32, message: String) -> Self {
        match code {
            -2010 => Self::InsufficientBalance(message),
            -2011 | -2013 => Self::OrderNotFound { code, message },
            -1013 | -1100 | -1102 | -1106 | -1111 | -1115 | -1116 | -1117 => {
                Self::InvalidOrder { code, message }
            }
            _ => Self::ApiError { code, message },
        }
    }

    /// The exchange error code, when the exchange produced one.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::ApiError { code, .. }
            | Self::InvalidOrder { code, .. }
            | Self::OrderNotFound { code, .. } => Some(*code),
            Self::InsufficientBalance(_) => Some(-2010),
            Self::RateLimited { .. } => Some(RATE_LIMIT_CODE),
            _ => None,
        }
    }

    /// Check if this error indicates the operation should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Rest(rest_err) => rest_err.is_retryable(),
            Self::RateLimited { .. } => true,
            Self::ApiError { code, .. } => {
                // Binance server errors are often retryable
                matches!(code, -1000 | -1001 | -1003 | -1015 | -1016 | -1021)
            }
            _ => false,
        }
    }
}

impl From<BinanceRestError> for ExchangeError {
    /// Errors the exchange itself reported become `Rejected`; transport,
    /// parsing and signing failures become `Unexpected`.
    fn from(err: BinanceRestError) -> Self {
        match err.code() {
            Some(code) => ExchangeError::rejected(code, err.to_string()),
            None => ExchangeError::unexpected(err.to_string()),
        }
    }
}
