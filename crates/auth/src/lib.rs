//! Authentication and signing for the exchange REST API.
//!
//! - **Secure Credentials**: the API secret lives in a `SecretString`, so it never
//!   shows up in `Debug` output and is zeroed on drop.
//! - **HMAC-SHA256 Signing**: builds the signed query strings Binance expects for
//!   `USER_DATA` and `TRADE` endpoints.
//!
//! ```rust,ignore
//! use auth::{ApiCredentials, RequestSigner};
//!
//! let credentials = ApiCredentials::from_env()?;
//! let signer = RequestSigner::new(&credentials);
//! let query = signer.signed_query(&[("symbol", "ETHBTC".to_string())], timestamp_ms)?;
//! ```

mod credentials;
mod error;
mod signer;

pub use credentials::ApiCredentials;
pub use error::AuthError;
pub use signer::RequestSigner;
