//! Generic REST client infrastructure.
//!
//! A thin wrapper around `reqwest` with:
//!
//! - Consistent error handling via `RestError`
//! - GET and POST with optional query string and API-key header
//! - JSON response deserialization
//! - Rate limit detection (`429`/`418` with `Retry-After`)

mod client;
mod error;

pub use client::RestClient;
pub use error::RestError;
