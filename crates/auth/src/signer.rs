//! HMAC-SHA256 request signing for Binance `SIGNED` endpoints.

use crate::credentials::ApiCredentials;
use crate::error::AuthError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Default `recvWindow` sent with signed requests, in milliseconds.
pub const DEFAULT_RECV_WINDOW_MS: u64 = 5_000;

/// Signs query strings with the account secret.
pub struct RequestSigner<'a> {
    credentials: &'a ApiCredentials,
    recv_window_ms: u64,
}

impl<'a> RequestSigner<'a> {
    pub fn new(credentials: &'a ApiCredentials) -> Self {
        Self {
            credentials,
            recv_window_ms: DEFAULT_RECV_WINDOW_MS,
        }
    }

    /// Override the `recvWindow` parameter.
    pub fn with_recv_window(mut self, recv_window_ms: u64) -> Self {
        self.recv_window_ms = recv_window_ms;
        self
    }

    /// Lowercase hex HMAC-SHA256 of `message`.
    pub fn sign(&self, message: &str) -> Result<String, AuthError> {
        let mut mac = HmacSha256::new_from_slice(self.credentials.expose_secret().as_bytes())
            .map_err(|_| AuthError::InvalidSecretKey)?;

        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Build `k=v&...&recvWindow=..&timestamp=..&signature=..`.
    ///
    /// Parameter order is preserved; the signature covers exactly the bytes
    /// that precede it.
    pub fn signed_query(
        &self,
        params: &[(&str, String)],
        timestamp_ms: i64,
    ) -> Result<String, AuthError> {
        let mut query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>();
        query.push(format!("recvWindow={}", self.recv_window_ms));
        query.push(format!("timestamp={}", timestamp_ms));

        let query = query.join("&");
        let signature = self.sign(&query)?;
        Ok(format!("{}&signature={}", query, signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(secret: &str) -> ApiCredentials {
        ApiCredentials::new("key".into(), secret.into()).unwrap()
    }

    #[test]
    fn test_sign_known_vector() {
        // Example from the Binance spot API documentation.
        let creds = creds("NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j");
        let signer = RequestSigner::new(&creds);

        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";

        assert_eq!(
            signer.sign(query).unwrap(),
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_signed_query_matches_known_vector() {
        let creds = creds("NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j");
        let signer = RequestSigner::new(&creds);

        let params = [
            ("symbol", "LTCBTC".to_string()),
            ("side", "BUY".to_string()),
            ("type", "LIMIT".to_string()),
            ("timeInForce", "GTC".to_string()),
            ("quantity", "1".to_string()),
            ("price", "0.1".to_string()),
        ];
        let query = signer.signed_query(&params, 1499827319559).unwrap();

        assert!(query.starts_with("symbol=LTCBTC&side=BUY&type=LIMIT"));
        assert!(query.ends_with(
            "&recvWindow=5000&timestamp=1499827319559&signature=c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        ));
    }

    #[test]
    fn test_custom_recv_window() {
        let creds = creds("secret");
        let signer = RequestSigner::new(&creds).with_recv_window(10_000);

        let query = signer.signed_query(&[], 42).unwrap();
        assert!(query.starts_with("recvWindow=10000&timestamp=42&signature="));
    }
}
