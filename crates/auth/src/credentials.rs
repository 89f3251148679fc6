//! API credential management.

use crate::error::AuthError;
use secrecy::{ExposeSecret, SecretString};

/// Environment variable holding the public API key.
pub const API_KEY_VAR: &str = "BINANCE_API_KEY";
/// Environment variable holding the secret key.
pub const SECRET_KEY_VAR: &str = "BINANCE_SECRET_KEY";

/// API credentials for authenticated requests.
#[derive(Clone)]
pub struct ApiCredentials {
    api_key: String,
    secret_key: SecretString,
}

impl ApiCredentials {
    /// Load credentials from `BINANCE_API_KEY` and `BINANCE_SECRET_KEY`.
    ///
    /// A `.env` file in the working directory is read first if present.
    ///
    /// # Errors
    /// `AuthError::MissingEnvVar` if a variable is unset,
    /// `AuthError::EmptyCredential` if it is set but blank.
    pub fn from_env() -> Result<Self, AuthError> {
        dotenvy::dotenv().ok();

        let api_key = read_var(API_KEY_VAR)?;
        let secret_key = read_var(SECRET_KEY_VAR)?;

        Self::new(api_key, secret_key)
    }

    /// Create credentials from explicit values.
    pub fn new(api_key: String, secret_key: String) -> Result<Self, AuthError> {
        if api_key.trim().is_empty() {
            return Err(AuthError::EmptyCredential("api key"));
        }
        if secret_key.trim().is_empty() {
            return Err(AuthError::EmptyCredential("secret key"));
        }

        Ok(Self {
            api_key,
            secret_key: SecretString::from(secret_key),
        })
    }

    /// Get the API key (public, safe to log).
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Expose the secret key for signing only.
    pub(crate) fn expose_secret(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

fn read_var(name: &str) -> Result<String, AuthError> {
    std::env::var(name).map_err(|_| AuthError::MissingEnvVar(name.to_string()))
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let creds = ApiCredentials::new("my_api_key".into(), "super_secret_key".into()).unwrap();
        let debug_str = format!("{:?}", creds);

        assert!(debug_str.contains("my_api_key"));
        assert!(!debug_str.contains("super_secret_key"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_blank_credentials_rejected() {
        assert!(matches!(
            ApiCredentials::new("  ".into(), "secret".into()),
            Err(AuthError::EmptyCredential("api key"))
        ));
        assert!(matches!(
            ApiCredentials::new("key".into(), "".into()),
            Err(AuthError::EmptyCredential("secret key"))
        ));
    }
}
