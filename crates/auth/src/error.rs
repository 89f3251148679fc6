use thiserror::Error;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// A credential is present but empty.
    #[error("Empty credential: {0}")]
    EmptyCredential(&'static str),

    /// The secret key cannot be used as an HMAC key.
    #[error("Invalid secret key")]
    InvalidSecretKey,
}
