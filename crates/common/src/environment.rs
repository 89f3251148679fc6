//! Binance environment configuration.
//!
//! Production endpoints vary by top-level domain (`api.binance.com`,
//! `api.binance.us`, ...). The testnet has a single fixed host.

use std::fmt;
use std::str::FromStr;

/// Top-level domain used when none is configured.
const DEFAULT_TLD: &str = "com";

/// Binance environment (production or testnet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinanceEnvironment {
    /// Production environment (real money) on the given top-level domain.
    Production {
        /// Top-level domain, e.g. `com` or `us`.
        tld: String,
    },
    /// Testnet environment (fake money for testing).
    Testnet,
}

impl Default for BinanceEnvironment {
    fn default() -> Self {
        Self::production(DEFAULT_TLD)
    }
}

impl BinanceEnvironment {
    /// Production environment on a specific top-level domain.
    pub fn production(tld: &str) -> Self {
        let tld = tld.trim().trim_start_matches('.').to_lowercase();
        Self::Production {
            tld: if tld.is_empty() {
                DEFAULT_TLD.to_string()
            } else {
                tld
            },
        }
    }

    /// REST API base URL.
    pub fn rest_base_url(&self) -> String {
        match self {
            Self::Production { tld } => format!("https://api.binance.{}", tld),
            Self::Testnet => "https://testnet.binance.vision".to_string(),
        }
    }

    /// Returns true if this is the production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production { .. })
    }

    /// Load environment from `BINANCE_ENVIRONMENT` and `BINANCE_TLD`.
    ///
    /// Falls back to production on `com` when unset or invalid. The TLD only
    /// applies to production.
    pub fn from_env() -> Self {
        let env = match std::env::var("BINANCE_ENVIRONMENT") {
            Ok(value) => value.parse().unwrap_or_else(|e: ParseEnvironmentError| {
                tracing::warn!(error = %e, "Invalid BINANCE_ENVIRONMENT, using production");
                Self::default()
            }),
            Err(_) => Self::default(),
        };

        match (env, std::env::var("BINANCE_TLD").ok()) {
            (Self::Production { .. }, Some(tld)) => Self::production(&tld),
            (env, _) => env,
        }
    }
}

impl fmt::Display for BinanceEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production { tld } => write!(f, "production (binance.{})", tld),
            Self::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for BinanceEnvironment {
    type Err = ParseEnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" | "mainnet" | "main" => Ok(Self::default()),
            "testnet" | "test" | "sandbox" => Ok(Self::Testnet),
            _ => Err(ParseEnvironmentError(s.to_string())),
        }
    }
}

/// Error parsing environment string.
#[derive(Debug, Clone)]
pub struct ParseEnvironmentError(String);

impl fmt::Display for ParseEnvironmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid environment '{}', expected 'production' or 'testnet'",
            self.0
        )
    }
}

impl std::error::Error for ParseEnvironmentError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_production_com() {
        let env = BinanceEnvironment::default();
        assert!(env.is_production());
        assert_eq!(env.rest_base_url(), "https://api.binance.com");
    }

    #[test]
    fn test_production_tld() {
        let env = BinanceEnvironment::production("us");
        assert_eq!(env.rest_base_url(), "https://api.binance.us");

        let env = BinanceEnvironment::production(".US ");
        assert_eq!(env.rest_base_url(), "https://api.binance.us");

        let env = BinanceEnvironment::production("");
        assert_eq!(env.rest_base_url(), "https://api.binance.com");
    }

    #[test]
    fn test_testnet_url() {
        let env = BinanceEnvironment::Testnet;
        assert_eq!(env.rest_base_url(), "https://testnet.binance.vision");
        assert!(!env.is_production());
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "MAINNET".parse::<BinanceEnvironment>().unwrap(),
            BinanceEnvironment::default()
        );
        assert_eq!(
            "sandbox".parse::<BinanceEnvironment>().unwrap(),
            BinanceEnvironment::Testnet
        );
        assert!("staging".parse::<BinanceEnvironment>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            BinanceEnvironment::production("us").to_string(),
            "production (binance.us)"
        );
        assert_eq!(BinanceEnvironment::Testnet.to_string(), "testnet");
    }
}
