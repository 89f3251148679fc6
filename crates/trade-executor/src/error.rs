//! Trade executor error types.

use std::fmt;
use std::time::Duration;

use execution_core::{Coin, ExchangeError, ExchangeRuleError, OrderStatus};
use rust_decimal::Decimal;
use thiserror::Error;

/// Polling phase that can time out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// Waiting for a placed order to appear in order queries.
    Visibility,
    /// Waiting for the order to reach `FILLED`.
    Fill,
    /// Waiting for the origin balance to drop after a sell.
    BalanceSettlement,
}

impl fmt::Display for PollPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visibility => f.write_str("visibility"),
            Self::Fill => f.write_str("fill"),
            Self::BalanceSettlement => f.write_str("balance settlement"),
        }
    }
}

/// Ways a single trade attempt can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TradeError {
    /// The symbol's lot-size rule could not be interpreted.
    #[error("malformed exchange rule: {0}")]
    MalformedExchangeRule(#[from] ExchangeRuleError),

    /// A balance, ticker or symbol-info read failed.
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    /// The account does not list a coin the trade needs.
    #[error("no {0} balance in account")]
    MissingBalance(Coin),

    /// The ticker snapshot has no price for the pair.
    #[error("no ticker price for {0}")]
    MissingPrice(String),

    #[error("invalid price {price} for {symbol}")]
    InvalidPrice { symbol: String, price: Decimal },

    /// The available balance rounds down to nothing.
    #[error("order quantity for {symbol} rounds down to zero")]
    ZeroQuantity { symbol: String },

    /// The exchange refused every placement.
    #[error("order submission failed after {attempts} attempts: {last}")]
    SubmissionFailed { attempts: u32, last: ExchangeError },

    /// The order was accepted but not confirmed in time. It may still be
    /// live on the exchange.
    #[error("{phase} polling for order {order_id} timed out after {waited:?}")]
    PollTimeout {
        phase: PollPhase,
        order_id: u64,
        waited: Duration,
    },

    /// The order reached a terminal state other than `FILLED`.
    #[error("order {order_id} closed with status {status} before filling")]
    OrderClosed { order_id: u64, status: OrderStatus },

    #[error("trade cancelled")]
    Cancelled,
}

impl TradeError {
    /// Errors that must not start another attempt: another attempt cannot
    /// fix them, or an order from this attempt may still be live.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MalformedExchangeRule(_) | Self::PollTimeout { .. } | Self::Cancelled
        )
    }

    /// ID of an accepted order whose outcome is unknown.
    pub fn live_order_id(&self) -> Option<u64> {
        match self {
            Self::PollTimeout { order_id, .. } => Some(*order_id),
            _ => None,
        }
    }
}

/// A trade that did not reach a confirmed fill.
///
/// Unless [`RetryExhausted::live_order_id`] returns an ID, no order from any
/// attempt is left open on the exchange.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("trade not confirmed after {attempts} attempt(s): {last_error}")]
pub struct RetryExhausted {
    /// Attempts actually made.
    pub attempts: u32,
    pub first_error: TradeError,
    #[source]
    pub last_error: TradeError,
}

impl RetryExhausted {
    /// True if the retry loop stopped early on a fatal error.
    pub fn aborted(&self) -> bool {
        self.last_error.is_fatal()
    }

    /// Order accepted by the last attempt whose outcome is unknown.
    pub fn live_order_id(&self) -> Option<u64> {
        self.last_error.live_order_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(TradeError::Cancelled.is_fatal());
        assert!(
            TradeError::MalformedExchangeRule(ExchangeRuleError::MalformedStepSize("x".into()))
                .is_fatal()
        );

        assert!(!TradeError::Exchange(ExchangeError::unexpected("timeout")).is_fatal());
        assert!(!TradeError::OrderClosed {
            order_id: 7,
            status: OrderStatus::Canceled,
        }
        .is_fatal());
    }

    #[test]
    fn test_timeout_after_submission_is_fatal() {
        for phase in [
            PollPhase::Visibility,
            PollPhase::Fill,
            PollPhase::BalanceSettlement,
        ] {
            let err = TradeError::PollTimeout {
                phase,
                order_id: 42,
                waited: Duration::from_secs(60),
            };
            assert!(err.is_fatal(), "{phase}");
            assert_eq!(err.live_order_id(), Some(42));
        }
        assert_eq!(TradeError::Cancelled.live_order_id(), None);
    }

    #[test]
    fn test_display() {
        let err = TradeError::PollTimeout {
            phase: PollPhase::BalanceSettlement,
            order_id: 1001,
            waited: Duration::from_secs(300),
        };
        assert_eq!(
            err.to_string(),
            "balance settlement polling for order 1001 timed out after 300s"
        );

        let exhausted = RetryExhausted {
            attempts: 20,
            first_error: TradeError::Cancelled,
            last_error: TradeError::MissingPrice("ETHBTC".into()),
        };
        assert_eq!(
            exhausted.to_string(),
            "trade not confirmed after 20 attempt(s): no ticker price for ETHBTC"
        );
        assert!(!exhausted.aborted());
    }
}
