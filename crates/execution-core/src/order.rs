//! Order snapshots and status enums.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Convert from Binance string representation.
    pub fn from_binance_str(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(Self::Buy),
            "SELL" => Some(Self::Sell),
            _ => None,
        }
    }

    /// Convert to Binance string representation.
    pub fn as_binance_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

/// Order type. Only the two types this executor places are modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub fn from_binance_str(s: &str) -> Option<Self> {
        match s {
            "MARKET" => Some(Self::Market),
            "LIMIT" => Some(Self::Limit),
            _ => None,
        }
    }

    pub fn as_binance_str(&self) -> &'static str {
        match self {
            Self::Market => "MARKET",
            Self::Limit => "LIMIT",
        }
    }
}

/// Order status as reported by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Order acknowledged by exchange.
    New,
    /// Order partially filled.
    PartiallyFilled,
    /// Order completely filled.
    Filled,
    /// Order canceled.
    Canceled,
    /// Order pending cancellation.
    PendingCancel,
    /// Order rejected by exchange.
    Rejected,
    /// Order expired (time in force or self-trade prevention).
    Expired,
}

impl OrderStatus {
    /// Convert from Binance string representation.
    pub fn from_binance_str(s: &str) -> Option<Self> {
        match s {
            "NEW" => Some(Self::New),
            "PARTIALLY_FILLED" => Some(Self::PartiallyFilled),
            "FILLED" => Some(Self::Filled),
            "CANCELED" => Some(Self::Canceled),
            "PENDING_CANCEL" => Some(Self::PendingCancel),
            "REJECTED" => Some(Self::Rejected),
            "EXPIRED" | "EXPIRED_IN_MATCH" => Some(Self::Expired),
            _ => None,
        }
    }

    pub fn as_binance_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::PartiallyFilled => "PARTIALLY_FILLED",
            Self::Filled => "FILLED",
            Self::Canceled => "CANCELED",
            Self::PendingCancel => "PENDING_CANCEL",
            Self::Rejected => "REJECTED",
            Self::Expired => "EXPIRED",
        }
    }

    /// Check if this is a terminal status (order is done).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Canceled | Self::Rejected | Self::Expired
        )
    }

    /// Terminal without a complete fill: the order will never fill.
    pub fn is_closed_unfilled(&self) -> bool {
        self.is_terminal() && *self != Self::Filled
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_binance_str())
    }
}

/// Snapshot of an exchange order.
///
/// Never mutated locally; a fresher view is obtained by querying the exchange
/// again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Exchange-assigned order ID.
    pub order_id: u64,
    /// Trading pair symbol (e.g., "ETHBTC").
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub status: OrderStatus,
    /// Requested quantity.
    pub quantity: Decimal,
    /// Limit price (None for market orders).
    pub price: Option<Decimal>,
    /// Quantity filled so far.
    pub executed_qty: Decimal,
    /// Quote-currency amount filled so far.
    pub cumulative_quote_qty: Decimal,
    /// Exchange timestamp of the last update.
    pub updated_at_ms: i64,
}

impl Order {
    /// Check if the order is completely filled.
    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }

    /// Calculate remaining quantity to be filled.
    pub fn remaining_qty(&self) -> Decimal {
        self.quantity - self.executed_qty
    }
}
