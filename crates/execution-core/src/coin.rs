//! Coins and trade intents.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A tradable asset identified by its ticker symbol (e.g. `ETH`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coin {
    symbol: String,
}

impl Coin {
    /// Create a coin; the symbol is normalized to uppercase.
    pub fn new(symbol: impl AsRef<str>) -> Self {
        Self {
            symbol: symbol.as_ref().trim().to_uppercase(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// Direction of a trade from the point of view of the origin coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    /// Acquire the origin coin, paying with the target coin.
    Buy,
    /// Dispose of the origin coin, receiving the target coin.
    Sell,
}

impl TradeSide {
    /// Parse a command-line style side (`buy` / `sell`, any case).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "buy" => Some(Self::Buy),
            "sell" => Some(Self::Sell),
            _ => None,
        }
    }

    pub fn is_sell(&self) -> bool {
        matches!(self, Self::Sell)
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("BUY"),
            Self::Sell => f.write_str("SELL"),
        }
    }
}

/// One trade decision: convert between `origin` and `target` on the
/// `origin + target` market.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeIntent {
    pub origin: Coin,
    pub target: Coin,
    pub side: TradeSide,
}

impl TradeIntent {
    pub fn new(origin: Coin, target: Coin, side: TradeSide) -> Self {
        Self {
            origin,
            target,
            side,
        }
    }

    pub fn buy(origin: Coin, target: Coin) -> Self {
        Self::new(origin, target, TradeSide::Buy)
    }

    pub fn sell(origin: Coin, target: Coin) -> Self {
        Self::new(origin, target, TradeSide::Sell)
    }

    /// Exchange symbol of the traded pair, e.g. `ETHBTC`.
    pub fn pair_symbol(&self) -> String {
        format!("{}{}", self.origin.symbol(), self.target.symbol())
    }
}

impl fmt::Display for TradeIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} for {}", self.side, self.origin, self.target)
    }
}
