//! Append-only audit log of trades.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::coin::{Coin, TradeIntent, TradeSide};

/// Errors raised by trade record transitions and stores.
#[derive(Debug, Error)]
pub enum TradeLogError {
    /// `set_complete` called before `set_ordered`.
    #[error("trade {0} completed before it was ordered")]
    NotOrdered(Uuid),

    /// `set_ordered` called twice.
    #[error("trade {0} already ordered")]
    AlreadyOrdered(Uuid),

    /// Write attempted on a completed record.
    #[error("trade {0} already completed")]
    AlreadyCompleted(Uuid),

    #[error("trade log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("trade log serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Progress of a trade record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeState {
    Starting,
    Ordered,
    Complete,
}

/// Written once the exchange accepted the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedPhase {
    /// Origin coin balance sampled before the order.
    pub origin_balance: Decimal,
    /// Target coin balance sampled before the order.
    pub target_balance: Decimal,
    /// Submitted order quantity.
    pub quantity: Decimal,
    pub ordered_at: DateTime<Utc>,
}

/// Written once the order reached `FILLED`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedPhase {
    /// Quote-currency amount filled.
    pub quote_quantity: Decimal,
    pub completed_at: DateTime<Utc>,
}

/// Audit entry for one trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Uuid,
    pub origin: Coin,
    pub target: Coin,
    pub side: TradeSide,
    pub state: TradeState,
    pub ordered: Option<OrderedPhase>,
    pub completed: Option<CompletedPhase>,
    pub created_at: DateTime<Utc>,
}

impl TradeRecord {
    /// Start a record for `intent`.
    pub fn new(intent: &TradeIntent) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin: intent.origin.clone(),
            target: intent.target.clone(),
            side: intent.side,
            state: TradeState::Starting,
            ordered: None,
            completed: None,
            created_at: Utc::now(),
        }
    }

    /// Record the accepted order.
    pub fn set_ordered(
        &mut self,
        origin_balance: Decimal,
        target_balance: Decimal,
        quantity: Decimal,
    ) -> Result<(), TradeLogError> {
        match self.state {
            TradeState::Starting => {}
            TradeState::Ordered => return Err(TradeLogError::AlreadyOrdered(self.id)),
            TradeState::Complete => return Err(TradeLogError::AlreadyCompleted(self.id)),
        }

        self.ordered = Some(OrderedPhase {
            origin_balance,
            target_balance,
            quantity,
            ordered_at: Utc::now(),
        });
        self.state = TradeState::Ordered;
        Ok(())
    }

    /// Record the fill.
    pub fn set_complete(&mut self, quote_quantity: Decimal) -> Result<(), TradeLogError> {
        match self.state {
            TradeState::Ordered => {}
            TradeState::Starting => return Err(TradeLogError::NotOrdered(self.id)),
            TradeState::Complete => return Err(TradeLogError::AlreadyCompleted(self.id)),
        }

        self.completed = Some(CompletedPhase {
            quote_quantity,
            completed_at: Utc::now(),
        });
        self.state = TradeState::Complete;
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.state == TradeState::Complete
    }
}

/// Persistence collaborator for trade records.
///
/// `save` is called after every phase transition with the full record.
pub trait TradeLogStore: Send + Sync {
    fn save(&self, record: &TradeRecord) -> Result<(), TradeLogError>;
}

impl<T: TradeLogStore + ?Sized> TradeLogStore for Arc<T> {
    fn save(&self, record: &TradeRecord) -> Result<(), TradeLogError> {
        (**self).save(record)
    }
}

impl<T: TradeLogStore + ?Sized> TradeLogStore for Box<T> {
    fn save(&self, record: &TradeRecord) -> Result<(), TradeLogError> {
        (**self).save(record)
    }
}

/// Keeps every write in memory, in order.
#[derive(Debug, Default)]
pub struct InMemoryTradeLog {
    writes: Mutex<Vec<TradeRecord>>,
}

impl InMemoryTradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every saved snapshot, oldest first.
    pub fn writes(&self) -> Vec<TradeRecord> {
        self.writes.lock().clone()
    }

    /// Most recent snapshot of each trade, in creation order.
    pub fn records(&self) -> Vec<TradeRecord> {
        let writes = self.writes.lock();
        let mut latest: Vec<TradeRecord> = Vec::new();
        for record in writes.iter() {
            match latest.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => latest.push(record.clone()),
            }
        }
        latest
    }
}

impl TradeLogStore for InMemoryTradeLog {
    fn save(&self, record: &TradeRecord) -> Result<(), TradeLogError> {
        self.writes.lock().push(record.clone());
        Ok(())
    }
}

/// Appends one JSON line per write to a file.
#[derive(Debug)]
pub struct JsonlTradeLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlTradeLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TradeLogStore for JsonlTradeLog {
    fn save(&self, record: &TradeRecord) -> Result<(), TradeLogError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;

        tracing::debug!(path = %self.path.display(), trade_id = %record.id, "trade record written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record() -> TradeRecord {
        TradeRecord::new(&TradeIntent::sell(Coin::new("ETH"), Coin::new("BTC")))
    }

    #[test]
    fn test_phases_in_order() {
        let mut record = record();
        assert_eq!(record.state, TradeState::Starting);

        record.set_ordered(dec!(2), dec!(0.1), dec!(1.99)).unwrap();
        assert_eq!(record.state, TradeState::Ordered);
        assert_eq!(record.ordered.as_ref().unwrap().quantity, dec!(1.99));

        record.set_complete(dec!(0.103)).unwrap();
        assert!(record.is_complete());
        assert_eq!(record.completed.as_ref().unwrap().quote_quantity, dec!(0.103));
    }

    #[test]
    fn test_complete_requires_ordered() {
        let mut record = record();
        assert!(matches!(
            record.set_complete(dec!(1)),
            Err(TradeLogError::NotOrdered(_))
        ));
        assert!(record.completed.is_none());
    }

    #[test]
    fn test_completed_record_is_immutable() {
        let mut record = record();
        record.set_ordered(dec!(2), dec!(0), dec!(2)).unwrap();
        record.set_complete(dec!(0.1)).unwrap();

        assert!(matches!(
            record.set_complete(dec!(0.2)),
            Err(TradeLogError::AlreadyCompleted(_))
        ));
        assert!(matches!(
            record.set_ordered(dec!(1), dec!(1), dec!(1)),
            Err(TradeLogError::AlreadyCompleted(_))
        ));
        assert_eq!(record.completed.as_ref().unwrap().quote_quantity, dec!(0.1));
    }

    #[test]
    fn test_in_memory_latest_per_trade() {
        let log = InMemoryTradeLog::new();
        let mut record = record();

        log.save(&record).unwrap();
        record.set_ordered(dec!(2), dec!(0), dec!(2)).unwrap();
        log.save(&record).unwrap();

        assert_eq!(log.writes().len(), 2);
        let records = log.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state, TradeState::Ordered);
    }

    #[test]
    fn test_jsonl_appends_lines() {
        let path = std::env::temp_dir().join(format!("trade-log-{}.jsonl", Uuid::new_v4()));
        let log = JsonlTradeLog::new(&path);
        let mut record = record();

        record.set_ordered(dec!(2), dec!(0), dec!(2)).unwrap();
        log.save(&record).unwrap();
        record.set_complete(dec!(0.1)).unwrap();
        log.save(&record).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let last: TradeRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(last, record);

        std::fs::remove_file(path).ok();
    }
}
