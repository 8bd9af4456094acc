//! Persistence: save and load the market state to a JSON file.
//! Enables recovery after restart: instruments with their resting orders, trader
//! accounts and the transaction history are restored. Sessions are not persisted.

use crate::order_book::OrderBook;
use crate::types::{Order, Trader, Transaction};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The unit of snapshot/restore.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MarketState {
    pub instruments: BTreeMap<String, OrderBook>,
    pub traders: BTreeMap<String, Trader>,
    pub transactions: Vec<Transaction>,
}

impl MarketState {
    /// Checks what the engine relies on but JSON cannot express: no negative cash; every
    /// resting order belongs to a known trader, has a non-zero quantity and is that
    /// trader's only order on its side; transaction ids run 1..=n.
    pub fn validate(&self) -> Result<(), PersistenceError> {
        if let Some((name, _)) = self.traders.iter().find(|(_, t)| t.cash < Decimal::ZERO) {
            return Err(PersistenceError::Inconsistent(format!("negative cash for {}", name)));
        }
        for (name, book) in &self.instruments {
            for (side, queue) in [("bid", book.bids()), ("ask", book.asks())] {
                self.validate_queue(name, side, queue)?;
            }
        }
        for (i, tx) in self.transactions.iter().enumerate() {
            if tx.id.0 != i as u64 + 1 {
                return Err(PersistenceError::Inconsistent(format!(
                    "transaction at position {} has id {}",
                    i, tx.id.0
                )));
            }
        }
        Ok(())
    }

    fn validate_queue(&self, instrument: &str, side: &str, queue: &[Order]) -> Result<(), PersistenceError> {
        let mut seen = HashSet::new();
        for order in queue {
            let problem = if !self.traders.contains_key(&order.trader) {
                "unknown trader"
            } else if order.quantity == 0 {
                "zero quantity"
            } else if !seen.insert(order.trader.as_str()) {
                "duplicate order"
            } else {
                continue;
            };
            return Err(PersistenceError::Inconsistent(format!(
                "{} {} {} for {}",
                instrument, side, problem, order.trader
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("state file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("state file is not valid market state: {0}")]
    Json(#[from] serde_json::Error),

    #[error("state file is inconsistent: {0}")]
    Inconsistent(String),
}

/// File-based persistence: one JSON file. Saved at shutdown; loaded on startup.
#[derive(Clone, Debug)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    /// Save state to file. Overwrites existing file.
    pub fn save(&self, state: &MarketState) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, json).map_err(|e| self.io_error(e))
    }

    /// Load state from file. Returns `None` if the file does not exist.
    pub fn load(&self) -> Result<Option<MarketState>, PersistenceError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let state: MarketState = serde_json::from_str(&data)?;
        Ok(Some(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePersistence::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePersistence::new(dir.path().join("state.json"));
        let mut state = MarketState::default();
        state.instruments.insert("XYZ".into(), OrderBook::new());
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), Some(state));
    }

    fn state_with_bids(bids: serde_json::Value) -> MarketState {
        serde_json::from_value(serde_json::json!({
            "instruments": { "XYZ": { "bids": bids, "asks": [] } },
            "traders": {
                "a": { "cash": "100", "secret_hash": "00" },
                "b": { "cash": "100", "secret_hash": "00" }
            },
            "transactions": []
        }))
        .unwrap()
    }

    fn bid(trader: &str, quantity: u64) -> serde_json::Value {
        serde_json::json!({ "trader": trader, "price": "10", "quantity": quantity, "submitted_at": 1 })
    }

    #[test]
    fn validate_accepts_consistent_state() {
        let state = state_with_bids(serde_json::json!([bid("a", 1), bid("b", 2)]));
        assert!(state.validate().is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_resting_orders() {
        let state = state_with_bids(serde_json::json!([bid("a", 1), bid("a", 2)]));
        let err = state.validate().unwrap_err();
        assert!(matches!(err, PersistenceError::Inconsistent(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn validate_rejects_unknown_trader_and_empty_order() {
        let state = state_with_bids(serde_json::json!([bid("ghost", 1)]));
        assert!(matches!(state.validate(), Err(PersistenceError::Inconsistent(_))));
        let state = state_with_bids(serde_json::json!([bid("a", 0)]));
        assert!(matches!(state.validate(), Err(PersistenceError::Inconsistent(_))));
    }

    #[test]
    fn validate_rejects_gapped_transaction_ids() {
        let mut state = state_with_bids(serde_json::json!([]));
        state.transactions.push(Transaction {
            id: crate::types::TransactionId(2),
            seller: "a".into(),
            buyer: "b".into(),
            instrument: "XYZ".into(),
            price: Decimal::from(1),
            quantity: 1,
            timestamp: 0,
        });
        assert!(matches!(state.validate(), Err(PersistenceError::Inconsistent(_))));
    }

    #[test]
    fn load_garbage_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = FilePersistence::new(&path).load().unwrap_err();
        assert!(matches!(err, PersistenceError::Json(_)));
    }
}
