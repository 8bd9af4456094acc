//! Core data model: orders, traders, transactions and the read-only views handed out
//! to callers.
//!
//! Cash and prices are [`Decimal`]; quantities and holdings are whole shares (`u64`).
//! Timestamps are milliseconds since the Unix epoch.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Transaction identifier (1-based position in the transaction log).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct TransactionId(pub u64);

/// Order side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
        }
    }
}

/// Resting order (bid or ask). Lives in exactly one instrument queue.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Order {
    pub trader: String,
    pub price: Decimal,
    pub quantity: u64,
    pub submitted_at: u64,
}

/// Trader account. Keyed by name in the ledger.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Trader {
    pub cash: Decimal,
    /// Hex SHA-256 digest of the trader's secret.
    pub secret_hash: String,
    /// Instrument name -> shares owned.
    #[serde(default)]
    pub holdings: BTreeMap<String, u64>,
}

impl Trader {
    /// Shares of `instrument` owned (0 if never held).
    pub fn holding(&self, instrument: &str) -> u64 {
        self.holdings.get(instrument).copied().unwrap_or(0)
    }
}

/// Trader status as exposed to the trader: never carries the credential.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TraderStatus {
    pub cash: Decimal,
    pub holdings: BTreeMap<String, u64>,
}

/// Executed trade. Immutable once appended to the log.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub seller: String,
    pub buyer: String,
    pub instrument: String,
    pub price: Decimal,
    pub quantity: u64,
    pub timestamp: u64,
}

impl Transaction {
    /// Cash moved from buyer to seller. `None` only for a corrupt record whose product
    /// does not fit a `Decimal`.
    pub fn notional(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// One aggregated price level of the public book view.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BookLevel {
    pub price: Decimal,
    pub quantity: u64,
}

/// Price-aggregated view of one instrument's book. Trader identity is not exposed.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BookView {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

/// Exchange-wide counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Stats {
    pub traders: usize,
    pub live_tokens: usize,
    pub instruments: usize,
    pub queued_orders: usize,
}
