//! Append-only log of executed trades.

use crate::types::{Transaction, TransactionId};
use rust_decimal::Decimal;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionLog {
    entries: Vec<Transaction>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<Transaction>) -> Self {
        Self { entries }
    }

    /// Appends a trade and returns the recorded copy. Ids continue from the log length.
    pub fn append(
        &mut self,
        seller: &str,
        buyer: &str,
        instrument: &str,
        price: Decimal,
        quantity: u64,
        timestamp: u64,
    ) -> Transaction {
        let tx = Transaction {
            id: TransactionId(self.entries.len() as u64 + 1),
            seller: seller.to_string(),
            buyer: buyer.to_string(),
            instrument: instrument.to_string(),
            price,
            quantity,
            timestamp,
        };
        self.entries.push(tx.clone());
        tx
    }

    pub fn as_slice(&self) -> &[Transaction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
