//! Trader accounts: cash, share holdings and credentials.
//!
//! [`Ledger::apply_trade`] is the only path that moves money or shares between traders.

use crate::error::ExchangeError;
use crate::types::{Trader, TraderStatus};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Hex SHA-256 digest of a trader secret.
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// All trader accounts, keyed by unique trader name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    traders: BTreeMap<String, Trader>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted accounts.
    pub fn from_traders(traders: BTreeMap<String, Trader>) -> Self {
        Self { traders }
    }

    /// Creates a trader with empty holdings. Session issuance is the caller's job.
    pub fn register(&mut self, name: &str, secret: &str, cash: Decimal) -> Result<(), ExchangeError> {
        if self.traders.contains_key(name) {
            return Err(ExchangeError::DuplicateTrader);
        }
        if cash < Decimal::ZERO {
            return Err(ExchangeError::InvalidAmount);
        }
        self.traders.insert(
            name.to_string(),
            Trader {
                cash,
                secret_hash: hash_secret(secret),
                holdings: BTreeMap::new(),
            },
        );
        Ok(())
    }

    /// Checks credentials. Unknown name and wrong secret fail the same way.
    pub fn authenticate(&self, name: &str, secret: &str) -> Result<(), ExchangeError> {
        match self.traders.get(name) {
            Some(trader) if trader.secret_hash == hash_secret(secret) => Ok(()),
            _ => Err(ExchangeError::AuthenticationFailed),
        }
    }

    pub fn get(&self, name: &str) -> Result<&Trader, ExchangeError> {
        self.traders
            .get(name)
            .ok_or_else(|| ExchangeError::TraderNotFound(name.to_string()))
    }

    pub fn status(&self, name: &str) -> Result<TraderStatus, ExchangeError> {
        let trader = self.get(name)?;
        Ok(TraderStatus {
            cash: trader.cash,
            holdings: trader.holdings.clone(),
        })
    }

    /// Administrative share issuance.
    pub fn grant(&mut self, name: &str, instrument: &str, quantity: u64) -> Result<(), ExchangeError> {
        let trader = self
            .traders
            .get_mut(name)
            .ok_or_else(|| ExchangeError::TraderNotFound(name.to_string()))?;
        let held = trader.holdings.entry(instrument.to_string()).or_insert(0);
        *held = held.checked_add(quantity).ok_or(ExchangeError::InvalidQuantity)?;
        Ok(())
    }

    /// Moves `price * quantity` cash from buyer to seller and `quantity` shares from
    /// seller to buyer. Re-validates both legs first and applies nothing on failure.
    /// Arithmetic overflow on either leg is reported as a failure, never a panic.
    pub fn apply_trade(
        &mut self,
        seller: &str,
        buyer: &str,
        instrument: &str,
        price: Decimal,
        quantity: u64,
    ) -> Result<(), ExchangeError> {
        let notional = price
            .checked_mul(Decimal::from(quantity))
            .ok_or(ExchangeError::InsufficientFunds)?;
        let seller_acct = self.get(seller)?;
        let seller_held = seller_acct
            .holding(instrument)
            .checked_sub(quantity)
            .ok_or(ExchangeError::InsufficientHoldings)?;
        let seller_cash = seller_acct
            .cash
            .checked_add(notional)
            .ok_or(ExchangeError::InvalidAmount)?;
        let buyer_acct = self.get(buyer)?;
        if buyer_acct.cash < notional {
            return Err(ExchangeError::InsufficientFunds);
        }
        let buyer_cash = buyer_acct.cash - notional;
        let buyer_held = buyer_acct
            .holding(instrument)
            .checked_add(quantity)
            .ok_or(ExchangeError::InvalidQuantity)?;
        if seller == buyer {
            // both legs cancel out
            return Ok(());
        }

        if let Some(s) = self.traders.get_mut(seller) {
            s.cash = seller_cash;
            s.holdings.insert(instrument.to_string(), seller_held);
        }
        if let Some(b) = self.traders.get_mut(buyer) {
            b.cash = buyer_cash;
            b.holdings.insert(instrument.to_string(), buyer_held);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.traders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traders.is_empty()
    }

    /// Sum of all traders' cash.
    pub fn total_cash(&self) -> Decimal {
        self.traders.values().map(|t| t.cash).sum()
    }

    pub fn traders(&self) -> &BTreeMap<String, Trader> {
        &self.traders
    }
}
