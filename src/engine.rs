//! Exchange facade owning the whole market state.
//!
//! [`Engine`] holds the ledger, session registry, per-instrument order books and the
//! transaction log, and is the single entry point for the protocol layer. It is not
//! internally synchronized: callers serialize access (one lock around the engine), which
//! makes every operation, including a full matching tick, atomic.

use crate::clock::{Clock, SystemClock};
use crate::error::ExchangeError;
use crate::events::{EventBus, MarketEvent, OrderEvent};
use crate::ledger::Ledger;
use crate::matching::clear_instrument;
use crate::order_book::OrderBook;
use crate::persistence::{MarketState, PersistenceError};
use crate::session::SessionRegistry;
use crate::transactions::TransactionLog;
use crate::types::{BookView, Order, Side, Stats, TraderStatus, Transaction};
use log::info;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

fn to_non_negative_decimal(value: f64, err: ExchangeError) -> Result<Decimal, ExchangeError> {
    if !value.is_finite() || value < 0.0 {
        return Err(err);
    }
    Decimal::from_f64(value).ok_or(err)
}

fn to_quantity(value: i64) -> Result<u64, ExchangeError> {
    u64::try_from(value).map_err(|_| ExchangeError::InvalidQuantity)
}

pub struct Engine {
    ledger: Ledger,
    sessions: SessionRegistry,
    books: BTreeMap<String, OrderBook>,
    transactions: TransactionLog,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("traders", &self.ledger.len())
            .field("instruments", &self.books.len())
            .field("transactions", &self.transactions.len())
            .finish()
    }
}

impl Engine {
    /// Empty exchange on wall-clock time.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            ledger: Ledger::new(),
            sessions: SessionRegistry::default(),
            books: BTreeMap::new(),
            transactions: TransactionLog::new(),
            clock,
            events: EventBus::default(),
        }
    }

    /// Restores a persisted market. No sessions survive a restore. A state that breaks
    /// the book or log invariants is refused.
    pub fn from_state(state: MarketState, clock: Arc<dyn Clock>) -> Result<Self, PersistenceError> {
        state.validate()?;
        let mut engine = Self::with_clock(clock);
        engine.ledger = Ledger::from_traders(state.traders);
        engine.books = state.instruments;
        for book in engine.books.values_mut() {
            book.normalize();
        }
        engine.transactions = TransactionLog::from_entries(state.transactions);
        Ok(engine)
    }

    /// Copy of the persistable state.
    pub fn snapshot(&self) -> MarketState {
        MarketState {
            instruments: self.books.clone(),
            traders: self.ledger.traders().clone(),
            transactions: self.transactions.as_slice().to_vec(),
        }
    }

    /// Handle for subscribing to the market event stream without holding the engine.
    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<MarketEvent> {
        self.events.subscribe()
    }

    fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Administrative: opens an instrument for trading. Returns `false` if it already exists.
    pub fn create_instrument(&mut self, name: &str) -> bool {
        if self.books.contains_key(name) {
            return false;
        }
        self.books.insert(name.to_string(), OrderBook::new());
        info!("instrument created name={}", name);
        true
    }

    /// Administrative: issues shares of an existing instrument to a trader.
    pub fn grant_shares(&mut self, trader: &str, instrument: &str, quantity: u64) -> Result<(), ExchangeError> {
        if !self.books.contains_key(instrument) {
            return Err(ExchangeError::UnknownInstrument(instrument.to_string()));
        }
        self.ledger.grant(trader, instrument, quantity)?;
        info!("shares granted trader={} instrument={} quantity={}", trader, instrument, quantity);
        Ok(())
    }

    /// Creates a trader and returns a fresh session token.
    pub fn register(&mut self, name: &str, secret: &str, cash: f64) -> Result<String, ExchangeError> {
        if self.ledger.get(name).is_ok() {
            return Err(ExchangeError::DuplicateTrader);
        }
        let cash = to_non_negative_decimal(cash, ExchangeError::InvalidAmount)?;
        self.ledger.register(name, secret, cash)?;
        info!("trader registered name={} cash={}", name, cash);
        Ok(self.sessions.issue(name, self.now()))
    }

    /// Issues an additional session token; earlier tokens stay valid.
    pub fn login(&mut self, name: &str, secret: &str) -> Result<String, ExchangeError> {
        self.ledger.authenticate(name, secret)?;
        Ok(self.sessions.issue(name, self.now()))
    }

    /// Always succeeds, including for unknown tokens.
    pub fn logout(&mut self, token: &str) {
        self.sessions.revoke(token);
    }

    /// Name of the trader holding `token`.
    pub fn trader_name(&mut self, token: &str) -> Result<String, ExchangeError> {
        let now = self.now();
        self.sessions.resolve(token, now)
    }

    pub fn trader_status(&mut self, token: &str) -> Result<TraderStatus, ExchangeError> {
        let name = self.trader_name(token)?;
        self.ledger.status(&name)
    }

    pub fn place_bid(&mut self, token: &str, instrument: &str, price: f64, quantity: i64) -> Result<(), ExchangeError> {
        self.place(token, instrument, price, quantity, Side::Bid)
    }

    pub fn place_ask(&mut self, token: &str, instrument: &str, price: f64, quantity: i64) -> Result<(), ExchangeError> {
        self.place(token, instrument, price, quantity, Side::Ask)
    }

    /// Validates and rests an order, replacing the trader's previous order on that side.
    /// Zero quantity cancels without funding checks.
    pub fn place(
        &mut self,
        token: &str,
        instrument: &str,
        price: f64,
        quantity: i64,
        side: Side,
    ) -> Result<(), ExchangeError> {
        let now = self.now();
        let trader_name = self.sessions.resolve(token, now)?;
        let trader = self.ledger.get(&trader_name)?;
        let book = self
            .books
            .get_mut(instrument)
            .ok_or_else(|| ExchangeError::UnknownInstrument(instrument.to_string()))?;
        let price = to_non_negative_decimal(price, ExchangeError::InvalidPrice)?;
        let quantity = to_quantity(quantity)?;

        if quantity > 0 {
            match side {
                Side::Bid => {
                    // a cost too large for a Decimal is more than any balance
                    let affordable = price
                        .checked_mul(Decimal::from(quantity))
                        .is_some_and(|cost| trader.cash >= cost);
                    if !affordable {
                        return Err(ExchangeError::InsufficientFunds);
                    }
                }
                Side::Ask if trader.holding(instrument) < quantity => {
                    return Err(ExchangeError::InsufficientHoldings);
                }
                _ => {}
            }
        }

        book.place(
            side,
            Order {
                trader: trader_name.clone(),
                price,
                quantity,
                submitted_at: now,
            },
        );
        info!(
            "order placed trader={} instrument={} side={} price={} quantity={}",
            trader_name,
            instrument,
            side.as_str(),
            price,
            quantity
        );
        self.events.publish(MarketEvent::order(
            side,
            OrderEvent {
                trader: trader_name,
                instrument: instrument.to_string(),
                price,
                quantity,
            },
        ));
        Ok(())
    }

    /// Instrument names in stable (lexicographic) order.
    pub fn list_instruments(&self) -> Vec<String> {
        self.books.keys().cloned().collect()
    }

    /// Price-aggregated book for one instrument.
    pub fn instrument_book(&self, name: &str) -> Result<BookView, ExchangeError> {
        self.books
            .get(name)
            .map(OrderBook::view)
            .ok_or_else(|| ExchangeError::UnknownInstrument(name.to_string()))
    }

    /// Raw queues for one instrument (includes trader names; not for public display).
    pub fn order_book(&self, name: &str) -> Option<&OrderBook> {
        self.books.get(name)
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub fn stats(&self) -> Stats {
        Stats {
            traders: self.ledger.len(),
            live_tokens: self.sessions.live_count(self.now()),
            instruments: self.books.len(),
            queued_orders: self.books.values().map(OrderBook::len).sum(),
        }
    }

    /// Total cash across all traders.
    pub fn total_cash(&self) -> Decimal {
        self.ledger.total_cash()
    }

    /// One matching pass over every instrument. Returns the executed transactions, each
    /// of which has also been published on the event stream.
    pub fn tick(&mut self) -> Vec<Transaction> {
        let now = self.now();
        let mut executed = Vec::new();
        for (name, book) in self.books.iter_mut() {
            let txs = clear_instrument(name, book, &mut self.ledger, &mut self.transactions, now);
            for tx in &txs {
                info!(
                    "trade id={} instrument={} seller={} buyer={} price={} quantity={}",
                    tx.id.0, tx.instrument, tx.seller, tx.buyer, tx.price, tx.quantity
                );
                self.events.publish(MarketEvent::Transaction(tx.clone()));
            }
            executed.extend(txs);
        }
        executed
    }

    /// Evicts expired sessions. Returns how many were dropped.
    pub fn sweep_expired_sessions(&mut self) -> usize {
        let now = self.now();
        self.sessions.sweep(now)
    }
}
