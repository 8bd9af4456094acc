//! # Toy Stock Exchange
//!
//! Minimal securities exchange: traders register accounts, rest bids and asks on named
//! instruments, and a periodic matching tick clears crossing orders into transactions
//! with price-time priority, moving cash and shares between buyer and seller.
//!
//! ## Entry point
//!
//! Use [`Engine`] as the single entry point: [`Engine::register`], [`Engine::login`],
//! [`Engine::place_bid`], [`Engine::place_ask`], and [`Engine::tick`]. Instruments are
//! created administratively with [`Engine::create_instrument`].
//!
//! ## Example
//!
//! ```rust
//! use toy_stock_exchange::Engine;
//! use rust_decimal::Decimal;
//!
//! let mut engine = Engine::new();
//! engine.create_instrument("XYZ");
//! let alice = engine.register("alice", "secret", 1000.0).unwrap();
//! let bob = engine.register("bob", "secret", 1000.0).unwrap();
//! engine.grant_shares("bob", "XYZ", 5).unwrap();
//!
//! engine.place_ask(&bob, "XYZ", 50.0, 2).unwrap();
//! engine.place_bid(&alice, "XYZ", 60.0, 2).unwrap();
//! let trades = engine.tick();
//! assert_eq!(trades.len(), 1);
//! assert_eq!(trades[0].price, Decimal::from(50));
//! assert_eq!(engine.trader_status(&alice).unwrap().cash, Decimal::from(900));
//! ```
//!
//! ## Lower-level API
//!
//! [`OrderBook`], [`Ledger`] and [`clear_instrument`] can be used directly; the engine
//! only adds sessions, validation, logging and event publication around them.

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod flow_gen;
pub mod ledger;
pub mod matching;
pub mod order_book;
pub mod persistence;
pub mod scheduler;
pub mod session;
pub mod transactions;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::Engine;
pub use error::ExchangeError;
pub use events::{EventBus, MarketEvent, OrderEvent};
pub use flow_gen::{FlowConfig, FlowGenerator};
pub use ledger::Ledger;
pub use matching::clear_instrument;
pub use order_book::OrderBook;
pub use persistence::{FilePersistence, MarketState, PersistenceError};
pub use session::SessionRegistry;
pub use transactions::TransactionLog;
pub use types::{BookLevel, BookView, Order, Side, Stats, Trader, TraderStatus, Transaction, TransactionId};
