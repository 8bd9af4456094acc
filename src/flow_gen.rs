//! Synthetic order flow.
//!
//! Deterministic, configurable stream of trader actions for property tests, demos and
//! benchmarks. Same seed ⇒ same sequence of actions.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::engine::Engine;
use crate::error::ExchangeError;
use crate::types::Side;

/// Configuration for the synthetic flow generator.
/// All ranges are inclusive. Same config + seed produces the same stream.
#[derive(Clone, Debug)]
pub struct FlowConfig {
    /// RNG seed. Same seed ⇒ same action stream.
    pub seed: u64,
    /// Instrument all actions target.
    pub instrument: String,
    /// Number of actions to generate.
    pub num_actions: usize,
    /// Number of distinct traders (`trader-0` .. `trader-{n-1}`).
    pub num_traders: usize,
    /// Cash each trader starts with.
    pub initial_cash: f64,
    /// Shares each trader is granted.
    pub initial_shares: u64,
    /// Probability of a bid (0.0..=1.0). Ask otherwise.
    pub bid_ratio: f64,
    /// Probability that an action is a zero-quantity cancel.
    pub cancel_ratio: f64,
    pub price_min: i64,
    pub price_max: i64,
    pub quantity_min: i64,
    pub quantity_max: i64,
    /// Run a matching tick after every this many actions (0 = never).
    pub tick_every: usize,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            instrument: "XYZ".to_string(),
            num_actions: 1000,
            num_traders: 5,
            initial_cash: 10_000.0,
            initial_shares: 50,
            bid_ratio: 0.5,
            cancel_ratio: 0.05,
            price_min: 95,
            price_max: 105,
            quantity_min: 1,
            quantity_max: 10,
            tick_every: 10,
        }
    }
}

/// One trader action: place (or cancel, with zero quantity) an order.
#[derive(Clone, Debug, PartialEq)]
pub struct Action {
    pub trader: usize,
    pub side: Side,
    pub price: f64,
    pub quantity: i64,
}

/// Deterministic action stream. Create with [`FlowGenerator::new`].
pub struct FlowGenerator {
    rng: StdRng,
    config: FlowConfig,
}

impl FlowGenerator {
    pub fn new(config: FlowConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
        }
    }

    pub fn next_action(&mut self) -> Action {
        let trader = self.rng.gen_range(0..self.config.num_traders.max(1));
        let side = if self.rng.gen::<f64>() < self.config.bid_ratio {
            Side::Bid
        } else {
            Side::Ask
        };
        let price = self.rng.gen_range(self.config.price_min..=self.config.price_max) as f64;
        let quantity = if self.rng.gen::<f64>() < self.config.cancel_ratio {
            0
        } else {
            self.rng
                .gen_range(self.config.quantity_min..=self.config.quantity_max)
        };
        Action {
            trader,
            side,
            price,
            quantity,
        }
    }

    pub fn take_actions(&mut self, n: usize) -> Vec<Action> {
        (0..n).map(|_| self.next_action()).collect()
    }

    /// The full stream as defined by `config.num_actions`.
    pub fn all_actions(&mut self) -> Vec<Action> {
        self.take_actions(self.config.num_actions)
    }
}

/// Name of the `i`-th generated trader.
pub fn trader_name(i: usize) -> String {
    format!("trader-{}", i)
}

/// Creates the instrument and funded traders described by `config`; returns one
/// session token per trader, indexed like [`Action::trader`].
pub fn populate(engine: &mut Engine, config: &FlowConfig) -> Result<Vec<String>, ExchangeError> {
    engine.create_instrument(&config.instrument);
    (0..config.num_traders)
        .map(|i| {
            let name = trader_name(i);
            let token = engine.register(&name, &name, config.initial_cash)?;
            engine.grant_shares(&name, &config.instrument, config.initial_shares)?;
            Ok(token)
        })
        .collect()
}

/// Counts from a replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub accepted: usize,
    pub rejected: usize,
    pub transactions: usize,
}

/// Replays `actions` into the engine, ticking every `config.tick_every` actions and once
/// at the end. Rejected placements (e.g. insufficient funds) are counted, not returned.
pub fn replay(
    engine: &mut Engine,
    config: &FlowConfig,
    tokens: &[String],
    actions: impl IntoIterator<Item = Action>,
) -> ReplayOutcome {
    let mut outcome = ReplayOutcome::default();
    for (i, action) in actions.into_iter().enumerate() {
        let Some(token) = tokens.get(action.trader) else {
            outcome.rejected += 1;
            continue;
        };
        match engine.place(token, &config.instrument, action.price, action.quantity, action.side) {
            Ok(()) => outcome.accepted += 1,
            Err(_) => outcome.rejected += 1,
        }
        if config.tick_every > 0 && (i + 1) % config.tick_every == 0 {
            outcome.transactions += engine.tick().len();
        }
    }
    outcome.transactions += engine.tick().len();
    outcome
}
