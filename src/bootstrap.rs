//! Demo market seeded on first start.
//!
//! Worked example from the Bristol Stock Exchange guide (pages 4-5): five traders with
//! 1000 cash and 5 shares of `XYZ` each, and a small book whose last bid crosses the best
//! ask, so the first tick executes one trade (t03 sells to t02 at 62).

use crate::engine::Engine;
use crate::error::ExchangeError;
use log::info;

pub const DEMO_INSTRUMENT: &str = "XYZ";

const DEMO_TRADERS: [&str; 5] = ["t11", "t02", "t08", "t01", "t03"];

/// Seeds `engine` with the demo market. Each trader's secret is its name.
pub fn seed_demo(engine: &mut Engine) -> Result<(), ExchangeError> {
    info!("bootstrapping with bristol stock exchange example");
    engine.create_instrument(DEMO_INSTRUMENT);

    let mut tokens = Vec::with_capacity(DEMO_TRADERS.len());
    for name in DEMO_TRADERS {
        tokens.push(engine.register(name, name, 1000.0)?);
        engine.grant_shares(name, DEMO_INSTRUMENT, 5)?;
    }
    let [t11, t02, t08, t01, t03] = &tokens[..] else {
        unreachable!("one token per demo trader");
    };

    engine.place_bid(t11, DEMO_INSTRUMENT, 22.0, 1)?;
    engine.place_bid(t02, DEMO_INSTRUMENT, 27.0, 1)?;
    engine.place_ask(t08, DEMO_INSTRUMENT, 77.0, 1)?;
    engine.place_bid(t01, DEMO_INSTRUMENT, 27.0, 1)?;
    engine.place_ask(t03, DEMO_INSTRUMENT, 62.0, 1)?;
    // replace earlier bids; t02@67 crosses t03@62
    engine.place_bid(t11, DEMO_INSTRUMENT, 30.0, 1)?;
    engine.place_bid(t02, DEMO_INSTRUMENT, 67.0, 1)?;

    for token in &tokens {
        engine.logout(token);
    }
    Ok(())
}
