//! Fixed-cadence matching loop.
//!
//! One task runs ticks sequentially, so a tick never overlaps itself; if a tick overruns
//! the interval, missed ticks are skipped rather than queued.

use crate::engine::Engine;
use log::{debug, info};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Runs one tick plus a session sweep under the engine lock. Returns trades executed.
pub fn run_tick(engine: &Mutex<Engine>) -> usize {
    let mut guard = engine.lock().unwrap_or_else(PoisonError::into_inner);
    let executed = guard.tick().len();
    let swept = guard.sweep_expired_sessions();
    if swept > 0 {
        debug!("sessions swept count={}", swept);
    }
    executed
}

/// Spawns the matching loop on the current tokio runtime.
pub fn spawn_matching_loop(engine: Arc<Mutex<Engine>>, period: Duration) -> JoinHandle<()> {
    info!("matching loop started interval_ms={}", period.as_millis());
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let executed = run_tick(&engine);
            if executed > 0 {
                debug!("tick executed trades={}", executed);
            }
        }
    })
}
