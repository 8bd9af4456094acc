//! HTTP server for the exchange.
//!
//! Loads the market state from `STATE_FILE` (or seeds the demo market), runs the matching
//! loop every `TICK_INTERVAL_MS`, serves the REST/SSE API on `PORT`, and saves the state
//! on Ctrl-C.

use log::{error, info, warn};
use std::sync::{Arc, PoisonError};
use tokio::net::TcpListener;
use toy_stock_exchange::api;
use toy_stock_exchange::auth::AuthConfig;
use toy_stock_exchange::bootstrap::seed_demo;
use toy_stock_exchange::config::ServerConfig;
use toy_stock_exchange::persistence::FilePersistence;
use toy_stock_exchange::scheduler::spawn_matching_loop;
use toy_stock_exchange::{Engine, SystemClock};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = env_logger::try_init();
    let config = ServerConfig::from_env();
    let persistence = FilePersistence::new(&config.state_file);

    let engine = match persistence.load()? {
        Some(state) => {
            info!("restoring last state from {}", persistence.path().display());
            Engine::from_state(state, Arc::new(SystemClock))?
        }
        None => {
            let mut engine = Engine::new();
            if config.seed_demo {
                seed_demo(&mut engine)?;
            }
            engine
        }
    };

    let state = api::create_app_state(engine);
    let ticker = spawn_matching_loop(state.engine.clone(), config.tick_interval);
    let app = api::create_router(state.clone(), AuthConfig::from_env());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("toy-stock-exchange {} listening on http://{}", env!("CARGO_PKG_VERSION"), addr);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    ticker.abort();
    let snapshot = state
        .engine
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .snapshot();
    match persistence.save(&snapshot) {
        Ok(()) => info!("state saved to {}", persistence.path().display()),
        Err(e) => warn!("could not save state: {}", e),
    }
    Ok(())
}
