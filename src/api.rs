//! HTTP layer for the exchange.
//!
//! Used by the binary and by integration tests. Create state with [`create_app_state`] and
//! the router with [`create_router`]. Uses Extension for state so the router is
//! `Router<()>` and works with `into_make_service()`.
//!
//! Trader routes are plain GETs with path parameters; `/stream` is a server-sent-event
//! feed of [`MarketEvent`]s; `/admin/*` routes sit behind [`require_admin_key`].

use axum::{
    extract::{Extension, Path, Request},
    http::StatusCode,
    middleware::{self, Next},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures_util::Stream;
use log::warn;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast::error::RecvError;

use crate::auth::{require_admin_key, AuthConfig};
use crate::clock::{Clock, SystemClock};
use crate::events::{EventBus, MarketEvent};
use crate::{Engine, ExchangeError};

/// Shared app state: one engine per process behind one lock.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Mutex<Engine>>,
    pub events: EventBus,
    pub started_at: u64,
}

impl AppState {
    fn engine(&self) -> MutexGuard<'_, Engine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn create_app_state(engine: Engine) -> AppState {
    let events = engine.events();
    AppState {
        engine: Arc::new(Mutex::new(engine)),
        events,
        started_at: SystemClock.now_ms(),
    }
}

/// Builds the router. Returns `Router<()>` so you can call `.into_make_service()` for `axum::serve`.
pub fn create_router(state: AppState, auth: AuthConfig) -> Router<()> {
    let admin = Router::new()
        .route("/admin/instruments", post(create_instrument))
        .route("/admin/grants", post(grant_shares))
        .route_layer(middleware::from_fn(move |req: Request, next: Next| {
            require_admin_key(req, next, auth.clone())
        }));

    Router::new()
        .route("/", get(info))
        .route("/health", get(health))
        .route("/register/:name/:password/:money", get(register))
        .route("/login/:name/:password", get(login))
        .route("/logout/:token", get(logout))
        .route("/trader/:token", get(trader_status))
        .route("/bid/:token/:stock/:price/:quantity", get(place_bid))
        .route("/ask/:token/:stock/:price/:quantity", get(place_ask))
        .route("/stock", get(list_instruments))
        .route("/stock/:name", get(instrument_book))
        .route("/transactions", get(transactions))
        .route("/stats", get(stats))
        .route("/stream", get(stream))
        .merge(admin)
        .layer(Extension(state))
}

/// Exchange error as an HTTP response: `{ "error": CODE, "message": text }`.
pub struct ApiError(pub ExchangeError);

impl From<ExchangeError> for ApiError {
    fn from(e: ExchangeError) -> Self {
        Self(e)
    }
}

pub fn status_for(err: &ExchangeError) -> StatusCode {
    match err {
        ExchangeError::DuplicateTrader => StatusCode::CONFLICT,
        ExchangeError::InvalidAmount | ExchangeError::InvalidPrice | ExchangeError::InvalidQuantity => {
            StatusCode::BAD_REQUEST
        }
        ExchangeError::AuthenticationFailed | ExchangeError::InvalidToken | ExchangeError::ExpiredToken => {
            StatusCode::UNAUTHORIZED
        }
        ExchangeError::UnknownInstrument(_) | ExchangeError::TraderNotFound(_) => StatusCode::NOT_FOUND,
        ExchangeError::InsufficientFunds | ExchangeError::InsufficientHoldings => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": self.0.code(),
            "message": self.0.to_string(),
        }));
        (status_for(&self.0), body).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn ok() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn info(Extension(state): Extension<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "since": state.started_at,
    }))
}

async fn register(
    Extension(state): Extension<AppState>,
    Path((name, password, money)): Path<(String, String, String)>,
) -> ApiResult<serde_json::Value> {
    let money: f64 = money.trim().parse().map_err(|_| ExchangeError::InvalidAmount)?;
    let token = state.engine().register(&name, &password, money)?;
    Ok(Json(serde_json::json!({ "token": token })))
}

async fn login(
    Extension(state): Extension<AppState>,
    Path((name, password)): Path<(String, String)>,
) -> ApiResult<serde_json::Value> {
    let token = state.engine().login(&name, &password)?;
    Ok(Json(serde_json::json!({ "token": token })))
}

async fn logout(Extension(state): Extension<AppState>, Path(token): Path<String>) -> Json<serde_json::Value> {
    state.engine().logout(&token);
    ok()
}

async fn trader_status(
    Extension(state): Extension<AppState>,
    Path(token): Path<String>,
) -> ApiResult<crate::TraderStatus> {
    Ok(Json(state.engine().trader_status(&token)?))
}

fn parse_order_params(price: &str, quantity: &str) -> Result<(f64, i64), ExchangeError> {
    let price: f64 = price.trim().parse().map_err(|_| ExchangeError::InvalidPrice)?;
    let quantity: i64 = quantity.trim().parse().map_err(|_| ExchangeError::InvalidQuantity)?;
    Ok((price, quantity))
}

async fn place_bid(
    Extension(state): Extension<AppState>,
    Path((token, stock, price, quantity)): Path<(String, String, String, String)>,
) -> ApiResult<serde_json::Value> {
    let (price, quantity) = parse_order_params(&price, &quantity)?;
    state.engine().place_bid(&token, &stock, price, quantity)?;
    Ok(ok())
}

async fn place_ask(
    Extension(state): Extension<AppState>,
    Path((token, stock, price, quantity)): Path<(String, String, String, String)>,
) -> ApiResult<serde_json::Value> {
    let (price, quantity) = parse_order_params(&price, &quantity)?;
    state.engine().place_ask(&token, &stock, price, quantity)?;
    Ok(ok())
}

async fn list_instruments(Extension(state): Extension<AppState>) -> Json<Vec<String>> {
    Json(state.engine().list_instruments())
}

async fn instrument_book(
    Extension(state): Extension<AppState>,
    Path(name): Path<String>,
) -> ApiResult<crate::BookView> {
    Ok(Json(state.engine().instrument_book(&name)?))
}

async fn transactions(Extension(state): Extension<AppState>) -> Json<Vec<crate::Transaction>> {
    Json(state.engine().transactions().to_vec())
}

async fn stats(Extension(state): Extension<AppState>) -> Json<crate::Stats> {
    Json(state.engine().stats())
}

async fn stream(
    Extension(state): Extension<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = state.events.subscribe();
    let events = futures_util::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => return Some((Event::default().json_data::<MarketEvent>(event), rx)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("stream subscriber lagged skipped={}", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}

#[derive(serde::Deserialize)]
struct CreateInstrumentRequest {
    name: String,
}

async fn create_instrument(
    Extension(state): Extension<AppState>,
    Json(body): Json<CreateInstrumentRequest>,
) -> Response {
    let created = state.engine().create_instrument(&body.name);
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    (status, Json(serde_json::json!({ "created": created }))).into_response()
}

#[derive(serde::Deserialize)]
struct GrantRequest {
    trader: String,
    instrument: String,
    quantity: u64,
}

async fn grant_shares(
    Extension(state): Extension<AppState>,
    Json(body): Json<GrantRequest>,
) -> ApiResult<serde_json::Value> {
    state
        .engine()
        .grant_shares(&body.trader, &body.instrument, body.quantity)?;
    Ok(ok())
}
