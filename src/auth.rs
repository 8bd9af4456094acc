//! Admin authentication for market administration routes.
//!
//! Trader requests authenticate with session tokens (see [`crate::session`]); this module
//! only guards administrative routes (creating instruments, granting shares). When
//! `ADMIN_KEYS` is unset or empty, admin auth is disabled and every request passes
//! (development bypass). Otherwise the request must carry `Authorization: Bearer <key>` or
//! `X-API-Key: <key>` with one of the comma-separated keys.

use axum::{
    body::Body,
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use log::warn;
use std::collections::HashSet;
use std::sync::Arc;

/// Admin auth configuration. Built from env.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub disable: bool,
    keys: Arc<HashSet<String>>,
}

fn parse_keys(s: &str) -> HashSet<String> {
    s.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

impl AuthConfig {
    /// Auth disabled: all admin requests accepted.
    pub fn disabled() -> Self {
        Self {
            disable: true,
            keys: Arc::new(HashSet::new()),
        }
    }

    /// Build from a comma-separated key list (e.g. "k1,k2"). Empty list disables auth.
    pub fn from_keys(keys: &str) -> Self {
        let keys = parse_keys(keys);
        Self {
            disable: keys.is_empty(),
            keys: Arc::new(keys),
        }
    }

    /// Load from env: unset or empty `ADMIN_KEYS` => admin auth disabled.
    pub fn from_env() -> Self {
        let config = Self::from_keys(&std::env::var("ADMIN_KEYS").unwrap_or_default());
        if config.disable {
            warn!("ADMIN_KEYS not set: admin routes are unauthenticated");
        }
        config
    }

    pub fn accepts(&self, key: &str) -> bool {
        self.disable || self.keys.contains(key)
    }
}

/// Returns the key from `Authorization: Bearer <key>` or `X-API-Key: <key>`.
fn get_api_key_from_request(req: &Request) -> Option<String> {
    if let Some(v) = req.headers().get(header::AUTHORIZATION) {
        if let Ok(s) = v.to_str() {
            let s = s.trim();
            if s.get(..7).map(|p| p.eq_ignore_ascii_case("bearer ")).unwrap_or(false) {
                return Some(s.get(7..).unwrap_or("").trim().to_string());
            }
        }
    }
    if let Some(v) = req.headers().get("X-API-Key") {
        if let Ok(s) = v.to_str() {
            return Some(s.trim().to_string());
        }
    }
    None
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "UNAUTHORIZED", "message": message })),
    )
        .into_response()
}

/// Admin middleware: passes through when auth is disabled; otherwise requires a known key.
pub async fn require_admin_key(req: Request<Body>, next: Next, config: AuthConfig) -> Response {
    if config.disable {
        return next.run(req).await;
    }
    match get_api_key_from_request(&req) {
        Some(key) if !key.is_empty() && config.accepts(&key) => next.run(req).await,
        Some(key) if !key.is_empty() => unauthorized("invalid admin key"),
        _ => unauthorized("missing Authorization or X-API-Key"),
    }
}
