//! Session tokens: issuance, lazy expiry on lookup, revocation and periodic sweep.

use crate::error::ExchangeError;
use rand::Rng;
use std::collections::HashMap;

/// Session lifetime from issuance. No renewal on use.
pub const SESSION_TTL_MS: u64 = 24 * 60 * 60 * 1000;

/// Token length in symbols of [`TOKEN_ALPHABET`].
pub const TOKEN_LEN: usize = 16;

/// 32-symbol token alphabet.
const TOKEN_ALPHABET: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub trader: String,
    pub expires_at: u64,
}

/// Live sessions keyed by opaque token. A trader may hold several tokens at once.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: HashMap<String, Session>,
    ttl_ms: u64,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(SESSION_TTL_MS)
    }
}

fn random_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

impl SessionRegistry {
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl_ms,
        }
    }

    /// Issues a token unique among currently held tokens.
    pub fn issue(&mut self, trader: &str, now: u64) -> String {
        let mut token = random_token();
        while self.sessions.contains_key(&token) {
            token = random_token();
        }
        self.sessions.insert(
            token.clone(),
            Session {
                trader: trader.to_string(),
                expires_at: now.saturating_add(self.ttl_ms),
            },
        );
        token
    }

    /// Resolves a token to its trader. Expired entries are evicted on this path.
    pub fn resolve(&mut self, token: &str, now: u64) -> Result<String, ExchangeError> {
        let session = self.sessions.get(token).ok_or(ExchangeError::InvalidToken)?;
        if now > session.expires_at {
            self.sessions.remove(token);
            return Err(ExchangeError::ExpiredToken);
        }
        Ok(session.trader.clone())
    }

    /// Idempotent; unknown tokens are ignored.
    pub fn revoke(&mut self, token: &str) {
        self.sessions.remove(token);
    }

    /// Drops every expired session. Returns how many were removed.
    pub fn sweep(&mut self, now: u64) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| now <= s.expires_at);
        before - self.sessions.len()
    }

    /// Sessions not yet expired at `now`.
    pub fn live_count(&self, now: u64) -> usize {
        self.sessions.values().filter(|s| now <= s.expires_at).count()
    }
}
