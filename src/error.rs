//! Error kinds surfaced to callers of the exchange.
//!
//! Every failure is a synchronous validation failure: the operation that returns it has
//! applied nothing.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ExchangeError {
    #[error("trader already exists")]
    DuplicateTrader,

    #[error("amount must be a finite non-negative number")]
    InvalidAmount,

    /// Unknown trader or wrong secret; deliberately indistinguishable.
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("token is not valid")]
    InvalidToken,

    #[error("token has expired")]
    ExpiredToken,

    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("price must be a finite non-negative number")]
    InvalidPrice,

    #[error("quantity must be a non-negative integer")]
    InvalidQuantity,

    #[error("trader does not have enough cash")]
    InsufficientFunds,

    #[error("trader does not have enough shares")]
    InsufficientHoldings,

    #[error("trader not found: {0}")]
    TraderNotFound(String),
}

impl ExchangeError {
    /// Stable machine-readable code for this kind.
    pub fn code(&self) -> &'static str {
        match self {
            ExchangeError::DuplicateTrader => "DUPLICATE_TRADER",
            ExchangeError::InvalidAmount => "INVALID_AMOUNT",
            ExchangeError::AuthenticationFailed => "AUTHENTICATION_FAILED",
            ExchangeError::InvalidToken => "INVALID_TOKEN",
            ExchangeError::ExpiredToken => "EXPIRED_TOKEN",
            ExchangeError::UnknownInstrument(_) => "UNKNOWN_INSTRUMENT",
            ExchangeError::InvalidPrice => "INVALID_PRICE",
            ExchangeError::InvalidQuantity => "INVALID_QUANTITY",
            ExchangeError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ExchangeError::InsufficientHoldings => "INSUFFICIENT_HOLDINGS",
            ExchangeError::TraderNotFound(_) => "TRADER_NOT_FOUND",
        }
    }
}
