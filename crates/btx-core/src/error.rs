//! Typed error definitions for the BTREX bridge.
//!
//! Provides [`BtxError`] for domain-specific errors that are more informative
//! than plain `anyhow::Error` strings. All variants implement `std::error::Error`
//! via `thiserror`, so they integrate seamlessly with `anyhow::Result`.

use thiserror::Error;

/// Domain-specific errors for the BTREX bridge.
#[derive(Debug, Error)]
pub enum BtxError {
    /// Configuration parsing or validation error.
    #[error("config error: {0}")]
    Config(String),

    /// Malformed frame, bad handshake, or unknown wire data.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Exchange-typed REST error (the exchange returned a failure message).
    #[error("Bittrex: {0}")]
    Exchange(String),

    /// Market data, order response, or upstream message parsing error.
    #[error("parse error: {0}")]
    Parse(String),

    /// Trading operation error (order placement, cancellation, etc.).
    #[error("trading error: {0}")]
    Trading(String),

    /// Historical tick store error.
    #[error("store error: {0}")]
    Store(String),
}
