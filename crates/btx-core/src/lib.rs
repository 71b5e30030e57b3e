//! # btx-core
//!
//! Core crate for the BTREX bridge, providing:
//!
//! - **Types** (`types`) — enums, market data structs, trading structs
//! - **Order books** (`book`) — per-side ordered price ladders with batch updates
//! - **Market state** (`state`) — process-wide ticker/book/trade/currency tables
//! - **RestSync** (`rest_sync`) — single-consumer FIFO for upstream REST calls
//! - **Configuration** (`config`) — settings structs consumed by the runner
//! - **Error types** (`error`) — domain-specific `BtxError` via thiserror
//! - **Time utilities** (`time_util`) — high-precision timestamps
//! - **Logging** (`logging`) — tracing-based structured logging

pub mod book;
pub mod config;
pub mod error;
pub mod logging;
pub mod rest_sync;
pub mod state;
pub mod time_util;
pub mod types;

// Re-export types at crate root for convenience.
pub use types::*;
