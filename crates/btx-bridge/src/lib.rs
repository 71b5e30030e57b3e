//! # btx-bridge
//!
//! The live bridge between DTC clients and the Bittrex exchange.
//!
//! ## Architecture
//!
//! ```text
//! DTC clients ──► server (accept + framed read)
//!                  │
//!                  ├─► handlers ──► orders ──► RestSync ──► bittrex::rest
//!                  │
//! bittrex::ws ─────┴─► MarketState ──► fan-out to subscribed writers
//!        ▲
//!        └── watchdog / reconnect / re-subscribe
//! ```
//!
//! One [`Bridge`] handle is built at startup and shared by every task.

pub mod bittrex;
pub mod connection;
pub mod handlers;
pub mod orders;
pub mod refresher;
pub mod server;

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use btx_core::config::BridgeSettings;
use btx_core::rest_sync::RestSync;
use btx_core::state::MarketState;

use crate::bittrex::Exchange;
use crate::connection::Registry;

/// Exchange identifier carried in every emitted symbol.
pub const EXCHANGE_NAME: &str = "BTREX";

/// The two fixed trade accounts.
pub const ACCOUNT_EXCHANGE: &str = "exchange";
pub const ACCOUNT_MARGIN: &str = "margin";

/// Shared handles for every handler and background task.
pub struct Bridge {
    pub state: Arc<MarketState>,
    pub registry: Arc<Registry>,
    pub rest: Arc<RestSync>,
    pub exchange: Arc<dyn Exchange>,
    pub settings: BridgeSettings,
    /// Symbols the exchange allows leveraged trading on; orders for these
    /// route through the margin endpoint.
    margin_symbols: RwLock<HashSet<String>>,
}

impl Bridge {
    pub fn new(
        state: Arc<MarketState>,
        exchange: Arc<dyn Exchange>,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            state,
            registry: Arc::new(Registry::new()),
            rest: Arc::new(RestSync::new()),
            exchange,
            settings,
            margin_symbols: RwLock::new(HashSet::new()),
        }
    }

    pub fn set_margin_symbols(&self, symbols: impl IntoIterator<Item = String>) {
        *self.margin_symbols.write().unwrap() = symbols.into_iter().collect();
    }

    pub fn is_margin_symbol(&self, symbol: &str) -> bool {
        self.margin_symbols.read().unwrap().contains(symbol)
    }
}
