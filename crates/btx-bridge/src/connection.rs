//! Per-client connection state and the process-wide registry.
//!
//! A [`Connection`] is created on the first byte from a new TCP peer and
//! registered under its remote address string; it is removed when the reader
//! sees EOF or the writer errors. Credentials are set once at logon and are
//! immutable for the connection's lifetime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use btx_dtc::messages::SubmitNewSingleOrder;
use btx_dtc::writer::DtcWriter;

use btx_core::types::{ExchangeBalance, MarginPosition, OpenOrder, TradeFill};

use crate::bittrex::Credentials;

// ---------------------------------------------------------------------------
// SubscriptionPair
// ---------------------------------------------------------------------------

/// Paired bidirectional maps `symbol → id` and `id → symbol`.
///
/// Ids are chosen by the client; uniqueness is enforced here per map. The
/// two directions are mutated together, so they stay exact inverses.
#[derive(Debug, Default)]
pub struct SubscriptionPair {
    by_symbol: HashMap<String, u32>,
    by_id: HashMap<u32, String>,
}

impl SubscriptionPair {
    /// Record a subscription. Re-subscribing the same `(id, symbol)` pair is
    /// a no-op; reusing an id for a *different* symbol returns the symbol it
    /// is already bound to.
    pub fn subscribe(&mut self, id: u32, symbol: &str) -> Result<(), String> {
        if let Some(existing) = self.by_id.get(&id) {
            if existing != symbol {
                return Err(existing.clone());
            }
        }
        self.by_id.insert(id, symbol.to_string());
        self.by_symbol.insert(symbol.to_string(), id);
        Ok(())
    }

    /// Remove the mapping for `id`, if present.
    pub fn unsubscribe(&mut self, id: u32) {
        if let Some(symbol) = self.by_id.remove(&id) {
            self.by_symbol.remove(&symbol);
        }
    }

    pub fn id_for(&self, symbol: &str) -> Option<u32> {
        self.by_symbol.get(symbol).copied()
    }

    pub fn symbol_for(&self, id: u32) -> Option<&str> {
        self.by_id.get(&id).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// True when the two directions are exact inverses.
    pub fn is_consistent(&self) -> bool {
        self.by_id.len() == self.by_symbol.len()
            && self
                .by_id
                .iter()
                .all(|(id, sym)| self.by_symbol.get(sym) == Some(id))
    }
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// State for one live client.
pub struct Connection {
    /// Remote address string; the registry key.
    pub addr: String,
    pub writer: DtcWriter,
    creds: OnceLock<Credentials>,
    send_secdefs: AtomicBool,
    /// Market data subscriptions.
    pub subs_md: Mutex<SubscriptionPair>,
    /// Market depth subscriptions.
    pub subs_depth: Mutex<SubscriptionPair>,
    /// `currency → balance` on the exchange account.
    pub balances: Mutex<HashMap<String, ExchangeBalance>>,
    /// `currency → balance` on the margin account.
    pub margin_balances: Mutex<HashMap<String, f64>>,
    /// Original submit requests keyed by the server-assigned order id.
    pub client_orders: Mutex<HashMap<String, SubmitNewSingleOrder>>,
    /// Open orders keyed by order uuid.
    pub orders: Mutex<HashMap<String, OpenOrder>>,
    /// Historical fills keyed by trade uuid.
    pub trades: Mutex<HashMap<String, TradeFill>>,
    /// Margin positions keyed by symbol.
    pub positions: Mutex<HashMap<String, MarginPosition>>,
}

impl Connection {
    pub fn new(addr: String, writer: DtcWriter) -> Self {
        Self {
            addr,
            writer,
            creds: OnceLock::new(),
            send_secdefs: AtomicBool::new(false),
            subs_md: Mutex::new(SubscriptionPair::default()),
            subs_depth: Mutex::new(SubscriptionPair::default()),
            balances: Mutex::new(HashMap::new()),
            margin_balances: Mutex::new(HashMap::new()),
            client_orders: Mutex::new(HashMap::new()),
            orders: Mutex::new(HashMap::new()),
            trades: Mutex::new(HashMap::new()),
            positions: Mutex::new(HashMap::new()),
        }
    }

    /// Install logon credentials. The first call wins; later calls are
    /// ignored (credentials are immutable per connection).
    pub fn set_credentials(&self, creds: Credentials) {
        let _ = self.creds.set(creds);
    }

    pub fn credentials(&self) -> Credentials {
        self.creds.get().cloned().unwrap_or_default()
    }

    pub fn set_send_secdefs(&self, v: bool) {
        self.send_secdefs.store(v, Ordering::Relaxed);
    }

    pub fn send_secdefs(&self) -> bool {
        self.send_secdefs.load(Ordering::Relaxed)
    }

    /// Market-data subscription id for a symbol, if subscribed.
    pub fn md_id_for(&self, symbol: &str) -> Option<u32> {
        self.subs_md.lock().unwrap().id_for(symbol)
    }

    /// Depth subscription id for a symbol, if subscribed.
    pub fn depth_id_for(&self, symbol: &str) -> Option<u32> {
        self.subs_depth.lock().unwrap().id_for(symbol)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Process-wide table of live connections keyed by remote address.
#[derive(Default)]
pub struct Registry {
    conns: RwLock<HashMap<String, Arc<Connection>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, conn: Arc<Connection>) {
        self.conns.write().unwrap().insert(conn.addr.clone(), conn);
    }

    pub fn remove(&self, addr: &str) -> Option<Arc<Connection>> {
        self.conns.write().unwrap().remove(addr)
    }

    pub fn len(&self) -> usize {
        self.conns.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.read().unwrap().is_empty()
    }

    /// Snapshot of all live connections. Iteration order is unspecified and
    /// must not be relied upon.
    pub fn all(&self) -> Vec<Arc<Connection>> {
        self.conns.read().unwrap().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_writer() -> DtcWriter {
        let (_, server) = tokio::io::duplex(256);
        DtcWriter::spawn(server, "test".into())
    }

    #[tokio::test]
    async fn subscription_pair_stays_inverse() {
        let mut subs = SubscriptionPair::default();
        subs.subscribe(1, "BTC-ETH").unwrap();
        subs.subscribe(2, "BTC-LTC").unwrap();
        assert!(subs.is_consistent());

        // Same pair again: no-op.
        subs.subscribe(1, "BTC-ETH").unwrap();
        assert_eq!(subs.len(), 2);

        // Id reuse for a different symbol is refused, state unchanged.
        let err = subs.subscribe(1, "BTC-XMR").unwrap_err();
        assert_eq!(err, "BTC-ETH");
        assert!(subs.is_consistent());
        assert_eq!(subs.symbol_for(1), Some("BTC-ETH"));

        subs.unsubscribe(1);
        assert!(subs.is_consistent());
        assert_eq!(subs.id_for("BTC-ETH"), None);
        assert_eq!(subs.len(), 1);

        // Unsubscribing an unknown id is harmless.
        subs.unsubscribe(99);
        assert_eq!(subs.len(), 1);
    }

    #[tokio::test]
    async fn credentials_are_write_once() {
        let conn = Connection::new("1.2.3.4:5".into(), test_writer());
        assert!(conn.credentials().is_empty());
        conn.set_credentials(Credentials::new("k1", "s1"));
        conn.set_credentials(Credentials::new("k2", "s2"));
        assert_eq!(conn.credentials(), Credentials::new("k1", "s1"));
    }

    #[tokio::test]
    async fn registry_insert_remove() {
        let reg = Registry::new();
        let conn = Arc::new(Connection::new("1.2.3.4:5".into(), test_writer()));
        reg.insert(Arc::clone(&conn));
        assert_eq!(reg.len(), 1);
        assert!(reg.remove("1.2.3.4:5").is_some());
        assert!(reg.is_empty());
        assert!(reg.remove("1.2.3.4:5").is_none());
    }
}
