//! DTC TCP server: accept loop and per-connection framed read loop.
//!
//! Each accepted socket gets a writer drain task and a reader loop. The
//! reader feeds the streaming decoder and dispatches every complete frame;
//! it exits on EOF, read error, logoff, or writer closure, and removes the
//! connection from the registry on the way out.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{error, info, warn};

use btx_dtc::codec::{Decoded, FrameDecoder};
use btx_dtc::writer::DtcWriter;

use crate::connection::Connection;
use crate::handlers;
use crate::Bridge;

/// Read buffer size for client sockets.
const READ_BUF_LEN: usize = 8 * 1024;

/// Accept clients until shutdown.
pub async fn run_server(bridge: Arc<Bridge>, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let addr = ("0.0.0.0", bridge.settings.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding DTC port {}", bridge.settings.port))?;
    info!("DTC server listening on port {}", bridge.settings.port);

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!("DTC server shutting down");
                return Ok(());
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let bridge = Arc::clone(&bridge);
                        tokio::spawn(async move {
                            handle_client(bridge, stream, peer.to_string()).await;
                        });
                    }
                    Err(e) => warn!("accept failed: {e}"),
                }
            }
        }
    }
}

/// Serve one client until it disconnects.
pub async fn handle_client(bridge: Arc<Bridge>, stream: TcpStream, peer: String) {
    if let Err(e) = stream.set_nodelay(true) {
        warn!("[{peer}] set_nodelay failed: {e}");
    }
    let (mut read_half, write_half) = stream.into_split();
    let writer = DtcWriter::spawn(write_half, peer.clone());
    let conn = Arc::new(Connection::new(peer.clone(), writer.clone()));
    bridge.registry.insert(Arc::clone(&conn));
    info!("[{peer}] connected");

    let mut decoder = FrameDecoder::new();
    let mut buf = vec![0u8; READ_BUF_LEN];

    'conn: loop {
        tokio::select! {
            _ = writer.closed() => break 'conn,

            read = read_half.read(&mut buf) => {
                let n = match read {
                    Ok(0) => break 'conn,
                    Ok(n) => n,
                    Err(e) => {
                        warn!("[{peer}] read error: {e}");
                        break 'conn;
                    }
                };
                decoder.feed(&buf[..n]);
                loop {
                    match decoder.next_frame() {
                        Ok(Decoded::Frame { type_id, payload }) => {
                            if !handlers::dispatch(&bridge, &conn, type_id, &payload).await {
                                break 'conn;
                            }
                        }
                        Ok(Decoded::Need(_)) => break,
                        Err(e) => {
                            error!("[{peer}] framing error, closing: {e}");
                            break 'conn;
                        }
                    }
                }
            }
        }
    }

    bridge.registry.remove(&peer);
    info!("[{peer}] disconnected ({} dropped)", writer.dropped());
}
