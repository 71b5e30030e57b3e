//! Framed writer handle.
//!
//! Each client connection owns one [`DtcWriter`]. Frames are submitted to a
//! bounded channel and written to the socket by a background drain task,
//! decoupling fan-out from per-client socket speed:
//!
//! - Handler responses use [`send`](DtcWriter::send), which waits for space.
//! - Fan-out paths use [`try_send`](DtcWriter::try_send); a full channel
//!   drops the frame and bumps the dropped counter reported in heartbeats.
//! - Sends on a closed writer are silently discarded either way; the owner
//!   observes closure via [`closed`](DtcWriter::closed) and tears down.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use bytes::Bytes;
use prost::Message;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::codec::encode_frame;
use crate::types::MessageType;

/// Frames buffered per connection before fan-out starts dropping.
const WRITER_QUEUE_DEPTH: usize = 1024;

/// Sending half of a connection's outbound pipe.
#[derive(Debug, Clone)]
pub struct DtcWriter {
    tx: mpsc::Sender<Bytes>,
    dropped: Arc<AtomicU32>,
    closed_rx: watch::Receiver<bool>,
}

impl DtcWriter {
    /// Create a writer whose drain task writes to `sink`.
    ///
    /// The drain task exits (and marks the writer closed) on the first write
    /// error or when every sender is gone.
    pub fn spawn<W>(mut sink: W, peer: String) -> Self
    where
        W: tokio::io::AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<Bytes>(WRITER_QUEUE_DEPTH);
        let (closed_tx, closed_rx) = watch::channel(false);

        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if let Err(e) = sink.write_all(&frame).await {
                    warn!("[{peer}] write error, closing writer: {e}");
                    break;
                }
            }
            let _ = sink.shutdown().await;
            let _ = closed_tx.send(true);
            debug!("[{peer}] writer drained");
        });

        Self { tx, dropped: Arc::new(AtomicU32::new(0)), closed_rx }
    }

    /// Encode and send one message, waiting for queue space.
    pub async fn send<M: Message>(&self, msg_type: MessageType, payload: &M) {
        let _ = self.tx.send(encode_frame(msg_type, payload)).await;
    }

    /// Encode and send without waiting; drops (and counts) when full.
    pub fn try_send<M: Message>(&self, msg_type: MessageType, payload: &M) {
        self.try_send_raw(encode_frame(msg_type, payload));
    }

    /// Send an already-framed message without waiting.
    pub fn try_send_raw(&self, frame: Bytes) {
        match self.tx.try_send(frame) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    /// Frames dropped so far because the client could not keep up.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// True once the drain task has exited.
    pub fn is_closed(&self) -> bool {
        *self.closed_rx.borrow()
    }

    /// Resolve when the drain task exits. Used by per-connection timers to
    /// stop themselves without a back-pointer into the registry.
    pub async fn closed(&self) {
        let mut rx = self.closed_rx.clone();
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Decoded, FrameDecoder, decode_payload};
    use crate::messages::Heartbeat;

    #[tokio::test]
    async fn frames_reach_the_sink_in_order() {
        let (client, server) = tokio::io::duplex(4096);
        let writer = DtcWriter::spawn(server, "test".into());

        for n in 0..3u32 {
            writer
                .send(
                    MessageType::Heartbeat,
                    &Heartbeat { num_dropped_messages: n, current_date_time: 0 },
                )
                .await;
        }

        let mut dec = FrameDecoder::new();
        let mut got = Vec::new();
        let mut buf = [0u8; 1024];
        let mut reader = client;
        use tokio::io::AsyncReadExt;
        while got.len() < 3 {
            let n = reader.read(&mut buf).await.unwrap();
            dec.feed(&buf[..n]);
            while let Decoded::Frame { type_id, payload } = dec.next_frame().unwrap() {
                let hb: Heartbeat = decode_payload(type_id, &payload).unwrap();
                got.push(hb.num_dropped_messages);
            }
        }
        assert_eq!(got, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn send_after_close_is_silently_dropped() {
        let (client, server) = tokio::io::duplex(64);
        let writer = DtcWriter::spawn(server, "test".into());
        drop(client);

        // Let the drain task observe the broken pipe.
        writer
            .send(MessageType::Heartbeat, &Heartbeat::default())
            .await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        // No panic, no error; closure is observable.
        writer.try_send(MessageType::Heartbeat, &Heartbeat::default());
        writer.closed().await;
        assert!(writer.is_closed());
    }
}
