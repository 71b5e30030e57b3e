//! Historical DTC query server.
//!
//! Speaks the same framed protocol as the live bridge but handles only the
//! session messages and `historical_price_data_request`. Queries stream
//! either raw ticks (`record_interval == 0`) or granulated OHLCV records,
//! always terminated by an `is_final_record` sentinel.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{error, info, warn};

use btx_core::types::Side;
use btx_dtc::MessageType;
use btx_dtc::codec::{
    Decoded, EncodingMsg, FrameDecoder, decode_payload, encode_encoding_frame,
    parse_encoding_payload,
};
use btx_dtc::messages::{self, AtBidOrAsk, LogonStatus};
use btx_dtc::writer::DtcWriter;

use crate::granulator::Granulator;
use crate::store::TickStore;

/// Shared state of the historical service.
pub struct HistService {
    pub server_name: String,
    pub port: u16,
    pub stores: Arc<HashMap<String, TickStore>>,
}

/// Accept clients until shutdown.
pub async fn run_server(service: Arc<HistService>, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", service.port))
        .await
        .with_context(|| format!("binding historical port {}", service.port))?;
    info!("historical server listening on port {}", service.port);

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!("historical server shutting down");
                return Ok(());
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let service = Arc::clone(&service);
                        tokio::spawn(async move {
                            handle_client(service, stream, peer.to_string()).await;
                        });
                    }
                    Err(e) => warn!("accept failed: {e}"),
                }
            }
        }
    }
}

async fn handle_client(service: Arc<HistService>, stream: TcpStream, peer: String) {
    let (mut read_half, write_half) = stream.into_split();
    let writer = DtcWriter::spawn(write_half, peer.clone());
    info!("[{peer}] connected");

    let mut decoder = FrameDecoder::new();
    let mut buf = vec![0u8; 8 * 1024];

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
                            if !handle_frame(&service, &writer, &peer, type_id, &payload).await {
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
    info!("[{peer}] disconnected");
}

async fn handle_frame(
    service: &HistService,
    writer: &DtcWriter,
    peer: &str,
    type_id: u16,
    payload: &[u8],
) -> bool {
    match MessageType::from_u16(type_id) {
        Some(MessageType::EncodingRequest) => {
            match parse_encoding_payload(payload) {
                Ok(_) => writer.try_send_raw(encode_encoding_frame(
                    MessageType::EncodingResponse,
                    EncodingMsg::protobuf_response(),
                )),
                Err(e) => warn!("[{peer}] bad encoding request: {e}"),
            }
            true
        }
        Some(MessageType::LogonRequest) => {
            if let Ok(req) = decode_payload::<messages::LogonRequest>(type_id, payload) {
                info!("[{peer}] logon from {:?}", req.client_name);
            }
            writer
                .send(
                    MessageType::LogonResponse,
                    &messages::LogonResponse {
                        protocol_version: btx_dtc::types::PROTOCOL_VERSION,
                        result: LogonStatus::LogonSuccess as i32,
                        result_text: "Historical data".to_string(),
                        server_name: service.server_name.clone(),
                        symbol_exchange_delimiter: "-".to_string(),
                        historical_price_data_supported: true,
                        one_historical_price_data_request_per_connection: true,
                        ..Default::default()
                    },
                )
                .await;
            true
        }
        Some(MessageType::Heartbeat) => true,
        Some(MessageType::Logoff) => false,
        Some(MessageType::HistoricalPriceDataRequest) => {
            match decode_payload::<messages::HistoricalPriceDataRequest>(type_id, payload) {
                Ok(req) => serve_history(writer, &service.stores, &req).await,
                Err(e) => warn!("[{peer}] dropped malformed request: {e}"),
            }
            true
        }
        Some(other) => {
            warn!("[{peer}] unexpected {other:?}, dropped");
            true
        }
        None => {
            warn!("[{peer}] unknown message type {type_id}, dropped");
            true
        }
    }
}

/// Answer one historical price data request.
pub async fn serve_history(
    writer: &DtcWriter,
    stores: &HashMap<String, TickStore>,
    req: &messages::HistoricalPriceDataRequest,
) {
    let Some(store) = stores.get(&req.symbol) else {
        writer
            .send(
                MessageType::HistoricalPriceDataReject,
                &messages::HistoricalPriceDataReject {
                    request_id: req.request_id,
                    reject_text: format!("Unknown symbol {}", req.symbol),
                },
            )
            .await;
        return;
    };

    // 0 means epoch start / open-ended respectively.
    let start_ns = req.start_date_time.max(0) as u64 * 1_000_000_000;
    let end_ns = (req.end_date_time > 0)
        .then(|| req.end_date_time as u64 * 1_000_000_000 + 999_999_999);

    let mut ticks = store.range(start_ns, end_ns).peekable();
    writer
        .send(
            MessageType::HistoricalPriceDataResponseHeader,
            &messages::HistoricalPriceDataResponseHeader {
                request_id: req.request_id,
                record_interval: req.record_interval,
                use_zlib_compression: false,
                no_records_to_return: ticks.peek().is_none(),
                int_to_float_price_divisor: 1.0,
            },
        )
        .await;

    if req.record_interval <= 0 {
        // Raw tick stream.
        for tick in ticks {
            let tick = match tick {
                Ok(t) => t,
                Err(e) => {
                    error!("tick scan failed: {e}");
                    break;
                }
            };
            let at = match tick.side {
                Side::Buy => AtBidOrAsk::AtAsk,
                Side::Sell => AtBidOrAsk::AtBid,
            };
            writer
                .send(
                    MessageType::HistoricalPriceDataTickRecordResponse,
                    &messages::HistoricalPriceDataTickRecordResponse {
                        request_id: req.request_id,
                        date_time: tick.ts_ns as f64 / 1e9,
                        at_bid_or_ask: at as i32,
                        price: tick.price,
                        volume: tick.qty,
                        is_final_record: false,
                    },
                )
                .await;
        }
        writer
            .send(
                MessageType::HistoricalPriceDataTickRecordResponse,
                &messages::HistoricalPriceDataTickRecordResponse {
                    request_id: req.request_id,
                    is_final_record: true,
                    ..Default::default()
                },
            )
            .await;
        return;
    }

    // Granulated OHLCV stream.
    let span_ns = req.record_interval as u64 * 1_000_000_000;
    let mut granulator = Granulator::new(span_ns);
    let emit = |bar: crate::granulator::Bar| {
        messages::HistoricalPriceDataRecordResponse {
            request_id: req.request_id,
            start_date_time: (bar.start_ns / 1_000_000_000) as i64,
            open_price: bar.open,
            high_price: bar.high,
            low_price: bar.low,
            last_price: bar.last,
            volume: bar.volume,
            num_trades: bar.num_trades,
            bid_volume: bar.bid_volume.unwrap_or(0.0),
            ask_volume: bar.ask_volume.unwrap_or(0.0),
            is_final_record: false,
        }
    };

    for tick in ticks {
        let tick = match tick {
            Ok(t) => t,
            Err(e) => {
                error!("tick scan failed: {e}");
                break;
            }
        };
        if let Some(bar) = granulator.push(&tick) {
            let record = emit(bar);
            writer.send(MessageType::HistoricalPriceDataRecordResponse, &record).await;
        }
    }
    if let Some(bar) = granulator.finish() {
        let record = emit(bar);
        writer.send(MessageType::HistoricalPriceDataRecordResponse, &record).await;
    }
    writer
        .send(
            MessageType::HistoricalPriceDataRecordResponse,
            &messages::HistoricalPriceDataRecordResponse {
                request_id: req.request_id,
                is_final_record: true,
                ..Default::default()
            },
        )
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use btx_bridge::bittrex::MarketTrade;
    use tokio::io::{AsyncReadExt, DuplexStream};

    fn seeded_stores() -> (tempfile::TempDir, HashMap<String, TickStore>) {
        let dir = tempfile::tempdir().unwrap();
        let store = TickStore::open(dir.path(), "BTC-ETH").unwrap();
        store
            .insert_trades(&[
                MarketTrade {
                    timestamp_ns: 100_000_000_000,
                    side: Side::Buy,
                    price: 0.05,
                    quantity: 1.0,
                },
                MarketTrade {
                    timestamp_ns: 130_000_000_000,
                    side: Side::Sell,
                    price: 0.06,
                    quantity: 2.0,
                },
                MarketTrade {
                    timestamp_ns: 200_000_000_000,
                    side: Side::Buy,
                    price: 0.04,
                    quantity: 3.0,
                },
            ])
            .unwrap();
        let mut stores = HashMap::new();
        stores.insert("BTC-ETH".to_string(), store);
        (dir, stores)
    }

    async fn recv_frame(client: &mut DuplexStream, dec: &mut FrameDecoder) -> (u16, bytes::Bytes) {
        let mut buf = [0u8; 4096];
        loop {
            if let Decoded::Frame { type_id, payload } = dec.next_frame().unwrap() {
                return (type_id, payload);
            }
            let n = tokio::time::timeout(Duration::from_secs(2), client.read(&mut buf))
                .await
                .expect("timed out")
                .expect("read failed");
            assert!(n > 0);
            dec.feed(&buf[..n]);
        }
    }

    #[tokio::test]
    async fn tick_query_streams_raw_records_and_sentinel() {
        let (_dir, stores) = seeded_stores();
        let (mut client, server) = tokio::io::duplex(64 * 1024);
        let writer = DtcWriter::spawn(server, "test".into());

        let req = messages::HistoricalPriceDataRequest {
            request_id: 4,
            symbol: "BTC-ETH".into(),
            exchange: "BTREX".into(),
            record_interval: 0,
            ..Default::default()
        };
        serve_history(&writer, &stores, &req).await;

        let mut dec = FrameDecoder::new();
        let (t, p) = recv_frame(&mut client, &mut dec).await;
        assert_eq!(t, MessageType::HistoricalPriceDataResponseHeader.as_u16());
        let header: messages::HistoricalPriceDataResponseHeader = decode_payload(t, &p).unwrap();
        assert!(!header.no_records_to_return);
        assert!(!header.use_zlib_compression);

        let mut prices = Vec::new();
        loop {
            let (t, p) = recv_frame(&mut client, &mut dec).await;
            assert_eq!(t, MessageType::HistoricalPriceDataTickRecordResponse.as_u16());
            let rec: messages::HistoricalPriceDataTickRecordResponse =
                decode_payload(t, &p).unwrap();
            if rec.is_final_record {
                break;
            }
            prices.push(rec.price);
        }
        assert_eq!(prices, vec![0.05, 0.06, 0.04]);
    }

    #[tokio::test]
    async fn bar_query_granulates_and_scopes_by_time() {
        let (_dir, stores) = seeded_stores();
        let (mut client, server) = tokio::io::duplex(64 * 1024);
        let writer = DtcWriter::spawn(server, "test".into());

        // 60 s bars over the whole store: first two ticks share a bucket.
        let req = messages::HistoricalPriceDataRequest {
            request_id: 5,
            symbol: "BTC-ETH".into(),
            exchange: "BTREX".into(),
            record_interval: 60,
            start_date_time: 0,
            end_date_time: 0,
            ..Default::default()
        };
        serve_history(&writer, &stores, &req).await;

        let mut dec = FrameDecoder::new();
        let (t, _p) = recv_frame(&mut client, &mut dec).await;
        assert_eq!(t, MessageType::HistoricalPriceDataResponseHeader.as_u16());

        let mut bars = Vec::new();
        loop {
            let (t, p) = recv_frame(&mut client, &mut dec).await;
            assert_eq!(t, MessageType::HistoricalPriceDataRecordResponse.as_u16());
            let rec: messages::HistoricalPriceDataRecordResponse = decode_payload(t, &p).unwrap();
            if rec.is_final_record {
                break;
            }
            bars.push(rec);
        }
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].start_date_time, 100);
        assert_eq!(bars[0].open_price, 0.05);
        assert_eq!(bars[0].high_price, 0.06);
        assert_eq!(bars[0].last_price, 0.06);
        assert_eq!(bars[0].num_trades, 2);
        assert_eq!(bars[0].bid_volume, 1.0);
        assert_eq!(bars[0].ask_volume, 2.0);
        assert_eq!(bars[1].start_date_time, 200);
        assert_eq!(bars[1].num_trades, 1);
    }

    #[tokio::test]
    async fn unknown_symbol_rejected() {
        let (_dir, stores) = seeded_stores();
        let (mut client, server) = tokio::io::duplex(4096);
        let writer = DtcWriter::spawn(server, "test".into());

        let req = messages::HistoricalPriceDataRequest {
            request_id: 6,
            symbol: "NO-PE".into(),
            ..Default::default()
        };
        serve_history(&writer, &stores, &req).await;

        let mut dec = FrameDecoder::new();
        let (t, p) = recv_frame(&mut client, &mut dec).await;
        assert_eq!(t, MessageType::HistoricalPriceDataReject.as_u16());
        let rej: messages::HistoricalPriceDataReject = decode_payload(t, &p).unwrap();
        assert_eq!(rej.reject_text, "Unknown symbol NO-PE");
    }
}
