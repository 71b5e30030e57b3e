//! Frame codec and encoding handshake.
//!
//! Framing is `[u16 LE total_length][u16 LE type_id][payload]` where
//! `total_length` includes the 4 header bytes. The decoder is streaming: it
//! accumulates chunks and yields complete frames without reallocating per
//! message; a short buffer reports how many bytes are still needed.
//!
//! The encoding handshake is the one message that is *not* protobuf: a fixed
//! 16-byte raw record exchanged before any other traffic.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use prost::Message;
use thiserror::Error;

use crate::types::{
    ENCODING_PROTOCOL_BUFFERS, MessageType, PROTOCOL_TYPE_MAGIC, PROTOCOL_VERSION,
};

/// Frame header length: u16 total_length + u16 type_id.
pub const HEADER_LEN: usize = 4;

/// Total wire size of an encoding handshake message, header included.
pub const ENCODING_MSG_LEN: usize = 16;

#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("frame length {0} shorter than header")]
    LengthTooShort(u16),
    #[error("bad encoding handshake: {0}")]
    BadHandshake(String),
    #[error("payload decode failed for type {0}: {1}")]
    Payload(u16, String),
}

// ---------------------------------------------------------------------------
// Streaming decoder
// ---------------------------------------------------------------------------

/// Result of one decode attempt.
#[derive(Debug, PartialEq)]
pub enum Decoded {
    /// A complete frame: wire type id and payload bytes.
    Frame { type_id: u16, payload: Bytes },
    /// Not enough buffered bytes. `Some(n)` = the frame needs `n` total
    /// buffered bytes; `None` = even the length prefix is incomplete.
    Need(Option<usize>),
}

/// Streaming frame decoder.
///
/// Feed chunks with [`feed`](FrameDecoder::feed) and drain frames with
/// [`next_frame`](FrameDecoder::next_frame) until it returns `Need`. Multiple
/// concatenated messages in one chunk all decode before more input is
/// required.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an incoming chunk to the internal buffer.
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Try to decode the next frame from the buffer.
    pub fn next_frame(&mut self) -> Result<Decoded, CodecError> {
        if self.buf.len() < 2 {
            return Ok(Decoded::Need(None));
        }
        let total = u16::from_le_bytes([self.buf[0], self.buf[1]]) as usize;
        if total < HEADER_LEN {
            return Err(CodecError::LengthTooShort(total as u16));
        }
        if self.buf.len() < total {
            return Ok(Decoded::Need(Some(total)));
        }

        let mut frame = self.buf.split_to(total);
        frame.advance(2); // total_length
        let type_id = frame.get_u16_le();
        Ok(Decoded::Frame { type_id, payload: frame.freeze() })
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Serialize a protobuf payload and prepend the 4-byte frame header.
pub fn encode_frame<M: Message>(msg_type: MessageType, payload: &M) -> Bytes {
    let body_len = payload.encoded_len();
    let total = HEADER_LEN + body_len;
    let mut buf = BytesMut::with_capacity(total);
    buf.put_u16_le(total as u16);
    buf.put_u16_le(msg_type.as_u16());
    payload.encode(&mut buf).expect("buffer sized to encoded_len");
    buf.freeze()
}

/// Decode a protobuf payload out of a frame body.
pub fn decode_payload<M: Message + Default>(type_id: u16, payload: &[u8]) -> Result<M, CodecError> {
    M::decode(payload).map_err(|e| CodecError::Payload(type_id, e.to_string()))
}

// ---------------------------------------------------------------------------
// Encoding handshake (raw, fixed 16 bytes)
// ---------------------------------------------------------------------------

/// The parsed body of a raw encoding request/response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingMsg {
    pub protocol_version: i32,
    pub encoding: i32,
}

impl EncodingMsg {
    /// The only response the server ever sends.
    pub fn protobuf_response() -> Self {
        Self { protocol_version: PROTOCOL_VERSION, encoding: ENCODING_PROTOCOL_BUFFERS }
    }
}

/// Parse a raw 16-byte encoding handshake payload (12 bytes, header already
/// stripped by the frame decoder).
pub fn parse_encoding_payload(payload: &[u8]) -> Result<EncodingMsg, CodecError> {
    if payload.len() != ENCODING_MSG_LEN - HEADER_LEN {
        return Err(CodecError::BadHandshake(format!(
            "payload length {} != {}",
            payload.len(),
            ENCODING_MSG_LEN - HEADER_LEN
        )));
    }
    let protocol_version = i32::from_le_bytes(payload[0..4].try_into().unwrap());
    let encoding = i32::from_le_bytes(payload[4..8].try_into().unwrap());
    if payload[8..12] != PROTOCOL_TYPE_MAGIC {
        return Err(CodecError::BadHandshake("missing DTC magic".into()));
    }
    Ok(EncodingMsg { protocol_version, encoding })
}

/// Serialize a complete 16-byte encoding handshake frame.
pub fn encode_encoding_frame(msg_type: MessageType, msg: EncodingMsg) -> Bytes {
    let mut buf = BytesMut::with_capacity(ENCODING_MSG_LEN);
    buf.put_u16_le(ENCODING_MSG_LEN as u16);
    buf.put_u16_le(msg_type.as_u16());
    buf.put_i32_le(msg.protocol_version);
    buf.put_i32_le(msg.encoding);
    buf.put_slice(&PROTOCOL_TYPE_MAGIC);
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Heartbeat, MarketDataReject};

    #[test]
    fn need_unknown_below_two_bytes() {
        let mut dec = FrameDecoder::new();
        assert_eq!(dec.next_frame().unwrap(), Decoded::Need(None));
        dec.feed(&[0x10]);
        assert_eq!(dec.next_frame().unwrap(), Decoded::Need(None));
    }

    #[test]
    fn need_total_length_when_partial() {
        let frame = encode_frame(
            MessageType::Heartbeat,
            &Heartbeat { num_dropped_messages: 3, current_date_time: 1_700_000_000 },
        );
        let mut dec = FrameDecoder::new();
        dec.feed(&frame[..3]);
        assert_eq!(dec.next_frame().unwrap(), Decoded::Need(Some(frame.len())));

        dec.feed(&frame[3..]);
        match dec.next_frame().unwrap() {
            Decoded::Frame { type_id, payload } => {
                assert_eq!(type_id, MessageType::Heartbeat.as_u16());
                let hb: Heartbeat = decode_payload(type_id, &payload).unwrap();
                assert_eq!(hb.num_dropped_messages, 3);
            }
            other => panic!("expected frame, got {other:?}"),
        }
        assert_eq!(dec.buffered(), 0);
    }

    #[test]
    fn multiple_messages_in_one_chunk() {
        let a = encode_frame(
            MessageType::MarketDataReject,
            &MarketDataReject { symbol_id: 1, reject_text: "one".into() },
        );
        let b = encode_frame(
            MessageType::MarketDataReject,
            &MarketDataReject { symbol_id: 2, reject_text: "two".into() },
        );
        let mut chunk = a.to_vec();
        chunk.extend_from_slice(&b);

        let mut dec = FrameDecoder::new();
        dec.feed(&chunk);

        let mut ids = Vec::new();
        while let Decoded::Frame { type_id, payload } = dec.next_frame().unwrap() {
            let r: MarketDataReject = decode_payload(type_id, &payload).unwrap();
            ids.push(r.symbol_id);
        }
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn frame_length_matches_header() {
        let msg = MarketDataReject { symbol_id: 9, reject_text: "Unknown symbol X-Y".into() };
        let frame = encode_frame(MessageType::MarketDataReject, &msg);
        let total = u16::from_le_bytes([frame[0], frame[1]]) as usize;
        assert_eq!(total, frame.len());
        assert_eq!(total, HEADER_LEN + msg.encoded_len());
    }

    #[test]
    fn bad_length_prefix_is_error() {
        let mut dec = FrameDecoder::new();
        dec.feed(&[0x02, 0x00, 0x00, 0x00]); // total_length = 2 < header
        assert!(matches!(dec.next_frame(), Err(CodecError::LengthTooShort(2))));
    }

    #[test]
    fn encode_decode_round_trip_is_bit_identical() {
        let msg = Heartbeat { num_dropped_messages: 42, current_date_time: 1_234_567_890 };
        let frame = encode_frame(MessageType::Heartbeat, &msg);
        let mut dec = FrameDecoder::new();
        dec.feed(&frame);
        let Decoded::Frame { type_id, payload } = dec.next_frame().unwrap() else {
            panic!("no frame");
        };
        let back: Heartbeat = decode_payload(type_id, &payload).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn encoding_handshake_round_trip() {
        let frame = encode_encoding_frame(
            MessageType::EncodingRequest,
            EncodingMsg { protocol_version: PROTOCOL_VERSION, encoding: ENCODING_PROTOCOL_BUFFERS },
        );
        assert_eq!(frame.len(), ENCODING_MSG_LEN);

        let mut dec = FrameDecoder::new();
        dec.feed(&frame);
        let Decoded::Frame { type_id, payload } = dec.next_frame().unwrap() else {
            panic!("no frame");
        };
        assert_eq!(type_id, MessageType::EncodingRequest.as_u16());
        let msg = parse_encoding_payload(&payload).unwrap();
        assert_eq!(msg.protocol_version, 7);
        assert_eq!(msg.encoding, ENCODING_PROTOCOL_BUFFERS);
    }

    #[test]
    fn encoding_response_is_exactly_sixteen_bytes() {
        let frame = encode_encoding_frame(
            MessageType::EncodingResponse,
            EncodingMsg::protobuf_response(),
        );
        assert_eq!(frame.len(), 16);
        assert_eq!(&frame[0..2], &16u16.to_le_bytes());
        assert_eq!(&frame[2..4], &7u16.to_le_bytes());
        assert_eq!(&frame[4..8], &7i32.to_le_bytes());
        assert_eq!(&frame[8..12], &2i32.to_le_bytes());
        assert_eq!(&frame[12..16], b"DTC\0");
    }

    #[test]
    fn truncated_handshake_rejected() {
        assert!(parse_encoding_payload(&[0u8; 8]).is_err());
        let mut bad = [0u8; 12];
        bad[8..12].copy_from_slice(b"XXXX");
        assert!(parse_encoding_payload(&bad).is_err());
    }
}
