//! # btx-dtc
//!
//! The DTC wire protocol as spoken by the bridge:
//!
//! - **Type ids** (`types`) — the closed enum of message type ids and the
//!   protocol constants (version, encodings)
//! - **Payloads** (`messages`) — protobuf message structs
//! - **Codec** (`codec`) — `u16` little-endian length + type framing, the
//!   streaming decoder, and the raw 16-byte encoding handshake
//! - **Writer** (`writer`) — a framed writer handle backed by a drain task
//!
//! Every framed message is `[u16 total_length][u16 type_id][payload]` with
//! both header fields little-endian and `total_length` counting the 4 header
//! bytes. Payloads are protobuf except the encoding handshake, which uses a
//! fixed 16-byte raw record.

pub mod codec;
pub mod messages;
pub mod types;
pub mod writer;

pub use types::MessageType;
