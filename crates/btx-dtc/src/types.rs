//! DTC message type ids and protocol constants.
//!
//! The type id travels on the wire as a little-endian `u16` in every frame
//! header. The enum is closed: ids outside it decode to `None` and the
//! message is dropped with a log, never an error to the peer.

/// Protocol version spoken on both the handshake and the logon response.
pub const PROTOCOL_VERSION: i32 = 7;

/// Payload encodings negotiable in the handshake.
pub const ENCODING_BINARY: i32 = 0;
pub const ENCODING_PROTOCOL_BUFFERS: i32 = 2;

/// Magic trailing bytes of the raw encoding handshake record.
pub const PROTOCOL_TYPE_MAGIC: [u8; 4] = *b"DTC\0";

/// Message type ids handled by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageType {
    LogonRequest = 1,
    LogonResponse = 2,
    Heartbeat = 3,
    Logoff = 5,
    EncodingRequest = 6,
    EncodingResponse = 7,

    MarketDataRequest = 101,
    MarketDepthRequest = 102,
    MarketDataReject = 103,
    MarketDataSnapshot = 104,
    MarketDepthUpdateLevel = 106,
    MarketDataUpdateTrade = 107,
    MarketDataUpdateBidAsk = 108,
    MarketDataUpdateSessionVolume = 113,
    MarketDataUpdateSessionHigh = 114,
    MarketDataUpdateSessionLow = 115,
    MarketDepthReject = 121,
    MarketDepthSnapshotLevel = 122,

    CancelOrder = 203,
    CancelReplaceOrder = 204,
    SubmitNewSingleOrder = 208,

    OpenOrdersRequest = 300,
    OrderUpdate = 301,
    HistoricalOrderFillsRequest = 303,
    HistoricalOrderFillResponse = 304,
    CurrentPositionsRequest = 305,
    PositionUpdate = 306,

    TradeAccountsRequest = 400,
    TradeAccountResponse = 401,

    SecurityDefinitionForSymbolRequest = 506,
    SecurityDefinitionResponse = 507,
    SecurityDefinitionReject = 509,

    AccountBalanceUpdate = 600,
    AccountBalanceRequest = 601,
    AccountBalanceReject = 602,

    HistoricalPriceDataRequest = 800,
    HistoricalPriceDataResponseHeader = 801,
    HistoricalPriceDataReject = 802,
    HistoricalPriceDataRecordResponse = 803,
    HistoricalPriceDataTickRecordResponse = 804,
}

impl MessageType {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Decode a wire type id. Unknown ids return `None`.
    pub fn from_u16(v: u16) -> Option<Self> {
        use MessageType::*;
        Some(match v {
            1 => LogonRequest,
            2 => LogonResponse,
            3 => Heartbeat,
            5 => Logoff,
            6 => EncodingRequest,
            7 => EncodingResponse,
            101 => MarketDataRequest,
            102 => MarketDepthRequest,
            103 => MarketDataReject,
            104 => MarketDataSnapshot,
            106 => MarketDepthUpdateLevel,
            107 => MarketDataUpdateTrade,
            108 => MarketDataUpdateBidAsk,
            113 => MarketDataUpdateSessionVolume,
            114 => MarketDataUpdateSessionHigh,
            115 => MarketDataUpdateSessionLow,
            121 => MarketDepthReject,
            122 => MarketDepthSnapshotLevel,
            203 => CancelOrder,
            204 => CancelReplaceOrder,
            208 => SubmitNewSingleOrder,
            300 => OpenOrdersRequest,
            301 => OrderUpdate,
            303 => HistoricalOrderFillsRequest,
            304 => HistoricalOrderFillResponse,
            305 => CurrentPositionsRequest,
            306 => PositionUpdate,
            400 => TradeAccountsRequest,
            401 => TradeAccountResponse,
            506 => SecurityDefinitionForSymbolRequest,
            507 => SecurityDefinitionResponse,
            509 => SecurityDefinitionReject,
            600 => AccountBalanceUpdate,
            601 => AccountBalanceRequest,
            602 => AccountBalanceReject,
            800 => HistoricalPriceDataRequest,
            801 => HistoricalPriceDataResponseHeader,
            802 => HistoricalPriceDataReject,
            803 => HistoricalPriceDataRecordResponse,
            804 => HistoricalPriceDataTickRecordResponse,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_variant() {
        let all = [
            MessageType::LogonRequest,
            MessageType::LogonResponse,
            MessageType::Heartbeat,
            MessageType::Logoff,
            MessageType::EncodingRequest,
            MessageType::EncodingResponse,
            MessageType::MarketDataRequest,
            MessageType::MarketDepthRequest,
            MessageType::MarketDataReject,
            MessageType::MarketDataSnapshot,
            MessageType::MarketDepthUpdateLevel,
            MessageType::MarketDataUpdateTrade,
            MessageType::MarketDataUpdateBidAsk,
            MessageType::MarketDataUpdateSessionVolume,
            MessageType::MarketDataUpdateSessionHigh,
            MessageType::MarketDataUpdateSessionLow,
            MessageType::MarketDepthReject,
            MessageType::MarketDepthSnapshotLevel,
            MessageType::CancelOrder,
            MessageType::CancelReplaceOrder,
            MessageType::SubmitNewSingleOrder,
            MessageType::OpenOrdersRequest,
            MessageType::OrderUpdate,
            MessageType::HistoricalOrderFillsRequest,
            MessageType::HistoricalOrderFillResponse,
            MessageType::CurrentPositionsRequest,
            MessageType::PositionUpdate,
            MessageType::TradeAccountsRequest,
            MessageType::TradeAccountResponse,
            MessageType::SecurityDefinitionForSymbolRequest,
            MessageType::SecurityDefinitionResponse,
            MessageType::SecurityDefinitionReject,
            MessageType::AccountBalanceUpdate,
            MessageType::AccountBalanceRequest,
            MessageType::AccountBalanceReject,
            MessageType::HistoricalPriceDataRequest,
            MessageType::HistoricalPriceDataResponseHeader,
            MessageType::HistoricalPriceDataReject,
            MessageType::HistoricalPriceDataRecordResponse,
            MessageType::HistoricalPriceDataTickRecordResponse,
        ];
        for t in all {
            assert_eq!(MessageType::from_u16(t.as_u16()), Some(t));
        }
    }

    #[test]
    fn unknown_id_is_none() {
        assert_eq!(MessageType::from_u16(0), None);
        assert_eq!(MessageType::from_u16(9999), None);
    }
}
