//! DTC protobuf payload structs.
//!
//! Authored in prost-generated style; the `.proto` source and generator are
//! external to this repository. Field tags follow the upstream message
//! definitions. Quantities travel in multiples of 1e-4 of the exchange base
//! unit; date-times are whole or floating-point seconds since epoch as noted
//! per field.

// -- session ----------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LogonRequest {
    #[prost(int32, tag = "1")]
    pub protocol_version: i32,
    #[prost(string, tag = "2")]
    pub username: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub password: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub general_text_data: ::prost::alloc::string::String,
    #[prost(int32, tag = "5")]
    pub integer_1: i32,
    #[prost(int32, tag = "6")]
    pub integer_2: i32,
    #[prost(int32, tag = "7")]
    pub heartbeat_interval_in_seconds: i32,
    #[prost(string, tag = "8")]
    pub trade_account: ::prost::alloc::string::String,
    #[prost(string, tag = "9")]
    pub hardware_identifier: ::prost::alloc::string::String,
    #[prost(string, tag = "10")]
    pub client_name: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LogonResponse {
    #[prost(int32, tag = "1")]
    pub protocol_version: i32,
    #[prost(enumeration = "LogonStatus", tag = "2")]
    pub result: i32,
    #[prost(string, tag = "3")]
    pub result_text: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub reconnect_address: ::prost::alloc::string::String,
    #[prost(int32, tag = "5")]
    pub integer_1: i32,
    #[prost(string, tag = "6")]
    pub server_name: ::prost::alloc::string::String,
    #[prost(bool, tag = "7")]
    pub market_depth_updates_best_bid_and_ask: bool,
    #[prost(bool, tag = "8")]
    pub trading_is_supported: bool,
    #[prost(bool, tag = "9")]
    pub ocoorders_supported: bool,
    #[prost(bool, tag = "10")]
    pub order_cancel_replace_supported: bool,
    #[prost(string, tag = "11")]
    pub symbol_exchange_delimiter: ::prost::alloc::string::String,
    #[prost(bool, tag = "12")]
    pub security_definitions_supported: bool,
    #[prost(bool, tag = "13")]
    pub historical_price_data_supported: bool,
    #[prost(bool, tag = "14")]
    pub resubscribe_when_market_data_feed_available: bool,
    #[prost(bool, tag = "15")]
    pub market_depth_is_supported: bool,
    #[prost(bool, tag = "16")]
    pub one_historical_price_data_request_per_connection: bool,
    #[prost(bool, tag = "17")]
    pub bracket_orders_supported: bool,
    #[prost(bool, tag = "18")]
    pub use_integer_price_order_messages: bool,
    #[prost(bool, tag = "19")]
    pub uses_multiple_positions_per_symbol: bool,
    #[prost(bool, tag = "20")]
    pub market_data_supported: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Heartbeat {
    #[prost(uint32, tag = "1")]
    pub num_dropped_messages: u32,
    /// Whole seconds since epoch.
    #[prost(int64, tag = "2")]
    pub current_date_time: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Logoff {
    #[prost(string, tag = "1")]
    pub reason: ::prost::alloc::string::String,
    #[prost(bool, tag = "2")]
    pub do_not_reconnect: bool,
}

// -- market data ------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MarketDataRequest {
    #[prost(enumeration = "RequestAction", tag = "1")]
    pub request_action: i32,
    #[prost(uint32, tag = "2")]
    pub symbol_id: u32,
    #[prost(string, tag = "3")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub exchange: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MarketDataReject {
    #[prost(uint32, tag = "1")]
    pub symbol_id: u32,
    #[prost(string, tag = "2")]
    pub reject_text: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MarketDataSnapshot {
    #[prost(uint32, tag = "1")]
    pub symbol_id: u32,
    #[prost(double, tag = "2")]
    pub session_settlement_price: f64,
    #[prost(double, tag = "3")]
    pub session_open_price: f64,
    #[prost(double, tag = "4")]
    pub session_high_price: f64,
    #[prost(double, tag = "5")]
    pub session_low_price: f64,
    #[prost(double, tag = "6")]
    pub session_volume: f64,
    #[prost(uint32, tag = "7")]
    pub session_num_trades: u32,
    #[prost(uint32, tag = "8")]
    pub open_interest: u32,
    #[prost(double, tag = "9")]
    pub bid_price: f64,
    #[prost(double, tag = "10")]
    pub ask_price: f64,
    #[prost(double, tag = "11")]
    pub ask_quantity: f64,
    #[prost(double, tag = "12")]
    pub bid_quantity: f64,
    #[prost(double, tag = "13")]
    pub last_trade_price: f64,
    #[prost(double, tag = "14")]
    pub last_trade_volume: f64,
    /// Floating-point seconds since epoch.
    #[prost(double, tag = "15")]
    pub last_trade_date_time: f64,
    /// Floating-point seconds since epoch.
    #[prost(double, tag = "16")]
    pub bid_ask_date_time: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MarketDataUpdateTrade {
    #[prost(uint32, tag = "1")]
    pub symbol_id: u32,
    #[prost(enumeration = "AtBidOrAsk", tag = "2")]
    pub at_bid_or_ask: i32,
    #[prost(double, tag = "3")]
    pub price: f64,
    #[prost(double, tag = "4")]
    pub volume: f64,
    /// Floating-point seconds since epoch.
    #[prost(double, tag = "5")]
    pub date_time: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MarketDataUpdateBidAsk {
    #[prost(uint32, tag = "1")]
    pub symbol_id: u32,
    #[prost(double, tag = "2")]
    pub bid_price: f64,
    #[prost(float, tag = "3")]
    pub bid_quantity: f32,
    #[prost(double, tag = "4")]
    pub ask_price: f64,
    #[prost(float, tag = "5")]
    pub ask_quantity: f32,
    /// Whole seconds since epoch.
    #[prost(uint32, tag = "6")]
    pub date_time: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MarketDataUpdateSessionVolume {
    #[prost(uint32, tag = "1")]
    pub symbol_id: u32,
    #[prost(double, tag = "2")]
    pub volume: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MarketDataUpdateSessionHigh {
    #[prost(uint32, tag = "1")]
    pub symbol_id: u32,
    #[prost(double, tag = "2")]
    pub price: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MarketDataUpdateSessionLow {
    #[prost(uint32, tag = "1")]
    pub symbol_id: u32,
    #[prost(double, tag = "2")]
    pub price: f64,
}

// -- market depth -----------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MarketDepthRequest {
    #[prost(enumeration = "RequestAction", tag = "1")]
    pub request_action: i32,
    #[prost(uint32, tag = "2")]
    pub symbol_id: u32,
    #[prost(string, tag = "3")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub exchange: ::prost::alloc::string::String,
    #[prost(int32, tag = "5")]
    pub num_levels: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MarketDepthReject {
    #[prost(uint32, tag = "1")]
    pub symbol_id: u32,
    #[prost(string, tag = "2")]
    pub reject_text: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MarketDepthSnapshotLevel {
    #[prost(uint32, tag = "1")]
    pub symbol_id: u32,
    #[prost(enumeration = "AtBidOrAsk", tag = "2")]
    pub side: i32,
    #[prost(double, tag = "3")]
    pub price: f64,
    #[prost(double, tag = "4")]
    pub quantity: f64,
    #[prost(uint32, tag = "5")]
    pub level: u32,
    #[prost(bool, tag = "6")]
    pub is_first_message_in_batch: bool,
    #[prost(bool, tag = "7")]
    pub is_last_message_in_batch: bool,
    /// Floating-point seconds since epoch.
    #[prost(double, tag = "8")]
    pub date_time: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MarketDepthUpdateLevel {
    #[prost(uint32, tag = "1")]
    pub symbol_id: u32,
    #[prost(enumeration = "AtBidOrAsk", tag = "2")]
    pub side: i32,
    #[prost(double, tag = "3")]
    pub price: f64,
    #[prost(double, tag = "4")]
    pub quantity: f64,
    #[prost(enumeration = "DepthUpdateType", tag = "5")]
    pub update_type: i32,
    /// Floating-point seconds since epoch.
    #[prost(double, tag = "6")]
    pub date_time: f64,
}

// -- security definitions ---------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SecurityDefinitionForSymbolRequest {
    #[prost(int32, tag = "1")]
    pub request_id: i32,
    #[prost(string, tag = "2")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub exchange: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SecurityDefinitionResponse {
    #[prost(int32, tag = "1")]
    pub request_id: i32,
    #[prost(string, tag = "2")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub exchange: ::prost::alloc::string::String,
    #[prost(enumeration = "SecurityType", tag = "4")]
    pub security_type: i32,
    #[prost(string, tag = "5")]
    pub description: ::prost::alloc::string::String,
    #[prost(float, tag = "6")]
    pub min_price_increment: f32,
    #[prost(enumeration = "PriceDisplayFormat", tag = "7")]
    pub price_display_format: i32,
    #[prost(float, tag = "8")]
    pub currency_value_per_increment: f32,
    #[prost(bool, tag = "9")]
    pub is_final_message: bool,
    #[prost(bool, tag = "10")]
    pub updates_bid_ask_only: bool,
    #[prost(bool, tag = "11")]
    pub has_market_depth_data: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SecurityDefinitionReject {
    #[prost(int32, tag = "1")]
    pub request_id: i32,
    #[prost(string, tag = "2")]
    pub reject_text: ::prost::alloc::string::String,
}

// -- trading ----------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SubmitNewSingleOrder {
    #[prost(string, tag = "1")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub exchange: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub trade_account: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub client_order_id: ::prost::alloc::string::String,
    #[prost(enumeration = "OrderTypeEnum", tag = "5")]
    pub order_type: i32,
    #[prost(enumeration = "BuySellEnum", tag = "6")]
    pub buy_sell: i32,
    #[prost(double, tag = "7")]
    pub price1: f64,
    #[prost(double, tag = "8")]
    pub price2: f64,
    /// Wire quantity: multiples of 1e-4 base units.
    #[prost(double, tag = "9")]
    pub quantity: f64,
    #[prost(enumeration = "TimeInForceEnum", tag = "10")]
    pub time_in_force: i32,
    #[prost(int64, tag = "11")]
    pub good_till_date_time: i64,
    #[prost(bool, tag = "12")]
    pub is_automated_order: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CancelOrder {
    #[prost(string, tag = "1")]
    pub server_order_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub client_order_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CancelReplaceOrder {
    #[prost(string, tag = "1")]
    pub server_order_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub client_order_id: ::prost::alloc::string::String,
    #[prost(double, tag = "3")]
    pub price1: f64,
    #[prost(double, tag = "4")]
    pub price2: f64,
    #[prost(double, tag = "5")]
    pub quantity: f64,
    #[prost(bool, tag = "6")]
    pub price1_is_set: bool,
    #[prost(bool, tag = "7")]
    pub price2_is_set: bool,
    #[prost(enumeration = "OrderTypeEnum", tag = "8")]
    pub order_type: i32,
    #[prost(enumeration = "TimeInForceEnum", tag = "9")]
    pub time_in_force: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OpenOrdersRequest {
    #[prost(int32, tag = "1")]
    pub request_id: i32,
    #[prost(bool, tag = "2")]
    pub request_all_orders: bool,
    #[prost(string, tag = "3")]
    pub server_order_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OrderUpdate {
    #[prost(int32, tag = "1")]
    pub request_id: i32,
    #[prost(int32, tag = "2")]
    pub total_num_messages: i32,
    #[prost(int32, tag = "3")]
    pub message_number: i32,
    #[prost(string, tag = "4")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub exchange: ::prost::alloc::string::String,
    #[prost(string, tag = "6")]
    pub previous_server_order_id: ::prost::alloc::string::String,
    #[prost(string, tag = "7")]
    pub server_order_id: ::prost::alloc::string::String,
    #[prost(string, tag = "8")]
    pub client_order_id: ::prost::alloc::string::String,
    #[prost(string, tag = "9")]
    pub exchange_order_id: ::prost::alloc::string::String,
    #[prost(enumeration = "OrderStatusEnum", tag = "10")]
    pub order_status: i32,
    #[prost(enumeration = "OrderUpdateReason", tag = "11")]
    pub order_update_reason: i32,
    #[prost(enumeration = "OrderTypeEnum", tag = "12")]
    pub order_type: i32,
    #[prost(enumeration = "BuySellEnum", tag = "13")]
    pub buy_sell: i32,
    #[prost(double, tag = "14")]
    pub price1: f64,
    #[prost(double, tag = "15")]
    pub price2: f64,
    #[prost(enumeration = "TimeInForceEnum", tag = "16")]
    pub time_in_force: i32,
    #[prost(double, tag = "17")]
    pub order_quantity: f64,
    #[prost(double, tag = "18")]
    pub filled_quantity: f64,
    #[prost(double, tag = "19")]
    pub remaining_quantity: f64,
    #[prost(double, tag = "20")]
    pub average_fill_price: f64,
    #[prost(double, tag = "21")]
    pub last_fill_price: f64,
    /// Whole seconds since epoch.
    #[prost(int64, tag = "22")]
    pub last_fill_date_time: i64,
    #[prost(double, tag = "23")]
    pub last_fill_quantity: f64,
    #[prost(string, tag = "24")]
    pub last_fill_execution_id: ::prost::alloc::string::String,
    #[prost(string, tag = "25")]
    pub trade_account: ::prost::alloc::string::String,
    #[prost(string, tag = "26")]
    pub info_text: ::prost::alloc::string::String,
    #[prost(bool, tag = "27")]
    pub no_orders: bool,
    /// Whole seconds since epoch.
    #[prost(int64, tag = "28")]
    pub order_received_date_time: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HistoricalOrderFillsRequest {
    #[prost(int32, tag = "1")]
    pub request_id: i32,
    #[prost(string, tag = "2")]
    pub server_order_id: ::prost::alloc::string::String,
    #[prost(int32, tag = "3")]
    pub number_of_days: i32,
    #[prost(string, tag = "4")]
    pub trade_account: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HistoricalOrderFillResponse {
    #[prost(int32, tag = "1")]
    pub request_id: i32,
    #[prost(int32, tag = "2")]
    pub total_number_messages: i32,
    #[prost(int32, tag = "3")]
    pub message_number: i32,
    #[prost(string, tag = "4")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub exchange: ::prost::alloc::string::String,
    #[prost(string, tag = "6")]
    pub server_order_id: ::prost::alloc::string::String,
    #[prost(enumeration = "BuySellEnum", tag = "7")]
    pub buy_sell: i32,
    #[prost(double, tag = "8")]
    pub price: f64,
    #[prost(double, tag = "9")]
    pub quantity: f64,
    /// Whole seconds since epoch.
    #[prost(int64, tag = "10")]
    pub date_time: i64,
    #[prost(string, tag = "11")]
    pub unique_execution_id: ::prost::alloc::string::String,
    #[prost(string, tag = "12")]
    pub trade_account: ::prost::alloc::string::String,
    #[prost(bool, tag = "13")]
    pub no_order_fills: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CurrentPositionsRequest {
    #[prost(int32, tag = "1")]
    pub request_id: i32,
    #[prost(string, tag = "2")]
    pub trade_account: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PositionUpdate {
    #[prost(int32, tag = "1")]
    pub request_id: i32,
    #[prost(int32, tag = "2")]
    pub total_number_messages: i32,
    #[prost(int32, tag = "3")]
    pub message_number: i32,
    #[prost(string, tag = "4")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub exchange: ::prost::alloc::string::String,
    #[prost(double, tag = "6")]
    pub quantity: f64,
    #[prost(double, tag = "7")]
    pub average_price: f64,
    #[prost(string, tag = "8")]
    pub position_identifier: ::prost::alloc::string::String,
    #[prost(string, tag = "9")]
    pub trade_account: ::prost::alloc::string::String,
    #[prost(bool, tag = "10")]
    pub no_positions: bool,
    #[prost(bool, tag = "11")]
    pub unsolicited: bool,
}

// -- accounts ---------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TradeAccountsRequest {
    #[prost(int32, tag = "1")]
    pub request_id: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TradeAccountResponse {
    #[prost(int32, tag = "1")]
    pub total_number_messages: i32,
    #[prost(int32, tag = "2")]
    pub message_number: i32,
    #[prost(string, tag = "3")]
    pub trade_account: ::prost::alloc::string::String,
    #[prost(int32, tag = "4")]
    pub request_id: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountBalanceRequest {
    #[prost(int32, tag = "1")]
    pub request_id: i32,
    #[prost(string, tag = "2")]
    pub trade_account: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountBalanceReject {
    #[prost(int32, tag = "1")]
    pub request_id: i32,
    #[prost(string, tag = "2")]
    pub reject_text: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountBalanceUpdate {
    #[prost(int32, tag = "1")]
    pub request_id: i32,
    #[prost(double, tag = "2")]
    pub cash_balance: f64,
    #[prost(double, tag = "3")]
    pub balance_available_for_new_positions: f64,
    #[prost(string, tag = "4")]
    pub account_currency: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub trade_account: ::prost::alloc::string::String,
    #[prost(double, tag = "6")]
    pub securities_value: f64,
    #[prost(double, tag = "7")]
    pub margin_requirement: f64,
    #[prost(int32, tag = "8")]
    pub total_number_messages: i32,
    #[prost(int32, tag = "9")]
    pub message_number: i32,
    #[prost(bool, tag = "10")]
    pub no_account_balances: bool,
    #[prost(bool, tag = "11")]
    pub unsolicited: bool,
}

// -- historical price data --------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HistoricalPriceDataRequest {
    #[prost(int32, tag = "1")]
    pub request_id: i32,
    #[prost(string, tag = "2")]
    pub symbol: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub exchange: ::prost::alloc::string::String,
    /// Bucket span in whole seconds; 0 = raw ticks.
    #[prost(int32, tag = "4")]
    pub record_interval: i32,
    /// Whole seconds since epoch; 0 = epoch start.
    #[prost(int64, tag = "5")]
    pub start_date_time: i64,
    /// Whole seconds since epoch; 0 = open-ended.
    #[prost(int64, tag = "6")]
    pub end_date_time: i64,
    #[prost(uint32, tag = "7")]
    pub max_days_to_return: u32,
    #[prost(bool, tag = "8")]
    pub use_zlib_compression: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HistoricalPriceDataResponseHeader {
    #[prost(int32, tag = "1")]
    pub request_id: i32,
    #[prost(int32, tag = "2")]
    pub record_interval: i32,
    #[prost(bool, tag = "3")]
    pub use_zlib_compression: bool,
    #[prost(bool, tag = "4")]
    pub no_records_to_return: bool,
    #[prost(float, tag = "5")]
    pub int_to_float_price_divisor: f32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HistoricalPriceDataReject {
    #[prost(int32, tag = "1")]
    pub request_id: i32,
    #[prost(string, tag = "2")]
    pub reject_text: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HistoricalPriceDataRecordResponse {
    #[prost(int32, tag = "1")]
    pub request_id: i32,
    /// Bucket start, whole seconds since epoch.
    #[prost(int64, tag = "2")]
    pub start_date_time: i64,
    #[prost(double, tag = "3")]
    pub open_price: f64,
    #[prost(double, tag = "4")]
    pub high_price: f64,
    #[prost(double, tag = "5")]
    pub low_price: f64,
    #[prost(double, tag = "6")]
    pub last_price: f64,
    #[prost(double, tag = "7")]
    pub volume: f64,
    #[prost(uint32, tag = "8")]
    pub num_trades: u32,
    #[prost(double, tag = "9")]
    pub bid_volume: f64,
    #[prost(double, tag = "10")]
    pub ask_volume: f64,
    #[prost(bool, tag = "11")]
    pub is_final_record: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HistoricalPriceDataTickRecordResponse {
    #[prost(int32, tag = "1")]
    pub request_id: i32,
    /// Floating-point seconds since epoch.
    #[prost(double, tag = "2")]
    pub date_time: f64,
    #[prost(enumeration = "AtBidOrAsk", tag = "3")]
    pub at_bid_or_ask: i32,
    #[prost(double, tag = "4")]
    pub price: f64,
    #[prost(double, tag = "5")]
    pub volume: f64,
    #[prost(bool, tag = "6")]
    pub is_final_record: bool,
}

// -- enums ------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum LogonStatus {
    LogonStatusUnset = 0,
    LogonSuccess = 1,
    LogonErrorNoReconnect = 2,
    LogonError = 3,
    LogonReconnectNewAddress = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum RequestAction {
    ActionUnset = 0,
    Subscribe = 1,
    Unsubscribe = 2,
    Snapshot = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum AtBidOrAsk {
    BidAskUnset = 0,
    AtBid = 1,
    AtAsk = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum DepthUpdateType {
    DepthUnset = 0,
    DepthInsertUpdateLevel = 1,
    DepthDeleteLevel = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum SecurityType {
    SecurityTypeUnset = 0,
    SecurityTypeFuture = 1,
    SecurityTypeStock = 2,
    SecurityTypeForex = 3,
    SecurityTypeIndex = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum PriceDisplayFormat {
    DisplayFormatDecimal0 = 0,
    DisplayFormatDecimal1 = 1,
    DisplayFormatDecimal2 = 2,
    DisplayFormatDecimal3 = 3,
    DisplayFormatDecimal4 = 4,
    DisplayFormatDecimal5 = 5,
    DisplayFormatDecimal6 = 6,
    DisplayFormatDecimal7 = 7,
    DisplayFormatDecimal8 = 8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum BuySellEnum {
    BuySellUnset = 0,
    Buy = 1,
    Sell = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum OrderTypeEnum {
    OrderTypeUnset = 0,
    OrderTypeMarket = 1,
    OrderTypeLimit = 2,
    OrderTypeStop = 3,
    OrderTypeStopLimit = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TimeInForceEnum {
    TifUnset = 0,
    TifDay = 1,
    TifGoodTillCanceled = 2,
    TifGoodTillDateTime = 3,
    TifImmediateOrCancel = 4,
    TifAllOrNone = 5,
    TifFillOrKill = 6,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum OrderStatusEnum {
    OrderStatusUnset = 0,
    OrderStatusOrdersRejected = 1,
    OrderStatusPendingOpen = 2,
    OrderStatusPendingChild = 3,
    OrderStatusOpen = 4,
    OrderStatusPendingCancelReplace = 5,
    OrderStatusPendingCancel = 6,
    OrderStatusFilled = 7,
    OrderStatusCanceled = 8,
    OrderStatusRejected = 9,
    OrderStatusPartiallyFilled = 10,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum OrderUpdateReason {
    ReasonUnset = 0,
    OpenOrdersRequestResponse = 1,
    NewOrderAccepted = 2,
    GeneralOrderUpdate = 3,
    OrderFilled = 4,
    OrderFilledPartially = 5,
    OrderCanceled = 6,
    OrderCancelReplaceComplete = 7,
    NewOrderRejected = 8,
    OrderCancelRejected = 9,
    OrderCancelReplaceRejected = 10,
}
