/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Wallex adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod http;
pub mod types;
pub mod ws;

// Re-export commonly used types from http
pub use http::{
    AccountManage,
    ClientConfig,
    Credentials,
    MarketInfo,
    MarketsOtc,
    OrdersManage,
    Result,
    WallexClient,
    WallexError,
};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{
    ChannelConfig,
    ChannelEvent,
    ChannelName,
    ChannelState,
    StreamEvent,
    SubscriptionChannel,
};
