/*
[INPUT]:  Channel configuration, symbols and stream events
[OUTPUT]: Streaming payloads delivered to a subscription callback
[POS]:    WebSocket layer - real-time data streams
[UPDATE]: When adding new channels or changing connection logic
*/

pub mod client;
pub mod message;
pub mod packet;

pub use client::{
    CallbackError, CallbackResult, ChannelConfig, MessageCallback, SubscriptionChannel, socket_url,
};
pub use message::{ChannelEvent, ChannelName, ChannelState, DisconnectReason, StreamEvent};
pub use packet::{EnginePacket, SocketPacket};
