/*
[INPUT]:  Market symbols and stream event kinds
[OUTPUT]: Channel names, channel lifecycle states and observer events
[POS]:    WebSocket layer - subscription vocabulary
[UPDATE]: When adding new event suffixes or lifecycle notifications
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::http::WallexError;

/// Streaming feed kind; rendered as the channel suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamEvent {
    #[serde(rename = "@marketCap")]
    MarketCap,
    #[serde(rename = "@buyDepth")]
    BuyDepth,
    #[serde(rename = "@sellDepth")]
    SellDepth,
    #[serde(rename = "@trade")]
    Trade,
}

impl StreamEvent {
    pub const ALL: [StreamEvent; 4] = [
        StreamEvent::MarketCap,
        StreamEvent::BuyDepth,
        StreamEvent::SellDepth,
        StreamEvent::Trade,
    ];

    pub fn suffix(&self) -> &'static str {
        match self {
            StreamEvent::MarketCap => "@marketCap",
            StreamEvent::BuyDepth => "@buyDepth",
            StreamEvent::SellDepth => "@sellDepth",
            StreamEvent::Trade => "@trade",
        }
    }
}

impl fmt::Display for StreamEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Accepts the suffix with or without the leading `@`
impl FromStr for StreamEvent {
    type Err = WallexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s.strip_prefix('@').unwrap_or(s);
        StreamEvent::ALL
            .into_iter()
            .find(|event| &event.suffix()[1..] == bare)
            .ok_or_else(|| {
                WallexError::validation(
                    "event",
                    format!("expected one of marketCap, buyDepth, sellDepth, trade; got {s:?}"),
                )
            })
    }
}

/// Topic on the broadcaster: `{symbol}{suffix}`, e.g. `USDTTMN@trade`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelName(String);

impl ChannelName {
    pub fn new(symbol: &str, event: StreamEvent) -> Self {
        Self(format!("{symbol}{}", event.suffix()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a subscription channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Connecting,
    Subscribed,
    Delivering,
    Disconnected,
}

/// Why a connection ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// `disconnect()`, a re-subscribe, or the channel being dropped
    Requested,
    /// One-shot mode delivered its message
    OneShotComplete,
    /// Server sent a close frame or socket.io disconnect
    ServerClosed,
    ConnectFailed,
    Error(String),
}

/// Notification pushed to the optional observer
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connected { url: String },
    Subscribed { channel: ChannelName },
    ConnectFailed { message: String },
    CallbackFailed { channel: ChannelName, message: String },
    Disconnected { reason: DisconnectReason },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_name_concatenates_suffix() {
        assert_eq!(
            ChannelName::new("USDTTMN", StreamEvent::Trade).as_str(),
            "USDTTMN@trade"
        );
        assert_eq!(
            ChannelName::new("BTCTMN", StreamEvent::MarketCap).to_string(),
            "BTCTMN@marketCap"
        );
    }

    #[test]
    fn test_stream_event_parse() {
        assert_eq!("@sellDepth".parse::<StreamEvent>().unwrap(), StreamEvent::SellDepth);
        assert_eq!("buyDepth".parse::<StreamEvent>().unwrap(), StreamEvent::BuyDepth);
        assert!("@depth".parse::<StreamEvent>().unwrap_err().is_validation_error());
    }
}
