/*
[INPUT]:  Raw engine.io v4 / socket.io v5 text frames
[OUTPUT]: Parsed packets and encoded outbound frames
[POS]:    WebSocket layer - socket.io framing codec
[UPDATE]: When supporting new packet kinds or protocol revisions
*/

use serde_json::Value;

use crate::http::{Result, WallexError};

/// Client acknowledgement of the default namespace
pub const CONNECT_FRAME: &str = "40";
/// Client-side namespace disconnect
pub const DISCONNECT_FRAME: &str = "41";

/// Engine.io packet (outer framing)
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    /// `0{...}` handshake data (sid, pingInterval, ...)
    Open(Value),
    Close,
    Ping(String),
    Pong(String),
    Message(SocketPacket),
    Upgrade,
    Noop,
}

/// Socket.io packet carried in an engine.io message
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect(Value),
    Disconnect,
    Event { name: String, args: Vec<Value> },
    Ack(Vec<Value>),
    ConnectError(Value),
}

impl EnginePacket {
    pub fn parse(frame: &str) -> Result<Self> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| WallexError::Protocol("empty engine.io frame".to_string()))?;
        let rest = chars.as_str();

        match kind {
            '0' => Ok(EnginePacket::Open(parse_json_or_null(rest)?)),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(rest.to_string())),
            '3' => Ok(EnginePacket::Pong(rest.to_string())),
            '4' => Ok(EnginePacket::Message(SocketPacket::parse(rest)?)),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(WallexError::Protocol(format!(
                "unknown engine.io packet type {other:?}"
            ))),
        }
    }

    /// Reply to a server ping, echoing its data
    pub fn pong_frame(data: &str) -> String {
        format!("3{data}")
    }
}

impl SocketPacket {
    /// Parse `<type>[/namespace,][ackId][json]`
    pub fn parse(body: &str) -> Result<Self> {
        let mut chars = body.chars();
        let kind = chars
            .next()
            .ok_or_else(|| WallexError::Protocol("empty socket.io packet".to_string()))?;
        let mut rest = chars.as_str();

        if rest.starts_with('/') {
            rest = rest.find(',').map_or("", |idx| &rest[idx + 1..]);
        }
        let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());

        match kind {
            '0' => Ok(SocketPacket::Connect(parse_json_or_null(rest)?)),
            '1' => Ok(SocketPacket::Disconnect),
            '2' => {
                let mut items = parse_array(rest)?;
                if items.is_empty() {
                    return Err(WallexError::Protocol("socket.io event without name".to_string()));
                }
                let name = match items.remove(0) {
                    Value::String(name) => name,
                    other => {
                        return Err(WallexError::Protocol(format!(
                            "socket.io event name is not a string: {other}"
                        )));
                    }
                };
                Ok(SocketPacket::Event { name, args: items })
            }
            '3' => Ok(SocketPacket::Ack(parse_array(rest)?)),
            '4' => Ok(SocketPacket::ConnectError(parse_json_or_null(rest)?)),
            '5' | '6' => Err(WallexError::Protocol(
                "binary socket.io packets are not supported".to_string(),
            )),
            other => Err(WallexError::Protocol(format!(
                "unknown socket.io packet type {other:?}"
            ))),
        }
    }
}

/// Encode `42[name, ...args]`
pub fn event_frame(name: &str, args: &[Value]) -> String {
    let mut items = Vec::with_capacity(args.len() + 1);
    items.push(Value::String(name.to_string()));
    items.extend(args.iter().cloned());
    format!("42{}", Value::Array(items))
}

fn parse_json_or_null(raw: &str) -> Result<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(raw)?)
}

fn parse_array(raw: &str) -> Result<Vec<Value>> {
    match parse_json_or_null(raw)? {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(WallexError::Protocol(format!(
            "expected JSON array payload, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_open() {
        let frame = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;
        let packet = EnginePacket::parse(frame).unwrap();
        match packet {
            EnginePacket::Open(data) => assert_eq!(data["pingInterval"], 25000),
            other => panic!("Expected Open, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_ping_and_pong_frame() {
        assert_eq!(EnginePacket::parse("2").unwrap(), EnginePacket::Ping(String::new()));
        assert_eq!(
            EnginePacket::parse("2keepalive").unwrap(),
            EnginePacket::Ping("keepalive".to_string())
        );
        assert_eq!(EnginePacket::pong_frame("keepalive"), "3keepalive");
    }

    #[test]
    fn test_parse_namespace_connect() {
        let packet = EnginePacket::parse(r#"40{"sid":"sio-1"}"#).unwrap();
        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::Connect(json!({"sid": "sio-1"})))
        );
        assert_eq!(
            EnginePacket::parse("40").unwrap(),
            EnginePacket::Message(SocketPacket::Connect(Value::Null))
        );
    }

    #[test]
    fn test_parse_broadcaster_event() {
        let packet = EnginePacket::parse(
            r#"42["Broadcaster","USDTTMN@trade",{"price":"50000","qty":"1"}]"#,
        )
        .unwrap();
        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::Event {
                name: "Broadcaster".to_string(),
                args: vec![json!("USDTTMN@trade"), json!({"price": "50000", "qty": "1"})],
            })
        );
    }

    #[test]
    fn test_parse_event_with_namespace_and_ack_id() {
        let packet = EnginePacket::parse(r#"42/feed,17["tick",1]"#).unwrap();
        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::Event {
                name: "tick".to_string(),
                args: vec![json!(1)],
            })
        );
    }

    #[test]
    fn test_parse_connect_error() {
        let packet = EnginePacket::parse(r#"44{"message":"Invalid namespace"}"#).unwrap();
        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::ConnectError(
                json!({"message": "Invalid namespace"})
            ))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(EnginePacket::parse("").is_err());
        assert!(EnginePacket::parse("9").is_err());
        assert!(EnginePacket::parse("42{not json").is_err());
        assert!(EnginePacket::parse(r#"42[1,2]"#).is_err());
        assert!(EnginePacket::parse(r#"451-["bin",{"_placeholder":true,"num":0}]"#).is_err());
    }

    #[test]
    fn test_event_frame() {
        let frame = event_frame("subscribe", &[json!({"channel": "USDTTMN@trade"})]);
        assert_eq!(frame, r#"42["subscribe",{"channel":"USDTTMN@trade"}]"#);
    }
}
