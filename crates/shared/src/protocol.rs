//! Socket.IO v5 over Engine.IO v4 text framing, as spoken by the realtime endpoint.
//!
//! Only the text subset is supported: binary attachments are rejected. Every
//! WebSocket text frame is one Engine.IO packet; Engine.IO `message` packets
//! carry one Socket.IO packet.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Engine.IO protocol revision sent in the handshake query.
pub const ENGINE_IO_VERSION: &str = "4";

/// Default Socket.IO namespace.
pub const DEFAULT_NAMESPACE: &str = "/";

/// Server-pushed event carrying the full list of online user ids.
pub const GET_ONLINE_USERS: &str = "getOnlineUsers";

/// Lifecycle pseudo-events dispatched by the client itself.
pub const EVENT_CONNECT: &str = "connect";
pub const EVENT_DISCONNECT: &str = "disconnect";
pub const EVENT_CONNECT_ERROR: &str = "connect_error";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("empty packet")]
    Empty,
    #[error("unknown packet type {0:?}")]
    UnknownPacketType(char),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(String),
    #[error("unsupported packet: {0}")]
    Unsupported(&'static str),
    #[error("malformed event: {0}")]
    MalformedEvent(&'static str),
}

/// Handshake data sent by the server in the Engine.IO `open` packet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OpenPayload {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenPayload),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or(ProtocolError::Empty)?;
        let rest = chars.as_str();
        Ok(match kind {
            '0' => EnginePacket::Open(
                serde_json::from_str(rest).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?,
            ),
            '1' => EnginePacket::Close,
            '2' => EnginePacket::Ping(rest.to_string()),
            '3' => EnginePacket::Pong(rest.to_string()),
            '4' => EnginePacket::Message(rest.to_string()),
            '5' => EnginePacket::Upgrade,
            '6' => EnginePacket::Noop,
            other => return Err(ProtocolError::UnknownPacketType(other)),
        })
    }

    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(open) => {
                format!("0{}", serde_json::to_string(open).unwrap_or_default())
            }
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping(data) => format!("2{data}"),
            EnginePacket::Pong(data) => format!("3{data}"),
            EnginePacket::Message(data) => format!("4{data}"),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        data: Option<Value>,
    },
}

impl SocketPacket {
    /// Connect request for the default namespace.
    pub fn connect() -> Self {
        SocketPacket::Connect {
            namespace: DEFAULT_NAMESPACE.to_string(),
            data: None,
        }
    }

    pub fn disconnect() -> Self {
        SocketPacket::Disconnect {
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    pub fn event(name: impl Into<String>, args: Vec<Value>) -> Self {
        SocketPacket::Event {
            namespace: DEFAULT_NAMESPACE.to_string(),
            id: None,
            name: name.into(),
            args,
        }
    }

    pub fn decode(payload: &str) -> Result<Self, ProtocolError> {
        let mut chars = payload.chars();
        let kind = chars.next().ok_or(ProtocolError::Empty)?;
        let mut rest = chars.as_str();

        if matches!(kind, '5' | '6') {
            return Err(ProtocolError::Unsupported("binary attachments"));
        }

        let namespace = if rest.starts_with('/') {
            match rest.find(',') {
                Some(idx) => {
                    let nsp = &rest[..idx];
                    rest = &rest[idx + 1..];
                    nsp.to_string()
                }
                None => {
                    let nsp = rest.to_string();
                    rest = "";
                    nsp
                }
            }
        } else {
            DEFAULT_NAMESPACE.to_string()
        };

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let id = if digits > 0 {
            let parsed = rest[..digits]
                .parse::<u64>()
                .map_err(|_| ProtocolError::MalformedEvent("ack id out of range"))?;
            rest = &rest[digits..];
            Some(parsed)
        } else {
            None
        };

        let data = if rest.is_empty() {
            None
        } else {
            Some(
                serde_json::from_str::<Value>(rest)
                    .map_err(|e| ProtocolError::InvalidJson(e.to_string()))?,
            )
        };

        match kind {
            '0' => Ok(SocketPacket::Connect { namespace, data }),
            '1' => Ok(SocketPacket::Disconnect { namespace }),
            '2' => {
                let Some(Value::Array(mut items)) = data else {
                    return Err(ProtocolError::MalformedEvent("event payload is not an array"));
                };
                if items.is_empty() {
                    return Err(ProtocolError::MalformedEvent("event without a name"));
                }
                let Value::String(name) = items.remove(0) else {
                    return Err(ProtocolError::MalformedEvent("event name is not a string"));
                };
                Ok(SocketPacket::Event {
                    namespace,
                    id,
                    name,
                    args: items,
                })
            }
            // The client never requests acknowledgements.
            '3' => Err(ProtocolError::Unsupported("acknowledgements")),
            '4' => Ok(SocketPacket::ConnectError { namespace, data }),
            other => Err(ProtocolError::UnknownPacketType(other)),
        }
    }

    pub fn encode(&self) -> String {
        fn prefix(kind: char, namespace: &str) -> String {
            if namespace == DEFAULT_NAMESPACE {
                kind.to_string()
            } else {
                format!("{kind}{namespace},")
            }
        }

        match self {
            SocketPacket::Connect { namespace, data } => {
                let mut out = prefix('0', namespace);
                if let Some(data) = data {
                    out.push_str(&data.to_string());
                }
                out
            }
            SocketPacket::Disconnect { namespace } => prefix('1', namespace),
            SocketPacket::Event {
                namespace,
                id,
                name,
                args,
            } => {
                let mut out = prefix('2', namespace);
                if let Some(id) = id {
                    out.push_str(&id.to_string());
                }
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                out.push_str(&Value::Array(items).to_string());
                out
            }
            SocketPacket::ConnectError { namespace, data } => {
                let mut out = prefix('4', namespace);
                if let Some(data) = data {
                    out.push_str(&data.to_string());
                }
                out
            }
        }
    }

    /// Wrap this packet in an Engine.IO `message` frame.
    pub fn to_frame(&self) -> String {
        EnginePacket::Message(self.encode()).encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_server_handshake() {
        let frame = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
        let EnginePacket::Open(open) = EnginePacket::decode(frame).unwrap() else {
            panic!("expected open packet");
        };
        assert_eq!(open.sid, "abc");
        assert_eq!(open.ping_interval, 25000);
        assert_eq!(open.max_payload, Some(1_000_000));
    }

    #[test]
    fn ping_is_answered_with_matching_pong() {
        let ping = EnginePacket::decode("2probe").unwrap();
        assert_eq!(ping, EnginePacket::Ping("probe".into()));
        assert_eq!(EnginePacket::Pong("probe".into()).encode(), "3probe");
        assert_eq!(EnginePacket::Pong(String::new()).encode(), "3");
    }

    #[test]
    fn decodes_online_users_event() {
        let EnginePacket::Message(payload) =
            EnginePacket::decode(r#"42["getOnlineUsers",["a","b"]]"#).unwrap()
        else {
            panic!("expected message packet");
        };
        let packet = SocketPacket::decode(&payload).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                namespace: "/".into(),
                id: None,
                name: GET_ONLINE_USERS.into(),
                args: vec![json!(["a", "b"])],
            }
        );
    }

    #[test]
    fn decodes_namespace_and_ack_id() {
        let packet = SocketPacket::decode(r#"2/admin,12["ping",1]"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                namespace: "/admin".into(),
                id: Some(12),
                name: "ping".into(),
                args: vec![json!(1)],
            }
        );
    }

    #[test]
    fn connect_frames_for_default_namespace() {
        assert_eq!(SocketPacket::connect().to_frame(), "40");
        assert_eq!(SocketPacket::disconnect().to_frame(), "41");

        let ack = SocketPacket::decode(r#"0{"sid":"s1"}"#).unwrap();
        assert_eq!(
            ack,
            SocketPacket::Connect {
                namespace: "/".into(),
                data: Some(json!({ "sid": "s1" })),
            }
        );
    }

    #[test]
    fn event_encoding_matches_wire_format() {
        let packet = SocketPacket::event(GET_ONLINE_USERS, vec![json!(["u1"])]);
        assert_eq!(packet.to_frame(), r#"42["getOnlineUsers",["u1"]]"#);
    }

    #[test]
    fn rejects_binary_and_malformed_packets() {
        assert_eq!(
            SocketPacket::decode(r#"51-["upload",{"_placeholder":true,"num":0}]"#),
            Err(ProtocolError::Unsupported("binary attachments"))
        );
        assert!(matches!(
            SocketPacket::decode(r#"2{"not":"an array"}"#),
            Err(ProtocolError::MalformedEvent(_))
        ));
        assert!(matches!(
            SocketPacket::decode("2[42]"),
            Err(ProtocolError::MalformedEvent(_))
        ));
        assert_eq!(
            SocketPacket::decode(r#"31["ok"]"#),
            Err(ProtocolError::Unsupported("acknowledgements"))
        );
        assert_eq!(EnginePacket::decode(""), Err(ProtocolError::Empty));
        assert_eq!(
            EnginePacket::decode("9"),
            Err(ProtocolError::UnknownPacketType('9'))
        );
    }
}
