//! JSON control messages exchanged with a VM server.
//!
//! Every control message is a JSON object with a `"type"` field naming the
//! variant; all other fields sit in the same object:
//!
//! ```json
//! {"type":"turnUpdate","secondsRemaining":12,"queueSize":3}
//! {"type":"mouse","x":100,"y":200,"mask":1}
//! ```
//!
//! Serde's `#[serde(tag = "type")]` handles the discriminant, and the field
//! names are camelCase on the wire.
//!
//! The two directions use distinct enums so that sending a server-only
//! message to the server (or the reverse) is a compile-time error.

use serde::{Deserialize, Serialize};

use crate::domain::user::UserRank;

// ── Server → client ───────────────────────────────────────────────────────────

/// Control messages a VM server sends inside a text frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Liveness probe.  The client must echo `ping_number` back immediately.
    #[serde(rename_all = "camelCase")]
    Ping { ping_number: u64 },

    /// Reply to `getServerInfo`.
    #[serde(rename_all = "camelCase")]
    ServerInfo {
        server_name: String,
        #[serde(default)]
        server_description: String,
        /// Base64-encoded JPEG preview of the VM screen.
        #[serde(default)]
        thumbnail: String,
    },

    /// The VM's display resolution changed.
    VgaSizeUpdate { width: u32, height: u32 },

    /// Handshake accepted; carries the rank the server assigned to us.
    #[serde(rename_all = "camelCase")]
    Connected { user_rank: UserRank },

    /// We now hold the turn.
    #[serde(rename_all = "camelCase")]
    YourTurn {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seconds_remaining: Option<u32>,
    },

    /// Someone else holds the turn (or nobody does).
    ///
    /// `seconds_remaining` is absent when the turn is free.
    #[serde(rename_all = "camelCase")]
    TurnUpdate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seconds_remaining: Option<u32>,
        queue_size: u32,
    },
}

impl ServerMessage {
    /// Returns the wire `type` string of this message, for log lines.
    pub fn type_name(&self) -> &'static str {
        match self {
            ServerMessage::Ping { .. } => "ping",
            ServerMessage::ServerInfo { .. } => "serverInfo",
            ServerMessage::VgaSizeUpdate { .. } => "vgaSizeUpdate",
            ServerMessage::Connected { .. } => "connected",
            ServerMessage::YourTurn { .. } => "yourTurn",
            ServerMessage::TurnUpdate { .. } => "turnUpdate",
        }
    }
}

// ── Client → server ───────────────────────────────────────────────────────────

/// Control messages the client sends, always as JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Discovery query; answered by [`ServerMessage::ServerInfo`].
    GetServerInfo,

    /// Username handshake; answered by [`ServerMessage::Connected`].
    Connect { username: String },

    /// Join (`true`) or leave (`false`) the turn queue.
    #[serde(rename_all = "camelCase")]
    Turn { taking_turn: bool },

    /// Absolute pointer position plus the RFB button mask.
    Mouse { x: u32, y: u32, mask: u8 },

    /// X11 keysym press or release.
    #[serde(rename_all = "camelCase")]
    Key { key_code: u32, down: bool },

    /// Echo of a server [`ServerMessage::Ping`].
    #[serde(rename_all = "camelCase")]
    Ping { ping_number: u64 },
}

impl ClientMessage {
    /// Returns the wire `type` string of this message.
    ///
    /// Used in debug logs so that field values (usernames, typed keys) are
    /// never written to the log.
    pub fn type_name(&self) -> &'static str {
        match self {
            ClientMessage::GetServerInfo => "getServerInfo",
            ClientMessage::Connect { .. } => "connect",
            ClientMessage::Turn { .. } => "turn",
            ClientMessage::Mouse { .. } => "mouse",
            ClientMessage::Key { .. } => "key",
            ClientMessage::Ping { .. } => "ping",
        }
    }

    /// Returns `true` for messages that carry user input and are therefore
    /// subject to turn gating.
    pub fn is_input(&self) -> bool {
        matches!(self, ClientMessage::Mouse { .. } | ClientMessage::Key { .. })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_server_info_serializes_to_bare_type() {
        // Act
        let json = serde_json::to_string(&ClientMessage::GetServerInfo).unwrap();

        // Assert
        assert_eq!(json, r#"{"type":"getServerInfo"}"#);
    }

    #[test]
    fn test_turn_uses_camel_case_field() {
        let json = serde_json::to_string(&ClientMessage::Turn { taking_turn: true }).unwrap();
        assert_eq!(json, r#"{"type":"turn","takingTurn":true}"#);
    }

    #[test]
    fn test_key_uses_key_code_field() {
        let json = serde_json::to_string(&ClientMessage::Key {
            key_code: 0xFF0D,
            down: false,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"key","keyCode":65293,"down":false}"#);
    }

    #[test]
    fn test_mouse_fields_are_flat() {
        let json = serde_json::to_string(&ClientMessage::Mouse { x: 10, y: 20, mask: 5 }).unwrap();
        assert_eq!(json, r#"{"type":"mouse","x":10,"y":20,"mask":5}"#);
    }

    #[test]
    fn test_ping_echo_uses_ping_number_field() {
        let json = serde_json::to_string(&ClientMessage::Ping { ping_number: 7 }).unwrap();
        assert_eq!(json, r#"{"type":"ping","pingNumber":7}"#);
    }

    #[test]
    fn test_turn_update_without_seconds_remaining_parses() {
        // Arrange: the server omits secondsRemaining when the turn is free
        let json = r#"{"type":"turnUpdate","queueSize":3}"#;

        // Act
        let msg: ServerMessage = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(
            msg,
            ServerMessage::TurnUpdate {
                seconds_remaining: None,
                queue_size: 3
            }
        );
    }

    #[test]
    fn test_your_turn_with_seconds_remaining_parses() {
        let msg: ServerMessage =
            serde_json::from_str(r#"{"type":"yourTurn","secondsRemaining":30}"#).unwrap();
        assert_eq!(
            msg,
            ServerMessage::YourTurn {
                seconds_remaining: Some(30)
            }
        );
    }

    #[test]
    fn test_connected_parses_admin_rank() {
        let msg: ServerMessage =
            serde_json::from_str(r#"{"type":"connected","userRank":1}"#).unwrap();
        assert_eq!(
            msg,
            ServerMessage::Connected {
                user_rank: UserRank::AdminUser
            }
        );
    }

    #[test]
    fn test_connected_with_out_of_range_rank_is_rejected() {
        let result: Result<ServerMessage, _> =
            serde_json::from_str(r#"{"type":"connected","userRank":7}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_server_info_parses_camel_case_fields() {
        let json = r#"{"type":"serverInfo","serverName":"X","serverDescription":"","thumbnail":"AAAA"}"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        match msg {
            ServerMessage::ServerInfo {
                server_name,
                server_description,
                thumbnail,
            } => {
                assert_eq!(server_name, "X");
                assert_eq!(server_description, "");
                assert_eq!(thumbnail, "AAAA");
            }
            other => panic!("expected ServerInfo, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result: Result<ServerMessage, _> = serde_json::from_str(r#"{"type":"chat","msg":"hi"}"#);
        assert!(result.is_err(), "unknown type must not parse");
    }

    #[test]
    fn test_type_names_match_wire_discriminants() {
        let msg = ClientMessage::Connect {
            username: "secret-name".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(&format!(r#""type":"{}""#, msg.type_name())));
        assert!(!msg.type_name().contains("secret"));
    }

    #[test]
    fn test_only_mouse_and_key_are_input() {
        assert!(ClientMessage::Mouse { x: 0, y: 0, mask: 0 }.is_input());
        assert!(ClientMessage::Key { key_code: 97, down: true }.is_input());
        assert!(!ClientMessage::Turn { taking_turn: true }.is_input());
        assert!(!ClientMessage::Ping { ping_number: 1 }.is_input());
    }
}
