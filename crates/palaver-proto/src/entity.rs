//! Entity records carried inside envelope bodies.

use serde::{Deserialize, Serialize};

use crate::{MessageId, RoomId, RoomPerm, UserId};

/// The only message type currently defined by the protocol.
pub const TEXT_MESSAGE: u32 = 1;

/// A chat participant as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntry {
    /// Stable user id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Optional display color tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A directory entry for one room, including the local user's permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomEntry {
    /// Stable room id.
    pub id: RoomId,
    /// Room name.
    pub name: String,
    /// What the local user may do in this room.
    #[serde(default)]
    pub perm: RoomPerm,
}

/// One message as carried by `message` and `list-messages` responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEntry {
    /// Room the message belongs to.
    pub room_id: RoomId,
    /// Per-room message id, assigned monotonically by the server.
    pub message_id: MessageId,
    /// Author's user id.
    pub user_id: UserId,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// Type-tagged message content.
    pub data: MessageData,
}

/// Type-tagged message content.
///
/// The inner `data` shape depends on `message_type`. Only [`TEXT_MESSAGE`]
/// is defined; anything else is carried opaquely so the caller can fall
/// through to its generic handling path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageData {
    /// Message type discriminator.
    pub message_type: u32,
    /// Type-specific content.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl MessageData {
    /// Build a text message body.
    pub fn text(body: impl Into<String>) -> Self {
        Self { message_type: TEXT_MESSAGE, data: serde_json::json!({ "text": body.into() }) }
    }

    /// The text body, if this is a well-formed text message.
    pub fn as_text(&self) -> Option<&str> {
        if self.message_type != TEXT_MESSAGE {
            return None;
        }
        self.data.get("text")?.as_str()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn user_entry_decodes_without_color() {
        let user: UserEntry = serde_json::from_str(r#"{"id":9,"name":"X"}"#).unwrap();
        assert_eq!(user, UserEntry { id: 9, name: "X".into(), color: None });
    }

    #[test]
    fn room_entry_decodes_server_shape() {
        let room: RoomEntry =
            serde_json::from_str(r#"{"id":3,"name":"lounge","perm":3}"#).unwrap();
        assert_eq!(room.id, 3);
        assert_eq!(room.name, "lounge");
        assert!(room.perm.may_read());
        assert!(room.perm.may_write());
    }

    #[test]
    fn message_entry_text_body() {
        let raw = r#"{
            "roomId": 1,
            "messageId": 5,
            "userId": 9,
            "timestamp": 1700000000,
            "data": {"messageType": 1, "data": {"text": "hello"}}
        }"#;
        let entry: MessageEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.data.as_text(), Some("hello"));
    }

    #[test]
    fn unknown_message_type_has_no_text() {
        let data = MessageData { message_type: 7, data: serde_json::json!({"text": "x"}) };
        assert_eq!(data.as_text(), None);
    }

    #[test]
    fn text_constructor_round_trips() {
        let data = MessageData::text("hi");
        assert_eq!(data.as_text(), Some("hi"));
    }
}
