//! Client-to-server request envelopes.

use serde::{Deserialize, Serialize};

use crate::{ProtoError, RoomId, TEXT_MESSAGE, UserId};

/// A typed request envelope.
///
/// Serializes to `{"request": <kind>, "body": <fields>}`; kinds without a
/// body serialize to the bare `{"request": <kind>}` envelope. Kind strings
/// are kebab-case on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "request", content = "body", rename_all = "kebab-case")]
pub enum Request {
    /// Ask who the current session belongs to.
    Whoami,
    /// List every room visible to the local user.
    ListRooms,
    /// List the rooms the local user currently occupies.
    InRooms,
    /// Enter a room.
    #[serde(rename_all = "camelCase")]
    Enter {
        /// Room to enter.
        room_id: RoomId,
    },
    /// Leave a room.
    #[serde(rename_all = "camelCase")]
    Leave {
        /// Room to leave.
        room_id: RoomId,
    },
    /// List the members of a room.
    #[serde(rename_all = "camelCase")]
    ListUsers {
        /// Room whose roster to list.
        room_id: RoomId,
    },
    /// Fetch a slice of a room's message history.
    #[serde(rename_all = "camelCase")]
    ListMessages {
        /// Room whose history to fetch.
        room_id: RoomId,
        /// First message id of the slice. Negative means "the most recent
        /// `message_cnt` messages".
        first_message_id: i64,
        /// Maximum number of messages to return.
        message_cnt: u32,
    },
    /// Create a room.
    NewRoom {
        /// Name of the room to create.
        name: String,
    },
    /// Fetch identity details for one user.
    #[serde(rename_all = "camelCase")]
    UserInfo {
        /// User to look up.
        user_id: UserId,
    },
    /// Fetch the directory entry for one room.
    #[serde(rename_all = "camelCase")]
    RoomInfo {
        /// Room to look up.
        room_id: RoomId,
    },
    /// Post a message to a room.
    #[serde(rename_all = "camelCase")]
    Message {
        /// Target room.
        room_id: RoomId,
        /// Message type discriminator.
        message_type: u32,
        /// Type-specific content.
        data: serde_json::Value,
    },
}

impl Request {
    /// Build a text message request.
    pub fn text_message(room_id: RoomId, text: impl Into<String>) -> Self {
        Self::Message {
            room_id,
            message_type: TEXT_MESSAGE,
            data: serde_json::json!({ "text": text.into() }),
        }
    }

    /// Wire kind string, for logging.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Whoami => "whoami",
            Self::ListRooms => "list-rooms",
            Self::InRooms => "in-rooms",
            Self::Enter { .. } => "enter",
            Self::Leave { .. } => "leave",
            Self::ListUsers { .. } => "list-users",
            Self::ListMessages { .. } => "list-messages",
            Self::NewRoom { .. } => "new-room",
            Self::UserInfo { .. } => "user-info",
            Self::RoomInfo { .. } => "room-info",
            Self::Message { .. } => "message",
        }
    }

    /// Encode into one wire frame of JSON text.
    pub fn encode(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|source| ProtoError::Encode { kind: self.kind(), source })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bodyless_request_is_a_bare_envelope() {
        assert_eq!(Request::Whoami.encode().unwrap(), r#"{"request":"whoami"}"#);
        assert_eq!(Request::ListRooms.encode().unwrap(), r#"{"request":"list-rooms"}"#);
        assert_eq!(Request::InRooms.encode().unwrap(), r#"{"request":"in-rooms"}"#);
    }

    #[test]
    fn enter_carries_room_id() {
        assert_eq!(
            Request::Enter { room_id: 7 }.encode().unwrap(),
            r#"{"request":"enter","body":{"roomId":7}}"#
        );
    }

    #[test]
    fn list_messages_allows_negative_start() {
        assert_eq!(
            Request::ListMessages { room_id: 2, first_message_id: -50, message_cnt: 50 }
                .encode()
                .unwrap(),
            r#"{"request":"list-messages","body":{"roomId":2,"firstMessageId":-50,"messageCnt":50}}"#
        );
    }

    #[test]
    fn text_message_wraps_type_and_body() {
        assert_eq!(
            Request::text_message(1, "hi").encode().unwrap(),
            r#"{"request":"message","body":{"roomId":1,"messageType":1,"data":{"text":"hi"}}}"#
        );
    }

    #[test]
    fn request_round_trips() {
        let requests = [
            Request::Whoami,
            Request::ListMessages { room_id: 3, first_message_id: 1, message_cnt: 10 },
            Request::NewRoom { name: "den".into() },
            Request::UserInfo { user_id: 42 },
            Request::RoomInfo { room_id: 8 },
        ];
        for request in requests {
            let text = request.encode().unwrap();
            let back: Request = serde_json::from_str(&text).unwrap();
            assert_eq!(back, request);
        }
    }
}
