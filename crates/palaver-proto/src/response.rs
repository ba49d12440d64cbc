//! Server-to-client response envelopes.
//!
//! Responses arrive as `{"response": <kind>, "body": <kind-specific>}`. The
//! envelope keeps the body as a raw value: the kind string decides which of
//! the body records below applies, and unrecognized kinds must stay available
//! verbatim for the caller's fall-through handling. The kind dispatch itself
//! lives in the `palaver-client` codec.

use serde::{Deserialize, Serialize};

use crate::{GlobalPerm, MessageEntry, RoomEntry, RoomId, RoomPerm, UserEntry, UserId};

/// The outer response envelope with an undecoded body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Response kind discriminator.
    pub response: String,
    /// Kind-specific body, decoded by the codec once the kind is known.
    #[serde(default)]
    pub body: serde_json::Value,
}

/// Body of a `whoami` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoamiBody {
    /// The local user's identity.
    pub user: UserEntry,
    /// The local user's account-wide permissions.
    #[serde(default)]
    pub perm: GlobalPerm,
}

/// Body of a `list-rooms` or `in-rooms` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListBody {
    /// Directory entries, including per-room permissions.
    pub rooms: Vec<RoomEntry>,
}

/// Body of an `enter` broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnterBody {
    /// Room that was entered.
    pub room_id: RoomId,
    /// User who entered.
    pub user: UserEntry,
    /// The local user's permissions in that room.
    #[serde(default)]
    pub perm: RoomPerm,
}

/// Body of a `leave` broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveBody {
    /// Room that was left.
    pub room_id: RoomId,
    /// User who left.
    pub user_id: UserId,
}

/// Body of a `list-users` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListBody {
    /// Room whose roster this is.
    pub room_id: RoomId,
    /// Current members.
    pub users: Vec<UserEntry>,
}

/// Body of a `list-messages` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageListBody {
    /// Room whose history this is.
    pub room_id: RoomId,
    /// First message id that was requested, as echoed by the server.
    pub first_message_id: i64,
    /// The history slice, in server order.
    pub messages: Vec<MessageEntry>,
}

/// Body of an `error` response. Server-reported; the connection stays up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable description.
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn envelope_keeps_unknown_bodies_verbatim() {
        let raw = r#"{"response":"future-kind","body":{"anything":[1,2,3]}}"#;
        let envelope: ResponseEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.response, "future-kind");
        assert_eq!(envelope.body["anything"][2], 3);
    }

    #[test]
    fn envelope_tolerates_missing_body() {
        let envelope: ResponseEnvelope = serde_json::from_str(r#"{"response":"error"}"#).unwrap();
        assert!(envelope.body.is_null());
    }

    #[test]
    fn whoami_body_decodes() {
        let raw = r#"{"user":{"id":1,"name":"ana"},"perm":3}"#;
        let body: WhoamiBody = serde_json::from_str(raw).unwrap();
        assert_eq!(body.user.id, 1);
        assert!(body.perm.may_list_rooms());
        assert!(body.perm.may_create_room());
    }

    #[test]
    fn enter_body_defaults_missing_perm() {
        let raw = r#"{"roomId":4,"user":{"id":2,"name":"bo"}}"#;
        let body: EnterBody = serde_json::from_str(raw).unwrap();
        assert_eq!(body.room_id, 4);
        assert!(!body.perm.may_read());
    }
}
