//! The contract with the embedding UI.

use palaver_proto::{RoomId, UserId};

/// Operations the embedding UI can issue against a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask the server who this session belongs to.
    Identify,
    /// Fetch the room directory.
    ListRooms,
    /// Fetch the rooms the local user occupies.
    ListJoinedRooms,
    /// Enter a room.
    Enter {
        /// Room to enter.
        room_id: RoomId,
    },
    /// Leave a room; `None` leaves the focused room.
    Leave {
        /// Room to leave, defaulting to the current focus.
        room_id: Option<RoomId>,
    },
    /// Fetch the membership roster of a room.
    ListUsers {
        /// Room whose roster to fetch.
        room_id: RoomId,
    },
    /// Fetch a slice of a room's history. A negative `first_message_id`
    /// means "the most recent `message_cnt` messages".
    FetchMessages {
        /// Room whose history to fetch.
        room_id: RoomId,
        /// First message id, possibly negative.
        first_message_id: i64,
        /// Maximum number of messages.
        message_cnt: u32,
    },
    /// Create a room.
    CreateRoom {
        /// Name for the new room.
        name: String,
    },
    /// Fetch identity details for one user.
    FetchUserInfo {
        /// User to look up.
        user_id: UserId,
    },
    /// Fetch the directory entry for one room.
    FetchRoomInfo {
        /// Room to look up.
        room_id: RoomId,
    },
    /// Post a text message.
    SendText {
        /// Target room.
        room_id: RoomId,
        /// Message body.
        text: String,
    },
    /// Focus an already-joined room locally, clearing its unread flag.
    SelectRoom {
        /// Room to focus.
        room_id: RoomId,
    },
}

/// Notifications delivered to the embedding UI.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Chat state changed; re-read it and re-render.
    Render,

    /// The server rejected a request. The connection is still up.
    ProtocolError {
        /// Human-readable description.
        message: String,
    },

    /// The connection is gone and the chat state was reset. Reconnecting
    /// is an explicit caller decision.
    ConnectionLost {
        /// Human-readable description.
        message: String,
    },

    /// The server sent a response kind this client does not understand.
    Unhandled {
        /// Wire kind of the response.
        kind: String,
        /// Raw body, verbatim.
        body: serde_json::Value,
    },
}
