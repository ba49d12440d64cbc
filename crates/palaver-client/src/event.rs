//! Decoded server activity.

use palaver_proto::{GlobalPerm, MessageEntry, MessageId, RoomEntry, RoomId, RoomPerm, UserEntry, UserId};

/// One decoded unit of server activity, handed to the application layer.
///
/// Every response kind maps to exactly one variant, so consumers match
/// exhaustively instead of registering callbacks by name. Kinds (and message
/// types) this client does not understand arrive as [`ServerEvent::Other`]
/// rather than being silently dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// The local user's identity and account-wide permissions.
    Whoami {
        /// The local user.
        user: UserEntry,
        /// Account-wide permission flags.
        perm: GlobalPerm,
    },

    /// The full room directory.
    RoomList {
        /// Directory entries in server order.
        rooms: Vec<RoomEntry>,
    },

    /// The rooms the local user currently occupies.
    JoinedRooms {
        /// Directory entries in server order.
        rooms: Vec<RoomEntry>,
    },

    /// A user entered a room.
    Enter {
        /// Room that was entered.
        room_id: RoomId,
        /// User who entered.
        user: UserEntry,
        /// The local user's permissions in that room.
        perm: RoomPerm,
    },

    /// A user left a room.
    Leave {
        /// Room that was left.
        room_id: RoomId,
        /// User who left.
        user_id: UserId,
    },

    /// A room was created.
    NewRoom(RoomEntry),

    /// The membership roster of one room.
    UserList {
        /// Room whose roster this is.
        room_id: RoomId,
        /// Current members.
        users: Vec<UserEntry>,
    },

    /// A slice of a room's message history.
    MessageList {
        /// Room whose history this is.
        room_id: RoomId,
        /// First message id requested, as echoed by the server.
        first_message_id: i64,
        /// History entries in server order.
        messages: Vec<MessageEntry>,
    },

    /// Identity details for one user.
    UserInfo(UserEntry),

    /// The directory entry for one room.
    RoomInfo(RoomEntry),

    /// A text message, live or backfilled.
    TextMessage {
        /// Room the message belongs to.
        room_id: RoomId,
        /// Per-room message id.
        message_id: MessageId,
        /// Author's user id.
        user_id: UserId,
        /// Unix timestamp in seconds.
        timestamp: u64,
        /// Message body.
        text: String,
    },

    /// A server-reported error. The connection stays up.
    Error {
        /// Human-readable description.
        message: String,
    },

    /// A response kind or message type this client does not understand.
    Other {
        /// Wire kind of the response.
        kind: String,
        /// Raw body, verbatim.
        body: serde_json::Value,
    },

    /// The connection failed or was closed. All transport state is gone;
    /// reconnecting is an explicit caller decision.
    ConnectionError {
        /// Human-readable description, including any close code and reason.
        message: String,
    },
}
