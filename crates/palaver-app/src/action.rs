//! Synchronizer side-effects.
//!
//! [`ChatAction`]s are instructions produced by the [`crate::Chat`] state
//! machine for its driver to execute. The synchronizer never performs I/O
//! itself; detecting a sequence gap or an unknown author only *requests* the
//! follow-up fetch.

use palaver_proto::{MessageId, RoomId, UserId};

/// Actions produced by the chat state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAction {
    /// Ask the server who a user id belongs to.
    FetchUserInfo {
        /// Unknown author.
        user_id: UserId,
    },

    /// Request retransmission of a missing message range.
    FetchMessages {
        /// Room with the sequence gap.
        room_id: RoomId,
        /// First missing id.
        first_message_id: MessageId,
        /// Number of messages to fetch.
        message_cnt: u32,
    },

    /// Visible state changed; observers should re-render.
    Render,
}
