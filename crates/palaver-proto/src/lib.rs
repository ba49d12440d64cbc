//! Wire types for the palaver chat protocol.
//!
//! The protocol is a request/response mapping over a persistent duplex text
//! connection. Every frame carries exactly one JSON envelope: requests are
//! `{"request": <kind>, "body": <kind-specific>}`, responses are
//! `{"response": <kind>, "body": <kind-specific>}`. Framing is delegated to
//! the underlying transport; there is no batching or length prefixing.
//!
//! This crate owns the envelope and entity shapes plus the permission flag
//! newtypes. It performs no I/O and holds no connection state - the codec in
//! `palaver-client` drives these types.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod entity;
mod error;
mod perm;
mod request;
mod response;

pub use entity::{MessageData, MessageEntry, RoomEntry, TEXT_MESSAGE, UserEntry};
pub use error::ProtoError;
pub use perm::{GlobalPerm, RoomPerm};
pub use request::Request;
pub use response::{
    EnterBody, ErrorBody, LeaveBody, MessageListBody, ResponseEnvelope, RoomListBody, UserListBody,
    WhoamiBody,
};

/// Identity of a chat participant. Unique for the session, never reassigned.
pub type UserId = u64;

/// Identity of a room. Unique for the session, never reassigned.
pub type RoomId = u64;

/// Identity of a message. Unique within its room; assigned monotonically by
/// the server per room, starting at 1.
pub type MessageId = u64;
