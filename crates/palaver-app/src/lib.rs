//! Application layer for the palaver chat client.
//!
//! The core of this crate is the [`Chat`] state synchronizer: it turns an
//! unordered, possibly-gapped stream of server events into a consistent,
//! ordered view of rooms, memberships, and message history. It tolerates
//! messages arriving ahead of their predecessors (per-room gap buffer) and
//! ahead of their author's identity (pending-user queues).
//!
//! Everything here is a pure state machine: mutators consume decoded events
//! and return [`ChatAction`]s for the caller to execute. The [`Bridge`]
//! couples the synchronizer to the protocol codec, and the optional
//! [`runtime`] module drives the bridge against the WebSocket transport.
//!
//! # Components
//!
//! - [`Chat`]: root aggregate (users, rooms, pending queues, focus)
//! - [`Room`], [`User`], [`Message`]: chat entities
//! - [`Bridge`]: protocol-to-state translation layer
//! - [`Command`], [`Update`]: the contract with the embedding UI

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod bridge;
mod chat;
mod event;
mod roster;
mod state;

#[cfg(feature = "transport")]
pub mod runtime;

pub use action::ChatAction;
pub use bridge::Bridge;
pub use chat::Chat;
pub use event::{Command, Update};
pub use roster::{Keyed, Roster};
pub use state::{Ingest, Message, Room, User};
