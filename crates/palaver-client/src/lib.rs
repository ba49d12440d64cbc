//! Client
//!
//! Connection state machine and protocol codec for the palaver chat
//! protocol. Turns typed operations into wire envelopes and inbound frames
//! into typed [`ServerEvent`]s.
//!
//! # Architecture
//!
//! The crate is Sans-IO: [`Conn`] owns the outbound queue and readiness
//! state of one duplex text channel, [`Codec`] owns envelope translation and
//! response dispatch, and both only return values for the caller to act on.
//! I/O lives in the optional [`transport`] adapter.
//!
//! # Components
//!
//! - [`Conn`]: queue-before-ready connection state machine
//! - [`Codec`]: typed request senders and exhaustive response dispatch
//! - [`ServerEvent`]: decoded server activity, one variant per response kind
//! - [`CodecAction`]: instructions the codec hands back to its driver
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::ConnectedTransport`]: WebSocket connection with channels
//! - [`transport::connect`]: connect to a chat server endpoint

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod codec;
mod conn;
mod event;

#[cfg(feature = "transport")]
pub mod transport;

pub use codec::{Codec, CodecAction};
pub use conn::{Conn, ConnError, ConnState, WireFrame};
pub use event::ServerEvent;
pub use palaver_proto::{GlobalPerm, MessageId, RoomId, RoomPerm, UserId};
