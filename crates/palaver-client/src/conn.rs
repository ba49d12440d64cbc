//! Connection state machine.
//!
//! [`Conn`] tracks one duplex text channel through its lifecycle: outbound
//! payloads submitted before the opening handshake completes are queued in
//! submission order and flushed together once the channel is ready; inbound
//! frames must be text carrying one JSON value each. The actual socket is
//! driven elsewhere (see `transport` for the production adapter) - this type
//! only decides what happens to each payload.

use std::collections::VecDeque;

use thiserror::Error;

/// Errors surfaced by the connection state machine.
#[derive(Debug, Error)]
pub enum ConnError {
    /// No channel is open; the payload was not sent.
    #[error("no connection to server")]
    NotConnected,

    /// The peer sent a frame that is not text.
    #[error("unexpected non-text frame from server")]
    NonTextFrame,

    /// The peer sent text that does not decode as JSON.
    #[error("malformed frame from server: {0}")]
    MalformedFrame(#[source] serde_json::Error),

    /// The channel closed, normally or otherwise.
    #[error("connection closed: {code} {reason}")]
    Closed {
        /// Close code reported by the transport.
        code: u16,
        /// Close reason reported by the transport, possibly empty.
        reason: String,
    },
}

/// Lifecycle of the underlying channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// Channel requested; the opening handshake has not finished.
    Opening,
    /// Handshake complete; payloads pass straight through.
    Ready,
    /// No channel.
    Closed,
}

/// One inbound frame as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireFrame {
    /// A text frame.
    Text(String),
    /// A binary frame. Always an error in this protocol.
    Binary(Vec<u8>),
}

/// State of one duplex text connection.
#[derive(Debug)]
pub struct Conn {
    state: ConnState,
    queue: VecDeque<String>,
}

impl Conn {
    /// A fresh connection in the pre-handshake state.
    pub fn new() -> Self {
        Self { state: ConnState::Opening, queue: VecDeque::new() }
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> ConnState {
        self.state
    }

    /// Whether the opening handshake has completed.
    pub fn is_ready(&self) -> bool {
        self.state == ConnState::Ready
    }

    /// Number of payloads waiting for the handshake to complete.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Submit one serialized payload.
    ///
    /// Returns the text to transmit now, or `None` when the payload was
    /// queued until the handshake completes.
    ///
    /// # Errors
    ///
    /// [`ConnError::NotConnected`] when the channel is closed. The payload is
    /// dropped; nothing is retried.
    pub fn send(&mut self, text: String) -> Result<Option<String>, ConnError> {
        match self.state {
            ConnState::Closed => Err(ConnError::NotConnected),
            ConnState::Opening => {
                self.queue.push_back(text);
                Ok(None)
            },
            ConnState::Ready => Ok(Some(text)),
        }
    }

    /// Mark the opening handshake complete.
    ///
    /// Returns the queued payloads in submission order; the caller must
    /// transmit them before anything submitted later.
    pub fn established(&mut self) -> Vec<String> {
        self.state = ConnState::Ready;
        self.queue.drain(..).collect()
    }

    /// Decode one inbound frame.
    ///
    /// # Errors
    ///
    /// Non-text frames and undecodable text are errors; the caller must tear
    /// the connection down on either.
    pub fn receive(&mut self, frame: WireFrame) -> Result<serde_json::Value, ConnError> {
        match frame {
            WireFrame::Text(text) => {
                serde_json::from_str(&text).map_err(ConnError::MalformedFrame)
            },
            WireFrame::Binary(_) => Err(ConnError::NonTextFrame),
        }
    }

    /// Drop the channel and everything queued on it. Idempotent.
    pub fn close(&mut self) {
        self.state = ConnState::Closed;
        self.queue.clear();
    }
}

impl Default for Conn {
    fn default() -> Self {
        Self::new()
    }
}
