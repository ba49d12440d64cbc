//! Protocol codec.
//!
//! [`Codec`] is the typed boundary between application operations and wire
//! envelopes. Outbound methods build [`Request`] envelopes and hand them to
//! the attached [`Conn`]; inbound frames decode through a single exhaustive
//! dispatch into [`ServerEvent`]s.
//!
//! Transport failures all funnel through one connection-error path: the codec
//! detaches from its connection, closes it, and emits
//! [`ServerEvent::ConnectionError`]. Server-reported `error` responses are
//! ordinary events and leave the connection up.

use palaver_proto::{
    EnterBody, ErrorBody, LeaveBody, MessageEntry, MessageListBody, ProtoError, Request,
    ResponseEnvelope, RoomEntry, RoomId, RoomListBody, UserEntry, UserId, UserListBody, WhoamiBody,
};
use serde_json::Value;

use crate::{
    conn::{Conn, ConnError, WireFrame},
    event::ServerEvent,
};

/// Instructions produced by the codec for its driver.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecAction {
    /// Write one text frame to the wire.
    Transmit(String),
    /// Hand a decoded event to the application layer.
    Event(ServerEvent),
}

/// Typed request/response mapping over one [`Conn`].
#[derive(Debug, Default)]
pub struct Codec {
    conn: Option<Conn>,
}

impl Codec {
    /// A codec with no connection attached.
    pub fn new() -> Self {
        Self { conn: None }
    }

    /// Whether a connection is attached.
    pub fn is_attached(&self) -> bool {
        self.conn.is_some()
    }

    /// Attach a connection, closing any previous one.
    pub fn attach(&mut self, conn: Conn) {
        if let Some(mut old) = self.conn.replace(conn) {
            old.close();
        }
    }

    /// Detach and close the current connection, if any. Idempotent.
    pub fn detach(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            conn.close();
        }
    }

    // Outbound operations. Each builds one request envelope; each reports
    // through the connection-error path when no transport is attached.

    /// Ask who the current session belongs to.
    pub fn whoami(&mut self) -> Vec<CodecAction> {
        self.request(&Request::Whoami)
    }

    /// List every visible room.
    pub fn list_rooms(&mut self) -> Vec<CodecAction> {
        self.request(&Request::ListRooms)
    }

    /// List the rooms the local user occupies.
    pub fn in_rooms(&mut self) -> Vec<CodecAction> {
        self.request(&Request::InRooms)
    }

    /// Enter a room.
    pub fn enter(&mut self, room_id: RoomId) -> Vec<CodecAction> {
        self.request(&Request::Enter { room_id })
    }

    /// Leave a room.
    pub fn leave(&mut self, room_id: RoomId) -> Vec<CodecAction> {
        self.request(&Request::Leave { room_id })
    }

    /// List the members of a room.
    pub fn list_users(&mut self, room_id: RoomId) -> Vec<CodecAction> {
        self.request(&Request::ListUsers { room_id })
    }

    /// Fetch a slice of a room's history. A negative `first_message_id`
    /// means "the most recent `message_cnt` messages".
    pub fn list_messages(
        &mut self,
        room_id: RoomId,
        first_message_id: i64,
        message_cnt: u32,
    ) -> Vec<CodecAction> {
        self.request(&Request::ListMessages { room_id, first_message_id, message_cnt })
    }

    /// Create a room.
    pub fn new_room(&mut self, name: &str) -> Vec<CodecAction> {
        self.request(&Request::NewRoom { name: name.to_owned() })
    }

    /// Fetch identity details for one user.
    pub fn user_info(&mut self, user_id: UserId) -> Vec<CodecAction> {
        self.request(&Request::UserInfo { user_id })
    }

    /// Fetch the directory entry for one room.
    pub fn room_info(&mut self, room_id: RoomId) -> Vec<CodecAction> {
        self.request(&Request::RoomInfo { room_id })
    }

    /// Post a text message to a room.
    pub fn text_message(&mut self, room_id: RoomId, text: &str) -> Vec<CodecAction> {
        self.request(&Request::text_message(room_id, text))
    }

    fn request(&mut self, request: &Request) -> Vec<CodecAction> {
        let Some(conn) = self.conn.as_mut() else {
            return self.conn_error("not connected to server".to_owned());
        };

        let text = match request.encode() {
            Ok(text) => text,
            Err(e) => return self.conn_error(e.to_string()),
        };

        match conn.send(text) {
            Ok(Some(wire)) => vec![CodecAction::Transmit(wire)],
            Ok(None) => {
                tracing::debug!(kind = request.kind(), "queued request until connection is ready");
                vec![]
            },
            Err(e) => self.conn_error(e.to_string()),
        }
    }

    // Inbound path, fed by the transport driver.

    /// The opening handshake finished; flush requests queued so far, in
    /// submission order.
    pub fn opened(&mut self) -> Vec<CodecAction> {
        let Some(conn) = self.conn.as_mut() else {
            return vec![];
        };
        let flushed = conn.established();
        if !flushed.is_empty() {
            tracing::debug!(count = flushed.len(), "flushing queued requests");
        }
        flushed.into_iter().map(CodecAction::Transmit).collect()
    }

    /// Decode and dispatch one inbound frame.
    pub fn frame(&mut self, frame: WireFrame) -> Vec<CodecAction> {
        let Some(conn) = self.conn.as_mut() else {
            // Frames racing a teardown are dropped
            return vec![];
        };
        match conn.receive(frame) {
            Ok(value) => self.dispatch(value),
            Err(e) => self.conn_error(e.to_string()),
        }
    }

    /// The transport reported the connection closed.
    pub fn closed(&mut self, code: u16, reason: &str) -> Vec<CodecAction> {
        if self.conn.is_none() {
            return vec![];
        }
        self.conn_error(ConnError::Closed { code, reason: reason.to_owned() }.to_string())
    }

    /// The transport reported a failure.
    pub fn transport_error(&mut self, message: &str) -> Vec<CodecAction> {
        if self.conn.is_none() {
            return vec![];
        }
        self.conn_error(message.to_owned())
    }

    fn conn_error(&mut self, message: String) -> Vec<CodecAction> {
        self.detach();
        tracing::error!(%message, "connection error");
        vec![CodecAction::Event(ServerEvent::ConnectionError { message })]
    }

    fn dispatch(&mut self, value: Value) -> Vec<CodecAction> {
        let envelope: ResponseEnvelope = match serde_json::from_value(value) {
            Ok(envelope) => envelope,
            Err(e) => return self.conn_error(ProtoError::Envelope(e).to_string()),
        };
        match decode(envelope) {
            Ok(event) => vec![CodecAction::Event(event)],
            Err(e) => self.conn_error(e.to_string()),
        }
    }
}

/// Map one response envelope to its event variant.
///
/// Unknown kinds - and `message` bodies whose type is not text - fall
/// through to [`ServerEvent::Other`] with the body verbatim. A known kind
/// with a body that does not match its shape is a malformed frame.
fn decode(envelope: ResponseEnvelope) -> Result<ServerEvent, ProtoError> {
    let ResponseEnvelope { response: kind, body } = envelope;

    let event = match kind.as_str() {
        "whoami" => {
            let b: WhoamiBody = body_of(&kind, body)?;
            ServerEvent::Whoami { user: b.user, perm: b.perm }
        },
        "list-rooms" => {
            let b: RoomListBody = body_of(&kind, body)?;
            ServerEvent::RoomList { rooms: b.rooms }
        },
        "in-rooms" => {
            let b: RoomListBody = body_of(&kind, body)?;
            ServerEvent::JoinedRooms { rooms: b.rooms }
        },
        "enter" => {
            let b: EnterBody = body_of(&kind, body)?;
            ServerEvent::Enter { room_id: b.room_id, user: b.user, perm: b.perm }
        },
        "leave" => {
            let b: LeaveBody = body_of(&kind, body)?;
            ServerEvent::Leave { room_id: b.room_id, user_id: b.user_id }
        },
        "new-room" => {
            let entry: RoomEntry = body_of(&kind, body)?;
            ServerEvent::NewRoom(entry)
        },
        "room-info" => {
            let entry: RoomEntry = body_of(&kind, body)?;
            ServerEvent::RoomInfo(entry)
        },
        "user-info" => {
            let entry: UserEntry = body_of(&kind, body)?;
            ServerEvent::UserInfo(entry)
        },
        "list-users" => {
            let b: UserListBody = body_of(&kind, body)?;
            ServerEvent::UserList { room_id: b.room_id, users: b.users }
        },
        "list-messages" => {
            let b: MessageListBody = body_of(&kind, body)?;
            ServerEvent::MessageList {
                room_id: b.room_id,
                first_message_id: b.first_message_id,
                messages: b.messages,
            }
        },
        "message" => {
            let entry: MessageEntry = body_of(&kind, body.clone())?;
            match entry.data.as_text() {
                Some(text) => ServerEvent::TextMessage {
                    room_id: entry.room_id,
                    message_id: entry.message_id,
                    user_id: entry.user_id,
                    timestamp: entry.timestamp,
                    text: text.to_owned(),
                },
                None => {
                    tracing::warn!(
                        message_type = entry.data.message_type,
                        "unrecognized message type"
                    );
                    ServerEvent::Other { kind, body }
                },
            }
        },
        "error" => {
            let b: ErrorBody = body_of(&kind, body)?;
            ServerEvent::Error { message: b.message }
        },
        _ => {
            tracing::debug!(%kind, "unrecognized response kind");
            ServerEvent::Other { kind, body }
        },
    };

    Ok(event)
}

fn body_of<T: serde::de::DeserializeOwned>(kind: &str, body: Value) -> Result<T, ProtoError> {
    serde_json::from_value(body)
        .map_err(|source| ProtoError::Body { kind: kind.to_owned(), source })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn attached() -> Codec {
        let mut codec = Codec::new();
        codec.attach(Conn::new());
        codec
    }

    fn ready() -> Codec {
        let mut codec = attached();
        let _ = codec.opened();
        codec
    }

    fn text_frame(raw: &str) -> WireFrame {
        WireFrame::Text(raw.to_owned())
    }

    fn only_event(mut actions: Vec<CodecAction>) -> ServerEvent {
        assert_eq!(actions.len(), 1, "expected one action, got {actions:?}");
        match actions.remove(0) {
            CodecAction::Event(event) => event,
            CodecAction::Transmit(text) => panic!("expected event, got transmit {text}"),
        }
    }

    #[test]
    fn send_without_transport_reports_connection_error() {
        let mut codec = Codec::new();
        let event = only_event(codec.whoami());
        assert!(matches!(event, ServerEvent::ConnectionError { .. }));
    }

    #[test]
    fn requests_queue_until_opened_then_flush_in_order() {
        let mut codec = attached();
        assert!(codec.whoami().is_empty());
        assert!(codec.list_rooms().is_empty());

        let flushed = codec.opened();
        assert_eq!(flushed, vec![
            CodecAction::Transmit(r#"{"request":"whoami"}"#.to_owned()),
            CodecAction::Transmit(r#"{"request":"list-rooms"}"#.to_owned()),
        ]);

        // Direct sends after readiness
        let direct = codec.enter(4);
        assert_eq!(direct, vec![CodecAction::Transmit(
            r#"{"request":"enter","body":{"roomId":4}}"#.to_owned()
        )]);
    }

    #[test]
    fn binary_frame_tears_the_connection_down() {
        let mut codec = ready();
        let event = only_event(codec.frame(WireFrame::Binary(vec![0])));
        assert!(matches!(event, ServerEvent::ConnectionError { .. }));
        assert!(!codec.is_attached());

        // Sending afterwards reports the error again rather than panicking
        let event = only_event(codec.whoami());
        assert!(matches!(event, ServerEvent::ConnectionError { .. }));
    }

    #[test]
    fn malformed_json_tears_the_connection_down() {
        let mut codec = ready();
        let event = only_event(codec.frame(text_frame("{oops")));
        assert!(matches!(event, ServerEvent::ConnectionError { .. }));
        assert!(!codec.is_attached());
    }

    #[test]
    fn closed_reports_code_and_reason() {
        let mut codec = ready();
        let event = only_event(codec.closed(1006, "going away"));
        match event {
            ServerEvent::ConnectionError { message } => {
                assert!(message.contains("1006"));
                assert!(message.contains("going away"));
            },
            other => panic!("unexpected event: {other:?}"),
        }

        // Already detached: a second close is silent
        assert!(codec.closed(1006, "again").is_empty());
    }

    #[test]
    fn dispatches_whoami() {
        let mut codec = ready();
        let event = only_event(
            codec.frame(text_frame(r#"{"response":"whoami","body":{"user":{"id":1,"name":"ana"},"perm":3}}"#)),
        );
        match event {
            ServerEvent::Whoami { user, perm } => {
                assert_eq!(user.id, 1);
                assert!(perm.may_create_room());
            },
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn dispatches_text_message() {
        let mut codec = ready();
        let raw = r#"{"response":"message","body":{"roomId":1,"messageId":5,"userId":9,
            "timestamp":1700000000,"data":{"messageType":1,"data":{"text":"hi"}}}}"#;
        let event = only_event(codec.frame(text_frame(raw)));
        assert_eq!(event, ServerEvent::TextMessage {
            room_id: 1,
            message_id: 5,
            user_id: 9,
            timestamp: 1_700_000_000,
            text: "hi".to_owned(),
        });
    }

    #[test]
    fn unknown_message_type_falls_through() {
        let mut codec = ready();
        let raw = r#"{"response":"message","body":{"roomId":1,"messageId":5,"userId":9,
            "timestamp":0,"data":{"messageType":2,"data":{"blob":"AA=="}}}}"#;
        let event = only_event(codec.frame(text_frame(raw)));
        match event {
            ServerEvent::Other { kind, body } => {
                assert_eq!(kind, "message");
                assert_eq!(body["data"]["messageType"], 2);
            },
            other => panic!("unexpected event: {other:?}"),
        }
        // Not a transport failure: still attached
        assert!(codec.is_attached());
    }

    #[test]
    fn unknown_kind_falls_through() {
        let mut codec = ready();
        let event =
            only_event(codec.frame(text_frame(r#"{"response":"typing","body":{"userId":3}}"#)));
        assert!(matches!(event, ServerEvent::Other { kind, .. } if kind == "typing"));
        assert!(codec.is_attached());
    }

    #[test]
    fn server_error_keeps_the_connection_up() {
        let mut codec = ready();
        let event = only_event(
            codec.frame(text_frame(r#"{"response":"error","body":{"message":"no such room"}}"#)),
        );
        assert_eq!(event, ServerEvent::Error { message: "no such room".to_owned() });
        assert!(codec.is_attached());
    }

    #[test]
    fn known_kind_with_malformed_body_is_a_malformed_frame() {
        let mut codec = ready();
        let event =
            only_event(codec.frame(text_frame(r#"{"response":"leave","body":{"roomId":"x"}}"#)));
        assert!(matches!(event, ServerEvent::ConnectionError { .. }));
        assert!(!codec.is_attached());
    }

    #[test]
    fn attach_is_a_replacement() {
        let mut codec = ready();
        codec.attach(Conn::new());
        // Fresh connection starts unready: sends queue again
        assert!(codec.whoami().is_empty());
    }
}
