//! Protocol-to-application translation layer.
//!
//! The [`Bridge`] couples the protocol [`Codec`] with the [`Chat`]
//! synchronizer:
//!
//! - UI [`Command`]s become typed codec sends.
//! - Decoded [`ServerEvent`]s mutate the chat state.
//! - [`ChatAction`]s loop back into codec requests (`user-info` for
//!   unresolved authors, `list-messages` for sequence gaps) or surface as
//!   [`Update`]s for the UI.
//! - Outgoing wire frames accumulate until the driver collects them with
//!   [`Bridge::take_outgoing`].
//!
//! Connection loss resets the chat state (the session is gone) and surfaces
//! [`Update::ConnectionLost`]; reconnecting is the owner's explicit call.

use palaver_client::{Codec, CodecAction, Conn, ServerEvent, WireFrame};
use palaver_proto::MessageId;

use crate::{
    action::ChatAction,
    chat::Chat,
    event::{Command, Update},
    state::{Room, User},
};

/// Bridge between the codec and the chat state.
#[derive(Debug, Default)]
pub struct Bridge {
    codec: Codec,
    chat: Chat,
    outgoing: Vec<String>,
}

impl Bridge {
    /// A bridge with no connection attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// The synchronized chat state, for rendering.
    pub fn chat(&self) -> &Chat {
        &self.chat
    }

    /// Whether a connection is attached.
    pub fn is_connected(&self) -> bool {
        self.codec.is_attached()
    }

    /// Attach a fresh pre-handshake connection. Idempotent: an attached
    /// connection is kept and only the consumer side is renewed.
    pub fn open_connection(&mut self) {
        if !self.codec.is_attached() {
            self.codec.attach(Conn::new());
        }
    }

    /// Take the wire frames accumulated since the last call, in order.
    pub fn take_outgoing(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outgoing)
    }

    /// Execute one UI command.
    pub fn handle_command(&mut self, command: Command) -> Vec<Update> {
        let actions = match command {
            Command::Identify => self.codec.whoami(),
            Command::ListRooms => self.codec.list_rooms(),
            Command::ListJoinedRooms => self.codec.in_rooms(),
            Command::Enter { room_id } => self.codec.enter(room_id),
            Command::Leave { room_id } => match room_id.or(self.chat.focus()) {
                Some(room_id) => self.codec.leave(room_id),
                None => vec![],
            },
            Command::ListUsers { room_id } => self.codec.list_users(room_id),
            Command::FetchMessages { room_id, first_message_id, message_cnt } => {
                self.codec.list_messages(room_id, first_message_id, message_cnt)
            },
            Command::CreateRoom { name } => self.codec.new_room(&name),
            Command::FetchUserInfo { user_id } => self.codec.user_info(user_id),
            Command::FetchRoomInfo { room_id } => self.codec.room_info(room_id),
            Command::SendText { room_id, text } => self.codec.text_message(room_id, &text),
            Command::SelectRoom { room_id } => {
                let actions = self.chat.focus_room(room_id);
                let mut updates = self.run_chat_actions(actions);
                updates.dedup();
                return updates;
            },
        };
        let mut updates = self.run_codec_actions(actions);
        updates.dedup();
        updates
    }

    /// The opening handshake finished; flush requests queued so far.
    pub fn connection_opened(&mut self) -> Vec<Update> {
        let actions = self.codec.opened();
        self.run_codec_actions(actions)
    }

    /// Feed one inbound wire frame.
    pub fn take_frame(&mut self, frame: WireFrame) -> Vec<Update> {
        let actions = self.codec.frame(frame);
        let mut updates = self.run_codec_actions(actions);
        updates.dedup();
        updates
    }

    /// The transport reported the connection closed.
    pub fn connection_closed(&mut self, code: u16, reason: &str) -> Vec<Update> {
        let actions = self.codec.closed(code, reason);
        self.run_codec_actions(actions)
    }

    /// The transport reported a failure.
    pub fn transport_error(&mut self, message: &str) -> Vec<Update> {
        let actions = self.codec.transport_error(message);
        self.run_codec_actions(actions)
    }

    fn run_codec_actions(&mut self, actions: Vec<CodecAction>) -> Vec<Update> {
        let mut updates = Vec::new();
        for action in actions {
            match action {
                CodecAction::Transmit(text) => self.outgoing.push(text),
                CodecAction::Event(event) => updates.extend(self.apply_event(event)),
            }
        }
        updates
    }

    fn apply_event(&mut self, event: ServerEvent) -> Vec<Update> {
        match event {
            ServerEvent::Whoami { user, perm } => {
                let actions = self.chat.identify(user.into(), perm);
                self.run_chat_actions(actions)
            },
            ServerEvent::RoomList { rooms } => {
                let mut actions = Vec::new();
                for entry in rooms {
                    actions.extend(self.chat.add_room(Room::from(entry)));
                }
                self.run_chat_actions(actions)
            },
            ServerEvent::JoinedRooms { rooms } => {
                let mut actions = Vec::new();
                for entry in rooms {
                    let room_id = entry.id;
                    actions.extend(self.chat.add_room(Room::from(entry)));
                    actions.extend(self.chat.mark_joined(room_id));
                }
                self.run_chat_actions(actions)
            },
            ServerEvent::NewRoom(entry) | ServerEvent::RoomInfo(entry) => {
                let actions = self.chat.add_room(Room::from(entry));
                self.run_chat_actions(actions)
            },
            ServerEvent::Enter { room_id, user, perm } => {
                let user = User::from(user);
                let mut actions = self.chat.add_user(user.clone());
                self.chat.set_room_perm(room_id, perm);
                actions.extend(self.chat.enter_room(room_id, Some(user)));
                self.run_chat_actions(actions)
            },
            ServerEvent::Leave { room_id, user_id } => {
                let actions = self.chat.leave_room(Some(room_id), Some(user_id));
                self.run_chat_actions(actions)
            },
            ServerEvent::UserList { room_id, users } => {
                let users = users.into_iter().map(User::from).collect();
                let actions = self.chat.take_user_list(room_id, users);
                self.run_chat_actions(actions)
            },
            ServerEvent::MessageList { room_id: _, first_message_id: _, messages } => {
                let mut updates = Vec::new();
                for entry in messages {
                    match entry.data.as_text() {
                        Some(text) => {
                            let actions = self.chat.take_message(
                                entry.room_id,
                                entry.message_id,
                                entry.user_id,
                                entry.timestamp,
                                text.to_owned(),
                            );
                            updates.extend(self.run_chat_actions(actions));
                        },
                        None => {
                            tracing::warn!(
                                message_type = entry.data.message_type,
                                "skipping history entry with unrecognized message type"
                            );
                        },
                    }
                }
                updates
            },
            ServerEvent::TextMessage { room_id, message_id, user_id, timestamp, text } => {
                let actions = self.chat.take_message(room_id, message_id, user_id, timestamp, text);
                self.run_chat_actions(actions)
            },
            ServerEvent::UserInfo(entry) => {
                let actions = self.chat.add_user(entry.into());
                self.run_chat_actions(actions)
            },
            ServerEvent::Error { message } => vec![Update::ProtocolError { message }],
            ServerEvent::Other { kind, body } => {
                tracing::warn!(%kind, "unhandled response kind");
                vec![Update::Unhandled { kind, body }]
            },
            ServerEvent::ConnectionError { message } => {
                self.chat.reset();
                vec![Update::ConnectionLost { message }]
            },
        }
    }

    fn run_chat_actions(&mut self, actions: Vec<ChatAction>) -> Vec<Update> {
        let mut updates = Vec::new();
        for action in actions {
            match action {
                ChatAction::FetchUserInfo { user_id } => {
                    let codec_actions = self.codec.user_info(user_id);
                    updates.extend(self.run_codec_actions(codec_actions));
                },
                ChatAction::FetchMessages { room_id, first_message_id, message_cnt } => {
                    let first = first_message_id_wire(first_message_id);
                    let codec_actions = self.codec.list_messages(room_id, first, message_cnt);
                    updates.extend(self.run_codec_actions(codec_actions));
                },
                ChatAction::Render => updates.push(Update::Render),
            }
        }
        updates
    }
}

fn first_message_id_wire(id: MessageId) -> i64 {
    i64::try_from(id).unwrap_or(i64::MAX)
}
