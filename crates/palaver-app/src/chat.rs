//! The chat state synchronizer.
//!
//! [`Chat`] reconciles three asynchronous concerns: message arrival racing
//! ahead of a room's known continuity (handled by the per-room gap buffer in
//! [`Room`]), message arrival racing ahead of author identity (handled by
//! the pending-user queues here), and membership/focus changes driven by
//! both local actions and remote broadcasts.
//!
//! All mutation goes through the methods below, invoked from a single event
//! path; there is no interior locking and no concurrent access.

use std::collections::{BTreeMap, HashMap};

use palaver_proto::{GlobalPerm, MessageId, RoomId, RoomPerm, UserId};

use crate::{
    action::ChatAction,
    roster::{Keyed, Roster},
    state::{Ingest, Message, Room, User},
};

/// Entry in the name-ordered room directory.
#[derive(Debug, Clone)]
struct RoomTag {
    id: RoomId,
    name: String,
}

impl Keyed for RoomTag {
    fn id(&self) -> u64 {
        self.id
    }
    fn key(&self) -> &str {
        &self.name
    }
}

/// Root aggregate: everything this client knows about the chat.
#[derive(Debug, Default)]
pub struct Chat {
    user_id: Option<UserId>,
    perm: GlobalPerm,
    users: HashMap<UserId, User>,
    rooms: HashMap<RoomId, Room>,
    directory: Roster<RoomTag>,
    /// Messages whose author is not resolved yet: user id, then room id,
    /// then arrival order.
    pending: HashMap<UserId, BTreeMap<RoomId, Vec<Message>>>,
    focus: Option<RoomId>,
}

impl Chat {
    /// An empty chat with no identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// The local user's id, once `whoami` answered.
    pub fn local_user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// The local user's account-wide permissions.
    pub fn global_perm(&self) -> GlobalPerm {
        self.perm
    }

    /// The focused room id, if any.
    pub fn focus(&self) -> Option<RoomId> {
        self.focus
    }

    /// The focused room, if any.
    pub fn focused_room(&self) -> Option<&Room> {
        self.focus.and_then(|id| self.rooms.get(&id))
    }

    /// Look up a room.
    pub fn room(&self, room_id: RoomId) -> Option<&Room> {
        self.rooms.get(&room_id)
    }

    /// Rooms in directory (name) order.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.directory.iter().filter_map(|tag| self.rooms.get(&tag.id))
    }

    /// Look up a user.
    pub fn user(&self, user_id: UserId) -> Option<&User> {
        self.users.get(&user_id)
    }

    /// Number of messages queued for an unresolved user, across all rooms.
    pub fn pending_messages(&self, user_id: UserId) -> usize {
        self.pending.get(&user_id).map_or(0, |rooms| rooms.values().map(Vec::len).sum())
    }

    /// Adopt the local identity reported by the server.
    pub fn identify(&mut self, user: User, perm: GlobalPerm) -> Vec<ChatAction> {
        self.user_id = Some(user.id);
        self.perm = perm;
        self.add_user(user)
    }

    /// Register a user, replacing any previous record with the same id.
    ///
    /// Resolving a user re-attributes every message queued under that id and
    /// feeds each back through its room's ingestion, deciding the unread
    /// flag by the focus state now, not at queue time. The user's whole
    /// pending entry is cleared.
    pub fn add_user(&mut self, user: User) -> Vec<ChatAction> {
        self.users.insert(user.id, user.clone());

        let mut actions = Vec::new();
        if let Some(queued) = self.pending.remove(&user.id) {
            let mut flushed = 0usize;
            for (_, messages) in queued {
                for message in messages {
                    flushed += 1;
                    actions.extend(self.deliver(message.with_author(user.clone())));
                }
            }
            tracing::debug!(user_id = user.id, flushed, "resolved pending user");
        }

        actions.push(ChatAction::Render);
        actions
    }

    /// Register a room. The first write wins: a known id is a no-op.
    pub fn add_room(&mut self, room: Room) -> Vec<ChatAction> {
        if self.rooms.contains_key(&room.id) {
            return vec![];
        }
        self.directory.add(RoomTag { id: room.id, name: room.name.clone() });
        self.rooms.insert(room.id, room);
        vec![ChatAction::Render]
    }

    /// Update the local user's permissions for a room.
    pub fn set_room_perm(&mut self, room_id: RoomId, perm: RoomPerm) {
        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.perm = perm;
        }
    }

    /// Mark a room as occupied without focusing it, as joined-room listings
    /// report. The local user joins the roster when known.
    pub fn mark_joined(&mut self, room_id: RoomId) -> Vec<ChatAction> {
        let local = self.local_user();
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return vec![];
        };
        match local {
            Some(user) => room.user_enter(user),
            None => room.is_in = true,
        }
        vec![ChatAction::Render]
    }

    /// A user entered a room; `None` means the local user.
    ///
    /// Permitted only when the acting user is the local user or the room is
    /// already occupied (a third party entering a room we are in).
    /// Anything else - including an unknown room - is silently ignored.
    /// A local enter focuses the room and clears its unread flag.
    pub fn enter_room(&mut self, room_id: RoomId, user: Option<User>) -> Vec<ChatAction> {
        let user = match user {
            Some(user) => user,
            None => match self.local_user() {
                Some(user) => user,
                None => return vec![],
            },
        };
        let is_local = Some(user.id) == self.user_id;

        let Some(room) = self.rooms.get_mut(&room_id) else {
            tracing::warn!(room_id, "enter for an unknown room ignored");
            return vec![];
        };
        if !is_local && !room.is_in {
            tracing::debug!(room_id, user_id = user.id, "ignoring enter for a room we are not in");
            return vec![];
        }

        room.user_enter(user);
        if is_local {
            self.focus = Some(room_id);
            room.unread = false;
        }
        vec![ChatAction::Render]
    }

    /// A user left a room. `None` defaults to the focused room and the
    /// local user. Unknown rooms are a no-op.
    ///
    /// When the local user leaves, focus is cleared (if this room held it)
    /// and the room's transient data is reset; its id and name persist.
    pub fn leave_room(
        &mut self,
        room_id: Option<RoomId>,
        user_id: Option<UserId>,
    ) -> Vec<ChatAction> {
        let Some(room_id) = room_id.or(self.focus) else {
            return vec![];
        };
        let Some(user_id) = user_id.or(self.user_id) else {
            return vec![];
        };
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return vec![];
        };

        room.remove_user(user_id);
        if Some(user_id) == self.user_id {
            if self.focus == Some(room_id) {
                self.focus = None;
            }
            room.leave();
        }
        vec![ChatAction::Render]
    }

    /// Focus an already-joined room locally and clear its unread flag.
    /// Ignored for unknown or unjoined rooms.
    pub fn focus_room(&mut self, room_id: RoomId) -> Vec<ChatAction> {
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return vec![];
        };
        if !room.is_in {
            return vec![];
        }
        self.focus = Some(room_id);
        room.unread = false;
        vec![ChatAction::Render]
    }

    /// Take one inbound text message, resolving its author first.
    ///
    /// Unknown authors queue the message under (user id, room id) with a
    /// placeholder identity and request `user-info` exactly once per pending
    /// id; the message is neither visible nor discarded until the author
    /// resolves.
    pub fn take_message(
        &mut self,
        room_id: RoomId,
        message_id: MessageId,
        user_id: UserId,
        timestamp: u64,
        text: String,
    ) -> Vec<ChatAction> {
        let mut actions = if let Some(author) = self.users.get(&user_id) {
            let message = Message::new(message_id, room_id, author.clone(), timestamp, text);
            self.deliver(message)
        } else {
            let first_reference = !self.pending.contains_key(&user_id);
            let message =
                Message::new(message_id, room_id, User::placeholder(user_id), timestamp, text);
            self.pending.entry(user_id).or_default().entry(room_id).or_default().push(message);
            tracing::debug!(user_id, room_id, message_id, "queued message for unresolved user");
            if first_reference {
                vec![ChatAction::FetchUserInfo { user_id }]
            } else {
                vec![]
            }
        };
        actions.push(ChatAction::Render);
        actions
    }

    /// Take the membership roster of one room, registering each user.
    pub fn take_user_list(&mut self, room_id: RoomId, users: Vec<User>) -> Vec<ChatAction> {
        let mut actions = Vec::new();
        for user in users {
            actions.extend(self.add_user(user.clone()));
            if let Some(room) = self.rooms.get_mut(&room_id) {
                room.add_user(user);
            }
        }
        actions.push(ChatAction::Render);
        actions
    }

    /// Drop all session state except the local identity entry.
    pub fn reset(&mut self) {
        let local = self.local_user();
        self.users.clear();
        if let Some(user) = local {
            self.users.insert(user.id, user);
        }
        self.rooms.clear();
        self.directory.clear();
        self.pending.clear();
        self.focus = None;
    }

    /// Drop everything, including the local identity.
    pub fn reset_user(&mut self) {
        self.reset();
        self.users.clear();
        self.user_id = None;
        self.perm = GlobalPerm::default();
    }

    fn local_user(&self) -> Option<User> {
        self.user_id.and_then(|id| self.users.get(&id)).cloned()
    }

    /// Route a resolved message into its room's ingestion.
    fn deliver(&mut self, message: Message) -> Vec<ChatAction> {
        let room_id = message.room_id;
        let focused = self.focus == Some(room_id);
        let Some(room) = self.rooms.get_mut(&room_id) else {
            tracing::warn!(room_id, message_id = message.id, "message for an unknown room dropped");
            return vec![];
        };
        match room.ingest(message, focused) {
            Ingest::Accepted | Ingest::Stale => vec![],
            Ingest::Deferred { first, last } => {
                tracing::debug!(room_id, first, last, "sequence gap detected");
                vec![ChatAction::FetchMessages {
                    room_id,
                    first_message_id: first,
                    message_cnt: (last - first + 1) as u32,
                }]
            },
        }
    }
}
