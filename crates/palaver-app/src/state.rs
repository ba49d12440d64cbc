//! Chat entities and the per-room ingestion algorithm.
//!
//! A room's visible history is its *accepted sequence*: strictly increasing,
//! gapless message ids starting at 1. Messages that arrive ahead of their
//! predecessors park in a gap buffer until the missing range is backfilled.
//! [`Room::ingest`] is the only way messages reach either structure.

use std::collections::BTreeMap;

use palaver_proto::{MessageId, RoomEntry, RoomId, RoomPerm, UserEntry, UserId};

use crate::roster::{Keyed, Roster};

/// A chat participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Stable user id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Optional display color tag.
    pub color: Option<String>,
}

impl User {
    /// Create a user record.
    pub fn new(id: UserId, name: impl Into<String>, color: Option<String>) -> Self {
        Self { id, name: name.into(), color }
    }

    /// Stand-in identity shown until the real record arrives.
    pub fn placeholder(id: UserId) -> Self {
        Self { id, name: format!("user#{id}"), color: None }
    }
}

impl From<UserEntry> for User {
    fn from(entry: UserEntry) -> Self {
        Self { id: entry.id, name: entry.name, color: entry.color }
    }
}

impl Keyed for User {
    fn id(&self) -> u64 {
        self.id
    }
    fn key(&self) -> &str {
        &self.name
    }
}

/// A text message with a resolved author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Per-room message id.
    pub id: MessageId,
    /// Room the message belongs to.
    pub room_id: RoomId,
    /// Author at the time the message was accepted.
    pub author: User,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
    /// Message body.
    pub text: String,
}

impl Message {
    /// Create a message record.
    pub fn new(
        id: MessageId,
        room_id: RoomId,
        author: User,
        timestamp: u64,
        text: impl Into<String>,
    ) -> Self {
        Self { id, room_id, author, timestamp, text: text.into() }
    }

    /// The same message attributed to a different author.
    pub(crate) fn with_author(mut self, author: User) -> Self {
        self.author = author;
        self
    }
}

/// Outcome of offering one message to a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    /// The message (and any contiguous run it unblocked) joined the
    /// accepted sequence.
    Accepted,
    /// The id is already accepted or already parked; dropped silently.
    Stale,
    /// The message parked in the gap buffer; `[first, last]` must be
    /// refetched from the server.
    Deferred {
        /// First missing id.
        first: MessageId,
        /// Last missing id.
        last: MessageId,
    },
}

/// A named channel with membership and an ordered message history.
#[derive(Debug, Clone)]
pub struct Room {
    /// Stable room id.
    pub id: RoomId,
    /// Room name.
    pub name: String,
    /// What the local user may do here. Carried, never enforced.
    pub perm: RoomPerm,
    /// Whether the local user currently occupies this room.
    pub is_in: bool,
    /// Unseen activity since the room was last focused.
    pub unread: bool,
    users: Roster<User>,
    messages: Vec<Message>,
    last_id: MessageId,
    gap: BTreeMap<MessageId, Message>,
}

impl Room {
    /// Create an empty room.
    pub fn new(id: RoomId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            perm: RoomPerm::default(),
            is_in: false,
            unread: false,
            users: Roster::new(),
            messages: Vec::new(),
            last_id: 0,
            gap: BTreeMap::new(),
        }
    }

    /// Members in name order.
    pub fn members(&self) -> &Roster<User> {
        &self.users
    }

    /// The accepted message sequence, gapless and ordered by id.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Id of the last accepted message; 0 when the history is empty.
    pub fn last_id(&self) -> MessageId {
        self.last_id
    }

    /// Ids currently parked in the gap buffer, ascending.
    pub fn deferred_ids(&self) -> impl Iterator<Item = MessageId> + '_ {
        self.gap.keys().copied()
    }

    /// Add a member. No-op when already present.
    pub fn add_user(&mut self, user: User) {
        self.users.add(user);
    }

    /// Remove a member. No-op when absent.
    pub fn remove_user(&mut self, user_id: UserId) {
        self.users.remove(user_id);
    }

    /// A user entered: join the roster and mark the room occupied.
    pub(crate) fn user_enter(&mut self, user: User) {
        self.users.add(user);
        self.is_in = true;
    }

    /// The local user left: clear transient data. Id and name persist, so
    /// re-entering later starts with an empty history.
    pub(crate) fn leave(&mut self) {
        self.is_in = false;
        self.unread = false;
        self.users.clear();
        self.messages.clear();
        self.gap.clear();
        self.last_id = 0;
    }

    /// Offer one message with a resolved author to this room.
    ///
    /// `focused` tells whether this room is the focused one at insertion
    /// time; unfocused insertions set the unread flag, which is never
    /// cleared here.
    pub(crate) fn ingest(&mut self, message: Message, focused: bool) -> Ingest {
        let next = self.last_id + 1;

        if message.id < next {
            return Ingest::Stale;
        }

        if message.id > next {
            if self.gap.contains_key(&message.id) {
                return Ingest::Stale;
            }
            let last = message.id - 1;
            self.gap.insert(message.id, message);
            return Ingest::Deferred { first: next, last };
        }

        self.accept(message);
        // Drain the contiguous run this id unblocked
        while let Some(parked) = self.gap.remove(&(self.last_id + 1)) {
            self.accept(parked);
        }
        if !focused {
            self.unread = true;
        }
        Ingest::Accepted
    }

    fn accept(&mut self, message: Message) {
        self.last_id = message.id;
        self.messages.push(message);
    }
}

impl From<RoomEntry> for Room {
    fn from(entry: RoomEntry) -> Self {
        let mut room = Self::new(entry.id, entry.name);
        room.perm = entry.perm;
        room
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn msg(id: MessageId) -> Message {
        Message::new(id, 1, User::new(7, "ana", None), 0, format!("m{id}"))
    }

    fn accepted_ids(room: &Room) -> Vec<MessageId> {
        room.messages().iter().map(|m| m.id).collect()
    }

    #[test]
    fn contiguous_messages_append() {
        let mut room = Room::new(1, "lounge");
        assert_eq!(room.ingest(msg(1), true), Ingest::Accepted);
        assert_eq!(room.ingest(msg(2), true), Ingest::Accepted);
        assert_eq!(accepted_ids(&room), vec![1, 2]);
        assert_eq!(room.last_id(), 2);
    }

    #[test]
    fn stale_ids_are_discarded() {
        let mut room = Room::new(1, "lounge");
        room.ingest(msg(1), true);
        room.ingest(msg(2), true);
        assert_eq!(room.ingest(msg(1), true), Ingest::Stale);
        assert_eq!(accepted_ids(&room), vec![1, 2]);
    }

    #[test]
    fn ahead_of_sequence_parks_and_signals_the_missing_range() {
        let mut room = Room::new(1, "lounge");
        room.ingest(msg(1), true);
        assert_eq!(room.ingest(msg(5), true), Ingest::Deferred { first: 2, last: 4 });
        assert_eq!(accepted_ids(&room), vec![1]);
        assert_eq!(room.deferred_ids().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn parked_id_collision_is_a_no_op() {
        let mut room = Room::new(1, "lounge");
        room.ingest(msg(5), true);
        assert_eq!(room.ingest(msg(5), true), Ingest::Stale);
        assert_eq!(room.deferred_ids().count(), 1);
    }

    #[test]
    fn filling_the_gap_drains_the_contiguous_run() {
        let mut room = Room::new(1, "lounge");
        room.ingest(msg(1), true);
        room.ingest(msg(2), true);
        room.ingest(msg(4), true);

        assert_eq!(room.ingest(msg(3), true), Ingest::Accepted);
        assert_eq!(accepted_ids(&room), vec![1, 2, 3, 4]);
        assert_eq!(room.deferred_ids().count(), 0);
    }

    #[test]
    fn unfocused_insertions_mark_unread() {
        let mut room = Room::new(1, "lounge");
        room.ingest(msg(1), true);
        assert!(!room.unread);
        room.ingest(msg(2), false);
        assert!(room.unread);
        // Never cleared by ingestion
        room.ingest(msg(3), true);
        assert!(room.unread);
    }

    #[test]
    fn leave_resets_transient_data_but_keeps_identity() {
        let mut room = Room::new(3, "den");
        room.user_enter(User::new(7, "ana", None));
        room.ingest(msg(1), false);
        room.ingest(msg(5), false);

        room.leave();

        assert_eq!(room.id, 3);
        assert_eq!(room.name, "den");
        assert!(!room.is_in);
        assert!(!room.unread);
        assert!(room.members().is_empty());
        assert!(room.messages().is_empty());
        assert_eq!(room.last_id(), 0);
        assert_eq!(room.deferred_ids().count(), 0);
    }
}
