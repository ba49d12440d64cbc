//! Permission flag newtypes.
//!
//! Permissions travel as plain integers on the wire. Both namespaces are
//! wrapped into a typed accessor exactly once, at the serde boundary, so call
//! sites never branch on the raw representation. The client only carries
//! these flags; it does not enforce them.

use serde::{Deserialize, Serialize};

/// Account-wide permission bits, reported by the `whoami` response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalPerm(u32);

impl GlobalPerm {
    /// Bit allowing the room directory to be listed.
    pub const LIST_ROOMS: u32 = 1;
    /// Bit allowing new rooms to be created.
    pub const CREATE_ROOM: u32 = 1 << 1;

    /// Wrap raw permission bits received from the server.
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bit representation.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether the account may list rooms.
    pub const fn may_list_rooms(self) -> bool {
        self.0 & Self::LIST_ROOMS != 0
    }

    /// Whether the account may create rooms.
    pub const fn may_create_room(self) -> bool {
        self.0 & Self::CREATE_ROOM != 0
    }
}

/// Per-room permission bits, reported with room entries and `enter`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomPerm(u32);

impl RoomPerm {
    /// Bit allowing room history and events to be read.
    pub const READ: u32 = 1;
    /// Bit allowing messages to be posted.
    pub const WRITE: u32 = 1 << 1;

    /// Wrap raw permission bits received from the server.
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bit representation.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether the room may be read.
    pub const fn may_read(self) -> bool {
        self.0 & Self::READ != 0
    }

    /// Whether the room may be written to.
    pub const fn may_write(self) -> bool {
        self.0 & Self::WRITE != 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn global_perm_bits() {
        let perm = GlobalPerm::new(GlobalPerm::LIST_ROOMS | GlobalPerm::CREATE_ROOM);
        assert!(perm.may_list_rooms());
        assert!(perm.may_create_room());

        let perm = GlobalPerm::new(GlobalPerm::LIST_ROOMS);
        assert!(perm.may_list_rooms());
        assert!(!perm.may_create_room());
    }

    #[test]
    fn room_perm_bits() {
        let perm = RoomPerm::new(RoomPerm::READ);
        assert!(perm.may_read());
        assert!(!perm.may_write());
    }

    #[test]
    fn perm_is_transparent_on_the_wire() {
        let perm: RoomPerm = serde_json::from_str("3").unwrap();
        assert_eq!(perm, RoomPerm::new(3));
        assert_eq!(serde_json::to_string(&perm).unwrap(), "3");
    }
}
