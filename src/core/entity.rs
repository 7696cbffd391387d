//! Game entity ids
//!
//! Ids are small integers handed out in creation order, so a given seed
//! always produces the same ids and logs stay comparable across runs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Simple integer ID for game entities
///
/// These IDs are stable throughout a game - entities don't get reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u32);

impl EntityId {
    pub fn new(id: u32) -> Self {
        EntityId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Id of a physical card instance (deck, hand, discard or attached)
pub type CardId = EntityId;

/// Id of a live in-play Pokémon; survives evolution, dies with the Pokémon
pub type PokemonId = EntityId;

/// Hands out fresh ids for one game
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityAllocator {
    next_id: u32,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a new unique EntityId
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        id
    }
}

/// One of the two seats at the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(u8);

impl PlayerId {
    pub const FIRST: PlayerId = PlayerId(0);
    pub const SECOND: PlayerId = PlayerId(1);

    pub fn new(index: usize) -> Self {
        PlayerId(if index == 0 { 0 } else { 1 })
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn opponent(self) -> PlayerId {
        PlayerId(1 - self.0)
    }

    pub fn both() -> [PlayerId; 2] {
        [PlayerId::FIRST, PlayerId::SECOND]
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0 + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_is_sequential() {
        let mut ids = EntityAllocator::new();
        assert_eq!(ids.next_id(), EntityId::new(0));
        assert_eq!(ids.next_id(), EntityId::new(1));
        assert_eq!(ids.next_id().as_u32(), 2);
    }

    #[test]
    fn test_player_opponent() {
        assert_eq!(PlayerId::FIRST.opponent(), PlayerId::SECOND);
        assert_eq!(PlayerId::SECOND.opponent(), PlayerId::FIRST);
        assert_eq!(PlayerId::new(1).index(), 1);
        assert_eq!(PlayerId::FIRST.to_string(), "P1");
    }
}
