//! Entity type and allocation utilities.
//!
//! An [`Entity`] is a lightweight identifier with no inherent data. It is made
//! of a slot index and a generation: slots are recycled once an entity is
//! destroyed, and the generation is bumped on every reuse so that stale IDs
//! can never alias a live entity.

use serde::{Deserialize, Serialize};

/// A unique entity identifier within one registry.
///
/// Entities are pure identifiers: they carry no data of their own. Components
/// are attached to entities to give them meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    /// The null / invalid entity sentinel. Never returned by an allocator.
    pub const INVALID: Entity = Entity {
        index: u32::MAX,
        generation: u32::MAX,
    };

    /// Create an entity from its raw parts.
    #[must_use]
    pub const fn from_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the slot index of this entity.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Returns the generation of this entity's slot at allocation time.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Returns `true` unless this is [`Entity::INVALID`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        !(self.index == u32::MAX && self.generation == u32::MAX)
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

/// Allocates entity IDs, recycling freed slots.
///
/// Each slot remembers its current generation and whether it is alive. A
/// freed slot goes onto a free list and is handed out again with its
/// generation incremented.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free: Vec<u32>,
    alive_count: usize,
}

impl EntityAllocator {
    /// Creates a new, empty allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh entity ID.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX - 1` slots would be needed.
    pub fn allocate(&mut self) -> Entity {
        self.alive_count += 1;

        if let Some(index) = self.free.pop() {
            let slot = index as usize;
            self.alive[slot] = true;
            return Entity::from_parts(index, self.generations[slot]);
        }

        let index = u32::try_from(self.generations.len())
            .ok()
            .filter(|&index| index != u32::MAX)
            .expect("entity slot space exhausted");
        self.generations.push(0);
        self.alive.push(true);
        Entity::from_parts(index, 0)
    }

    /// Releases an entity ID so its slot can be reused.
    ///
    /// Returns `false` (and changes nothing) if the entity is already dead or
    /// the ID is stale.
    pub fn free(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }

        let slot = entity.index as usize;
        self.alive[slot] = false;
        // A wrapped generation could alias a very old ID; retire the slot instead.
        match self.generations[slot].checked_add(1) {
            Some(next) if next != u32::MAX => {
                self.generations[slot] = next;
                self.free.push(entity.index);
            }
            _ => {}
        }
        self.alive_count -= 1;
        true
    }

    /// Returns `true` if `entity` is currently alive.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        let slot = entity.index as usize;
        slot < self.generations.len()
            && self.alive[slot]
            && self.generations[slot] == entity.generation
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Returns the number of slots ever created.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.generations.len()
    }

    /// Iterates over every live entity in slot order.
    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive
            .iter()
            .zip(&self.generations)
            .enumerate()
            .filter(|(_, (alive, _))| **alive)
            .map(|(index, (_, &generation))| Entity::from_parts(index as u32, generation))
    }
}
