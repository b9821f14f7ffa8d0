//! Persisted slot storage.
//!
//! Session state is kept in a handful of named string slots that survive a
//! process restart. Backends only need to load one slot, write a batch of
//! slots atomically, and remove slots.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::Result;

/// A named persisted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// The access token.
    Token,
    /// The refresh token.
    RefreshToken,
    /// The server-issued session descriptor (JSON).
    Session,
    /// The user descriptor (JSON).
    User,
    /// Legacy bare user id, only ever cleared.
    UserId,
}

impl Slot {
    /// Every slot, in the order they are cleared.
    pub const ALL: [Slot; 5] = [
        Slot::Token,
        Slot::RefreshToken,
        Slot::Session,
        Slot::User,
        Slot::UserId,
    ];

    /// The slot's key in persisted form.
    pub fn key(self) -> &'static str {
        match self {
            Slot::Token => "token",
            Slot::RefreshToken => "refresh_token",
            Slot::Session => "session",
            Slot::User => "user",
            Slot::UserId => "user_id",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Backend for persisted slots.
///
/// Implementations must apply each `store` and `remove` call as a unit: a
/// reader never sees half of a batch.
pub trait SlotStorage: Send + Sync + fmt::Debug {
    /// Read one slot.
    fn load(&self, slot: Slot) -> Result<Option<String>>;

    /// Write several slots at once.
    fn store(&self, entries: &[(Slot, String)]) -> Result<()>;

    /// Remove several slots at once. Removing an empty slot is not an error.
    fn remove(&self, slots: &[Slot]) -> Result<()>;
}

/// In-memory storage living as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<Slot, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_slots<T>(&self, f: impl FnOnce(&mut HashMap<Slot, String>) -> T) -> T {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut slots)
    }
}

impl SlotStorage for MemoryStorage {
    fn load(&self, slot: Slot) -> Result<Option<String>> {
        Ok(self.with_slots(|slots| slots.get(&slot).cloned()))
    }

    fn store(&self, entries: &[(Slot, String)]) -> Result<()> {
        self.with_slots(|slots| {
            for (slot, value) in entries {
                slots.insert(*slot, value.clone());
            }
        });
        Ok(())
    }

    fn remove(&self, slots_to_remove: &[Slot]) -> Result<()> {
        self.with_slots(|slots| {
            for slot in slots_to_remove {
                slots.remove(slot);
            }
        });
        Ok(())
    }
}
