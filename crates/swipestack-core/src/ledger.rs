//! # Tombstone Ledger
//!
//! Bounded history of swiped cards that can still be undone.
//!
//! Tombstones are stored oldest → newest in a `VecDeque`, so undo pops from
//! the back and eviction pops from the front in O(1).
//!
//! ```text
//! record(e) with limit = 4
//! ┌──────────────────────────────────┐
//! │ [a, b, c, d] + e → [b, c, d, e]  │ → returns Some(a) (evicted)
//! └──────────────────────────────────┘
//! ```
//!
//! The ledger never runs eviction callbacks itself. Every operation that
//! drops tombstones hands them back to the caller, which keeps this type
//! synchronous and free of side effects.
//!
//! # Invariants
//!
//! 1. `len() <= limit` after every operation
//! 2. At most one tombstone per card ID

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::item::CardItem;

/// A recorded swipe retained for possible undo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize, T::Id: Serialize",
    deserialize = "T: Deserialize<'de>, T::Id: Deserialize<'de>"
))]
pub struct Tombstone<T: CardItem> {
    /// Identity of the swiped card
    pub id: T::Id,
    /// Snapshot of the card at swipe time
    pub item: T,
    /// Direction of the swipe
    pub direction: Direction,
    /// When the swipe happened
    pub swiped_at: DateTime<Utc>,
}

impl<T: CardItem> Tombstone<T> {
    /// Create a tombstone stamped with the current time.
    pub fn new(item: T, direction: Direction) -> Self {
        Self::at(item, direction, Utc::now())
    }

    /// Create a tombstone with an explicit timestamp.
    pub fn at(item: T, direction: Direction, swiped_at: DateTime<Utc>) -> Self {
        Self {
            id: item.id(),
            item,
            direction,
            swiped_at,
        }
    }
}

/// Bounded FIFO of tombstones with LIFO undo.
#[derive(Debug, Clone)]
pub struct TombstoneLedger<T: CardItem> {
    entries: VecDeque<Tombstone<T>>,
    limit: usize,
}

impl<T: CardItem> TombstoneLedger<T> {
    /// Create an empty ledger holding at most `limit` tombstones.
    ///
    /// A limit of zero is legal: every record is evicted immediately.
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit.min(64)),
            limit,
        }
    }

    // ─── Core Operations ─────────────────────────────────────

    /// Record a swipe now. Returns the evicted tombstone, if any.
    pub fn record(&mut self, item: T, direction: Direction) -> Option<Tombstone<T>> {
        self.record_tombstone(Tombstone::new(item, direction))
    }

    /// Record an existing tombstone. Returns the evicted tombstone, if any.
    ///
    /// A previous tombstone for the same ID is replaced rather than evicted.
    pub fn record_tombstone(&mut self, tombstone: Tombstone<T>) -> Option<Tombstone<T>> {
        self.remove_by_id(&tombstone.id);
        self.entries.push_back(tombstone);
        if self.entries.len() > self.limit {
            return self.entries.pop_front();
        }
        None
    }

    /// Remove and return the most recent tombstone.
    pub fn pop_latest(&mut self) -> Option<Tombstone<T>> {
        self.entries.pop_back()
    }

    /// Most recent tombstone without removing it.
    pub fn peek_latest(&self) -> Option<&Tombstone<T>> {
        self.entries.back()
    }

    /// Remove the tombstone for `id`, if present.
    pub fn remove_by_id(&mut self, id: &T::Id) -> Option<Tombstone<T>> {
        let position = self.entries.iter().position(|t| t.id == *id)?;
        self.entries.remove(position)
    }

    /// Empty the ledger, returning everything it held oldest first.
    pub fn clear_all(&mut self) -> Vec<Tombstone<T>> {
        self.entries.drain(..).collect()
    }

    // ─── Info ────────────────────────────────────────────────

    /// Whether a tombstone exists for `id`.
    pub fn contains(&self, id: &T::Id) -> bool {
        self.entries.iter().any(|t| t.id == *id)
    }

    /// Number of tombstones.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured maximum.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Tombstones oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Tombstone<T>> {
        self.entries.iter()
    }

    /// Owned snapshot, oldest first.
    pub fn all(&self) -> Vec<Tombstone<T>> {
        self.entries.iter().cloned().collect()
    }
}
