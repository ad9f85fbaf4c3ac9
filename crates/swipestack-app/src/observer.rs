//! Change notifications for UI bindings.
//!
//! The controller publishes a [`StackChange`] after every mutating call on a
//! `tokio::sync::broadcast` channel. Receivers that lag simply miss
//! intermediate changes and should re-read a [`StackSnapshot`].

use swipestack_core::{CardItem, Direction, StackError};

/// Capacity of the change broadcast channel.
pub const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// What changed in the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackChange<Id> {
    /// The collection was replaced
    CollectionReplaced {
        /// Cards in the new order
        count: usize,
    },
    /// A replacement was refused by the replacement policy
    ReplacementAbandoned,
    /// Cards were appended
    Appended {
        /// Cards actually added
        count: usize,
    },
    /// A card value changed
    Updated {
        /// Updated card
        id: Id,
    },
    /// Cards were removed
    Removed {
        /// Cards actually removed
        count: usize,
    },
    /// Everything was cleared
    Cleared,
    /// A card was swiped
    Swiped {
        /// Swiped card
        id: Id,
        /// Swipe direction
        direction: Direction,
    },
    /// A swipe was undone or rolled back
    Undone {
        /// Restored card
        id: Id,
    },
    /// A tombstone left the undo history
    Evicted {
        /// Evicted card
        id: Id,
    },
    /// Persisted tombstones were loaded into the undo history
    TombstonesRestored {
        /// Tombstones kept
        count: usize,
    },
    /// Loading flag changed
    LoadingChanged(bool),
    /// Error slot changed
    ErrorChanged(Option<StackError>),
}

/// Point-in-time view of the stack for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct StackSnapshot<T: CardItem> {
    /// Materialized visible window, current card first
    pub visible: Vec<T>,
    /// Cursor index into the full order
    pub cursor: usize,
    /// Cards left to swipe
    pub remaining: usize,
    /// Tombstones available for undo
    pub undoable: usize,
    /// Whether a load is in progress
    pub is_loading: bool,
    /// Most recent surfaced error
    pub last_error: Option<StackError>,
}

impl<T: CardItem> StackSnapshot<T> {
    /// Card on top of the stack.
    pub fn current(&self) -> Option<&T> {
        self.visible.first()
    }
}
