//! Identity contract for cards held by the stack.

use std::fmt::Debug;
use std::hash::Hash;

/// A caller-supplied card value with a stable identity.
///
/// The identity returned by [`CardItem::id`] must not change across updates
/// to the same logical card. Value equality (`PartialEq`) is used to detect
/// content changes, never identity.
pub trait CardItem: Clone + PartialEq + Debug + Send + Sync + 'static {
    /// Stable, hashable identifier.
    type Id: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// Identity of this card.
    fn id(&self) -> Self::Id;
}
