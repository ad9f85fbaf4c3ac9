//! Events delivered by an upstream card feed.

use std::collections::HashSet;

use crate::item::CardItem;

/// One change pushed by the upstream feed.
///
/// `Initial` is expected first; any later `Initial` is applied exactly like
/// `Replace`.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent<T: CardItem> {
    /// First full batch for a subscription
    Initial(Vec<T>),
    /// Cards to add at the end
    Append(Vec<T>),
    /// Wholesale replacement of the collection
    Replace(Vec<T>),
    /// Cards that no longer exist
    Remove(HashSet<T::Id>),
    /// New value for an existing card
    Update(T),
    /// Drop everything
    Clear,
}

impl<T: CardItem> FeedEvent<T> {
    /// Tag name used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Initial(_) => "initial",
            Self::Append(_) => "append",
            Self::Replace(_) => "replace",
            Self::Remove(_) => "remove",
            Self::Update(_) => "update",
            Self::Clear => "clear",
        }
    }

    /// Number of cards or IDs carried by the event.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Initial(items) | Self::Append(items) | Self::Replace(items) => items.len(),
            Self::Remove(ids) => ids.len(),
            Self::Update(_) => 1,
            Self::Clear => 0,
        }
    }

    /// Whether the event carries no cards or IDs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
