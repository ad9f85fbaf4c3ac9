//! # Card Store
//!
//! Ordered card storage addressed by stable identity.
//!
//! The store keeps three pieces of state:
//!
//! - `order`: the traversal order as a sequence of IDs (no duplicates)
//! - `by_id`: the lookup map from ID to the current card value
//! - `cursor`: index into `order` of the next card to be swiped
//!
//! ```text
//!            cursor
//!              │
//!   order: [ a , b , c , d , e ]
//!            ▲   ▲───────────▲
//!         swiped   remaining (visible window = first max_visible of these)
//! ```
//!
//! # Invariants
//!
//! 1. Every ID in `order` has an entry in `by_id`.
//! 2. `cursor <= order.len()`.
//! 3. After any mutation the cursor does not rest on a hole.
//! 4. IDs in `by_id` that are not in `order` are tracked as *detached*: cards
//!    kept alive for undo that will be re-materialized at the cursor.
//!
//! The lookup map is only rebuilt by [`CardStore::set_collection`] and
//! [`CardStore::clear`]; removal is a single linear pass over `order`.

use std::collections::{HashMap, HashSet};

use crate::item::CardItem;

/// Ordered, ID-indexed card collection with a swipe cursor.
#[derive(Debug, Clone)]
pub struct CardStore<T: CardItem> {
    order: Vec<T::Id>,
    by_id: HashMap<T::Id, T>,
    detached: HashSet<T::Id>,
    cursor: usize,
}

impl<T: CardItem> Default for CardStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: CardItem> CardStore<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            by_id: HashMap::new(),
            detached: HashSet::new(),
            cursor: 0,
        }
    }

    // ─── Mutations ───────────────────────────────────────────

    /// Replace the whole collection and reset the cursor.
    ///
    /// Order follows first occurrence of each ID; when an ID repeats, the last
    /// value wins in the lookup map.
    pub fn set_collection(&mut self, items: Vec<T>) {
        let mut order = Vec::with_capacity(items.len());
        let mut by_id = HashMap::with_capacity(items.len());
        let mut duplicates = 0usize;
        for item in items {
            let id = item.id();
            if by_id.insert(id.clone(), item).is_none() {
                order.push(id);
            } else {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            tracing::debug!(duplicates, "collapsed duplicate card IDs");
        }
        self.order = order;
        self.by_id = by_id;
        self.detached.clear();
        self.cursor = 0;
    }

    /// Append cards whose ID is not already in the order.
    ///
    /// Returns the number of cards appended. Duplicates keep their original
    /// value.
    pub fn append(&mut self, items: Vec<T>) -> usize {
        let mut appended = 0;
        for item in items {
            let id = item.id();
            if self.is_ordered(&id) {
                tracing::trace!(?id, "skipping duplicate append");
                continue;
            }
            self.detached.remove(&id);
            self.by_id.insert(id.clone(), item);
            self.order.push(id);
            appended += 1;
        }
        if appended > 0 {
            self.skip_holes_forward();
        }
        appended
    }

    /// Replace the value of an existing card without moving it.
    ///
    /// Returns `false` when the ID is unknown.
    pub fn update(&mut self, item: T) -> bool {
        match self.by_id.get_mut(&item.id()) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    /// Remove cards by ID from both the lookup map and the order.
    ///
    /// Returns the number of cards that were present. Removed positions before
    /// the cursor pull the cursor back so the current card stays current.
    pub fn remove(&mut self, ids: impl IntoIterator<Item = T::Id>) -> usize {
        let ids: HashSet<T::Id> = ids.into_iter().collect();
        if ids.is_empty() {
            return 0;
        }

        let mut removed = 0;
        for id in &ids {
            if self.by_id.remove(id).is_some() {
                removed += 1;
            }
            self.detached.remove(id);
        }

        let cursor = self.cursor;
        let mut removed_before_cursor = 0;
        let mut index = 0;
        self.order.retain(|id| {
            let keep = !ids.contains(id);
            if !keep && index < cursor {
                removed_before_cursor += 1;
            }
            index += 1;
            keep
        });
        self.cursor = cursor - removed_before_cursor;

        if self.cursor > self.order.len() {
            self.cursor = self.order.len().saturating_sub(1);
        }
        self.skip_holes_forward();
        removed
    }

    /// Remove everything and reset the cursor.
    pub fn clear(&mut self) {
        self.order.clear();
        self.by_id.clear();
        self.detached.clear();
        self.cursor = 0;
    }

    /// Keep a card in the lookup map without placing it in the order.
    ///
    /// Used for restored tombstones whose card is not part of the current
    /// collection. Returns `false` if the ID is already known.
    pub fn insert_detached(&mut self, item: T) -> bool {
        let id = item.id();
        if self.by_id.contains_key(&id) {
            return false;
        }
        self.by_id.insert(id.clone(), item);
        self.detached.insert(id);
        true
    }

    // ─── Cursor ──────────────────────────────────────────────

    /// Move past the current card, skipping holes. Returns `false` at the end.
    pub fn advance(&mut self) -> bool {
        if self.cursor >= self.order.len() {
            return false;
        }
        self.cursor += 1;
        self.skip_holes_forward();
        true
    }

    /// Bring `id` back as the current card.
    ///
    /// The common case is the card directly behind the cursor (ignoring
    /// holes), which just steps the cursor back. A card sitting elsewhere in
    /// the order is moved to the cursor, and a detached card is inserted at
    /// the cursor. Returns `false` if the ID is not in the lookup map.
    pub fn restore(&mut self, id: &T::Id) -> bool {
        if !self.by_id.contains_key(id) {
            return false;
        }

        if self.detached.remove(id) {
            self.order.insert(self.cursor, id.clone());
            return true;
        }

        let mut behind = self.cursor;
        while behind > 0 && !self.by_id.contains_key(&self.order[behind - 1]) {
            behind -= 1;
        }
        if behind > 0 && self.order[behind - 1] == *id {
            self.cursor = behind - 1;
            return true;
        }

        if let Some(position) = self.order.iter().position(|candidate| candidate == id) {
            self.order.remove(position);
            if position < self.cursor {
                self.cursor -= 1;
            }
            self.order.insert(self.cursor, id.clone());
        }
        true
    }

    fn skip_holes_forward(&mut self) {
        while self.cursor < self.order.len() && !self.by_id.contains_key(&self.order[self.cursor])
        {
            self.cursor += 1;
        }
    }

    // ─── Queries ─────────────────────────────────────────────

    /// Card at the cursor.
    pub fn current_item(&self) -> Option<&T> {
        self.order.get(self.cursor).and_then(|id| self.by_id.get(id))
    }

    /// Cards at or after the cursor.
    pub fn remaining_count(&self) -> usize {
        self.order.len().saturating_sub(self.cursor)
    }

    /// Up to `n` cards starting at the cursor.
    pub fn visible_window(&self, n: usize) -> Vec<&T> {
        self.window_ids(n)
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .collect()
    }

    /// Offset of `id` inside the window of size `n`, if it is there.
    pub fn position_in_window(&self, id: &T::Id, n: usize) -> Option<usize> {
        self.window_ids(n).iter().position(|candidate| candidate == id)
    }

    fn window_ids(&self, n: usize) -> &[T::Id] {
        let start = self.cursor.min(self.order.len());
        let end = start.saturating_add(n).min(self.order.len());
        &self.order[start..end]
    }

    /// Look up a card by ID (ordered or detached).
    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.by_id.get(id)
    }

    /// Whether the lookup map knows `id`.
    pub fn contains(&self, id: &T::Id) -> bool {
        self.by_id.contains_key(id)
    }

    /// Whether `id` is part of the traversal order.
    pub fn is_ordered(&self, id: &T::Id) -> bool {
        self.by_id.contains_key(id) && !self.detached.contains(id)
    }

    /// Current cursor index.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of IDs in the order.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the order is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// IDs in traversal order.
    pub fn order(&self) -> &[T::Id] {
        &self.order
    }

    /// Cards in traversal order.
    pub fn ordered_items(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    /// Number of cards held only for undo.
    pub fn detached_count(&self) -> usize {
        self.detached.len()
    }

    /// Verify the structural invariants. Intended for tests and debug checks.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen = HashSet::with_capacity(self.order.len());
        for id in &self.order {
            if !seen.insert(id) {
                return Err(format!("duplicate id {id:?} in order"));
            }
            if !self.by_id.contains_key(id) {
                return Err(format!("id {id:?} in order but not in lookup map"));
            }
            if self.detached.contains(id) {
                return Err(format!("id {id:?} both ordered and detached"));
            }
        }
        for id in &self.detached {
            if !self.by_id.contains_key(id) {
                return Err(format!("detached id {id:?} missing from lookup map"));
            }
        }
        if seen.len() + self.detached.len() != self.by_id.len() {
            return Err("lookup map holds ids that are neither ordered nor detached".into());
        }
        if self.cursor > self.order.len() {
            return Err(format!(
                "cursor {} past end {}",
                self.cursor,
                self.order.len()
            ));
        }
        Ok(())
    }
}
