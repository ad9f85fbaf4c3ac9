//! # Stack Controller
//!
//! Orchestrates the card store, the tombstone ledger and the replacement
//! policy behind one state machine.
//!
//! ```text
//!            swipe(d)                 undo()
//! visible ───────────► tombstoned ───────────► visible (same position)
//!                          │
//!                          ├── ledger overflow ──► evicted
//!                          └── replacement ─────► reconciled away
//! ```
//!
//! The controller has no internal locking. Share it as a
//! [`SharedController`] so every mutation runs under one write lock and
//! operations linearize.

use std::collections::HashMap;
use std::sync::Arc;

use async_lock::RwLock;
use swipestack_core::{
    decide, CardItem, CardStore, Direction, StackConfig, StackError, Tombstone, TombstoneLedger,
    UndoSettings,
};
use tokio::sync::broadcast;

use crate::eviction::EvictionDispatcher;
use crate::hooks::{UndoConfig, UndoHooks};
use crate::observer::{StackChange, StackSnapshot, CHANGE_CHANNEL_CAPACITY};

/// Controller shared between the UI, the listener and callers.
pub type SharedController<T> = Arc<RwLock<StackController<T>>>;

/// Result of [`StackController::set_collection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementOutcome {
    /// The new collection is in place
    Applied {
        /// Tombstones evicted by the replacement
        evicted: usize,
    },
    /// The replacement policy refused; nothing changed
    Abandoned,
}

struct UndoState<T: CardItem> {
    settings: UndoSettings,
    hooks: Arc<dyn UndoHooks<T>>,
    ledger: TombstoneLedger<T>,
    evictions: EvictionDispatcher<T>,
}

/// Swipe/undo state machine over an ordered card collection.
pub struct StackController<T: CardItem> {
    config: StackConfig,
    store: CardStore<T>,
    undo: Option<UndoState<T>>,
    swiped_directions: HashMap<T::Id, Direction>,
    is_loading: bool,
    last_error: Option<StackError>,
    changes: broadcast::Sender<StackChange<T::Id>>,
}

impl<T: CardItem> std::fmt::Debug for StackController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackController")
            .field("cards", &self.store.len())
            .field("cursor", &self.store.cursor())
            .field("undoable", &self.undoable_count())
            .field("is_loading", &self.is_loading)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl<T: CardItem> StackController<T> {
    /// Create an empty controller. Undo is disabled when `undo` is `None`.
    pub fn new(config: StackConfig, undo: Option<UndoConfig<T>>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let undo = undo.map(|undo| UndoState {
            ledger: TombstoneLedger::new(undo.settings.limit),
            evictions: EvictionDispatcher::new(undo.hooks.clone()),
            settings: undo.settings,
            hooks: undo.hooks,
        });
        Self {
            config,
            store: CardStore::new(),
            undo,
            swiped_directions: HashMap::new(),
            is_loading: false,
            last_error: None,
            changes,
        }
    }

    /// Wrap the controller for sharing.
    pub fn shared(self) -> SharedController<T> {
        Arc::new(RwLock::new(self))
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StackChange<T::Id>> {
        self.changes.subscribe()
    }

    fn emit(&self, change: StackChange<T::Id>) {
        // No receivers is fine
        let _ = self.changes.send(change);
    }

    // ─── Swipe / Undo ────────────────────────────────────────

    /// Swipe the current card away.
    ///
    /// Returns `None` when the stack is exhausted or `direction` is not part of
    /// the configured scheme. When undo is configured the
    /// swipe is recorded; an overflowing tombstone is evicted in the
    /// background and its card dropped from the store, unless it is the card
    /// that was just swiped (only possible with a limit of zero).
    pub fn swipe(&mut self, direction: Direction) -> Option<T> {
        if !self.config.direction_scheme.contains(direction) {
            tracing::debug!(
                %direction,
                scheme = ?self.config.direction_scheme,
                "swipe direction not in scheme"
            );
            return None;
        }
        let item = self.store.current_item()?.clone();
        let id = item.id();
        self.store.advance();
        self.swiped_directions.insert(id.clone(), direction);
        tracing::debug!(?id, %direction, remaining = self.store.remaining_count(), "swiped card");
        self.emit(StackChange::Swiped {
            id: id.clone(),
            direction,
        });

        let evicted = self
            .undo
            .as_mut()
            .and_then(|undo| undo.ledger.record(item.clone(), direction));
        if let Some(evicted) = evicted {
            let evicted_id = evicted.id.clone();
            if evicted_id != id {
                self.store.remove([evicted_id.clone()]);
                self.swiped_directions.remove(&evicted_id);
            }
            if let Some(undo) = self.undo.as_ref() {
                undo.evictions.dispatch(evicted);
            }
            tracing::debug!(id = ?evicted_id, "evicted oldest tombstone");
            self.emit(StackChange::Evicted { id: evicted_id });
        }

        Some(item)
    }

    /// Undo the most recent swipe.
    ///
    /// Tombstones whose card has since been removed are discarded and the
    /// next one is tried. A `false` from `validate_undo` cancels without
    /// touching the history.
    pub async fn undo(&mut self) -> Option<T> {
        let hooks = self.undo.as_ref()?.hooks.clone();
        let candidate = self.next_undo_candidate()?;
        if !hooks.validate_undo(&candidate).await {
            tracing::debug!(id = ?candidate.id(), "undo rejected by validation");
            return None;
        }
        self.apply_undo()
    }

    /// Restore a specific swiped card without validation.
    ///
    /// Used to roll back a swipe whose upstream report failed. Works with undo
    /// disabled as long as the card is still in the store.
    pub fn rollback_swipe(&mut self, id: &T::Id) -> Option<T> {
        if let Some(undo) = self.undo.as_mut() {
            undo.ledger.remove_by_id(id);
        }
        if !self.store.restore(id) {
            return None;
        }
        tracing::debug!(?id, "rolled back swipe");
        self.emit(StackChange::Undone { id: id.clone() });
        self.store.get(id).cloned()
    }

    fn next_undo_candidate(&mut self) -> Option<T> {
        let undo = self.undo.as_mut()?;
        loop {
            let latest = undo.ledger.peek_latest()?;
            if let Some(item) = self.store.get(&latest.id) {
                return Some(item.clone());
            }
            let stale = latest.id.clone();
            undo.ledger.remove_by_id(&stale);
            tracing::debug!(id = ?stale, "dropped tombstone for removed card");
        }
    }

    fn apply_undo(&mut self) -> Option<T> {
        let tombstone = self.undo.as_mut()?.ledger.pop_latest()?;
        if !self.store.restore(&tombstone.id) {
            return None;
        }
        let item = self
            .store
            .get(&tombstone.id)
            .cloned()
            .unwrap_or(tombstone.item);
        tracing::debug!(id = ?tombstone.id, cursor = self.store.cursor(), "undid swipe");
        self.emit(StackChange::Undone { id: tombstone.id });
        Some(item)
    }

    // ─── Collection Mutations ────────────────────────────────

    /// Replace the collection, reconciling against undo history.
    ///
    /// With a non-empty history the replacement policy decides first. An
    /// abandoned replacement leaves every piece of state untouched. The swap
    /// lands before eviction callbacks are awaited, and the callbacks keep
    /// running if this future is dropped.
    pub async fn set_collection(&mut self, items: Vec<T>) -> ReplacementOutcome {
        let mut survivors = Vec::new();
        let mut evictees = Vec::new();

        if let Some(undo) = self.undo.as_mut() {
            if !undo.ledger.is_empty() {
                let tombstones = undo.ledger.all();
                let hooks = undo.hooks.clone();
                let decision = decide(
                    undo.settings.replacement_strategy,
                    &tombstones,
                    &items,
                    || hooks.confirm_replacement(),
                )
                .await;

                if !decision.proceed {
                    tracing::info!(
                        strategy = ?undo.settings.replacement_strategy,
                        tombstones = tombstones.len(),
                        "replacement abandoned"
                    );
                    self.emit(StackChange::ReplacementAbandoned);
                    return ReplacementOutcome::Abandoned;
                }

                (survivors, evictees) = decision.partition(undo.ledger.clear_all());
                for tombstone in &survivors {
                    // Survivors came out of this ledger, so they fit its limit
                    let _ = undo.ledger.record_tombstone(tombstone.clone());
                }
            }
        }

        let evicted = evictees.len();
        self.store.set_collection(items);
        for tombstone in survivors {
            if !self.store.contains(&tombstone.id) {
                self.store.insert_detached(tombstone.item);
            }
        }
        let store = &self.store;
        self.swiped_directions.retain(|id, _| store.contains(id));

        tracing::debug!(count = self.store.len(), evicted, "collection replaced");
        for tombstone in &evictees {
            self.emit(StackChange::Evicted {
                id: tombstone.id.clone(),
            });
        }
        self.emit(StackChange::CollectionReplaced {
            count: self.store.len(),
        });

        if let Some(undo) = self.undo.as_ref() {
            undo.evictions.run_to_completion(evictees).await;
        }
        ReplacementOutcome::Applied { evicted }
    }

    /// Append cards not already present. Returns how many were added.
    pub fn append_cards(&mut self, items: Vec<T>) -> usize {
        let count = self.store.append(items);
        if count > 0 {
            self.emit(StackChange::Appended { count });
        }
        count
    }

    /// Replace an existing card's value in place.
    pub fn update_card(&mut self, item: T) -> bool {
        let id = item.id();
        let updated = self.store.update(item);
        if updated {
            self.emit(StackChange::Updated { id });
        }
        updated
    }

    /// Remove cards by ID. Returns how many were present.
    pub fn remove_cards(&mut self, ids: impl IntoIterator<Item = T::Id>) -> usize {
        let ids: Vec<T::Id> = ids.into_iter().collect();
        for id in &ids {
            self.swiped_directions.remove(id);
        }
        let count = self.store.remove(ids);
        if count > 0 {
            self.emit(StackChange::Removed { count });
        }
        count
    }

    /// Evict all undo history (awaiting callbacks) and empty the store.
    pub async fn clear_all(&mut self) {
        let cleared = self
            .undo
            .as_mut()
            .map(|undo| undo.ledger.clear_all())
            .unwrap_or_default();
        self.store.clear();
        self.swiped_directions.clear();
        tracing::debug!(evicted = cleared.len(), "stack cleared");
        for tombstone in &cleared {
            self.emit(StackChange::Evicted {
                id: tombstone.id.clone(),
            });
        }
        self.emit(StackChange::Cleared);

        if let Some(undo) = self.undo.as_ref() {
            undo.evictions.run_to_completion(cleared).await;
        }
    }

    // ─── Undo History ────────────────────────────────────────

    /// Seed the undo history from persisted tombstones.
    ///
    /// Cards not in the current collection are kept in the lookup map so a
    /// later undo can bring them back. Tombstones beyond the limit are evicted
    /// with callbacks awaited. Returns how many tombstones were kept.
    pub async fn restore_tombstones(&mut self, tombstones: Vec<Tombstone<T>>) -> usize {
        let Some(undo) = self.undo.as_mut() else {
            tracing::warn!(
                count = tombstones.len(),
                "undo is disabled; ignoring restored tombstones"
            );
            return 0;
        };

        let mut overflow = Vec::new();
        for tombstone in tombstones {
            self.store.insert_detached(tombstone.item.clone());
            self.swiped_directions
                .insert(tombstone.id.clone(), tombstone.direction);
            if let Some(evicted) = undo.ledger.record_tombstone(tombstone) {
                overflow.push(evicted);
            }
        }

        let kept = undo.ledger.count();
        for tombstone in &overflow {
            if !self.store.is_ordered(&tombstone.id) {
                self.store.remove([tombstone.id.clone()]);
                self.swiped_directions.remove(&tombstone.id);
            }
        }

        tracing::info!(kept, evicted = overflow.len(), "restored tombstones");
        for tombstone in &overflow {
            self.emit(StackChange::Evicted {
                id: tombstone.id.clone(),
            });
        }
        self.emit(StackChange::TombstonesRestored { count: kept });

        if let Some(undo) = self.undo.as_ref() {
            undo.evictions.run_to_completion(overflow).await;
        }
        kept
    }

    /// Run eviction callbacks for tombstones that never entered the history.
    pub async fn discard_tombstones(&self, tombstones: Vec<Tombstone<T>>) {
        match self.undo.as_ref() {
            Some(undo) => undo.evictions.run_to_completion(tombstones).await,
            None => tracing::warn!(
                count = tombstones.len(),
                "undo is disabled; discarded tombstones have no eviction hook"
            ),
        }
    }

    /// Wait for every background eviction callback to finish.
    pub async fn flush_evictions(&self) {
        if let Some(undo) = self.undo.as_ref() {
            undo.evictions.flush().await;
        }
    }

    /// Background eviction callbacks not yet finished.
    pub fn pending_evictions(&self) -> usize {
        self.undo
            .as_ref()
            .map_or(0, |undo| undo.evictions.pending())
    }

    // ─── Loading / Error ─────────────────────────────────────

    /// Set the loading flag. Starting a load clears the last error.
    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
        if loading && self.last_error.take().is_some() {
            self.emit(StackChange::ErrorChanged(None));
        }
        self.emit(StackChange::LoadingChanged(loading));
    }

    /// Record an error. Always clears the loading flag.
    pub fn set_error(&mut self, error: StackError) {
        tracing::warn!(%error, "stack error");
        if self.is_loading {
            self.is_loading = false;
            self.emit(StackChange::LoadingChanged(false));
        }
        self.last_error = Some(error.clone());
        self.emit(StackChange::ErrorChanged(Some(error)));
    }

    /// Clear the error slot.
    pub fn clear_error(&mut self) {
        if self.last_error.take().is_some() {
            self.emit(StackChange::ErrorChanged(None));
        }
    }

    /// Whether a load is in progress.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Most recent surfaced error.
    pub fn last_error(&self) -> Option<&StackError> {
        self.last_error.as_ref()
    }

    // ─── Queries ─────────────────────────────────────────────

    /// Stack configuration.
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Undo settings, if undo is enabled.
    pub fn undo_settings(&self) -> Option<&UndoSettings> {
        self.undo.as_ref().map(|undo| &undo.settings)
    }

    /// Card on top of the stack.
    pub fn current_item(&self) -> Option<&T> {
        self.store.current_item()
    }

    /// Cards left to swipe.
    pub fn remaining_count(&self) -> usize {
        self.store.remaining_count()
    }

    /// The visible window (`max_visible` cards from the cursor).
    pub fn visible_cards(&self) -> Vec<&T> {
        self.store.visible_window(self.config.max_visible)
    }

    /// Visible cards paired with their depth in the window.
    pub fn visible_cards_with_positions(&self) -> Vec<(usize, &T)> {
        self.visible_cards().into_iter().enumerate().collect()
    }

    /// Depth of `id` inside the visible window.
    pub fn position_in_window(&self, id: &T::Id) -> Option<usize> {
        self.store.position_in_window(id, self.config.max_visible)
    }

    /// All ordered cards, swiped ones included.
    pub fn cards(&self) -> impl Iterator<Item = &T> {
        self.store.ordered_items()
    }

    /// Number of ordered cards.
    pub fn card_count(&self) -> usize {
        self.store.len()
    }

    /// Cursor index.
    pub fn cursor(&self) -> usize {
        self.store.cursor()
    }

    /// Look up a card by ID.
    pub fn card(&self, id: &T::Id) -> Option<&T> {
        self.store.get(id)
    }

    /// Read-only access to the underlying store.
    pub fn store(&self) -> &CardStore<T> {
        &self.store
    }

    /// Direction `id` was last swiped in. Survives undo.
    pub fn swiped_direction(&self, id: &T::Id) -> Option<Direction> {
        self.swiped_directions.get(id).copied()
    }

    /// Whether `id` has a tombstone.
    pub fn is_in_tombstones(&self, id: &T::Id) -> bool {
        self.undo
            .as_ref()
            .is_some_and(|undo| undo.ledger.contains(id))
    }

    /// Tombstones available for undo.
    pub fn undoable_count(&self) -> usize {
        self.undo.as_ref().map_or(0, |undo| undo.ledger.count())
    }

    /// Whether an undo could currently be attempted.
    pub fn can_undo(&self) -> bool {
        self.undoable_count() > 0
    }

    /// Snapshot of the undo history, oldest first.
    pub fn tombstones(&self) -> Vec<Tombstone<T>> {
        self.undo
            .as_ref()
            .map(|undo| undo.ledger.all())
            .unwrap_or_default()
    }

    /// Whether the listener should fetch more cards.
    pub fn should_preload_more(&self) -> bool {
        self.store.remaining_count() <= self.config.preload_threshold
    }

    /// Point-in-time view for rendering.
    pub fn snapshot(&self) -> StackSnapshot<T> {
        StackSnapshot {
            visible: self.visible_cards().into_iter().cloned().collect(),
            cursor: self.store.cursor(),
            remaining: self.store.remaining_count(),
            undoable: self.undoable_count(),
            is_loading: self.is_loading,
            last_error: self.last_error.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use swipestack_core::{DirectionScheme, ReplacementStrategy, SourceError};

    #[derive(Debug, Clone, PartialEq)]
    struct Card {
        id: u32,
        body: String,
    }

    impl CardItem for Card {
        type Id = u32;

        fn id(&self) -> u32 {
            self.id
        }
    }

    fn card(id: u32) -> Card {
        Card {
            id,
            body: format!("card {id}"),
        }
    }

    fn cards(ids: impl IntoIterator<Item = u32>) -> Vec<Card> {
        ids.into_iter().map(card).collect()
    }

    #[derive(Default)]
    struct Recorder {
        evicted: Mutex<Vec<(u32, Direction)>>,
        allow_undo: Mutex<Option<bool>>,
        confirm: Mutex<bool>,
    }

    #[async_trait]
    impl UndoHooks<Card> for Recorder {
        async fn on_eviction(&self, item: Card, direction: Direction) {
            self.evicted.lock().push((item.id, direction));
        }

        async fn validate_undo(&self, _item: &Card) -> bool {
            self.allow_undo.lock().unwrap_or(true)
        }

        async fn confirm_replacement(&self) -> bool {
            *self.confirm.lock()
        }
    }

    fn controller_with(
        settings: UndoSettings,
    ) -> (StackController<Card>, Arc<Recorder>) {
        let hooks = Arc::new(Recorder::default());
        let undo = UndoConfig::new(settings).with_hooks(hooks.clone());
        let config = StackConfig::new(3, 0.5, 1).unwrap();
        (StackController::new(config, Some(undo)), hooks)
    }

    fn visible_ids(controller: &StackController<Card>) -> Vec<u32> {
        controller.visible_cards().iter().map(|c| c.id).collect()
    }

    fn current_id(controller: &StackController<Card>) -> Option<u32> {
        controller.current_item().map(|c| c.id)
    }

    #[tokio::test]
    async fn swipe_and_undo_walkthrough() {
        let (mut controller, _) = controller_with(UndoSettings::with_limit(5));
        controller.set_collection(cards(1..=5)).await;
        assert_eq!(visible_ids(&controller), vec![1, 2, 3]);

        let swiped = controller.swipe(Direction::Left).unwrap();
        assert_eq!(swiped.id, 1);
        assert_eq!(current_id(&controller), Some(2));
        assert_eq!(visible_ids(&controller), vec![2, 3, 4]);
        assert_eq!(controller.swiped_direction(&1), Some(Direction::Left));

        let undone = controller.undo().await.unwrap();
        assert_eq!(undone.id, 1);
        assert_eq!(current_id(&controller), Some(1));
        assert_eq!(controller.undoable_count(), 0);
        assert_eq!(controller.swiped_direction(&1), Some(Direction::Left));
    }

    #[tokio::test]
    async fn swipe_on_empty_stack_is_noop() {
        let (mut controller, _) = controller_with(UndoSettings::with_limit(5));
        assert!(controller.swipe(Direction::Right).is_none());
        assert!(controller.undo().await.is_none());
    }

    #[tokio::test]
    async fn swipe_outside_scheme_is_rejected() {
        let (mut controller, _) = controller_with(UndoSettings::with_limit(5));
        let mut changes = controller.subscribe();
        controller.set_collection(cards(1..=3)).await;
        let _ = changes.try_recv();

        assert!(controller.swipe(Direction::Up).is_none());
        assert!(controller.swipe(Direction::DownLeft).is_none());
        assert_eq!(current_id(&controller), Some(1));
        assert_eq!(controller.undoable_count(), 0);
        assert_eq!(controller.swiped_direction(&1), None);
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn wider_scheme_accepts_diagonals() {
        let config = StackConfig::new(3, 0.5, 1)
            .unwrap()
            .with_direction_scheme(DirectionScheme::EightWay);
        let mut controller: StackController<Card> = StackController::new(config, None);
        controller.set_collection(cards(1..=3)).await;

        assert_eq!(controller.swipe(Direction::UpRight).map(|c| c.id), Some(1));
        assert_eq!(controller.swiped_direction(&1), Some(Direction::UpRight));
        assert_eq!(current_id(&controller), Some(2));
    }

    #[tokio::test]
    async fn undo_disabled_without_config() {
        let mut controller: StackController<Card> =
            StackController::new(StackConfig::default(), None);
        controller.set_collection(cards(1..=3)).await;
        controller.swipe(Direction::Left);
        assert!(!controller.can_undo());
        assert!(controller.undo().await.is_none());
        assert_eq!(current_id(&controller), Some(2));
    }

    #[tokio::test]
    async fn overflow_evicts_first_swiped_card() {
        let (mut controller, hooks) = controller_with(UndoSettings::with_limit(2));
        controller.set_collection(cards(1..=5)).await;
        for _ in 0..3 {
            controller.swipe(Direction::Right);
        }
        controller.flush_evictions().await;
        assert_eq!(*hooks.evicted.lock(), vec![(1, Direction::Right)]);
        assert!(controller.card(&1).is_none());
        assert!(!controller.is_in_tombstones(&1));
        assert_eq!(controller.undoable_count(), 2);
        assert_eq!(current_id(&controller), Some(4));
        assert!(controller.store().check_invariants().is_ok());
    }

    #[tokio::test]
    async fn zero_limit_keeps_just_swiped_card_in_lookup() {
        let (mut controller, hooks) = controller_with(UndoSettings::with_limit(0));
        controller.set_collection(cards(1..=3)).await;
        controller.swipe(Direction::Left);
        controller.swipe(Direction::Right);
        controller.flush_evictions().await;

        assert_eq!(
            *hooks.evicted.lock(),
            vec![(1, Direction::Left), (2, Direction::Right)]
        );
        assert_eq!(controller.undoable_count(), 0);
        assert!(controller.card(&1).is_some());
        assert!(controller.card(&2).is_some());
        assert!(controller.undo().await.is_none());
        assert_eq!(current_id(&controller), Some(3));
    }

    #[tokio::test]
    async fn undo_skips_tombstones_of_removed_cards() {
        let (mut controller, _) = controller_with(UndoSettings::with_limit(5));
        controller.set_collection(cards(1..=4)).await;
        controller.swipe(Direction::Left);
        controller.swipe(Direction::Left);
        controller.remove_cards([2]);

        let undone = controller.undo().await.unwrap();
        assert_eq!(undone.id, 1);
        assert_eq!(current_id(&controller), Some(1));
        assert_eq!(controller.undoable_count(), 0);
    }

    #[tokio::test]
    async fn rejected_validation_keeps_tombstone() {
        let (mut controller, hooks) = controller_with(UndoSettings::with_limit(5));
        controller.set_collection(cards(1..=3)).await;
        controller.swipe(Direction::Left);
        *hooks.allow_undo.lock() = Some(false);

        assert!(controller.undo().await.is_none());
        assert!(controller.is_in_tombstones(&1));
        assert_eq!(current_id(&controller), Some(2));
    }

    #[tokio::test]
    async fn undo_returns_latest_value_of_card() {
        let (mut controller, _) = controller_with(UndoSettings::with_limit(5));
        controller.set_collection(cards(1..=3)).await;
        controller.swipe(Direction::Left);
        controller.update_card(Card {
            id: 1,
            body: "edited".into(),
        });
        assert_eq!(controller.undo().await.unwrap().body, "edited");
    }

    #[tokio::test]
    async fn block_if_present_leaves_state_identical() {
        let settings =
            UndoSettings::with_limit(5).replacement_strategy(ReplacementStrategy::BlockIfPresent);
        let (mut controller, hooks) = controller_with(settings);
        controller.set_collection(cards(1..=4)).await;
        controller.swipe(Direction::Right);

        let cards_before: Vec<Card> = controller.cards().cloned().collect();
        let cursor_before = controller.cursor();
        let ledger_before = controller.tombstones();

        let outcome = controller.set_collection(cards(10..=12)).await;
        assert_eq!(outcome, ReplacementOutcome::Abandoned);
        assert_eq!(controller.cards().cloned().collect::<Vec<_>>(), cards_before);
        assert_eq!(controller.cursor(), cursor_before);
        assert_eq!(controller.tombstones(), ledger_before);
        assert!(hooks.evicted.lock().is_empty());
    }

    #[tokio::test]
    async fn preserve_valid_evicts_only_missing_cards() {
        let settings =
            UndoSettings::with_limit(5).replacement_strategy(ReplacementStrategy::PreserveValid);
        let (mut controller, hooks) = controller_with(settings);
        controller.set_collection(cards(1..=4)).await;
        controller.swipe(Direction::Left);
        controller.swipe(Direction::Right);

        let outcome = controller.set_collection(cards([1, 3, 4, 5])).await;
        assert_eq!(outcome, ReplacementOutcome::Applied { evicted: 1 });
        assert!(controller.is_in_tombstones(&1));
        assert!(!controller.is_in_tombstones(&2));
        assert_eq!(*hooks.evicted.lock(), vec![(2, Direction::Right)]);
        assert!(controller.store().check_invariants().is_ok());
    }

    #[tokio::test]
    async fn ask_user_follows_confirmation() {
        let settings =
            UndoSettings::with_limit(5).replacement_strategy(ReplacementStrategy::AskUser);
        let (mut controller, hooks) = controller_with(settings);
        controller.set_collection(cards(1..=3)).await;
        controller.swipe(Direction::Left);

        assert_eq!(
            controller.set_collection(cards(7..=9)).await,
            ReplacementOutcome::Abandoned
        );
        assert_eq!(current_id(&controller), Some(2));

        *hooks.confirm.lock() = true;
        assert_eq!(
            controller.set_collection(cards(7..=9)).await,
            ReplacementOutcome::Applied { evicted: 1 }
        );
        assert_eq!(current_id(&controller), Some(7));
        assert_eq!(controller.undoable_count(), 0);
        assert_eq!(*hooks.evicted.lock(), vec![(1, Direction::Left)]);
    }

    #[tokio::test]
    async fn empty_ledger_bypasses_policy() {
        let settings =
            UndoSettings::with_limit(5).replacement_strategy(ReplacementStrategy::BlockIfPresent);
        let (mut controller, _) = controller_with(settings);
        controller.set_collection(cards(1..=2)).await;
        assert_eq!(
            controller.set_collection(cards(3..=4)).await,
            ReplacementOutcome::Applied { evicted: 0 }
        );
        assert_eq!(current_id(&controller), Some(3));
    }

    #[tokio::test]
    async fn clear_all_evicts_everything() {
        let (mut controller, hooks) = controller_with(UndoSettings::with_limit(5));
        controller.set_collection(cards(1..=3)).await;
        controller.swipe(Direction::Left);
        controller.swipe(Direction::Right);
        controller.clear_all().await;

        assert_eq!(hooks.evicted.lock().len(), 2);
        assert_eq!(controller.card_count(), 0);
        assert!(controller.current_item().is_none());
        assert!(!controller.can_undo());
    }

    #[tokio::test]
    async fn restored_tombstones_rematerialize_on_undo() {
        let (mut controller, hooks) = controller_with(UndoSettings::with_limit(2));
        controller.set_collection(cards(1..=2)).await;
        let restored = vec![
            Tombstone::new(card(7), Direction::Left),
            Tombstone::new(card(8), Direction::Right),
            Tombstone::new(card(9), Direction::Up),
        ];
        assert_eq!(controller.restore_tombstones(restored).await, 2);
        assert_eq!(*hooks.evicted.lock(), vec![(7, Direction::Left)]);
        assert!(controller.card(&7).is_none());

        let undone = controller.undo().await.unwrap();
        assert_eq!(undone.id, 9);
        assert_eq!(current_id(&controller), Some(9));
        assert_eq!(visible_ids(&controller), vec![9, 1, 2]);
        assert!(controller.store().check_invariants().is_ok());
    }

    #[tokio::test]
    async fn rollback_restores_specific_card() {
        let (mut controller, _) = controller_with(UndoSettings::with_limit(5));
        controller.set_collection(cards(1..=3)).await;
        controller.swipe(Direction::Left);
        controller.swipe(Direction::Left);

        let rolled = controller.rollback_swipe(&2).unwrap();
        assert_eq!(rolled.id, 2);
        assert_eq!(current_id(&controller), Some(2));
        assert!(controller.is_in_tombstones(&1));
        assert!(!controller.is_in_tombstones(&2));
    }

    #[tokio::test]
    async fn loading_and_error_are_exclusive() {
        let (mut controller, _) = controller_with(UndoSettings::default());
        controller.set_loading(true);
        controller.set_error(StackError::Load(SourceError::network("offline")));
        assert!(!controller.is_loading());
        assert!(controller.last_error().is_some());

        controller.set_loading(true);
        assert!(controller.is_loading());
        assert!(controller.last_error().is_none());
    }

    #[tokio::test]
    async fn mutations_publish_changes() {
        let (mut controller, _) = controller_with(UndoSettings::with_limit(5));
        let mut changes = controller.subscribe();
        controller.set_collection(cards(1..=2)).await;
        controller.swipe(Direction::Right);

        assert_eq!(
            changes.recv().await.unwrap(),
            StackChange::CollectionReplaced { count: 2 }
        );
        assert_eq!(
            changes.recv().await.unwrap(),
            StackChange::Swiped {
                id: 1,
                direction: Direction::Right
            }
        );
    }

    #[tokio::test]
    async fn preload_threshold_tracks_remaining() {
        let (mut controller, _) = controller_with(UndoSettings::default());
        controller.set_collection(cards(1..=3)).await;
        assert!(!controller.should_preload_more());
        controller.swipe(Direction::Left);
        controller.swipe(Direction::Left);
        assert!(controller.should_preload_more());

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.remaining, 1);
        assert_eq!(snapshot.current().map(|c| c.id), Some(3));
    }
}
