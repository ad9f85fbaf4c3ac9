//! Undo callbacks supplied by the embedding application.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use swipestack_core::{CardItem, Direction, UndoSettings};

/// Callbacks the controller awaits around undo history changes.
///
/// Every method has a default so implementors only override what they need.
#[async_trait]
pub trait UndoHooks<T: CardItem>: Send + Sync {
    /// A tombstone left the undo history for good (e.g. delete it upstream).
    async fn on_eviction(&self, _item: T, _direction: Direction) {}

    /// Approve an undo. Returning `false` cancels it and keeps the tombstone.
    async fn validate_undo(&self, _item: &T) -> bool {
        true
    }

    /// Approve discarding undo history for a replacement under
    /// `ReplacementStrategy::AskUser`. Defaults to refusing.
    async fn confirm_replacement(&self) -> bool {
        false
    }
}

/// Hooks that accept every undo and ignore evictions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

#[async_trait]
impl<T: CardItem> UndoHooks<T> for NoopHooks {}

/// Undo configuration: plain settings plus callbacks.
pub struct UndoConfig<T: CardItem> {
    /// Limit, policies and persistence key
    pub settings: UndoSettings,
    /// Callbacks awaited by the controller
    pub hooks: Arc<dyn UndoHooks<T>>,
}

impl<T: CardItem> UndoConfig<T> {
    /// Undo configuration with no-op hooks.
    pub fn new(settings: UndoSettings) -> Self {
        Self {
            settings,
            hooks: Arc::new(NoopHooks),
        }
    }

    /// Replace the hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn UndoHooks<T>>) -> Self {
        self.hooks = hooks;
        self
    }
}

impl<T: CardItem> Clone for UndoConfig<T> {
    fn clone(&self) -> Self {
        Self {
            settings: self.settings.clone(),
            hooks: self.hooks.clone(),
        }
    }
}

impl<T: CardItem> fmt::Debug for UndoConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoConfig")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
