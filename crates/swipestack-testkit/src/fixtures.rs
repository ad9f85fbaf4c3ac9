//! Card fixtures and controller builders.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use swipestack_app::{SharedController, StackController, UndoConfig, UndoHooks};
use swipestack_core::{CardItem, StackConfig, UndoSettings};

/// Serializable card used across tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCard {
    /// Stable identity
    pub id: u64,
    /// Mutable payload, used to observe updates
    pub title: String,
}

impl TestCard {
    /// Card with a default title derived from `id`.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            title: format!("card {id}"),
        }
    }

    /// Card with an explicit title.
    pub fn titled(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

impl CardItem for TestCard {
    type Id = u64;

    fn id(&self) -> u64 {
        self.id
    }
}

/// Cards with the given IDs, in order.
pub fn cards(ids: impl IntoIterator<Item = u64>) -> Vec<TestCard> {
    ids.into_iter().map(TestCard::new).collect()
}

/// Config with a window of three and the given preload threshold.
pub fn stack_config(preload_threshold: usize) -> StackConfig {
    StackConfig::new(3, 0.5, preload_threshold).unwrap()
}

/// Shared controller without undo.
pub fn controller_without_undo(preload_threshold: usize) -> SharedController<TestCard> {
    StackController::new(stack_config(preload_threshold), None).shared()
}

/// Shared controller with undo enabled and the given hooks.
pub fn controller_with_undo(
    settings: UndoSettings,
    hooks: Arc<dyn UndoHooks<TestCard>>,
) -> SharedController<TestCard> {
    let undo = UndoConfig::new(settings).with_hooks(hooks);
    StackController::new(stack_config(1), Some(undo)).shared()
}
