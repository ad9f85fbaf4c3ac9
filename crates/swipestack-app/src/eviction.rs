//! Background dispatch of eviction callbacks.
//!
//! A swipe that overflows the undo history must not wait for the eviction
//! callback (typically an upstream delete). The dispatcher spawns the callback
//! on the ambient Tokio runtime and keeps the handle so callers can join all
//! outstanding callbacks with [`EvictionDispatcher::flush`].
//!
//! Without a runtime the tombstone is parked and its callback runs on the
//! next `flush`, so no eviction is ever dropped.

use std::sync::Arc;

use parking_lot::Mutex;
use swipestack_core::{CardItem, Tombstone};
use tokio::task::JoinHandle;

use crate::hooks::UndoHooks;

pub(crate) struct EvictionDispatcher<T: CardItem> {
    hooks: Arc<dyn UndoHooks<T>>,
    spawned: Mutex<Vec<JoinHandle<()>>>,
    parked: Mutex<Vec<Tombstone<T>>>,
}

impl<T: CardItem> EvictionDispatcher<T> {
    pub(crate) fn new(hooks: Arc<dyn UndoHooks<T>>) -> Self {
        Self {
            hooks,
            spawned: Mutex::new(Vec::new()),
            parked: Mutex::new(Vec::new()),
        }
    }

    /// Run the eviction callback for `tombstone` in the background.
    pub(crate) fn dispatch(&self, tombstone: Tombstone<T>) {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let hooks = self.hooks.clone();
                let handle = runtime.spawn(async move {
                    hooks.on_eviction(tombstone.item, tombstone.direction).await;
                });
                let mut spawned = self.spawned.lock();
                spawned.retain(|h| !h.is_finished());
                spawned.push(handle);
            }
            Err(_) => {
                tracing::debug!(id = ?tombstone.id, "no runtime; parking eviction callback");
                self.parked.lock().push(tombstone);
            }
        }
    }

    /// Run eviction callbacks oldest first and wait for them.
    ///
    /// The batch runs on its own task. If the returned future is dropped
    /// before the batch finishes, the task keeps running and is joined by the
    /// next [`EvictionDispatcher::flush`].
    pub(crate) async fn run_to_completion(&self, tombstones: Vec<Tombstone<T>>) {
        if tombstones.is_empty() {
            return;
        }
        let hooks = self.hooks.clone();
        let batch = async move {
            for tombstone in tombstones {
                hooks.on_eviction(tombstone.item, tombstone.direction).await;
            }
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            batch.await;
            return;
        };

        let mut tracked = TrackedBatch {
            handle: Some(runtime.spawn(batch)),
            spawned: &self.spawned,
        };
        if let Some(handle) = tracked.handle.as_mut() {
            if let Err(error) = handle.await {
                tracing::warn!(%error, "eviction callback did not complete");
            }
        }
        tracked.handle = None;
    }

    /// Wait for every dispatched callback and run any parked ones.
    pub(crate) async fn flush(&self) {
        let parked = std::mem::take(&mut *self.parked.lock());
        for tombstone in parked {
            self.hooks
                .on_eviction(tombstone.item, tombstone.direction)
                .await;
        }

        let spawned = std::mem::take(&mut *self.spawned.lock());
        for handle in spawned {
            if let Err(error) = handle.await {
                tracing::warn!(%error, "eviction callback did not complete");
            }
        }
    }

    pub(crate) fn pending(&self) -> usize {
        let spawned = self.spawned.lock().iter().filter(|h| !h.is_finished()).count();
        spawned + self.parked.lock().len()
    }
}

/// Hands an unfinished batch over to the dispatcher when its waiter is dropped.
struct TrackedBatch<'a> {
    handle: Option<JoinHandle<()>>,
    spawned: &'a Mutex<Vec<JoinHandle<()>>>,
}

impl Drop for TrackedBatch<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                self.spawned.lock().push(handle);
            }
        }
    }
}
