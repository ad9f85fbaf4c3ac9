//! # Update Listener
//!
//! Bridges the push feed and the paged source into controller calls.
//!
//! ```text
//! start()
//!   └─ spawned listen task
//!        restore-on-launch → load_initial → set_collection → subscribe
//!        └─ loop: next event → write lock → cancelled? → apply
//! ```
//!
//! Every event is applied under the controller write lock after checking the
//! cancel flag, and `stop()` joins the task, so no event lands after `stop()`
//! returns. Each await in the task is raced against the cancel flag, so a
//! hook that never answers cannot keep `stop()` waiting. Controller
//! operations apply their state before awaiting eviction callbacks, which
//! makes dropping one mid-await safe.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::FutureExt;
use futures::StreamExt;
use parking_lot::Mutex;
use swipestack_core::{CardItem, Direction, FeedEvent, RestoreOnLaunch, StackError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::controller::{SharedController, StackController};
use crate::load_more::LoadMoreGate;
use crate::persistence::TombstonePersistence;
use crate::source::{CardFeed, CardSource};

struct ListenTask {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Drop for ListenTask {
    fn drop(&mut self) {
        let _ = self.cancel.send(true);
    }
}

/// Collaborators shared between the listener handle and its task.
#[derive(Clone)]
struct ListenContext<T: CardItem> {
    controller: SharedController<T>,
    source: Arc<dyn CardSource<T>>,
    feed: Arc<dyn CardFeed<T>>,
    persistence: Option<Arc<dyn TombstonePersistence<T>>>,
    missing_bridge_warned: Arc<AtomicBool>,
}

/// Drives a shared controller from a feed and a paged source.
///
/// Holds the controller by `Arc`; call [`UpdateListener::stop`] before tearing
/// the controller down. Dropping the listener signals the task to stop
/// without waiting for it.
pub struct UpdateListener<T: CardItem> {
    context: ListenContext<T>,
    task: Mutex<Option<ListenTask>>,
    load_more: Arc<LoadMoreGate<Vec<T>>>,
}

impl<T: CardItem> UpdateListener<T> {
    /// Create a stopped listener.
    pub fn new(
        controller: SharedController<T>,
        source: Arc<dyn CardSource<T>>,
        feed: Arc<dyn CardFeed<T>>,
    ) -> Self {
        Self {
            context: ListenContext {
                controller,
                source,
                feed,
                persistence: None,
                missing_bridge_warned: Arc::new(AtomicBool::new(false)),
            },
            task: Mutex::new(None),
            load_more: Arc::new(LoadMoreGate::new()),
        }
    }

    /// Inject the bridge used to save and restore undo history.
    #[must_use]
    pub fn with_persistence(mut self, bridge: Arc<dyn TombstonePersistence<T>>) -> Self {
        self.context.persistence = Some(bridge);
        self
    }

    /// The controller this listener drives.
    pub fn controller(&self) -> &SharedController<T> {
        &self.context.controller
    }

    // ─── Lifecycle ───────────────────────────────────────────

    /// Start listening, restarting if already running.
    ///
    /// Must be called inside a Tokio runtime.
    pub async fn start(&self) {
        self.join_running().await;

        let (cancel, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(listen(self.context.clone(), cancel_rx));
        *self.task.lock() = Some(ListenTask { cancel, handle });
        info!("listener started");
    }

    /// Stop listening and persist the undo history.
    ///
    /// Once this returns no further feed event is applied.
    pub async fn stop(&self) {
        if self.join_running().await {
            info!("listener stopped");
        }
        if let Err(error) = self.persist_tombstones().await {
            warn!(%error, "failed to persist tombstones on stop");
        }
    }

    /// Whether the listen task is running.
    pub fn is_listening(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    async fn join_running(&self) -> bool {
        let task = self.task.lock().take();
        let Some(mut task) = task else {
            return false;
        };
        let _ = task.cancel.send(true);
        if let Err(error) = (&mut task.handle).await {
            warn!(%error, "listen task ended abnormally");
        }
        true
    }

    /// Save the current undo history through the injected bridge.
    ///
    /// A no-op when undo or persistence is not configured.
    pub async fn persist_tombstones(&self) -> Result<(), StackError> {
        let (key, tombstones) = {
            let controller = self.context.controller.read().await;
            let Some(key) = controller
                .undo_settings()
                .and_then(|settings| settings.persistence_key.clone())
            else {
                return Ok(());
            };
            (key, controller.tombstones())
        };
        let Some(bridge) = self.context.bridge(&key) else {
            return Ok(());
        };
        bridge.save(&key, &tombstones).await?;
        debug!(key = %key, count = tombstones.len(), "persisted tombstones");
        Ok(())
    }

    // ─── User Actions ────────────────────────────────────────

    /// Fetch the next page, joining a fetch already in flight.
    ///
    /// Returns the fetched cards. Empty pages and failures yield an empty
    /// list; failures are logged and never reach `last_error`.
    pub async fn trigger_load_more(&self) -> Vec<T> {
        let context = self.context.clone();
        self.load_more
            .run(move || async move { context.load_more_once().await }.boxed())
            .await
    }

    /// Swipe, preload if running low, then report upstream.
    ///
    /// A failed report rolls the swipe back, records the error and returns
    /// `None`.
    pub async fn swipe(&self, direction: Direction) -> Option<T> {
        let (item, preload) = {
            let mut controller = self.context.controller.write().await;
            let item = controller.swipe(direction)?;
            (item, controller.should_preload_more())
        };

        if preload {
            self.trigger_load_more().await;
        }

        if let Err(error) = self.context.source.report_swipe(&item, direction).await {
            let mut controller = self.context.controller.write().await;
            controller.rollback_swipe(&item.id());
            controller.set_error(StackError::SwipeReport(error));
            return None;
        }
        Some(item)
    }

    /// Undo, then report upstream.
    ///
    /// A failed report records the error but keeps the undo applied.
    pub async fn undo(&self) -> Option<T> {
        let item = self.context.controller.write().await.undo().await?;
        if let Err(error) = self.context.source.report_undo(&item).await {
            self.context
                .controller
                .write()
                .await
                .set_error(StackError::UndoReport(error));
        }
        Some(item)
    }
}

impl<T: CardItem> ListenContext<T> {
    fn bridge(&self, key: &str) -> Option<&Arc<dyn TombstonePersistence<T>>> {
        if self.persistence.is_none() && !self.missing_bridge_warned.swap(true, Ordering::Relaxed) {
            warn!(
                key,
                "persistence key configured without a persistence bridge; undo history will not be persisted"
            );
        }
        self.persistence.as_ref()
    }

    async fn load_more_once(&self) -> Vec<T> {
        match self.source.load_more().await {
            Ok(items) if items.is_empty() => {
                debug!("load more returned no cards");
                items
            }
            Ok(items) => {
                let appended = self.controller.write().await.append_cards(items.clone());
                debug!(fetched = items.len(), appended, "loaded more cards");
                items
            }
            Err(error) => {
                warn!(%error, "load more failed");
                Vec::new()
            }
        }
    }

    async fn restore_on_launch(&self) {
        let (key, policy) = {
            let controller = self.controller.read().await;
            let Some(settings) = controller.undo_settings() else {
                return;
            };
            let Some(key) = settings.persistence_key.clone() else {
                return;
            };
            (key, settings.restore_on_launch)
        };
        let Some(bridge) = self.bridge(&key) else {
            return;
        };

        match policy {
            RestoreOnLaunch::Restore => match bridge.load(&key).await {
                Ok(tombstones) if tombstones.is_empty() => {}
                Ok(tombstones) => {
                    self.controller
                        .write()
                        .await
                        .restore_tombstones(tombstones)
                        .await;
                }
                Err(error) => warn!(%error, key = %key, "failed to load tombstones"),
            },
            RestoreOnLaunch::ClearGracefully => {
                match bridge.load(&key).await {
                    Ok(tombstones) => {
                        let count = tombstones.len();
                        self.controller
                            .read()
                            .await
                            .discard_tombstones(tombstones)
                            .await;
                        info!(count, key = %key, "evicted persisted tombstones");
                    }
                    Err(error) => warn!(%error, key = %key, "failed to load tombstones"),
                }
                self.clear_storage(bridge.as_ref(), &key).await;
            }
            RestoreOnLaunch::Ignore => self.clear_storage(bridge.as_ref(), &key).await,
        }
    }

    async fn clear_storage(&self, bridge: &dyn TombstonePersistence<T>, key: &str) {
        if let Err(error) = bridge.clear(key).await {
            warn!(%error, key, "failed to clear persisted tombstones");
        }
    }

    /// Clear a loading flag left behind by a cancelled initial load.
    fn settle_loading(&self) {
        match self.controller.try_write() {
            Some(mut controller) if controller.is_loading() => controller.set_loading(false),
            Some(_) => {}
            None => debug!("controller busy; loading flag left to its holder"),
        }
    }
}

fn is_cancelled(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow()
}

/// Resolves once the listener is cancelled or its handle is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let _ = cancel.wait_for(|cancelled| *cancelled).await;
}

/// Run `work` unless cancellation wins first. `None` means cancelled.
async fn until_cancelled<F: Future>(
    cancel: &mut watch::Receiver<bool>,
    work: F,
) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancelled(cancel) => None,
        output = work => Some(output),
    }
}

async fn listen<T: CardItem>(context: ListenContext<T>, mut cancel: watch::Receiver<bool>) {
    let flag = cancel.clone();
    if until_cancelled(&mut cancel, context.restore_on_launch())
        .await
        .is_none()
    {
        debug!("cancelled during restore");
        return;
    }

    let started = until_cancelled(&mut cancel, async {
        context.controller.write().await.set_loading(true);
    })
    .await;
    if started.is_none() {
        return;
    }

    let Some(initial) = until_cancelled(&mut cancel, context.source.load_initial()).await else {
        context.settle_loading();
        return;
    };

    let loaded = until_cancelled(&mut cancel, async {
        let mut controller = context.controller.write().await;
        if is_cancelled(&flag) {
            controller.set_loading(false);
            return false;
        }
        match initial {
            Ok(items) => {
                let outcome = controller.set_collection(items).await;
                controller.set_loading(false);
                debug!(?outcome, "initial collection loaded");
                true
            }
            Err(error) => {
                controller.set_error(StackError::Load(error));
                false
            }
        }
    })
    .await;
    match loaded {
        Some(true) => {}
        Some(false) => return,
        None => {
            context.settle_loading();
            return;
        }
    }

    let Some(subscribed) = until_cancelled(&mut cancel, context.feed.subscribe()).await else {
        return;
    };
    let mut stream = match subscribed {
        Ok(stream) => stream,
        Err(error) => {
            until_cancelled(&mut cancel, async {
                context
                    .controller
                    .write()
                    .await
                    .set_error(StackError::Feed(error));
            })
            .await;
            return;
        }
    };

    loop {
        let next = tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => break,
            next = stream.next() => next,
        };
        let Some(event) = next else {
            info!("feed ended");
            break;
        };

        let applied = until_cancelled(&mut cancel, async {
            let mut controller = context.controller.write().await;
            if is_cancelled(&flag) {
                debug!(kind = event.kind(), "dropping feed event after cancellation");
                return false;
            }
            apply_event(&mut controller, event).await;
            true
        })
        .await;
        if applied != Some(true) {
            debug!("listen loop cancelled");
            break;
        }
    }
}

async fn apply_event<T: CardItem>(controller: &mut StackController<T>, event: FeedEvent<T>) {
    debug!(kind = event.kind(), len = event.len(), "applying feed event");
    match event {
        FeedEvent::Initial(items) | FeedEvent::Replace(items) => {
            controller.set_collection(items).await;
        }
        FeedEvent::Append(items) => {
            controller.append_cards(items);
        }
        FeedEvent::Remove(ids) => {
            controller.remove_cards(ids);
        }
        FeedEvent::Update(item) => {
            controller.update_card(item);
        }
        FeedEvent::Clear => controller.clear_all().await,
    }
}
