//! Scripted collaborators.
//!
//! Each mock records what the code under test asked of it so assertions can
//! inspect the interaction afterwards. Clones share state.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::StreamExt;
use parking_lot::Mutex;
use swipestack_app::{CardFeed, CardSource, FeedStream, UndoHooks};
use swipestack_core::{Direction, FeedEvent, SourceError};
use tokio::sync::watch;

use crate::fixtures::TestCard;

// ─── Source ──────────────────────────────────────────────

#[derive(Debug, Default)]
struct SourceState {
    initial: Option<Result<Vec<TestCard>, SourceError>>,
    pages: VecDeque<Result<Vec<TestCard>, SourceError>>,
    swipe_failure: Option<SourceError>,
    undo_failure: Option<SourceError>,
    reported_swipes: Vec<(u64, Direction)>,
    reported_undos: Vec<u64>,
}

/// Paged source with scripted responses.
///
/// `load_more` can be held open with [`MockSource::hold_load_more`] so tests
/// can pile up concurrent callers before releasing it.
#[derive(Debug, Clone)]
pub struct MockSource {
    state: Arc<Mutex<SourceState>>,
    initial_calls: Arc<AtomicUsize>,
    load_more_calls: Arc<AtomicUsize>,
    gate: Arc<watch::Sender<bool>>,
}

impl Default for MockSource {
    fn default() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            state: Arc::new(Mutex::new(SourceState::default())),
            initial_calls: Arc::new(AtomicUsize::new(0)),
            load_more_calls: Arc::new(AtomicUsize::new(0)),
            gate: Arc::new(gate),
        }
    }
}

impl MockSource {
    /// Source with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Source whose initial load returns `items`.
    pub fn with_initial(items: Vec<TestCard>) -> Self {
        let source = Self::new();
        source.set_initial(Ok(items));
        source
    }

    /// Script the result of `load_initial`.
    pub fn set_initial(&self, result: Result<Vec<TestCard>, SourceError>) {
        self.state.lock().initial = Some(result);
    }

    /// Queue the next `load_more` response. An empty queue yields empty pages.
    pub fn push_page(&self, result: Result<Vec<TestCard>, SourceError>) {
        self.state.lock().pages.push_back(result);
    }

    /// Make every `report_swipe` fail with `error`.
    pub fn fail_swipe_reports(&self, error: SourceError) {
        self.state.lock().swipe_failure = Some(error);
    }

    /// Make every `report_undo` fail with `error`.
    pub fn fail_undo_reports(&self, error: SourceError) {
        self.state.lock().undo_failure = Some(error);
    }

    /// Block `load_more` until [`MockSource::release_load_more`].
    pub fn hold_load_more(&self) {
        self.gate.send_replace(false);
    }

    /// Let held `load_more` calls finish.
    pub fn release_load_more(&self) {
        self.gate.send_replace(true);
    }

    /// Number of `load_initial` calls so far.
    pub fn initial_calls(&self) -> usize {
        self.initial_calls.load(Ordering::SeqCst)
    }

    /// Number of `load_more` calls so far.
    pub fn load_more_calls(&self) -> usize {
        self.load_more_calls.load(Ordering::SeqCst)
    }

    /// Swipes reported so far, in order.
    pub fn reported_swipes(&self) -> Vec<(u64, Direction)> {
        self.state.lock().reported_swipes.clone()
    }

    /// Undos reported so far, in order.
    pub fn reported_undos(&self) -> Vec<u64> {
        self.state.lock().reported_undos.clone()
    }
}

#[async_trait]
impl CardSource<TestCard> for MockSource {
    async fn load_initial(&self) -> Result<Vec<TestCard>, SourceError> {
        self.initial_calls.fetch_add(1, Ordering::SeqCst);
        self.state.lock().initial.clone().unwrap_or(Ok(Vec::new()))
    }

    async fn load_more(&self) -> Result<Vec<TestCard>, SourceError> {
        self.load_more_calls.fetch_add(1, Ordering::SeqCst);
        let mut open = self.gate.subscribe();
        let _ = open.wait_for(|open| *open).await;
        self.state.lock().pages.pop_front().unwrap_or(Ok(Vec::new()))
    }

    async fn report_swipe(&self, item: &TestCard, direction: Direction) -> Result<(), SourceError> {
        let mut state = self.state.lock();
        state.reported_swipes.push((item.id, direction));
        match state.swipe_failure.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn report_undo(&self, item: &TestCard) -> Result<(), SourceError> {
        let mut state = self.state.lock();
        state.reported_undos.push(item.id);
        match state.undo_failure.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

// ─── Feed ────────────────────────────────────────────────

/// Push feed backed by unbounded channels, one per subscription.
#[derive(Debug, Clone, Default)]
pub struct ChannelFeed {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<FeedEvent<TestCard>>>>>,
    subscribe_failure: Arc<Mutex<Option<SourceError>>>,
    subscriptions: Arc<AtomicUsize>,
}

impl ChannelFeed {
    /// Feed with no subscriptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `subscribe` fail with `error`.
    pub fn fail_subscribe(&self, error: SourceError) {
        *self.subscribe_failure.lock() = Some(error);
    }

    /// Deliver `event` to every live subscription.
    pub fn send(&self, event: FeedEvent<TestCard>) {
        self.subscribers
            .lock()
            .retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }

    /// End every live subscription.
    pub fn close(&self) {
        for tx in self.subscribers.lock().drain(..) {
            tx.close_channel();
        }
    }

    /// Number of successful subscriptions so far.
    pub fn subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CardFeed<TestCard> for ChannelFeed {
    async fn subscribe(&self) -> Result<FeedStream<TestCard>, SourceError> {
        if let Some(error) = self.subscribe_failure.lock().clone() {
            return Err(error);
        }
        let (tx, rx) = mpsc::unbounded();
        self.subscribers.lock().push(tx);
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        Ok(rx.boxed())
    }
}

// ─── Hooks ───────────────────────────────────────────────

/// Undo hooks that record evictions and answer from switches.
#[derive(Debug)]
pub struct RecordingHooks {
    evictions: Mutex<Vec<(u64, Direction)>>,
    validations: AtomicUsize,
    allow_undo: AtomicBool,
    confirm_replacement: AtomicBool,
    confirmations: AtomicUsize,
    hold_confirmations: AtomicBool,
}

impl RecordingHooks {
    /// Hooks that allow undo and refuse replacement.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            evictions: Mutex::new(Vec::new()),
            validations: AtomicUsize::new(0),
            allow_undo: AtomicBool::new(true),
            confirm_replacement: AtomicBool::new(false),
            confirmations: AtomicUsize::new(0),
            hold_confirmations: AtomicBool::new(false),
        })
    }

    /// Evictions seen so far, in order.
    pub fn evictions(&self) -> Vec<(u64, Direction)> {
        self.evictions.lock().clone()
    }

    /// IDs of the evicted cards, in order.
    pub fn evicted_ids(&self) -> Vec<u64> {
        self.evictions.lock().iter().map(|(id, _)| *id).collect()
    }

    /// Number of `validate_undo` calls.
    pub fn validations(&self) -> usize {
        self.validations.load(Ordering::SeqCst)
    }

    /// Answer for `validate_undo`.
    pub fn set_allow_undo(&self, allow: bool) {
        self.allow_undo.store(allow, Ordering::SeqCst);
    }

    /// Answer for `confirm_replacement`.
    pub fn set_confirm_replacement(&self, confirm: bool) {
        self.confirm_replacement.store(confirm, Ordering::SeqCst);
    }

    /// Never answer `confirm_replacement`.
    pub fn hold_confirmations(&self) {
        self.hold_confirmations.store(true, Ordering::SeqCst);
    }

    /// Number of `confirm_replacement` calls, answered or not.
    pub fn confirmations(&self) -> usize {
        self.confirmations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UndoHooks<TestCard> for RecordingHooks {
    async fn on_eviction(&self, item: TestCard, direction: Direction) {
        self.evictions.lock().push((item.id, direction));
    }

    async fn validate_undo(&self, _item: &TestCard) -> bool {
        self.validations.fetch_add(1, Ordering::SeqCst);
        self.allow_undo.load(Ordering::SeqCst)
    }

    async fn confirm_replacement(&self) -> bool {
        self.confirmations.fetch_add(1, Ordering::SeqCst);
        if self.hold_confirmations.load(Ordering::SeqCst) {
            futures::future::pending::<()>().await;
        }
        self.confirm_replacement.load(Ordering::SeqCst)
    }
}
