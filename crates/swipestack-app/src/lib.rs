//! # SwipeStack App - Async Orchestration
//!
//! **Purpose**: Drive the pure card stack from `swipestack-core` with
//! async collaborators: undo hooks, a paged source, a live feed and an
//! optional persistence bridge.
//!
//! # Architecture Constraints
//!
//! - YES One controller per stack, shared behind an async `RwLock`
//! - YES Collaborators injected as trait objects
//! - YES Cooperative cancellation of the listen loop
//! - NO rendering, gestures or animation
//! - NO concrete network clients
//!
//! ## Usage
//!
//! ```ignore
//! let controller = StackController::new(StackConfig::default(), Some(undo)).shared();
//! let listener = UpdateListener::new(controller.clone(), source, feed)
//!     .with_persistence(Arc::new(JsonFilePersistence::new(dir)));
//! listener.start().await;
//! listener.swipe(Direction::Left).await;
//! listener.undo().await;
//! listener.stop().await;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Swipe/undo state machine
pub mod controller;

mod eviction;

/// Undo callbacks and configuration
pub mod hooks;

/// Feed and source bridging
pub mod listener;

mod load_more;

/// Change notifications and snapshots
pub mod observer;

/// Tombstone persistence bridges
pub mod persistence;

/// Upstream collaborator contracts
pub mod source;

pub use controller::{ReplacementOutcome, SharedController, StackController};
pub use hooks::{NoopHooks, UndoConfig, UndoHooks};
pub use listener::UpdateListener;
pub use observer::{StackChange, StackSnapshot};
pub use persistence::{
    decode_tombstones, encode_tombstones, JsonFilePersistence, MemoryPersistence,
    TombstonePersistence,
};
pub use source::{CardFeed, CardSource, FeedStream};

pub use swipestack_core::{
    CardItem, Direction, DirectionScheme, FeedEvent, ReplacementStrategy, RestoreOnLaunch,
    SourceError, StackConfig, StackError, StackSettings, Tombstone, UndoSettings,
};
