//! # SwipeStack Core - Pure Card Stack State
//!
//! **Purpose**: Define the ordering model, cursor arithmetic, undo ledger and
//! replacement policy for a swipeable card stack.
//!
//! # Architecture Constraints
//!
//! - YES Card ordering over a stable-ID lookup map
//! - YES Bounded tombstone history with explicit eviction hand-off
//! - YES Replacement decisions as pure functions
//! - NO async runtime (callbacks are awaited by the caller, not spawned here)
//! - NO orchestration or I/O (that's `swipestack-app`)
//!
//! ## Core Concepts
//!
//! - **Card Store**: `order` of IDs + `by_id` lookup + `cursor`
//! - **Tombstone**: a recorded swipe retained for possible undo
//! - **Eviction**: permanent removal of the oldest tombstone once the undo
//!   limit is exceeded
//! - **Hole**: an ID present in the order but absent from the lookup map

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Stack and undo configuration
pub mod config;

/// Swipe directions and angle schemes
pub mod direction;

/// Unified error types
pub mod errors;

/// Upstream feed events
pub mod event;

/// The `CardItem` identity contract
pub mod item;

/// Bounded undo history
pub mod ledger;

/// Replacement reconciliation against undo history
pub mod policy;

/// Ordered card storage with cursor
pub mod store;

pub use config::{ReplacementStrategy, RestoreOnLaunch, StackConfig, StackSettings, UndoSettings};
pub use direction::{Direction, DirectionScheme};
pub use errors::{ConfigError, PersistenceError, SourceError, StackError};
pub use event::FeedEvent;
pub use item::CardItem;
pub use ledger::{Tombstone, TombstoneLedger};
pub use policy::{decide, ReplacementDecision};
pub use store::CardStore;
