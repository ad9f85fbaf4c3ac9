//! SwipeStack Testing Infrastructure
//!
//! Shared fixtures and scripted collaborators for controller and listener
//! tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! swipestack-testkit = { path = "../swipestack-testkit" }
//! ```
//!
//! ```rust,ignore
//! use swipestack_testkit::*;
//!
//! #[tokio::test]
//! async fn swipes() {
//!     let source = MockSource::with_initial(cards(1..=5));
//!     let controller = controller_with_undo(UndoSettings::with_limit(3), RecordingHooks::new());
//!     // ... test logic
//! }
//! ```

pub mod fixtures;
pub mod mocks;
pub mod wait;

pub use fixtures::*;
pub use mocks::*;
pub use wait::*;
