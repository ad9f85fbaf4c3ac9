//! Upstream collaborator contracts.
//!
//! A [`CardSource`] is pulled for pages and told about user actions. A
//! [`CardFeed`] pushes live changes as a stream of [`FeedEvent`]s. Both are
//! injected into the listener as trait objects.

use async_trait::async_trait;
use futures::stream::BoxStream;
use swipestack_core::{CardItem, Direction, FeedEvent, SourceError};

/// Stream of live collection changes.
pub type FeedStream<T> = BoxStream<'static, FeedEvent<T>>;

/// Pull-based data source.
#[async_trait]
pub trait CardSource<T: CardItem>: Send + Sync {
    /// Load the first page of cards.
    async fn load_initial(&self) -> Result<Vec<T>, SourceError>;

    /// Load the next page. An empty page means nothing more is available.
    async fn load_more(&self) -> Result<Vec<T>, SourceError> {
        Ok(Vec::new())
    }

    /// Report a completed swipe upstream.
    async fn report_swipe(&self, item: &T, direction: Direction) -> Result<(), SourceError>;

    /// Report an undo upstream.
    async fn report_undo(&self, item: &T) -> Result<(), SourceError>;
}

/// Push-based change feed.
#[async_trait]
pub trait CardFeed<T: CardItem>: Send + Sync {
    /// Open a new subscription. Ending the stream ends the listen loop.
    async fn subscribe(&self) -> Result<FeedStream<T>, SourceError>;
}
