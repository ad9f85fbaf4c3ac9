//! Polling helpers for state reached by background tasks.

use std::future::Future;
use std::time::Duration;

use swipestack_app::SharedController;

use crate::fixtures::TestCard;

/// Upper bound for [`wait_until`].
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(2);

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Poll `condition` until it holds or [`WAIT_TIMEOUT`] passes.
pub async fn wait_until<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let poll = async {
        loop {
            if condition().await {
                return;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    };
    tokio::time::timeout(WAIT_TIMEOUT, poll).await.is_ok()
}

/// Wait until the controller holds exactly `expected` ordered cards.
pub async fn wait_for_card_count(controller: &SharedController<TestCard>, expected: usize) -> bool {
    wait_until(|| async { controller.read().await.card_count() == expected }).await
}

/// Wait until the controller's current card has ID `expected`.
pub async fn wait_for_current(controller: &SharedController<TestCard>, expected: u64) -> bool {
    wait_until(|| async {
        controller.read().await.current_item().map(|card| card.id) == Some(expected)
    })
    .await
}
