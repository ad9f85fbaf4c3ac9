//! Single-flight gate for paged loads.
//!
//! The first caller starts the fetch; callers arriving while it is in flight
//! join the same shared future and observe the same result.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

type InFlight<O> = Shared<BoxFuture<'static, O>>;

pub(crate) struct LoadMoreGate<O: Clone> {
    in_flight: Mutex<Option<InFlight<O>>>,
}

impl<O: Clone + Send + Sync + 'static> LoadMoreGate<O> {
    pub(crate) fn new() -> Self {
        Self {
            in_flight: Mutex::new(None),
        }
    }

    /// Join the in-flight load, or start one with `start`.
    pub(crate) async fn run<F>(&self, start: F) -> O
    where
        F: FnOnce() -> BoxFuture<'static, O>,
    {
        let (load, joined) = {
            let mut slot = self.in_flight.lock();
            match slot.as_ref() {
                Some(load) => (load.clone(), true),
                None => {
                    let load = start().shared();
                    *slot = Some(load.clone());
                    (load, false)
                }
            }
        };
        if joined {
            tracing::debug!("joined in-flight load");
        }

        let output = load.clone().await;

        let mut slot = self.in_flight.lock();
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&load)) {
            *slot = None;
        }
        output
    }

    #[cfg(test)]
    pub(crate) fn is_in_flight(&self) -> bool {
        self.in_flight.lock().is_some()
    }
}
