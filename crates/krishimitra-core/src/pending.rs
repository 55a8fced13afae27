//! Cancellable delayed delivery.
//!
//! A [`PendingReply`] runs a piece of async work after a fixed delay unless its
//! token is cancelled first. Cancelling is idempotent. Dropping the handle
//! cancels it too, so a reply can never outlive the conversation that
//! scheduled it. Scheduling under a child of a longer-lived token lets the
//! owner cancel every outstanding delivery at once.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A scheduled delivery that has not necessarily run yet.
#[derive(Debug)]
pub struct PendingReply {
    cancel_token: CancellationToken,
}

impl PendingReply {
    /// Run `deliver` once `delay` has elapsed, unless `cancel_token` fires first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(delay: Duration, cancel_token: CancellationToken, deliver: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task_token = cancel_token.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = task_token.cancelled() => {
                    debug!("Pending reply cancelled before delivery");
                }
                _ = tokio::time::sleep(delay) => {
                    deliver().await;
                }
            }
        });

        Self { cancel_token }
    }

    /// Stop the delivery if it has not started.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
