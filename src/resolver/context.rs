//! # Resolve Context
//!
//! Caller-supplied cancellation and deadline for one resolver call.

use super::ResolveError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Cancellation token plus optional deadline for resolver calls
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    cancel: CancellationToken,
    timeout: Option<Duration>,
}

impl ResolveContext {
    /// Context that is never cancelled and has no deadline
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Child context sharing this context's deadline, cancelled with its parent
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            timeout: self.timeout,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Drive `fut` to completion unless the context is cancelled or the deadline elapses
    ///
    /// Cancellation wins over a ready result so a cancelled caller never
    /// observes data fetched after it gave up.
    pub(crate) async fn run<T, F>(&self, fut: F) -> Result<T, ResolveError>
    where
        F: Future<Output = Result<T, ResolveError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        let bounded = async {
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, fut)
                    .await
                    .unwrap_or(Err(ResolveError::DeadlineExceeded(limit))),
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(ResolveError::Cancelled),
            result = bounded => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_passes_through_result() {
        let ctx = ResolveContext::background();
        let value = ctx.run(async { Ok::<_, ResolveError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_run_already_cancelled() {
        let ctx = ResolveContext::background();
        ctx.cancel();
        let result = ctx.run(async { Ok::<_, ResolveError>(7) }).await;
        assert!(matches!(result, Err(ResolveError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_deadline() {
        let ctx = ResolveContext::background().with_timeout(Duration::from_millis(50));
        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, ResolveError>(())
            })
            .await;
        assert!(matches!(result, Err(ResolveError::DeadlineExceeded(d)) if d == Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn test_child_cancelled_with_parent() {
        let parent = ResolveContext::background();
        let child = parent.child();
        parent.cancel();
        assert!(child.is_cancelled());
    }
}
