//! Trailing-edge debouncing for search-as-you-type.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
type Action<A> = Arc<dyn Fn(A) -> BoxFuture + Send + Sync>;

/// Runs `action` once the trigger has been quiet for `quiet`.
///
/// Each trigger cancels the pending one, so only the final arguments of a
/// burst reach the action. Dropping the debouncer cancels anything pending.
pub struct Debouncer<A> {
    quiet: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
    action: Action<A>,
}

impl<A: Send + 'static> Debouncer<A> {
    pub fn new<F, Fut>(quiet: Duration, action: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            quiet,
            pending: Mutex::new(None),
            action: Arc::new(move |args| -> BoxFuture { Box::pin(action(args)) }),
        }
    }

    pub fn quiet(&self) -> Duration {
        self.quiet
    }

    /// Schedule `args`, replacing whatever is pending. Must be called inside
    /// a tokio runtime.
    pub fn trigger(&self, args: A) {
        let action = Arc::clone(&self.action);
        let quiet = self.quiet;
        let task = tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            action(args).await;
        });

        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = pending.replace(task) {
            previous.abort();
        }
    }

    /// Drop the pending invocation, if any.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }

    /// True while an invocation is waiting or running.
    pub fn is_pending(&self) -> bool {
        let pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl<A> Drop for Debouncer<A> {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(|p| p.into_inner());
        if let Some(task) = pending.take() {
            task.abort();
        }
    }
}

impl<A> std::fmt::Debug for Debouncer<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer").field("quiet", &self.quiet).finish()
    }
}
