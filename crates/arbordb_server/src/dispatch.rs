//! Bridge between async request handling and blocking storage work.
//!
//! Storage operations hold file locks and perform synchronous I/O, so
//! they must not run on async worker threads. [`Dispatcher`] moves each
//! closure onto the runtime's blocking pool and surfaces the result back
//! to the awaiting task.

use crate::error::{ServerError, ServerResult};
use tokio::runtime::Handle;

/// Runs blocking storage closures on a Tokio blocking pool.
///
/// The dispatcher is cheap to clone; all clones share the same runtime.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    handle: Handle,
}

impl Dispatcher {
    /// Creates a dispatcher for the given runtime handle.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Creates a dispatcher for the current runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Runs `work` on the blocking pool and awaits its result.
    ///
    /// A worker that panics or is cancelled surfaces as
    /// [`ServerError::TaskFailed`] rather than unwinding the request task.
    pub async fn run_blocking<T, F>(&self, work: F) -> ServerResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> ServerResult<T> + Send + 'static,
    {
        self.handle
            .spawn_blocking(work)
            .await
            .map_err(|err| ServerError::TaskFailed(err.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_closure_and_returns_value() {
        let dispatcher = Dispatcher::current();
        let value = dispatcher.run_blocking(|| Ok(7 * 6)).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn propagates_closure_errors() {
        let dispatcher = Dispatcher::current();
        let result: ServerResult<()> = dispatcher
            .run_blocking(|| Err(ServerError::validation("nope")))
            .await;
        assert!(matches!(result, Err(ServerError::Validation(_))));
    }

    #[tokio::test]
    async fn panicking_worker_surfaces_as_task_failed() {
        let dispatcher = Dispatcher::current();
        let result: ServerResult<()> = dispatcher
            .run_blocking(|| panic!("worker blew up"))
            .await;
        assert!(matches!(result, Err(ServerError::TaskFailed(_))));
    }
}
