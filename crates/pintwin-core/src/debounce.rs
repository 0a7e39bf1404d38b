// ── Cancellable trailing-edge debouncer ──
//
// Explicit delayed-task abstraction: schedule() cancels any pending
// invocation and arms a new one. Once the delay has elapsed the task runs
// to completion even if another schedule() arrives meanwhile, matching
// clear-timer semantics rather than mid-flight abortion.

use std::sync::Mutex;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Collapses rapid repeated invocations into a single trailing call.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<CancellationToken>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(CancellationToken::new()),
        }
    }

    /// Schedule `task` to run after the delay, cancelling any invocation
    /// still waiting out its delay window.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        {
            let mut guard = self.pending.lock().expect("debounce lock poisoned");
            guard.cancel();
            *guard = token.clone();
        }

        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    trace!("debounced invocation superseded");
                }
                () = tokio::time::sleep(delay) => {
                    task.await;
                }
            }
        });
    }

    /// Drop any pending invocation without replacing it.
    pub fn cancel(&self) {
        self.pending
            .lock()
            .expect("debounce lock poisoned")
            .cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn rapid_calls_collapse_to_single_trailing_run() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let runs = Arc::new(AtomicU32::new(0));

        for _ in 0..5 {
            let runs = Arc::clone(&runs);
            debouncer.schedule(async move {
                runs.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::advance(Duration::from_millis(50)).await;
        }

        tokio::time::advance(Duration::from_millis(400)).await;
        tokio::task::yield_now().await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_invocation() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let runs = Arc::new(AtomicU32::new(0));

        {
            let runs = Arc::clone(&runs);
            debouncer.schedule(async move {
                runs.fetch_add(1, Ordering::SeqCst);
            });
        }
        debouncer.cancel();

        tokio::time::advance(Duration::from_millis(500)).await;
        tokio::task::yield_now().await;

        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn separate_windows_each_fire() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let runs = Arc::new(AtomicU32::new(0));

        for _ in 0..2 {
            let runs = Arc::clone(&runs);
            debouncer.schedule(async move {
                runs.fetch_add(1, Ordering::SeqCst);
            });
            // Let the spawned task register its sleep before the paused
            // clock advances; otherwise the window never elapses.
            tokio::task::yield_now().await;
            tokio::time::advance(Duration::from_millis(200)).await;
            tokio::task::yield_now().await;
        }

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
