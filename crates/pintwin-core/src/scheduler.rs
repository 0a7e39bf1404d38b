// ── Poll scheduler ──
//
// A single tokio task firing Twin::refresh() on a fixed interval. The
// first tick fires immediately so a fresh start shows data without
// waiting out one interval. Overlap suppression lives inside refresh()
// itself (the single-flight gate), not here: a tick that lands while a
// refresh is still in flight is simply dropped.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::twin::Twin;

/// Run the periodic refresh loop until cancelled.
///
/// Cancellation comes from two places: an explicit `stop_polling()`, or
/// `refresh()` itself after classifying the board as unreachable. Either
/// way the loop exits before attempting another poll.
pub(crate) async fn poll_task(twin: Twin, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    debug!(interval_ms = interval.as_millis(), "poll task started");

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            _ = ticker.tick() => {
                twin.refresh().await;
            }
        }
    }

    debug!("poll task stopped");
}
