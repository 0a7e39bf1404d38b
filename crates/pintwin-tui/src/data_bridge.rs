//! Data bridge — connects [`Twin`] channels to TUI actions.
//!
//! Runs as a background task: subscribes to the snapshot store,
//! connectivity state, and the diagnostics side-channel, forwarding every
//! change as an [`Action`] through the TUI's action channel.

use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use pintwin_core::Twin;

use crate::action::Action;

/// Run the bridge until cancelled. Starts the twin's poll scheduler.
pub async fn run_data_bridge(
    twin: Twin,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut snapshot = twin.snapshot();
    let mut connectivity = twin.connectivity();
    let mut diagnostics = twin.diagnostics();

    twin.start_polling();

    // Push current state so panels have data on reconnect.
    if let Some(snap) = snapshot.borrow_and_update().clone() {
        let _ = action_tx.send(Action::SnapshotUpdated(snap));
    }
    let _ = action_tx.send(Action::ConnectivityChanged(
        *connectivity.borrow_and_update(),
    ));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Ok(()) = snapshot.changed() => {
                if let Some(snap) = snapshot.borrow_and_update().clone() {
                    let _ = action_tx.send(Action::SnapshotUpdated(snap));
                }
            }

            Ok(()) = connectivity.changed() => {
                let state = *connectivity.borrow_and_update();
                let _ = action_tx.send(Action::ConnectivityChanged(state));
            }

            line = diagnostics.recv() => {
                match line {
                    Ok(line) => {
                        let _ = action_tx.send(Action::Diagnostic(line));
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(dropped = n, "diagnostics receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    twin.stop_polling();
    debug!("data bridge shut down");
}
