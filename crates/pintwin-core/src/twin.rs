// ── Twin abstraction ──
//
// Full lifecycle management for one board's digital twin: the snapshot
// store, connectivity state, the poll scheduler, and the command
// dispatcher. All connectivity transitions happen here, on the one
// cooperative flow that just completed an awaited request.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;

use pintwin_api::{CommandAck, DeviceClient, TransportConfig};

use crate::connectivity::ConnectivityState;
use crate::debounce::Debouncer;
use crate::error::CoreError;
use crate::model::{DeviceSnapshot, PinId, PinMode, PullMode};
use crate::scheduler;
use crate::store::SnapshotStore;

const DIAG_CHANNEL_SIZE: usize = 256;

/// Default refresh interval (matches the firmware's expectation of a
/// lightly loaded server).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2500);

/// Default trailing-edge delay for the debounced PWM path.
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(300);

// ── Configuration ────────────────────────────────────────────────

/// Twin construction parameters.
#[derive(Debug, Clone)]
pub struct TwinConfig {
    /// Board base URL (e.g. `http://192.168.1.50`).
    pub base_url: Url,
    pub poll_interval: Duration,
    pub debounce_delay: Duration,
    pub transport: TransportConfig,
}

impl TwinConfig {
    /// Config with default intervals for the given board URL.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            poll_interval: DEFAULT_POLL_INTERVAL,
            debounce_delay: DEFAULT_DEBOUNCE_DELAY,
            transport: TransportConfig::default(),
        }
    }
}

// ── Refresh outcome ──────────────────────────────────────────────

/// What a single `refresh()` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot was accepted and applied.
    Applied,
    /// Another refresh was already in flight; this trigger was dropped.
    Dropped,
    /// The request failed; connectivity reflects the classification.
    Failed,
}

// ── Twin ─────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc`. The remote board is authoritative: the
/// twin only mirrors its state and fires commands at it; every mutation
/// is confirmed by the next accepted snapshot, never applied locally.
#[derive(Clone)]
pub struct Twin {
    inner: Arc<TwinInner>,
}

struct TwinInner {
    client: DeviceClient,
    store: SnapshotStore,
    connectivity: watch::Sender<ConnectivityState>,
    diag_tx: broadcast::Sender<String>,
    /// Single-flight gate: a refresh in progress suppresses any
    /// overlapping trigger (timer or command success). Dropped, not queued.
    refresh_gate: Mutex<()>,
    poll_interval: Duration,
    /// Cancellation for the current poll task, replaced on restart so a
    /// halted twin stays restartable.
    poll_cancel: StdMutex<CancellationToken>,
    poll_task: StdMutex<Option<JoinHandle<()>>>,
    pwm_debouncer: Debouncer,
}

impl Twin {
    /// Create a new twin. Does NOT start polling -- call
    /// [`start_polling()`](Self::start_polling) for that.
    pub fn new(config: TwinConfig) -> Result<Self, CoreError> {
        let client = DeviceClient::new(config.base_url, &config.transport)?;
        let (connectivity, _) = watch::channel(ConnectivityState::default());
        let (diag_tx, _) = broadcast::channel(DIAG_CHANNEL_SIZE);
        let cancel = CancellationToken::new();

        Ok(Self {
            inner: Arc::new(TwinInner {
                client,
                store: SnapshotStore::new(),
                connectivity,
                diag_tx,
                refresh_gate: Mutex::new(()),
                poll_interval: config.poll_interval,
                poll_cancel: StdMutex::new(cancel),
                poll_task: StdMutex::new(None),
                pwm_debouncer: Debouncer::new(config.debounce_delay),
            }),
        })
    }

    // ── State observation ────────────────────────────────────────

    /// The current snapshot, if any poll has succeeded yet.
    pub fn current_snapshot(&self) -> Option<Arc<DeviceSnapshot>> {
        self.inner.store.current()
    }

    /// Subscribe to snapshot replacements.
    pub fn snapshot(&self) -> watch::Receiver<Option<Arc<DeviceSnapshot>>> {
        self.inner.store.subscribe()
    }

    /// Subscribe to connectivity transitions.
    pub fn connectivity(&self) -> watch::Receiver<ConnectivityState> {
        self.inner.connectivity.subscribe()
    }

    /// The most recent connectivity state.
    pub fn connectivity_now(&self) -> ConnectivityState {
        *self.inner.connectivity.borrow()
    }

    /// Subscribe to the operator diagnostics side-channel.
    ///
    /// Observational only: lines here describe request outcomes and local
    /// rejections, distinct from the board's own activity log.
    pub fn diagnostics(&self) -> broadcast::Receiver<String> {
        self.inner.diag_tx.subscribe()
    }

    fn set_connectivity(&self, state: ConnectivityState) {
        self.inner.connectivity.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
    }

    fn diag(&self, line: impl Into<String>) {
        let line = line.into();
        debug!(diag = %line);
        let _ = self.inner.diag_tx.send(line);
    }

    // ── Polling lifecycle ────────────────────────────────────────

    /// Start the periodic refresh task. No-op while one is running.
    pub fn start_polling(&self) {
        let mut task = self.inner.poll_task.lock().expect("poll task lock poisoned");
        if task.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        let cancel = CancellationToken::new();
        *self.inner.poll_cancel.lock().expect("poll cancel lock poisoned") = cancel.clone();

        let twin = self.clone();
        *task = Some(tokio::spawn(scheduler::poll_task(
            twin,
            self.inner.poll_interval,
            cancel,
        )));
    }

    /// Halt the periodic refresh task.
    ///
    /// Recoverable only by an explicit [`start_polling()`](Self::start_polling);
    /// nothing restarts it implicitly.
    pub fn stop_polling(&self) {
        self.inner
            .poll_cancel
            .lock()
            .expect("poll cancel lock poisoned")
            .cancel();
    }

    /// Whether the poll task is currently scheduled.
    pub fn is_polling(&self) -> bool {
        let cancelled = self
            .inner
            .poll_cancel
            .lock()
            .expect("poll cancel lock poisoned")
            .is_cancelled();
        let running = self
            .inner
            .poll_task
            .lock()
            .expect("poll task lock poisoned")
            .as_ref()
            .is_some_and(|h| !h.is_finished());
        running && !cancelled
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Fetch the board snapshot and replace the store wholesale.
    ///
    /// Single-flight: concurrent triggers are dropped, not queued. A
    /// malformed response degrades the indicator but leaves scheduling
    /// running; only an unreachable board halts the poll task.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Ok(_gate) = self.inner.refresh_gate.try_lock() else {
            trace!("refresh already in flight; dropping trigger");
            return RefreshOutcome::Dropped;
        };

        self.set_connectivity(ConnectivityState::Connecting);

        match self.inner.client.board_state().await {
            Ok(state) => {
                self.inner.store.replace(Arc::new(DeviceSnapshot::from(state)));
                self.set_connectivity(ConnectivityState::Connected);
                RefreshOutcome::Applied
            }
            Err(e) if e.is_unreachable() => {
                warn!(error = %e, "board unreachable; halting polling");
                self.diag(format!("[ERROR] Fetch failed for /api/board_state: {e}"));
                self.set_connectivity(ConnectivityState::Offline);
                self.stop_polling();
                RefreshOutcome::Failed
            }
            Err(e) => {
                // Soft failure: a reachable board answered badly. Keep
                // polling so a transient glitch heals on the next cycle.
                self.diag(format!("[ERROR] API /api/board_state: {e}"));
                self.set_connectivity(ConnectivityState::ApiError);
                RefreshOutcome::Failed
            }
        }
    }

    // ── Command dispatch ─────────────────────────────────────────

    /// Apply connectivity + diagnostics side effects to a command
    /// outcome, converting the error type on the way through.
    fn finish_command(
        &self,
        path: &str,
        result: Result<CommandAck, pintwin_api::Error>,
    ) -> Result<CommandAck, CoreError> {
        match result {
            Ok(ack) => {
                if let Some(msg) = &ack.message {
                    self.diag(format!("[API] {path}: {msg}"));
                }
                self.set_connectivity(ConnectivityState::Connected);
                Ok(ack)
            }
            Err(e) if e.is_unreachable() => {
                self.diag(format!("[ERROR] Fetch failed for {path}: {e}"));
                self.set_connectivity(ConnectivityState::Offline);
                self.stop_polling();
                Err(e.into())
            }
            Err(e) => {
                self.diag(format!("[ERROR] API {path}: {e}"));
                self.set_connectivity(ConnectivityState::ApiError);
                Err(e.into())
            }
        }
    }

    /// Set a pin's mode, then refresh.
    pub async fn set_pin_mode(&self, pin_id: &PinId, mode: PinMode) -> Result<(), CoreError> {
        if mode == PinMode::Fixed {
            return Err(CoreError::Validation {
                message: "cannot request fixed mode".into(),
            });
        }
        self.set_connectivity(ConnectivityState::Connecting);
        let result = self
            .inner
            .client
            .set_pin_mode(&pin_id.to_string(), &mode.to_string())
            .await;
        self.finish_command("pin/mode", result)?;
        self.refresh().await;
        Ok(())
    }

    /// Set a pin's pull resistor, then refresh.
    pub async fn set_pin_pull(&self, pin_id: &PinId, pull: PullMode) -> Result<(), CoreError> {
        self.set_connectivity(ConnectivityState::Connecting);
        let result = self
            .inner
            .client
            .set_pin_pull(&pin_id.to_string(), &pull.to_string())
            .await;
        self.finish_command("pin/pull", result)?;
        self.refresh().await;
        Ok(())
    }

    /// Toggle a digital output to its complement.
    ///
    /// The target level comes from the current snapshot: an unknown pin or
    /// one not in output mode is rejected locally, and no request is sent.
    pub async fn toggle_pin(&self, pin_id: &PinId) -> Result<(), CoreError> {
        let snapshot = self.current_snapshot().ok_or(CoreError::NoSnapshot)?;
        let Some(pin) = snapshot.pin(pin_id) else {
            self.diag(format!("[ERROR] Toggle requested for unknown pin {pin_id}"));
            return Err(CoreError::PinNotFound {
                id: pin_id.to_string(),
            });
        };
        if pin.mode != PinMode::Out {
            self.diag(format!("[ERROR] Toggle requested for non-output pin {pin_id}"));
            return Err(CoreError::NotAnOutput {
                id: pin_id.to_string(),
            });
        }

        let next = u8::from(pin.value != Some(1));
        self.set_connectivity(ConnectivityState::Connecting);
        let result = self
            .inner
            .client
            .set_pin_value(&pin_id.to_string(), next)
            .await;
        self.finish_command("pin/value", result)?;
        self.refresh().await;
        Ok(())
    }

    /// Configure PWM parameters immediately, then refresh.
    pub async fn set_pwm(&self, pin_id: &PinId, freq_hz: u32, duty_pct: f64) -> Result<(), CoreError> {
        if freq_hz == 0 {
            return Err(CoreError::Validation {
                message: "PWM frequency must be at least 1 Hz".into(),
            });
        }
        if !duty_pct.is_finite() || !(0.0..=100.0).contains(&duty_pct) {
            return Err(CoreError::Validation {
                message: "PWM duty must be between 0 and 100 percent".into(),
            });
        }
        self.set_connectivity(ConnectivityState::Connecting);
        let result = self
            .inner
            .client
            .set_pwm(&pin_id.to_string(), freq_hz, duty_pct)
            .await;
        self.finish_command("pwm/set", result)?;
        self.refresh().await;
        Ok(())
    }

    /// Debounced PWM variant for continuous input sources: invocations
    /// within the delay window collapse to a single trailing call.
    pub fn set_pwm_debounced(&self, pin_id: PinId, freq_hz: u32, duty_pct: f64) {
        let twin = self.clone();
        self.inner.pwm_debouncer.schedule(async move {
            if let Err(e) = twin.set_pwm(&pin_id, freq_hz, duty_pct).await {
                warn!(error = %e, %pin_id, "debounced PWM set failed");
            }
        });
    }

    /// Reconfigure the board's network credentials.
    ///
    /// Fire-and-forget: the board drops off the network to re-join, so no
    /// response is awaited. The twin proactively goes `Connecting` and
    /// halts polling; only an explicit restart resumes it.
    pub async fn set_wifi_credentials(
        &self,
        ssid: &str,
        password: &SecretString,
    ) -> Result<(), CoreError> {
        if ssid.trim().is_empty() {
            return Err(CoreError::Validation {
                message: "SSID is required".into(),
            });
        }
        if password.expose_secret().is_empty() {
            return Err(CoreError::Validation {
                message: "Password is required to change Wi-Fi".into(),
            });
        }

        self.inner.client.connect_wifi(ssid, password).await?;
        self.diag(format!(
            "[SYSTEM] Wi-Fi reconnect initiated for {ssid}. Connection may be lost."
        ));
        self.set_connectivity(ConnectivityState::Connecting);
        self.stop_polling();
        Ok(())
    }

    /// Set the radio advertising name, then refresh.
    pub async fn set_ble_name(&self, name: &str) -> Result<(), CoreError> {
        if name.trim().is_empty() {
            return Err(CoreError::Validation {
                message: "BLE name cannot be empty".into(),
            });
        }
        self.set_connectivity(ConnectivityState::Connecting);
        let result = self.inner.client.set_ble_name(name).await;
        self.finish_command("ble/set_name", result)?;
        self.refresh().await;
        Ok(())
    }

    /// Start or stop radio advertising, then refresh.
    pub async fn set_ble_advertising(&self, enable: bool) -> Result<(), CoreError> {
        self.set_connectivity(ConnectivityState::Connecting);
        let result = self.inner.client.set_ble_advertising(enable).await;
        self.finish_command(if enable { "ble/start" } else { "ble/stop" }, result)?;
        self.refresh().await;
        Ok(())
    }

    /// Append a command to the board's server-side log, then refresh so
    /// the echoed log line shows up.
    pub async fn send_console_command(&self, text: &str) -> Result<(), CoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::Validation {
                message: "console command is empty".into(),
            });
        }
        self.set_connectivity(ConnectivityState::Connecting);
        let result = self.inner.client.console_command(text).await;
        self.finish_command("console/command", result)?;
        self.refresh().await;
        Ok(())
    }
}
