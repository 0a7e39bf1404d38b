//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::sync::Arc;

use pintwin_core::{ConnectivityState, DeviceSnapshot, PinId, PinMode, PullMode};

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Focus ──────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,

    // ── Data events (from the twin) ────────────────────────────────
    SnapshotUpdated(Arc<DeviceSnapshot>),
    ConnectivityChanged(ConnectivityState),
    /// A diagnostics line (request outcome or local rejection).
    Diagnostic(String),

    // ── Board commands ─────────────────────────────────────────────
    TogglePin(PinId),
    SetPinMode(PinId, PinMode),
    SetPinPull(PinId, PullMode),
    SetPwm {
        pin: PinId,
        freq_hz: u32,
        duty_pct: f64,
    },
    /// Debounced variant for live duty adjustment.
    SetPwmLive {
        pin: PinId,
        freq_hz: u32,
        duty_pct: f64,
    },
    SetWifi {
        ssid: String,
        password: String,
    },
    SetBleName(String),
    SetBleAdvertising(bool),
    ConsoleSubmit(String),
    RefreshNow,
    StartPolling,
}
