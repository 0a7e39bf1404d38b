// Wire-format types for the board console API.
//
// These mirror the JSON the firmware emits verbatim. `pintwin-core`
// converts them into its domain model; nothing here is meant to be
// ergonomic, only faithful.

use serde::Deserialize;

/// Full board snapshot as served by `GET /api/board_state`.
///
/// `status` and `pins` are required; their absence is treated as a
/// malformed response by [`DeviceClient::board_state`](crate::DeviceClient::board_state).
#[derive(Debug, Clone, Deserialize)]
pub struct BoardState {
    pub status: StatusBlock,
    #[serde(default)]
    pub adc_volts: AdcVolts,
    pub pins: Vec<PinRecord>,
    #[serde(default)]
    pub server_log: Vec<String>,
}

/// Network / radio / housekeeping metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusBlock {
    pub time: String,
    pub temp_c: f64,
    pub ip: String,
    pub ble_status: String,
    pub ble_name: String,
    #[serde(default)]
    pub wifi_ssid: String,
}

/// Named ADC voltage readings, in volts.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AdcVolts {
    #[serde(default)]
    pub adc0: f64,
    #[serde(default)]
    pub adc1: f64,
    #[serde(default)]
    pub adc2: f64,
}

/// Pin identity on the wire: a non-negative GPIO index for header pins,
/// or a symbolic name (`"GND"`, `"VBUS"`, `"EN"`, ...) for fixed-function
/// positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum PinIdWire {
    Gpio(i64),
    Name(String),
}

/// One pin's state as exported by the firmware.
///
/// Mode-specific fields (`value`, `pull`, `pwm_freq`, `pwm_duty`) may be
/// present for modes where they are meaningless; consumers ignore them
/// rather than require their absence.
#[derive(Debug, Clone, Deserialize)]
pub struct PinRecord {
    pub id: PinIdWire,
    pub name: String,
    pub mode: String,
    #[serde(default)]
    pub value: Option<u8>,
    #[serde(default)]
    pub pull: Option<String>,
    #[serde(default)]
    pub pwm_freq: Option<u32>,
    #[serde(default)]
    pub pwm_duty: Option<f64>,
}

/// Acknowledgement parsed from a command response envelope.
///
/// Success envelopes are `{status: "ok", message?: "..."}`; the message,
/// when present, is operator-facing and goes to the diagnostics channel.
#[derive(Debug, Clone)]
pub struct CommandAck {
    pub message: Option<String>,
}
