//! The device snapshot — one complete, immutable mirror of board state.

use serde::{Deserialize, Serialize};

use pintwin_api::BoardState;

use super::pin::{PinId, PinState};

/// Network / radio / housekeeping metadata from the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub time: String,
    pub temp_c: f64,
    pub ip: String,
    pub ble_status: String,
    pub ble_name: String,
    pub wifi_ssid: String,
}

/// Named ADC channel voltages.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AdcReadings {
    pub adc0: f64,
    pub adc1: f64,
    pub adc2: f64,
}

impl AdcReadings {
    /// Channel name / voltage pairs in display order.
    pub fn channels(&self) -> [(&'static str, f64); 3] {
        [("adc0", self.adc0), ("adc1", self.adc1), ("adc2", self.adc2)]
    }
}

/// The authoritative mirror of remote board state at one instant.
///
/// Immutable once constructed; every successful poll replaces the whole
/// snapshot -- there is no field-level merging. Consumers hold it behind
/// an `Arc` so one reconciliation pass observes one consistent snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub status: DeviceStatus,
    pub adc: AdcReadings,
    /// Ordered as the firmware reports them (header order).
    pub pins: Vec<PinState>,
    /// Board-side log lines, most-recent-last, already windowed server-side.
    pub activity_log: Vec<String>,
}

impl DeviceSnapshot {
    /// Look up a pin by identity.
    ///
    /// When a snapshot carries duplicate identities the last occurrence
    /// wins, matching reconciliation order.
    pub fn pin(&self, id: &PinId) -> Option<&PinState> {
        self.pins.iter().rev().find(|p| &p.id == id)
    }
}

impl From<BoardState> for DeviceSnapshot {
    fn from(state: BoardState) -> Self {
        Self {
            status: DeviceStatus {
                time: state.status.time,
                temp_c: state.status.temp_c,
                ip: state.status.ip,
                ble_status: state.status.ble_status,
                ble_name: state.status.ble_name,
                wifi_ssid: state.status.wifi_ssid,
            },
            adc: AdcReadings {
                adc0: state.adc_volts.adc0,
                adc1: state.adc_volts.adc1,
                adc2: state.adc_volts.adc2,
            },
            pins: state.pins.into_iter().map(PinState::from).collect(),
            activity_log: state.server_log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::pin::PinMode;

    fn pin(id: PinId, mode: PinMode, value: Option<u8>) -> PinState {
        PinState {
            name: id.to_string(),
            id,
            mode,
            value,
            pull: None,
            pwm_freq_hz: None,
            pwm_duty_pct: None,
        }
    }

    #[test]
    fn duplicate_pin_ids_last_one_wins() {
        let snap = DeviceSnapshot {
            status: DeviceStatus {
                time: String::new(),
                temp_c: 0.0,
                ip: String::new(),
                ble_status: String::new(),
                ble_name: String::new(),
                wifi_ssid: String::new(),
            },
            adc: AdcReadings::default(),
            pins: vec![
                pin(PinId::Gpio(7), PinMode::In, Some(0)),
                pin(PinId::Gpio(7), PinMode::Out, Some(1)),
            ],
            activity_log: vec![],
        };

        let found = snap.pin(&PinId::Gpio(7)).expect("pin present");
        assert_eq!(found.mode, PinMode::Out);
        assert_eq!(found.value, Some(1));
    }
}
