//! Pin identity, modes, and roles.

use std::fmt;

use serde::{Deserialize, Serialize};

use pintwin_api::{PinIdWire, PinRecord};

/// Power-rail names; any pin whose name contains one of these is a power pin.
const POWER_KEYWORDS: [&str; 4] = ["GND", "VBUS", "3V3", "VSYS"];

/// Special-function names (reset, reference, enable).
const SPECIAL_KEYWORDS: [&str; 3] = ["EN", "VREF", "RUN"];

/// Identity of a pin: a numeric GPIO index for header GPIOs, or the
/// symbolic name of a fixed-function position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinId {
    Gpio(u8),
    Fixed(String),
}

impl PinId {
    /// Returns `true` for numeric GPIO identities.
    pub fn is_gpio(&self) -> bool {
        matches!(self, Self::Gpio(_))
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio(n) => write!(f, "{n}"),
            Self::Fixed(name) => f.write_str(name),
        }
    }
}

impl From<PinIdWire> for PinId {
    fn from(wire: PinIdWire) -> Self {
        match wire {
            PinIdWire::Gpio(n) => match u8::try_from(n) {
                Ok(n) => Self::Gpio(n),
                // Negative or absurd indexes are treated as symbolic.
                Err(_) => Self::Fixed(n.to_string()),
            },
            PinIdWire::Name(name) => Self::Fixed(name),
        }
    }
}

/// Configured mode of a pin.
///
/// `Fixed` covers everything the firmware reports that is not one of the
/// four configurable modes (power rails, reset, unknown future modes).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum PinMode {
    In,
    Out,
    Adc,
    Pwm,
    Fixed,
}

impl PinMode {
    /// Parse a wire mode string, mapping anything unknown to `Fixed`.
    pub fn from_wire(s: &str) -> Self {
        s.parse().unwrap_or(Self::Fixed)
    }
}

/// Pull resistor configuration, meaningful only in `In` mode.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum PullMode {
    #[default]
    None,
    Up,
    Down,
}

/// Role of a pin, decided once when widgets are built.
///
/// Replaces the original per-refresh name-substring heuristic with a
/// classification done a single time per pin identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinRole {
    /// Numeric GPIO, fully configurable.
    Gpio,
    /// Power rail (GND, VBUS, 3V3, VSYS).
    Power,
    /// Special function (EN, VREF, RUN).
    SpecialFunction,
    /// Fixed-function pin that matched no keyword.
    UnclassifiedFixed,
}

impl PinRole {
    /// Classify a pin from its identity and display name.
    ///
    /// GPIO identity wins; otherwise the name is matched against the
    /// power-rail and special-function keyword tables.
    pub fn classify(id: &PinId, name: &str) -> Self {
        if id.is_gpio() {
            return Self::Gpio;
        }
        if POWER_KEYWORDS.iter().any(|kw| name.contains(kw)) {
            return Self::Power;
        }
        if SPECIAL_KEYWORDS.iter().any(|kw| name.contains(kw)) {
            return Self::SpecialFunction;
        }
        Self::UnclassifiedFixed
    }
}

/// State of one pin within a snapshot.
///
/// Exactly one of the mode-specific field groups is semantically active;
/// the others may still be populated by the firmware and are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinState {
    pub id: PinId,
    pub name: String,
    pub mode: PinMode,
    /// Digital level, 0 or 1. Meaningful for `In` / `Out` only.
    pub value: Option<u8>,
    /// Pull resistor. Meaningful for `In` only.
    pub pull: Option<PullMode>,
    /// PWM frequency in Hz. Meaningful for `Pwm` only.
    pub pwm_freq_hz: Option<u32>,
    /// PWM duty cycle in percent. Meaningful for `Pwm` only.
    pub pwm_duty_pct: Option<f64>,
}

impl PinState {
    /// Returns `true` if this pin is currently a configurable PWM output.
    pub fn is_pwm(&self) -> bool {
        self.mode == PinMode::Pwm && self.id.is_gpio()
    }
}

impl From<PinRecord> for PinState {
    fn from(rec: PinRecord) -> Self {
        Self {
            id: PinId::from(rec.id),
            name: rec.name,
            mode: PinMode::from_wire(&rec.mode),
            value: rec.value,
            pull: rec.pull.as_deref().map(|p| p.parse().unwrap_or_default()),
            pwm_freq_hz: rec.pwm_freq,
            pwm_duty_pct: rec.pwm_duty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_classification() {
        let gnd = PinId::Fixed("GND".into());
        let en = PinId::Fixed("EN".into());
        let mystery = PinId::Fixed("AGND_SENSE?".into());
        assert_eq!(PinRole::classify(&PinId::Gpio(25), "GP25 (LED)"), PinRole::Gpio);
        assert_eq!(PinRole::classify(&gnd, "GND"), PinRole::Power);
        assert_eq!(PinRole::classify(&en, "EN"), PinRole::SpecialFunction);
        // "AGND_SENSE?" contains "GND" -> power by keyword table.
        assert_eq!(PinRole::classify(&mystery, "AGND_SENSE?"), PinRole::Power);
        let run = PinId::Fixed("X1".into());
        assert_eq!(
            PinRole::classify(&run, "X1"),
            PinRole::UnclassifiedFixed
        );
    }

    #[test]
    fn mode_round_trip_and_unknowns() {
        assert_eq!(PinMode::from_wire("IN"), PinMode::In);
        assert_eq!(PinMode::from_wire("PWM"), PinMode::Pwm);
        assert_eq!(PinMode::from_wire("GND"), PinMode::Fixed);
        assert_eq!(PinMode::Out.to_string(), "OUT");
    }

    #[test]
    fn wire_id_conversion() {
        assert_eq!(PinId::from(PinIdWire::Gpio(25)), PinId::Gpio(25));
        assert_eq!(
            PinId::from(PinIdWire::Name("VBUS".into())),
            PinId::Fixed("VBUS".into())
        );
        assert_eq!(PinId::from(PinIdWire::Gpio(-1)), PinId::Fixed("-1".into()));
    }
}
