//! Snapshot-to-view reconciliation.
//!
//! The [`DashboardView`] is the single view-model behind every panel.
//! Each accepted snapshot is folded into it in place: widgets for pins
//! that persist keep their ephemeral state (focus, open selects, typed
//! text), widgets for vanished pins are dropped, and fields the operator
//! is currently editing are never overwritten by remote data.
//!
//! Running the same snapshot through twice leaves the view unchanged, so
//! the render pass can redraw from it at any rate without flicker.

use indexmap::IndexMap;
use tracing::warn;
use tui_input::Input;

use pintwin_core::{
    AdcReadings, ConnectivityState, DeviceSnapshot, DeviceStatus, PinId, PinMode, PinRole,
    PinState, PullMode,
};

/// Board-side log lines shown in the activity pane.
pub const LOG_WINDOW: usize = 20;

/// The user LED wired to GPIO 25 on the board.
pub const ONBOARD_LED: PinId = PinId::Gpio(25);

/// Frequency placeholder when a PWM pin reports none yet.
pub const DEFAULT_PWM_FREQ_HZ: u32 = 1000;

// ── Severity ─────────────────────────────────────────────────────────

/// Styling tag carried by status readouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Normal,
    Warning,
    Error,
}

impl From<ConnectivityState> for Severity {
    fn from(state: ConnectivityState) -> Self {
        match state {
            ConnectivityState::Connected => Self::Normal,
            ConnectivityState::Connecting => Self::Warning,
            ConnectivityState::Offline | ConnectivityState::ApiError => Self::Error,
        }
    }
}

// ── Editable fields ──────────────────────────────────────────────────

/// A text input that remote data may pre-fill but never clobber.
#[derive(Debug, Clone, Default)]
pub struct TextField {
    input: Input,
    pub focused: bool,
}

// `tui_input::Input` does not implement `PartialEq`; compare its two
// fields (value, cursor) through their getters instead.
impl PartialEq for TextField {
    fn eq(&self, other: &Self) -> bool {
        self.input.value() == other.input.value()
            && self.input.cursor() == other.input.cursor()
            && self.focused == other.focused
    }
}

impl TextField {
    pub fn value(&self) -> &str {
        self.input.value()
    }

    /// Replace the text locally (user editing goes through `input_mut`).
    pub fn set(&mut self, value: &str) {
        self.input = Input::new(value.to_string());
    }

    /// Fold in the remote value. Skipped while the field has focus, and
    /// skipped when unchanged so the cursor position survives redraws.
    pub fn sync_remote(&mut self, value: &str) {
        if self.focused || self.input.value() == value {
            return;
        }
        self.input = Input::new(value.to_string());
    }

    pub fn clear(&mut self) {
        self.input.reset();
    }

    pub fn input_mut(&mut self) -> &mut Input {
        &mut self.input
    }
}

/// A cyclable option list that remote data may move but never clobber
/// while the operator is on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select<T> {
    pub options: Vec<T>,
    pub index: usize,
    pub focused: bool,
}

impl<T: PartialEq + Copy> Select<T> {
    pub fn new(options: Vec<T>, current: T) -> Self {
        let index = options.iter().position(|&o| o == current).unwrap_or(0);
        Self {
            options,
            index,
            focused: false,
        }
    }

    pub fn selected(&self) -> T {
        self.options[self.index.min(self.options.len() - 1)]
    }

    /// Fold in the remote value unless the select has focus.
    pub fn sync_remote(&mut self, value: T) {
        if self.focused {
            return;
        }
        if let Some(i) = self.options.iter().position(|&o| o == value) {
            self.index = i;
        }
    }

    pub fn cycle_next(&mut self) {
        self.index = (self.index + 1) % self.options.len();
    }

    pub fn cycle_prev(&mut self) {
        self.index = (self.index + self.options.len() - 1) % self.options.len();
    }
}

// ── Pin widgets ──────────────────────────────────────────────────────

/// One row in the pin grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PinWidget {
    pub id: PinId,
    pub name: String,
    pub role: PinRole,
    /// Mode selector; absent for fixed-function pins.
    pub mode_select: Option<Select<PinMode>>,
    /// Pull selector; absent for fixed-function pins.
    pub pull_select: Option<Select<PullMode>>,
    /// Last remote state for this pin.
    pub remote: PinState,
    /// Display string for the value cell.
    pub readout: String,
    /// Toggle button label, naming the state the press would produce.
    pub toggle_label: Option<&'static str>,
}

const MODE_OPTIONS: [PinMode; 4] = [PinMode::In, PinMode::Out, PinMode::Adc, PinMode::Pwm];
const PULL_OPTIONS: [PullMode; 3] = [PullMode::None, PullMode::Up, PullMode::Down];

impl PinWidget {
    fn new(pin: &PinState) -> Self {
        let role = PinRole::classify(&pin.id, &pin.name);
        let (mode_select, pull_select) = if role == PinRole::Gpio {
            (
                Some(Select::new(MODE_OPTIONS.to_vec(), pin.mode)),
                Some(Select::new(
                    PULL_OPTIONS.to_vec(),
                    pin.pull.unwrap_or_default(),
                )),
            )
        } else {
            (None, None)
        };

        let mut widget = Self {
            id: pin.id.clone(),
            name: pin.name.clone(),
            role,
            mode_select,
            pull_select,
            remote: pin.clone(),
            readout: String::new(),
            toggle_label: None,
        };
        widget.apply(pin);
        widget
    }

    /// Fold a new remote state into this widget.
    fn apply(&mut self, pin: &PinState) {
        self.name.clone_from(&pin.name);
        if let Some(select) = &mut self.mode_select {
            select.sync_remote(pin.mode);
        }
        if let Some(select) = &mut self.pull_select {
            select.sync_remote(pin.pull.unwrap_or_default());
        }
        self.readout = Self::format_readout(pin);
        self.toggle_label = match (pin.mode, pin.value) {
            (PinMode::Out, Some(1)) => Some("Set LOW"),
            (PinMode::Out, _) => Some("Set HIGH"),
            _ => None,
        };
        self.remote = pin.clone();
    }

    fn format_readout(pin: &PinState) -> String {
        match pin.mode {
            PinMode::In | PinMode::Out => match pin.value {
                Some(1) => "HIGH".into(),
                Some(_) => "LOW".into(),
                None => "-".into(),
            },
            PinMode::Pwm => {
                let freq = pin.pwm_freq_hz.unwrap_or(DEFAULT_PWM_FREQ_HZ);
                let duty = pin.pwm_duty_pct.unwrap_or(0.0);
                format!("{freq} Hz @ {duty:.1}%")
            }
            PinMode::Adc => "analog".into(),
            // Short rail/function name, e.g. "GND" from "GND (Pin 3)".
            PinMode::Fixed => pin
                .name
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_owned(),
        }
    }
}

// ── PWM forms ────────────────────────────────────────────────────────

/// Frequency/duty entry form for one PWM-mode pin.
#[derive(Debug, Clone, PartialEq)]
pub struct PwmForm {
    pub pin: PinId,
    pub freq_input: TextField,
    pub duty_input: TextField,
    pub remote_freq_hz: Option<u32>,
    pub remote_duty_pct: Option<f64>,
}

impl PwmForm {
    fn new(pin: &PinState) -> Self {
        Self {
            pin: pin.id.clone(),
            freq_input: TextField::default(),
            duty_input: TextField::default(),
            remote_freq_hz: pin.pwm_freq_hz,
            remote_duty_pct: pin.pwm_duty_pct,
        }
    }

    /// Placeholder shown when the frequency input is empty.
    pub fn freq_placeholder(&self) -> String {
        self.remote_freq_hz.unwrap_or(DEFAULT_PWM_FREQ_HZ).to_string()
    }

    /// Placeholder shown when the duty input is empty.
    pub fn duty_placeholder(&self) -> String {
        format!("{:.1}", self.remote_duty_pct.unwrap_or(0.0))
    }

    /// Effective frequency: typed value, else the remote/placeholder one.
    pub fn effective_freq_hz(&self) -> Option<u32> {
        let typed = self.freq_input.value().trim();
        if typed.is_empty() {
            return Some(self.remote_freq_hz.unwrap_or(DEFAULT_PWM_FREQ_HZ));
        }
        typed.parse().ok()
    }

    /// Effective duty: typed value, else the remote/placeholder one.
    pub fn effective_duty_pct(&self) -> Option<f64> {
        let typed = self.duty_input.value().trim();
        if typed.is_empty() {
            return Some(self.remote_duty_pct.unwrap_or(0.0));
        }
        typed.parse().ok()
    }
}

// ── Onboard LED ──────────────────────────────────────────────────────

/// State of the user LED, looked up from the snapshot by its fixed GPIO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnboardLed {
    pub mode: PinMode,
    pub lit: bool,
}

// ── Dashboard view ───────────────────────────────────────────────────

/// The complete reconciled view-model.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub connectivity: ConnectivityState,
    /// Display copy of the board's status block, `None` before first poll.
    pub status: Option<DeviceStatus>,
    pub adc: AdcReadings,
    pub wifi_ssid_field: TextField,
    /// Never pre-filled from remote data.
    pub wifi_password_field: TextField,
    pub ble_name_field: TextField,
    pub pins: IndexMap<PinId, PinWidget>,
    pub pwm_forms: IndexMap<PinId, PwmForm>,
    pub activity_log: Vec<String>,
    pub onboard_led: Option<OnboardLed>,
}

impl Default for DashboardView {
    fn default() -> Self {
        Self {
            connectivity: ConnectivityState::default(),
            status: None,
            adc: AdcReadings::default(),
            wifi_ssid_field: TextField::default(),
            wifi_password_field: TextField::default(),
            ble_name_field: TextField::default(),
            pins: IndexMap::new(),
            pwm_forms: IndexMap::new(),
            activity_log: Vec::new(),
            onboard_led: None,
        }
    }
}

impl DashboardView {
    /// Fold one accepted snapshot into the view.
    pub fn reconcile(&mut self, snapshot: &DeviceSnapshot) {
        self.wifi_ssid_field.sync_remote(&snapshot.status.wifi_ssid);
        self.ble_name_field.sync_remote(&snapshot.status.ble_name);
        self.status = Some(snapshot.status.clone());
        self.adc = snapshot.adc;

        self.reconcile_pins(snapshot);
        self.reconcile_pwm_forms(snapshot);
        self.reconcile_onboard(snapshot);

        // Already windowed server-side; clamp anyway.
        let skip = snapshot.activity_log.len().saturating_sub(LOG_WINDOW);
        self.activity_log = snapshot.activity_log[skip..].to_vec();
    }

    /// Rebuild the pin map in snapshot order, carrying surviving widgets
    /// over so their selects keep focus and position.
    fn reconcile_pins(&mut self, snapshot: &DeviceSnapshot) {
        let mut next = IndexMap::with_capacity(snapshot.pins.len());
        for pin in &snapshot.pins {
            // Duplicate identities collapse onto one widget, last wins.
            let mut widget = self
                .pins
                .shift_remove(&pin.id)
                .or_else(|| next.shift_remove(&pin.id))
                .unwrap_or_else(|| PinWidget::new(pin));
            widget.apply(pin);
            next.insert(pin.id.clone(), widget);
        }
        self.pins = next;
    }

    /// Keep the PWM form list in step with the set of PWM-mode pins.
    ///
    /// Same set: update placeholders only, typed text stays. Different
    /// set: rebuild, reusing forms for pins present in both.
    fn reconcile_pwm_forms(&mut self, snapshot: &DeviceSnapshot) {
        let pwm_pins: Vec<&PinState> = snapshot.pins.iter().filter(|p| p.is_pwm()).collect();

        let same_set = pwm_pins.len() == self.pwm_forms.len()
            && pwm_pins.iter().all(|p| self.pwm_forms.contains_key(&p.id));

        if same_set {
            for pin in pwm_pins {
                if let Some(form) = self.pwm_forms.get_mut(&pin.id) {
                    form.remote_freq_hz = pin.pwm_freq_hz;
                    form.remote_duty_pct = pin.pwm_duty_pct;
                }
            }
            return;
        }

        let mut next = IndexMap::with_capacity(pwm_pins.len());
        for pin in pwm_pins {
            let mut form = self
                .pwm_forms
                .shift_remove(&pin.id)
                .unwrap_or_else(|| PwmForm::new(pin));
            form.remote_freq_hz = pin.pwm_freq_hz;
            form.remote_duty_pct = pin.pwm_duty_pct;
            next.insert(pin.id.clone(), form);
        }
        self.pwm_forms = next;
    }

    /// The user LED is addressed by its known GPIO, never inferred from
    /// grid position or name.
    fn reconcile_onboard(&mut self, snapshot: &DeviceSnapshot) {
        self.onboard_led = match snapshot.pin(&ONBOARD_LED) {
            Some(pin) => Some(OnboardLed {
                mode: pin.mode,
                lit: pin.value == Some(1),
            }),
            None => {
                warn!(pin = %ONBOARD_LED, "user LED pin missing from snapshot");
                None
            }
        };
    }

    /// Severity for the network-address readout. It doubles as the
    /// reachability field, so it inherits the connectivity severity.
    pub fn address_severity(&self) -> Severity {
        Severity::from(self.connectivity)
    }

    /// Record a diagnostics line locally, trimming to the window.
    pub fn push_diagnostic(&mut self, line: String) {
        self.activity_log.push(line);
        let skip = self.activity_log.len().saturating_sub(LOG_WINDOW);
        if skip > 0 {
            self.activity_log.drain(..skip);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    fn gpio(id: u8, mode: PinMode, value: Option<u8>) -> PinState {
        PinState {
            id: PinId::Gpio(id),
            name: format!("GP{id}"),
            mode,
            value,
            pull: Some(PullMode::None),
            pwm_freq_hz: None,
            pwm_duty_pct: None,
        }
    }

    fn pwm(id: u8, freq: u32, duty: f64) -> PinState {
        PinState {
            pwm_freq_hz: Some(freq),
            pwm_duty_pct: Some(duty),
            ..gpio(id, PinMode::Pwm, None)
        }
    }

    fn snapshot(pins: Vec<PinState>) -> DeviceSnapshot {
        DeviceSnapshot {
            status: DeviceStatus {
                time: "10:00:00".into(),
                temp_c: 22.0,
                ip: "192.168.4.1".into(),
                ble_status: "Idle".into(),
                ble_name: "pico-console".into(),
                wifi_ssid: "lab-net".into(),
            },
            adc: AdcReadings::default(),
            pins,
            activity_log: vec!["[BOOT] console up".into()],
        }
    }

    #[test]
    fn reconcile_is_idempotent() {
        let snap = snapshot(vec![
            gpio(5, PinMode::Out, Some(1)),
            gpio(6, PinMode::In, Some(0)),
            pwm(2, 1000, 50.0),
        ]);

        let mut view = DashboardView::default();
        view.reconcile(&snap);
        let first = view.clone();
        view.reconcile(&snap);

        assert_eq!(view, first);
    }

    #[test]
    fn focused_text_field_is_not_clobbered() {
        let snap = snapshot(vec![gpio(5, PinMode::Out, Some(1))]);
        let mut view = DashboardView::default();
        view.reconcile(&snap);
        assert_eq!(view.wifi_ssid_field.value(), "lab-net");

        view.wifi_ssid_field.focused = true;
        view.wifi_ssid_field.set("my-new-net");
        view.reconcile(&snap);
        assert_eq!(view.wifi_ssid_field.value(), "my-new-net");

        // Blur without edits: next snapshot wins again.
        view.wifi_ssid_field.focused = false;
        view.reconcile(&snap);
        assert_eq!(view.wifi_ssid_field.value(), "lab-net");
    }

    #[test]
    fn focused_mode_select_keeps_user_position() {
        let snap = snapshot(vec![gpio(5, PinMode::In, Some(0))]);
        let mut view = DashboardView::default();
        view.reconcile(&snap);

        let select = view
            .pins
            .get_mut(&PinId::Gpio(5))
            .unwrap()
            .mode_select
            .as_mut()
            .unwrap();
        select.focused = true;
        select.cycle_next();
        let user_choice = select.selected();
        assert_ne!(user_choice, PinMode::In);

        view.reconcile(&snap);
        let select = view
            .pins
            .get(&PinId::Gpio(5))
            .unwrap()
            .mode_select
            .as_ref()
            .unwrap();
        assert_eq!(select.selected(), user_choice);
    }

    #[test]
    fn toggle_label_names_target_state() {
        let snap = snapshot(vec![
            gpio(5, PinMode::Out, Some(1)),
            gpio(6, PinMode::Out, Some(0)),
            gpio(7, PinMode::In, Some(1)),
        ]);
        let mut view = DashboardView::default();
        view.reconcile(&snap);

        assert_eq!(view.pins[&PinId::Gpio(5)].toggle_label, Some("Set LOW"));
        assert_eq!(view.pins[&PinId::Gpio(6)].toggle_label, Some("Set HIGH"));
        assert_eq!(view.pins[&PinId::Gpio(7)].toggle_label, None);
    }

    #[test]
    fn unchanged_pwm_set_preserves_typed_text() {
        let mut view = DashboardView::default();
        view.reconcile(&snapshot(vec![pwm(2, 1000, 50.0), pwm(3, 500, 25.0)]));
        assert_eq!(view.pwm_forms.len(), 2);

        view.pwm_forms
            .get_mut(&PinId::Gpio(2))
            .unwrap()
            .duty_input
            .set("75.5");

        // Same {2, 3} set, new duty reported for pin 3.
        view.reconcile(&snapshot(vec![pwm(2, 1000, 50.0), pwm(3, 500, 30.0)]));

        let form2 = &view.pwm_forms[&PinId::Gpio(2)];
        assert_eq!(form2.duty_input.value(), "75.5");
        let form3 = &view.pwm_forms[&PinId::Gpio(3)];
        assert_eq!(form3.remote_duty_pct, Some(30.0));
    }

    #[test]
    fn changed_pwm_set_rebuilds_forms() {
        let mut view = DashboardView::default();
        view.reconcile(&snapshot(vec![pwm(2, 1000, 50.0), pwm(3, 500, 25.0)]));

        view.reconcile(&snapshot(vec![pwm(2, 1000, 50.0), pwm(4, 200, 10.0)]));

        let ids: Vec<&PinId> = view.pwm_forms.keys().collect();
        assert_eq!(ids, vec![&PinId::Gpio(2), &PinId::Gpio(4)]);
    }

    #[test]
    fn pwm_form_placeholders_fall_back_to_defaults() {
        let pin = PinState {
            pwm_freq_hz: None,
            pwm_duty_pct: None,
            ..gpio(2, PinMode::Pwm, None)
        };
        let mut view = DashboardView::default();
        view.reconcile(&snapshot(vec![pin]));

        let form = &view.pwm_forms[&PinId::Gpio(2)];
        assert_eq!(form.freq_placeholder(), "1000");
        assert_eq!(form.duty_placeholder(), "0.0");
        assert_eq!(form.effective_freq_hz(), Some(1000));
    }

    #[test]
    fn vanished_pins_are_dropped() {
        let mut view = DashboardView::default();
        view.reconcile(&snapshot(vec![
            gpio(5, PinMode::Out, Some(1)),
            gpio(6, PinMode::In, Some(0)),
        ]));
        assert_eq!(view.pins.len(), 2);

        view.reconcile(&snapshot(vec![gpio(6, PinMode::In, Some(0))]));
        assert_eq!(view.pins.len(), 1);
        assert!(view.pins.contains_key(&PinId::Gpio(6)));
    }

    #[test]
    fn onboard_led_is_looked_up_by_gpio() {
        let mut view = DashboardView::default();
        view.reconcile(&snapshot(vec![gpio(25, PinMode::Out, Some(1))]));
        assert_eq!(
            view.onboard_led,
            Some(OnboardLed {
                mode: PinMode::Out,
                lit: true
            })
        );

        view.reconcile(&snapshot(vec![gpio(5, PinMode::Out, Some(1))]));
        assert_eq!(view.onboard_led, None);
    }

    #[test]
    fn activity_log_is_windowed() {
        let mut snap = snapshot(vec![]);
        snap.activity_log = (0..30).map(|i| format!("line {i}")).collect();

        let mut view = DashboardView::default();
        view.reconcile(&snap);

        assert_eq!(view.activity_log.len(), LOG_WINDOW);
        assert_eq!(view.activity_log[0], "line 10");
        assert_eq!(view.activity_log[LOG_WINDOW - 1], "line 29");
    }

    #[test]
    fn diagnostics_share_the_log_window() {
        let mut view = DashboardView::default();
        for i in 0..25 {
            view.push_diagnostic(format!("diag {i}"));
        }
        assert_eq!(view.activity_log.len(), LOG_WINDOW);
        assert_eq!(view.activity_log[0], "diag 5");
    }

    #[test]
    fn address_severity_tracks_connectivity() {
        let mut view = DashboardView::default();
        view.connectivity = ConnectivityState::Connected;
        assert_eq!(view.address_severity(), Severity::Normal);
        view.connectivity = ConnectivityState::Connecting;
        assert_eq!(view.address_severity(), Severity::Warning);
        view.connectivity = ConnectivityState::Offline;
        assert_eq!(view.address_severity(), Severity::Error);
        view.connectivity = ConnectivityState::ApiError;
        assert_eq!(view.address_severity(), Severity::Error);
    }

    #[test]
    fn fixed_pins_get_no_controls() {
        let rail = PinState {
            id: PinId::Fixed("GND".into()),
            name: "GND".into(),
            mode: PinMode::Fixed,
            value: None,
            pull: None,
            pwm_freq_hz: None,
            pwm_duty_pct: None,
        };
        let mut view = DashboardView::default();
        view.reconcile(&snapshot(vec![rail]));

        let widget = &view.pins[&PinId::Fixed("GND".into())];
        assert_eq!(widget.role, PinRole::Power);
        assert!(widget.mode_select.is_none());
        assert!(widget.pull_select.is_none());
        assert_eq!(widget.toggle_label, None);
    }
}
