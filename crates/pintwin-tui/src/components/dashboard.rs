//! The single console screen: pin grid, PWM forms, radio panel, console.
//!
//! Owns the [`DashboardView`] and folds every data action into it. Key
//! handling is panel-scoped; Tab cycles panels and Esc backs out of
//! whatever is being edited.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc::UnboundedSender;
use tui_input::backend::crossterm::EventHandler;

use pintwin_core::{PinId, PinMode};

use crate::action::Action;
use crate::component::Component;
use crate::components::forms::{self, PwmField};
use crate::components::pin_grid::{self, EditTarget};
use crate::components::status_bar;
use crate::reconcile::{DashboardView, TextField};
use crate::theme;

/// Focusable panels in Tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Panel {
    #[default]
    PinGrid,
    Pwm,
    Wifi,
    Ble,
    Console,
}

impl Panel {
    const ALL: [Panel; 5] = [
        Self::PinGrid,
        Self::Pwm,
        Self::Wifi,
        Self::Ble,
        Self::Console,
    ];

    fn next(self) -> Self {
        let pos = Self::ALL.iter().position(|&p| p == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        let pos = Self::ALL.iter().position(|&p| p == self).unwrap_or(0);
        Self::ALL[(pos + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum WifiField {
    #[default]
    Ssid,
    Password,
}

pub struct Dashboard {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    view: DashboardView,
    panel: Panel,
    pin_selected: usize,
    pin_editing: Option<EditTarget>,
    pwm_selected: usize,
    pwm_field: PwmField,
    wifi_field: WifiField,
    console_input: TextField,
}

impl Dashboard {
    pub fn new() -> Self {
        let mut dashboard = Self {
            focused: true,
            action_tx: None,
            view: DashboardView::default(),
            panel: Panel::default(),
            pin_selected: 0,
            pin_editing: None,
            pwm_selected: 0,
            pwm_field: PwmField::default(),
            wifi_field: WifiField::default(),
            console_input: TextField::default(),
        };
        dashboard.apply_focus();
        dashboard
    }

    #[cfg(test)]
    fn view(&self) -> &DashboardView {
        &self.view
    }

    /// Re-derive every widget's focus flag from the panel state.
    ///
    /// Reconciliation consults these flags, so they must be correct
    /// before each snapshot is folded in.
    fn apply_focus(&mut self) {
        self.view.wifi_ssid_field.focused =
            self.panel == Panel::Wifi && self.wifi_field == WifiField::Ssid;
        self.view.wifi_password_field.focused =
            self.panel == Panel::Wifi && self.wifi_field == WifiField::Password;
        self.view.ble_name_field.focused = self.panel == Panel::Ble;
        self.console_input.focused = self.panel == Panel::Console;

        for (i, form) in self.view.pwm_forms.values_mut().enumerate() {
            let on_form = self.panel == Panel::Pwm && i == self.pwm_selected;
            form.freq_input.focused = on_form && self.pwm_field == PwmField::Freq;
            form.duty_input.focused = on_form && self.pwm_field == PwmField::Duty;
        }

        let editing = self.pin_editing;
        for (i, widget) in self.view.pins.values_mut().enumerate() {
            let on_row = self.panel == Panel::PinGrid && i == self.pin_selected;
            if let Some(select) = &mut widget.mode_select {
                select.focused = on_row && editing == Some(EditTarget::Mode);
            }
            if let Some(select) = &mut widget.pull_select {
                select.focused = on_row && editing == Some(EditTarget::Pull);
            }
        }
    }

    fn switch_panel(&mut self, panel: Panel) {
        self.panel = panel;
        self.pin_editing = None;
        self.apply_focus();
    }

    fn selected_pin_id(&self) -> Option<PinId> {
        self.view
            .pins
            .get_index(self.pin_selected)
            .map(|(id, _)| id.clone())
    }

    fn clamp_selections(&mut self) {
        if self.pin_selected >= self.view.pins.len() {
            self.pin_selected = self.view.pins.len().saturating_sub(1);
        }
        if self.pwm_selected >= self.view.pwm_forms.len() {
            self.pwm_selected = self.view.pwm_forms.len().saturating_sub(1);
        }
    }

    // ── Per-panel key handling ───────────────────────────────────────

    fn handle_pin_grid_key(&mut self, key: KeyEvent) -> Option<Action> {
        if let Some(target) = self.pin_editing {
            let widget = self.view.pins.get_index_mut(self.pin_selected)?.1;
            // The two selects carry different option types, so dispatch
            // on the target at each call site instead of binding one.
            match target {
                EditTarget::Mode => widget.mode_select.as_mut().map(|_| ()),
                EditTarget::Pull => widget.pull_select.as_mut().map(|_| ()),
            }?;

            match key.code {
                KeyCode::Left | KeyCode::Char('h') => match target {
                    EditTarget::Mode => widget.mode_select.as_mut()?.cycle_prev(),
                    EditTarget::Pull => widget.pull_select.as_mut()?.cycle_prev(),
                },
                KeyCode::Right | KeyCode::Char('l') => match target {
                    EditTarget::Mode => widget.mode_select.as_mut()?.cycle_next(),
                    EditTarget::Pull => widget.pull_select.as_mut()?.cycle_next(),
                },
                KeyCode::Esc => {
                    self.pin_editing = None;
                    self.apply_focus();
                }
                KeyCode::Enter => {
                    let id = widget.id.clone();
                    let action = match target {
                        EditTarget::Mode => {
                            let mode = widget.mode_select.as_ref()?.selected();
                            Action::SetPinMode(id, mode)
                        }
                        EditTarget::Pull => {
                            let pull = widget.pull_select.as_ref()?.selected();
                            Action::SetPinPull(id, pull)
                        }
                    };
                    self.pin_editing = None;
                    self.apply_focus();
                    return Some(action);
                }
                _ => {}
            }
            return None;
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.pin_selected = self.pin_selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.pin_selected + 1 < self.view.pins.len() {
                    self.pin_selected += 1;
                }
            }
            KeyCode::Char('t' | ' ') | KeyCode::Enter => {
                return self.selected_pin_id().map(Action::TogglePin);
            }
            KeyCode::Char('m') => {
                let widget = self.view.pins.get_index(self.pin_selected)?.1;
                if widget.mode_select.is_some() {
                    self.pin_editing = Some(EditTarget::Mode);
                    self.apply_focus();
                }
            }
            KeyCode::Char('u') => {
                let widget = self.view.pins.get_index(self.pin_selected)?.1;
                // Pull editing only applies to pins currently in input mode.
                if widget.pull_select.is_some() && widget.remote.mode == PinMode::In {
                    self.pin_editing = Some(EditTarget::Pull);
                    self.apply_focus();
                }
            }
            _ => {}
        }
        None
    }

    fn handle_pwm_key(&mut self, key: KeyEvent) -> Option<Action> {
        if self.view.pwm_forms.is_empty() {
            return None;
        }

        match key.code {
            KeyCode::Up => {
                self.pwm_selected = self.pwm_selected.saturating_sub(1);
                self.apply_focus();
                return None;
            }
            KeyCode::Down => {
                if self.pwm_selected + 1 < self.view.pwm_forms.len() {
                    self.pwm_selected += 1;
                }
                self.apply_focus();
                return None;
            }
            KeyCode::Left | KeyCode::Right => {
                self.pwm_field = match self.pwm_field {
                    PwmField::Freq => PwmField::Duty,
                    PwmField::Duty => PwmField::Freq,
                };
                self.apply_focus();
                return None;
            }
            _ => {}
        }

        let pin = self
            .view
            .pwm_forms
            .get_index(self.pwm_selected)
            .map(|(id, _)| id.clone())?;

        // Live duty nudges go through the debounced path.
        if let KeyCode::Char(c @ ('+' | '-')) = key.code {
            let form = self.view.pwm_forms.get_index_mut(self.pwm_selected)?.1;
            let freq_hz = form.effective_freq_hz()?;
            let current = form.effective_duty_pct().unwrap_or(0.0);
            let duty_pct = if c == '+' {
                (current + 5.0).min(100.0)
            } else {
                (current - 5.0).max(0.0)
            };
            form.duty_input.set(&format!("{duty_pct:.1}"));
            return Some(Action::SetPwmLive {
                pin,
                freq_hz,
                duty_pct,
            });
        }

        if key.code == KeyCode::Enter {
            let form = self.view.pwm_forms.get_index(self.pwm_selected)?.1;
            match (form.effective_freq_hz(), form.effective_duty_pct()) {
                (Some(freq_hz), Some(duty_pct)) => {
                    return Some(Action::SetPwm {
                        pin,
                        freq_hz,
                        duty_pct,
                    });
                }
                _ => {
                    return Some(Action::Diagnostic(
                        "[ERROR] PWM frequency and duty must be numeric".into(),
                    ));
                }
            }
        }

        let form = self.view.pwm_forms.get_index_mut(self.pwm_selected)?.1;
        let input = match self.pwm_field {
            PwmField::Freq => &mut form.freq_input,
            PwmField::Duty => &mut form.duty_input,
        };
        input
            .input_mut()
            .handle_event(&crossterm::event::Event::Key(key));
        None
    }

    fn handle_wifi_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Up | KeyCode::Down => {
                self.wifi_field = match self.wifi_field {
                    WifiField::Ssid => WifiField::Password,
                    WifiField::Password => WifiField::Ssid,
                };
                self.apply_focus();
                None
            }
            KeyCode::Enter => {
                let action = Action::SetWifi {
                    ssid: self.view.wifi_ssid_field.value().trim().to_string(),
                    password: self.view.wifi_password_field.value().to_string(),
                };
                self.view.wifi_password_field.clear();
                Some(action)
            }
            _ => {
                let field = match self.wifi_field {
                    WifiField::Ssid => &mut self.view.wifi_ssid_field,
                    WifiField::Password => &mut self.view.wifi_password_field,
                };
                field
                    .input_mut()
                    .handle_event(&crossterm::event::Event::Key(key));
                None
            }
        }
    }

    fn handle_ble_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.code == KeyCode::Enter {
            return Some(Action::SetBleName(
                self.view.ble_name_field.value().trim().to_string(),
            ));
        }
        self.view
            .ble_name_field
            .input_mut()
            .handle_event(&crossterm::event::Event::Key(key));
        None
    }

    fn handle_console_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.code == KeyCode::Enter {
            let text = self.console_input.value().trim().to_string();
            self.console_input.clear();
            if text.is_empty() {
                return None;
            }
            return Some(Action::ConsoleSubmit(text));
        }
        self.console_input
            .input_mut()
            .handle_event(&crossterm::event::Event::Key(key));
        None
    }

    // ── Rendering ────────────────────────────────────────────────────

    /// Key/description hint pairs for the focused panel.
    fn key_hints(&self) -> &'static [(&'static str, &'static str)] {
        match self.panel {
            Panel::PinGrid => {
                if self.pin_editing.is_some() {
                    &[
                        ("\u{25C2}/\u{25B8}", "select"),
                        ("Enter", "apply"),
                        ("Esc", "cancel"),
                    ]
                } else {
                    &[
                        ("j/k", "move"),
                        ("t", "toggle"),
                        ("m", "mode"),
                        ("u", "pull"),
                        ("Tab", "panel"),
                        ("^R", "refresh"),
                        ("^C", "quit"),
                    ]
                }
            }
            Panel::Pwm => &[
                ("\u{2191}/\u{2193}", "form"),
                ("\u{25C2}/\u{25B8}", "field"),
                ("+/-", "duty"),
                ("Enter", "apply"),
                ("Tab", "panel"),
            ],
            Panel::Wifi => &[
                ("\u{2191}/\u{2193}", "field"),
                ("Enter", "reconnect"),
                ("Tab", "panel"),
            ],
            Panel::Ble => &[
                ("Enter", "set name"),
                ("^B", "advertising on/off"),
                ("Tab", "panel"),
            ],
            Panel::Console => &[("Enter", "send"), ("Tab", "panel"), ("^C", "quit")],
        }
    }
}

impl Component for Dashboard {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        // Panel-independent bindings first.
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Tab) => {
                self.switch_panel(self.panel.next());
                return Ok(None);
            }
            (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                self.switch_panel(self.panel.prev());
                return Ok(None);
            }
            (KeyModifiers::CONTROL, KeyCode::Char('r')) => {
                return Ok(Some(Action::RefreshNow));
            }
            (KeyModifiers::CONTROL, KeyCode::Char('p')) => {
                return Ok(Some(Action::StartPolling));
            }
            (KeyModifiers::CONTROL, KeyCode::Char('b')) => {
                let advertising = self
                    .view
                    .status
                    .as_ref()
                    .is_some_and(|s| s.ble_status.to_lowercase().contains("advertis"));
                return Ok(Some(Action::SetBleAdvertising(!advertising)));
            }
            _ => {}
        }

        let action = match self.panel {
            Panel::PinGrid => self.handle_pin_grid_key(key),
            Panel::Pwm => self.handle_pwm_key(key),
            Panel::Wifi => self.handle_wifi_key(key),
            Panel::Ble => self.handle_ble_key(key),
            Panel::Console => self.handle_console_key(key),
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SnapshotUpdated(snapshot) => {
                self.view.reconcile(snapshot);
                self.clamp_selections();
                self.apply_focus();
            }
            Action::ConnectivityChanged(state) => {
                self.view.connectivity = *state;
            }
            Action::Diagnostic(line) => {
                let stamp = chrono::Local::now().format("%H:%M:%S");
                self.view.push_diagnostic(format!("{stamp} {line}"));
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let outer = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(area);

        status_bar::render(frame, outer[0], &self.view);

        let body = Layout::horizontal([Constraint::Percentage(58), Constraint::Percentage(42)])
            .split(outer[1]);

        pin_grid::render(
            frame,
            body[0],
            &self.view,
            self.pin_selected,
            self.pin_editing,
            self.panel == Panel::PinGrid,
        );

        let pwm_height = (self.view.pwm_forms.len() * 3 + 2).clamp(3, 14);
        #[allow(clippy::cast_possible_truncation)]
        let right = Layout::vertical([
            Constraint::Length(pwm_height as u16),
            Constraint::Length(7),
            Constraint::Min(5),
        ])
        .split(body[1]);

        forms::render_pwm_panel(
            frame,
            right[0],
            &self.view,
            self.pwm_selected,
            self.panel == Panel::Pwm,
        );
        forms::render_radio_panel(frame, right[1], &self.view, self.panel == Panel::Wifi || self.panel == Panel::Ble);
        forms::render_console_panel(
            frame,
            right[2],
            &self.view,
            &self.console_input,
            self.panel == Panel::Console,
        );

        let mut hints: Vec<Span> = Vec::new();
        for (i, (keys, what)) in self.key_hints().iter().enumerate() {
            if i > 0 {
                hints.push(Span::raw("  "));
            }
            hints.push(Span::styled(*keys, theme::key_hint_key()));
            hints.push(Span::styled(format!(" {what}"), theme::key_hint()));
        }
        frame.render_widget(
            Paragraph::new(Line::from(hints)).alignment(Alignment::Center),
            outer[2],
        );
    }

    fn focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &'static str {
        "dashboard"
    }
}
