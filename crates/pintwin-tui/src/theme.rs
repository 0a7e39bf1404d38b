//! Harbor palette and semantic styling for the console.

use ratatui::style::{Color, Modifier, Style};

use pintwin_core::{ConnectivityState, PinRole};

use crate::reconcile::Severity;

// ── Core Palette ──────────────────────────────────────────────────────

pub const FOAM_CYAN: Color = Color::Rgb(131, 208, 218); // #83d0da
pub const AMBER: Color = Color::Rgb(250, 189, 47); // #fabd2f
pub const SIGNAL_GREEN: Color = Color::Rgb(152, 195, 121); // #98c379
pub const ALERT_RED: Color = Color::Rgb(224, 108, 117); // #e06c75
pub const VIOLET: Color = Color::Rgb(198, 160, 246); // #c6a0f6

// ── Extended Palette ──────────────────────────────────────────────────

pub const DIM_WHITE: Color = Color::Rgb(171, 178, 191); // #abb2bf
pub const BORDER_GRAY: Color = Color::Rgb(92, 99, 112); // #5c6370
pub const BG_HIGHLIGHT: Color = Color::Rgb(44, 49, 60); // #2c313c
pub const BG_DARK: Color = Color::Rgb(30, 34, 42); // #1e222a

// ── Semantic Styles ───────────────────────────────────────────────────

/// Title text for blocks/panels.
pub fn title_style() -> Style {
    Style::default().fg(FOAM_CYAN).add_modifier(Modifier::BOLD)
}

/// Border for a focused panel.
pub fn border_focused() -> Style {
    Style::default().fg(VIOLET)
}

/// Border for an unfocused panel.
pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Table header row.
pub fn table_header() -> Style {
    Style::default()
        .fg(FOAM_CYAN)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

/// Normal table row text.
pub fn table_row() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Selected / highlighted table row.
pub fn table_selected() -> Style {
    Style::default()
        .fg(VIOLET)
        .bg(BG_HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

/// Key hint text (e.g., "^C quit  Tab panel").
pub fn key_hint() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Key hint key character.
pub fn key_hint_key() -> Style {
    Style::default().fg(FOAM_CYAN).add_modifier(Modifier::BOLD)
}

/// Indicator color for a connectivity state.
pub fn connectivity_color(state: ConnectivityState) -> Color {
    match state {
        ConnectivityState::Connecting => AMBER,
        ConnectivityState::Connected => SIGNAL_GREEN,
        ConnectivityState::Offline | ConnectivityState::ApiError => ALERT_RED,
    }
}

/// Text color for a status readout with the given severity.
pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Normal => FOAM_CYAN,
        Severity::Warning => AMBER,
        Severity::Error => ALERT_RED,
    }
}

/// Badge color for a pin role.
pub fn role_color(role: PinRole) -> Color {
    match role {
        PinRole::Gpio => FOAM_CYAN,
        PinRole::Power => ALERT_RED,
        PinRole::SpecialFunction => AMBER,
        PinRole::UnclassifiedFixed => BORDER_GRAY,
    }
}
