//! Form panels — PWM entry, radio/network credentials, console input.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, List, ListItem, Paragraph};
use ratatui::Frame;

use crate::reconcile::{DashboardView, TextField};
use crate::theme;

/// Which PWM subfield is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PwmField {
    #[default]
    Freq,
    Duty,
}

fn panel_block(title: &str, focused: bool) -> Block<'_> {
    let border = if focused {
        theme::border_focused()
    } else {
        theme::border_default()
    };
    Block::default()
        .title(Span::styled(format!(" {title} "), theme::title_style()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border)
}

/// One-line labelled input. Shows a block cursor when active and falls
/// back to a dimmed placeholder when empty.
fn input_line<'a>(
    label: &'a str,
    field: &'a TextField,
    placeholder: &str,
    masked: bool,
) -> Line<'a> {
    let label_style = if field.focused {
        Style::default().fg(theme::FOAM_CYAN)
    } else {
        Style::default().fg(theme::DIM_WHITE)
    };

    let mut spans = vec![Span::styled(format!("{label:<10}"), label_style)];

    let value = field.value();
    if value.is_empty() && !field.focused {
        spans.push(Span::styled(
            placeholder.to_string(),
            Style::default().fg(theme::BORDER_GRAY),
        ));
    } else {
        let display = if masked {
            "\u{25CF}".repeat(value.chars().count())
        } else {
            value.to_string()
        };
        spans.push(Span::styled(display, Style::default().fg(theme::FOAM_CYAN)));
    }

    if field.focused {
        spans.push(Span::styled("\u{2588}", Style::default().fg(theme::VIOLET)));
    }

    Line::from(spans)
}

/// Render the PWM panel: one freq/duty form per PWM-mode pin.
pub fn render_pwm_panel(
    frame: &mut Frame,
    area: Rect,
    view: &DashboardView,
    selected: usize,
    focused: bool,
) {
    let block = panel_block("PWM", focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if view.pwm_forms.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "no pins in PWM mode",
                Style::default().fg(theme::BORDER_GRAY),
            )),
            inner,
        );
        return;
    }

    let mut lines = Vec::new();
    for (i, (id, form)) in view.pwm_forms.iter().enumerate() {
        let marker = if focused && i == selected { "\u{25B8} " } else { "  " };
        lines.push(Line::from(Span::styled(
            format!("{marker}GP{id}"),
            if focused && i == selected {
                theme::table_selected()
            } else {
                theme::table_row()
            },
        )));
        lines.push(input_line(
            "   Hz",
            &form.freq_input,
            &form.freq_placeholder(),
            false,
        ));
        lines.push(input_line(
            "   Duty %",
            &form.duty_input,
            &form.duty_placeholder(),
            false,
        ));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render the radio/network panel: Wi-Fi credentials and BLE controls.
pub fn render_radio_panel(frame: &mut Frame, area: Rect, view: &DashboardView, focused: bool) {
    let block = panel_block("Radio", focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let ble_status = view
        .status
        .as_ref()
        .map_or("-", |s| s.ble_status.as_str());

    let lines = vec![
        input_line("SSID", &view.wifi_ssid_field, "network name", false),
        input_line("Password", &view.wifi_password_field, "(unchanged)", true),
        Line::default(),
        input_line("BLE name", &view.ble_name_field, "advertising name", false),
        Line::from(vec![
            Span::styled("BLE       ", Style::default().fg(theme::DIM_WHITE)),
            Span::styled(
                ble_status.to_string(),
                Style::default().fg(theme::AMBER),
            ),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render the console panel: command input above the activity log.
pub fn render_console_panel(
    frame: &mut Frame,
    area: Rect,
    view: &DashboardView,
    input: &TextField,
    focused: bool,
) {
    let block = panel_block("Console", focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::vertical([Constraint::Length(1), Constraint::Min(1)]).split(inner);

    frame.render_widget(
        Paragraph::new(input_line("> ", input, "command", false)),
        chunks[0],
    );

    // Most-recent-last; show the tail that fits.
    let visible = usize::from(chunks[1].height);
    let skip = view.activity_log.len().saturating_sub(visible);
    let items: Vec<ListItem> = view.activity_log[skip..]
        .iter()
        .map(|line| {
            let style = if line.contains("[ERROR]") {
                Style::default().fg(theme::ALERT_RED)
            } else {
                Style::default().fg(theme::DIM_WHITE)
            };
            ListItem::new(Span::styled(line.clone(), style))
        })
        .collect();
    frame.render_widget(List::new(items), chunks[1]);
}
