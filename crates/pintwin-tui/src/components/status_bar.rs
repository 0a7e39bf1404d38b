//! Status header — connectivity indicator plus the board's status block.

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use ratatui::Frame;

use crate::reconcile::DashboardView;
use crate::theme;

pub fn render(frame: &mut Frame, area: Rect, view: &DashboardView) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_default());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let indicator = Span::styled(
        format!(" {} ", view.connectivity.fallback_label()),
        Style::default()
            .fg(theme::BG_DARK)
            .bg(theme::connectivity_color(view.connectivity))
            .add_modifier(Modifier::BOLD),
    );

    let mut spans = vec![indicator, Span::raw("  ")];

    if let Some(status) = &view.status {
        let led = match view.onboard_led {
            Some(led) if led.lit => Span::styled("\u{25CF} LED", Style::default().fg(theme::SIGNAL_GREEN)),
            Some(_) => Span::styled("\u{25CB} LED", Style::default().fg(theme::BORDER_GRAY)),
            None => Span::styled("? LED", Style::default().fg(theme::AMBER)),
        };

        spans.extend([
            Span::styled(status.time.clone(), Style::default().fg(theme::DIM_WHITE)),
            Span::raw("  "),
            Span::styled(
                format!("{:.1}\u{B0}C", status.temp_c),
                Style::default().fg(theme::AMBER),
            ),
            Span::raw("  "),
            Span::styled(
                status.ip.clone(),
                Style::default().fg(theme::severity_color(view.address_severity())),
            ),
            Span::raw("  "),
            Span::styled(
                format!("wifi:{}", status.wifi_ssid),
                Style::default().fg(theme::DIM_WHITE),
            ),
            Span::raw("  "),
            led,
            Span::raw("  "),
        ]);

        for (name, volts) in view.adc.channels() {
            spans.push(Span::styled(
                format!("{name}={volts:.2}V "),
                Style::default().fg(theme::BORDER_GRAY),
            ));
        }
    } else {
        spans.push(Span::styled(
            "waiting for first snapshot",
            Style::default().fg(theme::BORDER_GRAY),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}
