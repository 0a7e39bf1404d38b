//! Pin grid panel — one row per reported pin, selects rendered inline.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Row, Table};
use ratatui::Frame;

use pintwin_core::{PinMode, PinRole};

use crate::reconcile::{DashboardView, PinWidget, Select};
use crate::theme;

/// Which inline select of the highlighted row is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Mode,
    Pull,
}

fn role_badge(role: PinRole) -> &'static str {
    match role {
        PinRole::Gpio => "gpio",
        PinRole::Power => "pwr",
        PinRole::SpecialFunction => "sys",
        PinRole::UnclassifiedFixed => "-",
    }
}

fn select_cell(current: &str, active: bool) -> Cell<'static> {
    if active {
        Cell::from(Line::from(vec![
            Span::styled("\u{25C2}", Style::default().fg(theme::VIOLET)),
            Span::styled(format!("{current:^6}"), theme::table_selected()),
            Span::styled("\u{25B8}", Style::default().fg(theme::VIOLET)),
        ]))
    } else {
        Cell::from(current.to_string())
    }
}

fn widget_row<'a>(
    widget: &'a PinWidget,
    is_selected: bool,
    editing: Option<EditTarget>,
) -> Row<'a> {
    let mode = widget
        .mode_select
        .as_ref()
        .map_or(PinMode::Fixed, Select::selected);
    let mode_cell = match &widget.mode_select {
        Some(_) => select_cell(
            &mode.to_string(),
            is_selected && editing == Some(EditTarget::Mode),
        ),
        None => Cell::from(""),
    };
    // Pull resistors only apply to inputs; hide the cell otherwise.
    let pull_cell = match &widget.pull_select {
        Some(select) if widget.remote.mode == PinMode::In => select_cell(
            &select.selected().to_string(),
            is_selected && editing == Some(EditTarget::Pull),
        ),
        _ => Cell::from(""),
    };

    let row = Row::new(vec![
        Cell::from(Span::styled(
            widget.name.clone(),
            Style::default().fg(theme::role_color(widget.role)),
        )),
        Cell::from(role_badge(widget.role)),
        mode_cell,
        pull_cell,
        Cell::from(widget.readout.clone()),
        Cell::from(widget.toggle_label.unwrap_or("")),
    ]);

    if is_selected {
        row.style(theme::table_selected())
    } else {
        row.style(theme::table_row())
    }
}

/// Render the pin grid.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    view: &DashboardView,
    selected: usize,
    editing: Option<EditTarget>,
    focused: bool,
) {
    let border = if focused {
        theme::border_focused()
    } else {
        theme::border_default()
    };
    let block = Block::default()
        .title(Span::styled(" Pins ", theme::title_style()))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border);

    let rows: Vec<Row> = view
        .pins
        .values()
        .enumerate()
        .map(|(i, widget)| widget_row(widget, focused && i == selected, editing))
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(5),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(16),
            Constraint::Min(8),
        ],
    )
    .header(
        Row::new(vec!["Pin", "Role", "Mode", "Pull", "Value", "Action"])
            .style(theme::table_header()),
    )
    .block(block);

    frame.render_widget(table, area);
}
