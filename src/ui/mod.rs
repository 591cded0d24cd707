pub mod widgets;

use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const HELP: &str = "Tab: next | Enter: follow | ↑↓: scroll | Ctrl-U: clear | Esc: quit";

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    let positions: Vec<(usize, usize)> = app.widgets().iter().map(|w| w.position()).collect();
    let cells = grid_cells(chunks[0], &positions);

    for (index, (widget, area)) in app.widgets().iter().zip(cells).enumerate() {
        widget.render(frame, area, index == app.selected());
    }

    draw_status_bar(frame, chunks[1], app.status());
}

fn draw_status_bar(frame: &mut Frame, area: Rect, status: Option<&str>) {
    let line = match status {
        Some(message) if message.starts_with("Error") => Line::from(Span::styled(
            message,
            Style::default().fg(Color::Red),
        )),
        Some(message) => Line::from(Span::styled(message, Style::default().fg(Color::Green))),
        None => Line::from(Span::styled(HELP, Style::default().fg(Color::DarkGray))),
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Splits `area` into one cell per position: rows share the height evenly and
/// each row splits its width evenly between its own columns.
pub fn grid_cells(area: Rect, positions: &[(usize, usize)]) -> Vec<Rect> {
    let row_count = positions.iter().map(|(row, _)| row + 1).max().unwrap_or(1);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, row_count as u32); row_count])
        .split(area);

    positions
        .iter()
        .map(|&(row, col)| {
            let col_count = positions
                .iter()
                .filter(|(r, _)| *r == row)
                .map(|(_, c)| c + 1)
                .max()
                .unwrap_or(1);
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![Constraint::Ratio(1, col_count as u32); col_count])
                .split(rows[row]);
            cols[col]
        })
        .collect()
}
