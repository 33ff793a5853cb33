use chrono::{DateTime, Utc};
use labdeck_core::cell::CellDisplay;
use labdeck_sync::activity::RECENT_WINDOW_MS;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use std::time::Instant;

use crate::table::{fade_fraction, TableView, HIGHLIGHT_MS};
use crate::theme::{blend, theme, Theme};
use crate::App;

const MIN_COLUMN_WIDTH: u16 = 4;
const MAX_COLUMN_WIDTH: u16 = 28;

pub fn render(frame: &mut Frame, app: &App) {
    let theme = theme();
    let area = frame.size();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let now = Instant::now();
    let now_utc = Utc::now();
    frame.render_widget(render_header(app, theme), layout[0]);
    render_table(frame, app, theme, layout[1], now, now_utc);
    frame.render_widget(render_status(app, theme, now), layout[2]);
}

fn render_header(app: &App, theme: Theme) -> Paragraph<'static> {
    let (conn_label, conn_color) = if app.connected {
        ("online", theme.ok)
    } else {
        ("reconnecting…", theme.warn)
    };
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", app.config.title),
            Style::default()
                .fg(theme.title)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("visited: {} ", app.view.visited_count()),
            Style::default().fg(theme.text),
        ),
        Span::styled(conn_label, Style::default().fg(conn_color)),
    ]);
    Paragraph::new(line).style(Style::default().bg(theme.surface))
}

fn render_table(
    frame: &mut Frame,
    app: &App,
    theme: Theme,
    area: ratatui::layout::Rect,
    now: Instant,
    now_utc: DateTime<Utc>,
) {
    let view = &app.view;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));

    if view.columns().is_empty() {
        let placeholder = Paragraph::new(Line::from(Span::styled(
            "waiting for the first snapshot…",
            Style::default().fg(theme.muted),
        )))
        .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let mut rows = Vec::with_capacity(view.rows().len());
    for view_row in view.rows() {
        let mut cells = Vec::with_capacity(view.columns().len());
        for column in 0..view.columns().len() {
            let text = view_row
                .cells
                .get(column)
                .map(|cell| cell_text(&cell.display, now_utc))
                .unwrap_or_default();
            let mut style = Style::default().fg(theme.text);
            if let Some(fraction) = fade_fraction(view_row.cell_flash(column), now, HIGHLIGHT_MS)
            {
                style = style.bg(blend(theme.highlight, theme.bg, fraction));
            }
            cells.push(Cell::from(text).style(style));
        }
        rows.push(Row::new(cells));
    }

    let widths = column_widths(view, now_utc);
    let header = Row::new(
        view.columns()
            .iter()
            .map(|name| Cell::from(name.clone()))
            .collect::<Vec<_>>(),
    )
    .style(
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD),
    );
    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

fn render_status(app: &App, theme: Theme, now: Instant) -> Paragraph<'static> {
    let Some(status) = app.view.status() else {
        return Paragraph::new("");
    };
    // The message fades out over the recency window, like the highlight.
    let Some(fraction) = fade_fraction(Some(status.shown_at), now, RECENT_WINDOW_MS as u64)
    else {
        return Paragraph::new("");
    };
    let color = blend(theme.text, theme.bg, fraction);
    Paragraph::new(Line::from(Span::styled(
        format!(" {}", status.text),
        Style::default().fg(color),
    )))
}

fn column_widths(view: &TableView, now_utc: DateTime<Utc>) -> Vec<Constraint> {
    view.columns()
        .iter()
        .enumerate()
        .map(|(column, name)| {
            let content = view
                .rows()
                .iter()
                .filter_map(|row| row.cells.get(column))
                .map(|cell| cell_text(&cell.display, now_utc).chars().count())
                .max()
                .unwrap_or(0);
            let width = content.max(name.chars().count()) as u16;
            Constraint::Length(width.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH))
        })
        .collect()
}

fn cell_text(display: &CellDisplay, now_utc: DateTime<Utc>) -> String {
    match display {
        CellDisplay::Empty => String::new(),
        CellDisplay::Text(text) => text.clone(),
        CellDisplay::Elapsed(instant) => {
            format_elapsed((now_utc - *instant).num_seconds())
        }
    }
}

fn format_elapsed(seconds: i64) -> String {
    let seconds = seconds.max(0);
    if seconds < 60 {
        format!("{seconds}s ago")
    } else if seconds < 3_600 {
        format!("{}m ago", seconds / 60)
    } else {
        format!("{}h ago", seconds / 3_600)
    }
}
