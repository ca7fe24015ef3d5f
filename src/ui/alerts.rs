//! Alerts view rendering.
//!
//! Newest-first list of intrusion alerts with the selected entry's details
//! pretty-printed below.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::App;

/// Render the Alerts view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(8)])
        .split(area);

    let log = app.alerts().log();
    let block = Block::default()
        .title(format!(" Alerts ({}) ", log.len()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if log.is_empty() {
        let paragraph = Paragraph::new(" No alerts received")
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = log
        .iter()
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled("● ", Style::default().fg(app.theme.critical)),
                Span::raw(entry.display_line()),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(app.theme.selected);

    let mut state = ListState::default();
    state.select(Some(app.selected_alert_index.min(log.len() - 1)));
    frame.render_stateful_widget(list, chunks[0], &mut state);

    let details = log
        .iter()
        .nth(app.selected_alert_index)
        .map(|entry| {
            serde_json::to_string_pretty(&entry.details)
                .unwrap_or_else(|_| entry.details.to_string())
        })
        .unwrap_or_default();

    let detail_block = Block::default()
        .title(" Details ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    frame.render_widget(
        Paragraph::new(details)
            .wrap(Wrap { trim: false })
            .block(detail_block),
        chunks[1],
    );
}
