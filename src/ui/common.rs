//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, help overlay
//! and the line chart used by both the Live and History views.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Tabs},
    Frame,
};

use farmwatch_types::MetricId;

use crate::app::{App, View};
use crate::sink::Chart as ChartData;
use crate::source::ChannelState;

/// Render the header bar with the backend and the state of the current tab.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(" FARMWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::raw(app.source_description().to_string()),
        Span::raw(" │ "),
    ];

    match app.current_view {
        View::Live => {
            for metric in app.live_selection() {
                let state = app
                    .live()
                    .channel_state(metric)
                    .unwrap_or(ChannelState::Closed);
                spans.push(Span::styled("● ", app.theme.channel_style(state)));
                spans.push(Span::raw(format!("{} ", metric.as_str())));
            }
        }
        View::History => {
            let query = &app.history_query;
            let range = query
                .range
                .map(|r| r.to_string())
                .unwrap_or_else(|| "default range".to_string());
            let pages = app
                .history_total_pages()
                .map(|total| format!("/{}", total))
                .unwrap_or_default();
            spans.push(Span::raw(format!(
                "{} │ page {}{} │ size {} │ {}",
                range,
                query.page + 1,
                pages,
                query.size,
                query.sort
            )));
            if app.history().is_loading() {
                spans.push(Span::styled(
                    " │ loading…",
                    Style::default().fg(app.theme.warning),
                ));
            }
        }
        View::Alerts => {
            let state = app.alerts().state();
            spans.push(Span::styled("● ", app.theme.channel_style(state)));
            spans.push(Span::raw(format!(
                "alert stream {} │ {} alerts",
                state.label(),
                app.alerts().log().len()
            )));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = View::ALL
        .iter()
        .map(|view| Line::from(format!(" {} ", view.label())))
        .collect();

    let selected = View::ALL
        .iter()
        .position(|view| *view == app.current_view)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows the latest error of the current tab and the available controls.
/// Temporary status messages take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let error = match app.current_view {
        View::Live => app
            .live_selection()
            .into_iter()
            .find_map(|m| app.live().last_error(m).map(|e| format!("{}: {}", m, e))),
        View::History => MetricId::ALL
            .into_iter()
            .find_map(|m| app.history().last_error(m).map(|e| format!("{}: {}", m, e))),
        View::Alerts => app.alerts().last_error().map(str::to_string),
    };

    let controls = match app.current_view {
        View::Live => "1/2/3:toggle metric r:reconnect Tab:switch ?:help q:quit",
        View::History => "n/p:page s:sort r:reload Tab:switch ?:help q:quit",
        View::Alerts => "↑↓:scroll r:reopen Tab:switch ?:help q:quit",
    };

    let (text, style) = match error {
        Some(err) => (
            format!(" Error: {} | {}", err, controls),
            Style::default().fg(app.theme.critical),
        ),
        None => (
            format!(" {} | {}", app.current_view.label(), controls),
            Style::default().add_modifier(Modifier::DIM),
        ),
    };

    frame.render_widget(Paragraph::new(text).style(style), area);
}

/// Split `area` into one equal-height row per chart.
pub fn chart_rows(area: Rect, count: usize) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }
    let constraints = vec![Constraint::Ratio(1, count as u32); count];
    Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area)
        .to_vec()
}

/// Render one metric's line chart, or a placeholder while it has no data.
pub fn render_chart(
    frame: &mut Frame,
    app: &App,
    metric: MetricId,
    chart: Option<&ChartData>,
    area: Rect,
) {
    let color = app.theme.metric_color(metric);
    let title = match chart.and_then(|c| c.last_value) {
        Some(value) => format!(" {} │ {:.1} ", metric.label(), value),
        None => format!(" {} ", metric.label()),
    };

    let block = Block::default()
        .title(Span::styled(title, Style::default().fg(color)))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let Some(chart) = chart.filter(|c| !c.is_empty()) else {
        let paragraph = Paragraph::new(" Waiting for data...")
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&chart.points);

    let y_labels = [
        format!("{:.1}", chart.y_bounds[0]),
        format!("{:.1}", (chart.y_bounds[0] + chart.y_bounds[1]) / 2.0),
        format!("{:.1}", chart.y_bounds[1]),
    ];

    let widget = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.border))
                .bounds(chart.x_bounds)
                .labels(chart.x_labels.clone()),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.border))
                .bounds(chart.y_bounds)
                .labels(y_labels),
        );

    frame.render_widget(widget, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Navigation",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  ←/→ Tab     Switch views"),
        Line::from("  ↑/↓ j/k     Scroll alerts"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Live",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  1/2/3     Toggle temperature/humidity/soil"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " History",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  n/p       Next/previous page"),
        Line::from("  s         Toggle sort order"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  r         Reconnect / reload"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 46u16.min(area.width.saturating_sub(4));
    let help_height = 24u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
