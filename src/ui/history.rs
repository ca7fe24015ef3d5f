//! History view rendering.

use ratatui::{layout::Rect, Frame};

use farmwatch_types::MetricId;

use crate::app::App;
use crate::ui::common::{chart_rows, render_chart};

/// Render one chart per metric for the current history page.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let rows = chart_rows(area, MetricId::ALL.len());

    for (metric, row) in MetricId::ALL.into_iter().zip(rows) {
        render_chart(frame, app, metric, app.history_charts().chart(metric), row);
    }
}
