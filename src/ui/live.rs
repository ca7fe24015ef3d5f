//! Live view rendering.
//!
//! One rolling chart per selected metric, fed by the coordinator's sink.

use ratatui::{layout::Rect, Frame};

use crate::app::App;
use crate::ui::common::{chart_rows, render_chart};

/// Render the Live view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let metrics = app.live_selection();
    let rows = chart_rows(area, metrics.len());

    for (metric, row) in metrics.into_iter().zip(rows) {
        render_chart(frame, app, metric, app.live().sink().chart(metric), row);
    }
}
