//! Application state and navigation logic.
//!
//! Each tab owns one pipeline: Live drives the [`Coordinator`], History the
//! [`HistoryLoader`], Alerts the [`AlertFeed`]. Entering a tab brings its
//! pipeline up and leaving it tears the pipeline down, so at most one of
//! them holds network resources at a time.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use farmwatch_types::{MetricId, MetricSpec};

use crate::coordinator::Coordinator;
use crate::feed::AlertFeed;
use crate::query::{HistoryLoader, HistoryQuery, HistorySource};
use crate::sink::{ChartBoard, RenderSink};
use crate::source::Connector;
use crate::ui::Theme;

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum View {
    /// Rolling charts fed by the live subscriptions.
    Live,
    /// Charts of a historical range query.
    History,
    /// Intrusion alerts, newest first.
    Alerts,
}

impl View {
    pub const ALL: [View; 3] = [View::Live, View::History, View::Alerts];

    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Live => View::History,
            View::History => View::Alerts,
            View::Alerts => View::Live,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        match self {
            View::Live => View::Alerts,
            View::History => View::Live,
            View::Alerts => View::History,
        }
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Live => "Live",
            View::History => "History",
            View::Alerts => "Alerts",
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    source_description: String,

    // Live
    live: Coordinator<ChartBoard>,
    live_selection: BTreeSet<MetricId>,

    // History
    history: HistoryLoader,
    history_charts: ChartBoard,
    pub history_query: HistoryQuery,

    // Alerts
    alerts: AlertFeed,
    pub selected_alert_index: usize,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create an app with every pipeline down.
    ///
    /// Call [`App::set_view`] (or [`App::start`]) to bring the first tab up.
    pub fn new(
        connector: Arc<dyn Connector>,
        history: Arc<dyn HistorySource>,
        max_points: usize,
        history_query: HistoryQuery,
        theme: Theme,
    ) -> Self {
        let source_description = connector.describe("").trim_end_matches('/').to_string();
        Self {
            running: true,
            current_view: View::Live,
            show_help: false,
            source_description,
            live: Coordinator::with_capacity(connector.clone(), ChartBoard::new(), max_points),
            live_selection: MetricId::ALL.into_iter().collect(),
            history: HistoryLoader::new(history),
            history_charts: ChartBoard::new(),
            history_query,
            alerts: AlertFeed::new(connector),
            selected_alert_index: 0,
            theme,
            status_message: None,
        }
    }

    /// Bring up the pipeline of `view`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, view: View) {
        self.current_view = view;
        self.enter(view);
    }

    /// Returns a description of the backend.
    pub fn source_description(&self) -> &str {
        &self.source_description
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    pub fn live(&self) -> &Coordinator<ChartBoard> {
        &self.live
    }

    pub fn history(&self) -> &HistoryLoader {
        &self.history
    }

    pub fn history_charts(&self) -> &ChartBoard {
        &self.history_charts
    }

    pub fn alerts(&self) -> &AlertFeed {
        &self.alerts
    }

    /// Metrics selected for live mode, in display order.
    pub fn live_selection(&self) -> Vec<MetricId> {
        self.live_selection.iter().copied().collect()
    }

    /// Apply everything the pipelines delivered since the last call.
    ///
    /// Returns true if anything changed on screen.
    pub fn tick(&mut self) -> bool {
        let live = self.live.poll();
        let history = self.history.poll(&mut self.history_charts);
        let alerts = self.alerts.poll();
        live + history + alerts > 0
    }

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.set_view(self.current_view.next());
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.set_view(self.current_view.prev());
    }

    /// Switch to a specific view, tearing down the one being left.
    pub fn set_view(&mut self, view: View) {
        if view == self.current_view {
            return;
        }
        self.leave(self.current_view);
        self.current_view = view;
        self.enter(view);
    }

    fn enter(&mut self, view: View) {
        match view {
            View::Live => self.live.activate(&self.live_specs()),
            View::History => self.run_history_query(),
            View::Alerts => {
                self.selected_alert_index = 0;
                self.alerts.open();
            }
        }
    }

    fn leave(&mut self, view: View) {
        match view {
            View::Live => {
                let failures = self.live.deactivate();
                if !failures.is_empty() {
                    self.set_status_message(format!(
                        "{} chart(s) failed to close cleanly",
                        failures.len()
                    ));
                }
            }
            View::History => {
                self.history.cancel();
                for metric in MetricId::ALL {
                    if let Err(e) = self.history_charts.detach(metric) {
                        warn!("Failed to detach history chart for {}: {}", metric, e);
                    }
                }
            }
            View::Alerts => self.alerts.close(),
        }
    }

    fn live_specs(&self) -> Vec<MetricSpec> {
        self.live_selection.iter().map(|m| m.spec()).collect()
    }

    /// Add or remove `metric` from live mode and re-activate.
    ///
    /// The last selected metric cannot be removed.
    pub fn toggle_metric(&mut self, metric: MetricId) {
        if self.live_selection.contains(&metric) {
            if self.live_selection.len() == 1 {
                self.set_status_message("At least one metric must stay selected".to_string());
                return;
            }
            self.live_selection.remove(&metric);
        } else {
            self.live_selection.insert(metric);
        }

        if self.current_view == View::Live {
            self.live.activate(&self.live_specs());
        }
    }

    /// Restart the pipeline of the current view.
    ///
    /// This is the only way to recover a channel that closed after an error.
    pub fn refresh(&mut self) {
        match self.current_view {
            View::Live => {
                self.live.deactivate();
                self.live.activate(&self.live_specs());
                self.set_status_message("Live subscriptions restarted".to_string());
            }
            View::History => self.run_history_query(),
            View::Alerts => {
                self.alerts.open();
                self.set_status_message("Alert feed reopened".to_string());
            }
        }
    }

    /// Query every metric for the current page.
    fn run_history_query(&mut self) {
        for metric in MetricId::ALL {
            if let Err(e) = self.history_charts.attach(metric, metric.label()) {
                warn!("Failed to attach history chart for {}: {}", metric, e);
            }
        }
        self.history.start(&MetricId::ALL, &self.history_query);
    }

    /// Highest page count reported by the last round, if any.
    pub fn history_total_pages(&self) -> Option<u32> {
        MetricId::ALL
            .iter()
            .filter_map(|m| self.history.page_info(*m).and_then(|p| p.total_pages))
            .max()
    }

    pub fn next_page(&mut self) {
        if self.current_view != View::History {
            return;
        }
        if let Some(total) = self.history_total_pages() {
            if self.history_query.page + 1 >= total {
                self.set_status_message("Already on the last page".to_string());
                return;
            }
        }
        self.history_query.page += 1;
        self.run_history_query();
    }

    pub fn prev_page(&mut self) {
        if self.current_view != View::History || self.history_query.page == 0 {
            return;
        }
        self.history_query.page -= 1;
        self.run_history_query();
    }

    /// Flip the history sort order and go back to the first page.
    pub fn toggle_sort(&mut self) {
        if self.current_view != View::History {
            return;
        }
        self.history_query.sort = self.history_query.sort.toggled();
        self.history_query.page = 0;
        self.set_status_message(format!("Sort order: {}", self.history_query.sort));
        self.run_history_query();
    }

    /// Move the alert selection down by one.
    pub fn select_next(&mut self) {
        let max = self.alerts.log().len().saturating_sub(1);
        self.selected_alert_index = (self.selected_alert_index + 1).min(max);
    }

    /// Move the alert selection up by one.
    pub fn select_prev(&mut self) {
        self.selected_alert_index = self.selected_alert_index.saturating_sub(1);
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit and release every pipeline.
    pub fn quit(&mut self) {
        self.leave(self.current_view);
        self.running = false;
        info!("Shutting down");
    }
}
