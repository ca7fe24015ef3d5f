use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::future::join_all;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use farmwatch::app::{App, View};
use farmwatch::config::Settings;
use farmwatch::query::{HistoryClient, HistoryQuery, HistorySource, SortOrder, TimeRange};
use farmwatch::source::HttpConnector;
use farmwatch::ui::{self, Theme};
use farmwatch::{events, MetricId};

#[derive(Parser, Debug)]
#[command(name = "farmwatch")]
#[command(about = "Terminal dashboard for live and historical smart-farm sensor telemetry")]
struct Args {
    /// Backend base URL (overrides the config file)
    #[arg(short, long)]
    url: Option<String>,

    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tab to open on start
    #[arg(long, value_enum, default_value = "live")]
    view: View,

    /// Points kept per live chart
    #[arg(short = 'n', long)]
    max_points: Option<usize>,

    /// Start of the history range, local time (YYYY-MM-DDTHH:MM[:SS])
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// End of the history range, local time (YYYY-MM-DDTHH:MM[:SS])
    #[arg(long, requires = "start")]
    end: Option<String>,

    /// Records per history page
    #[arg(long)]
    page_size: Option<u32>,

    /// History sort order (asc or desc)
    #[arg(long)]
    sort: Option<SortOrder>,

    /// File to write logs to
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Run the history query for every metric, write it as JSON and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

impl Args {
    /// Apply command-line overrides on top of loaded settings.
    fn apply(&self, settings: Settings) -> Settings {
        let mut settings = settings;
        if let Some(url) = &self.url {
            settings.base_url = url.clone();
        }
        if let Some(max_points) = self.max_points {
            settings.max_points = max_points;
        }
        if let Some(page_size) = self.page_size {
            settings.page_size = page_size;
        }
        if let Some(sort) = self.sort {
            settings.sort = sort;
        }
        if let Some(log_file) = &self.log_file {
            settings.log_file = log_file.clone();
        }
        settings.normalized()
    }

    fn history_query(&self, settings: &Settings) -> Result<HistoryQuery> {
        let query = HistoryQuery::default()
            .with_page(0, settings.page_size)
            .with_sort(settings.sort);
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => Ok(query.with_range(TimeRange::parse(start, end)?)),
            _ => Ok(query),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = args.apply(Settings::load(args.config.as_deref())?);
    init_logging(&settings.log_file)?;
    info!("Starting farmwatch against {}", settings.base_url);

    let query = args.history_query(&settings)?;
    let history = Arc::new(HistoryClient::new(
        &settings.base_url,
        settings.request_timeout(),
    )?);

    // Build a tokio runtime for subscriptions and queries
    let rt = tokio::runtime::Runtime::new()?;

    // Handle export mode (non-interactive)
    if let Some(export_path) = args.export {
        return rt.block_on(export_to_file(history.as_ref(), &query, &export_path));
    }

    let connector = Arc::new(HttpConnector::new(
        &settings.base_url,
        settings.request_timeout(),
    )?);

    // The TUI loop stays on this thread; tasks run on the runtime's workers
    let _guard = rt.enter();
    let app = App::new(
        connector,
        history,
        settings.max_points,
        query,
        Theme::auto_detect(),
    );
    run_tui(app, args.view)
}

/// Send logs to a file; the terminal belongs to the TUI.
fn init_logging(path: &Path) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_writer(log_file)
                .with_ansi(false),
        )
        .init();
    Ok(())
}

/// Run the TUI starting on `view`
fn run_tui(mut app: App, view: View) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    app.start(view);

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);
    if let Err(ref e) = result {
        error!("Terminal loop failed: {:#}", e);
    }
    if app.running {
        app.quit();
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 16;

    while app.running {
        app.tick();

        terminal.draw(|frame| {
            let area = frame.area();

            // Check for minimum terminal size
            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered = ratatui::layout::Rect::new(
                    0,
                    (area.height / 2).saturating_sub(2),
                    area.width,
                    5.min(area.height),
                );
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(12),   // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);

            match app.current_view {
                View::Live => ui::live::render(frame, app, chunks[2]),
                View::History => ui::history::render(frame, app, chunks[2]),
                View::Alerts => ui::alerts::render(frame, app, chunks[2]),
            }

            ui::common::render_status_bar(frame, app, chunks[3]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(Event::Key(key)) = events::poll_event(Duration::from_millis(100))? {
            events::handle_key_event(app, key);
        }
    }

    Ok(())
}

/// Query every metric once and write the series as JSON
async fn export_to_file(
    history: &dyn HistorySource,
    query: &HistoryQuery,
    export_path: &Path,
) -> Result<()> {
    use std::io::Write;

    let pages = join_all(
        MetricId::ALL
            .iter()
            .map(|metric| history.fetch_page(*metric, query)),
    )
    .await;

    let mut metrics = serde_json::Map::new();
    for (metric, page) in MetricId::ALL.iter().zip(pages) {
        let page = page.with_context(|| format!("History query for {} failed", metric))?;
        metrics.insert(
            metric.as_str().to_string(),
            serde_json::json!({
                "label": metric.label(),
                "total_elements": page.total_elements,
                "total_pages": page.total_pages,
                "points": page.series,
            }),
        );
    }

    let export = serde_json::json!({
        "range": query.range.map(|r| serde_json::json!({
            "start": r.start().format("%Y-%m-%dT%H:%M:%S").to_string(),
            "end": r.end().format("%Y-%m-%dT%H:%M:%S").to_string(),
        })),
        "page": query.page,
        "size": query.size,
        "sort": query.sort,
        "metrics": metrics,
    });

    let json = serde_json::to_string_pretty(&export)?;
    let mut file = std::fs::File::create(export_path)?;
    file.write_all(json.as_bytes())?;

    println!("Exported history to: {}", export_path.display());
    Ok(())
}
