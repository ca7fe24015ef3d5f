//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use farmwatch_types::MetricId;

use crate::source::ChannelState;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Line color of the temperature chart.
    pub temperature: Color,
    /// Line color of the humidity chart.
    pub humidity: Color,
    /// Line color of the soil moisture chart.
    pub soil: Color,
    /// Color for open channels.
    pub healthy: Color,
    /// Color for channels still connecting.
    pub warning: Color,
    /// Color for failed channels and alerts.
    pub critical: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for header rows.
    pub header: Style,
    /// Style for selected/highlighted rows.
    pub selected: Style,
    /// Style for the active tab.
    pub tab_active: Style,
    /// Style for inactive tabs.
    pub tab_inactive: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            temperature: Color::Rgb(255, 165, 0),
            humidity: Color::LightBlue,
            soil: Color::LightGreen,
            healthy: Color::Green,
            warning: Color::Yellow,
            critical: Color::Red,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            temperature: Color::Rgb(204, 102, 0),
            humidity: Color::Blue,
            soil: Color::Green,
            healthy: Color::Green,
            warning: Color::Rgb(176, 128, 0),
            critical: Color::Red,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Line color for a metric's chart.
    pub fn metric_color(&self, metric: MetricId) -> Color {
        match metric {
            MetricId::Temperature => self.temperature,
            MetricId::Humidity => self.humidity,
            MetricId::SoilMoisture => self.soil,
        }
    }

    /// Get style for a channel state
    pub fn channel_style(&self, state: ChannelState) -> Style {
        match state {
            ChannelState::Open => Style::default().fg(self.healthy),
            ChannelState::Connecting => Style::default().fg(self.warning),
            ChannelState::Erroring => {
                Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
            }
            ChannelState::Closed => Style::default().fg(self.critical),
        }
    }
}
