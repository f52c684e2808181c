//! Theme configuration for the dashboard.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};

/// The paint style of a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    Normal,
    Emphasized,
}

/// Color and style theme for the dashboard.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
/// Detection queries the terminal, so call it before the renderer takes
/// over the screen.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Style for the column header row.
    pub header: Style,
    /// Style for table content.
    pub content: Style,
    /// Style for the status line above the table.
    pub title: Style,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            content: Style::default(),
            title: Style::default().fg(Color::Gray),
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            content: Style::default(),
            title: Style::default().fg(Color::DarkGray),
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn style(&self, style: CellStyle) -> Style {
        match style {
            CellStyle::Normal => self.content,
            CellStyle::Emphasized => self.header,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
