//! Terminal rendering.
//!
//! - [`layout`]: column model and pure cell placement
//! - [`table`]: [`TabularRenderer`], the single writer to the terminal
//! - [`terminal`]: raw-mode session with guaranteed restore
//! - [`theme`]: light/dark styles

pub mod layout;
pub mod table;
pub mod terminal;
pub mod theme;

pub use layout::{Column, ColumnFormatter, Margins};
pub use table::{RenderError, TableRow, TabularRenderer, CONTENT_ROW, HEADER_ROW};
pub use terminal::TerminalSession;
pub use theme::{CellStyle, Theme};
