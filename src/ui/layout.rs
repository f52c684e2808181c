//! Column model and cell placement for the table.
//!
//! Layout is pure: it turns column definitions and string values into
//! positioned [`PaintCell`]s, which the renderer then writes into a frame.

use std::fmt;
use std::sync::Arc;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::theme::CellStyle;

/// Transformation applied to every value of a column before display.
pub type ColumnFormatter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A named, width-tracked display slot.
#[derive(Clone)]
pub struct Column {
    name: String,
    width: usize,
    pinned: bool,
    formatter: Option<ColumnFormatter>,
}

impl Column {
    /// A column is pinned when given an explicit non-zero width; pinned
    /// columns do not grow with their content. A zero width counts as none.
    pub fn new(name: impl Into<String>, formatter: Option<ColumnFormatter>, width: Option<usize>) -> Self {
        let name = name.into();
        let (width, pinned) = match width.filter(|w| *w > 0) {
            Some(w) => (w, true),
            None => (name.width(), false),
        };
        Self {
            name,
            width,
            pinned,
            formatter,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn format(&self, value: String) -> String {
        match &self.formatter {
            Some(f) => f(&value),
            None => value,
        }
    }

    /// Widen to fit `value`. Never shrinks; pinned columns are unchanged.
    pub fn fit(&mut self, value: &str) {
        if !self.pinned {
            self.width = self.width.max(value.width());
        }
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("width", &self.width)
            .field("pinned", &self.pinned)
            .finish()
    }
}

/// Spacing around the table and around each column, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margins {
    pub left: u16,
    pub right: u16,
    pub column_left: u16,
    pub column_right: u16,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            left: 0,
            right: 0,
            column_left: 1,
            column_right: 1,
        }
    }
}

/// One positioned piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaintCell {
    pub value: String,
    pub x: u16,
    pub y: u16,
    pub width: usize,
    pub style: CellStyle,
}

/// Place one table row at line `y`: each value right-justified in its
/// column, with the column margins painted as blank normal-style cells.
pub fn layout_row(
    columns: &[Column],
    values: &[String],
    y: u16,
    style: CellStyle,
    margins: &Margins,
) -> Vec<PaintCell> {
    let mut cells = Vec::with_capacity(columns.len() * 3);
    let mut x = margins.left;

    let blank = |cells: &mut Vec<PaintCell>, x: &mut u16, width: u16| {
        if width > 0 {
            cells.push(PaintCell {
                value: " ".repeat(width as usize),
                x: *x,
                y,
                width: width as usize,
                style: CellStyle::Normal,
            });
            *x = x.saturating_add(width);
        }
    };

    for (column, value) in columns.iter().zip(values) {
        blank(&mut cells, &mut x, margins.column_left);
        cells.push(PaintCell {
            value: right_justify(value, column.width()),
            x,
            y,
            width: column.width(),
            style,
        });
        x = x.saturating_add(u16::try_from(column.width()).unwrap_or(u16::MAX));
        blank(&mut cells, &mut x, margins.column_right);
    }
    cells
}

/// Pad `value` on the left to `width` display cells, truncating on the
/// right when it is too wide.
pub fn right_justify(value: &str, width: usize) -> String {
    let value_width = value.width();
    if value_width <= width {
        return format!("{}{}", " ".repeat(width - value_width), value);
    }

    let mut out = String::new();
    let mut used = 0;
    for c in value.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str(&" ".repeat(width - used));
    out
}
