//! Full-screen table renderer.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::io::{self, Stdout};

use ratatui::{
    backend::{Backend, CrosstermBackend},
    buffer::Buffer,
    layout::Rect,
    style::Style,
    Terminal,
};
use thiserror::Error;

use super::layout::{layout_row, Column, ColumnFormatter, Margins, PaintCell};
use super::terminal::TerminalSession;
use super::theme::{CellStyle, Theme};

/// Line of the column header row.
pub const HEADER_ROW: u16 = 1;
/// First line of table content.
pub const CONTENT_ROW: u16 = HEADER_ROW + 2;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("row has no value for column `{0}`")]
    UnknownColumn(String),
}

/// A row of the table, queried by column name.
pub trait TableRow {
    fn cell(&self, column: &str) -> Option<String>;
}

impl TableRow for BTreeMap<String, String> {
    fn cell(&self, column: &str) -> Option<String> {
        self.get(column).cloned()
    }
}

impl<S: BuildHasher> TableRow for HashMap<String, String, S> {
    fn cell(&self, column: &str) -> Option<String> {
        self.get(column).cloned()
    }
}

/// Paints a table of named columns, one row per input row, repainting the
/// whole screen once per [`update`](Self::update).
///
/// Column widths start at the column name's width and, when dynamic width
/// is on, grow to the widest value ever rendered. They never shrink.
///
/// While a renderer is live it is the only writer to the terminal. A
/// renderer created with [`open`](TabularRenderer::open) holds the terminal
/// in raw mode until [`close`](Self::close) or drop.
pub struct TabularRenderer<B: Backend> {
    terminal: Terminal<B>,
    session: Option<TerminalSession>,
    columns: Vec<Column>,
    margins: Margins,
    dynamic_width: bool,
    title: Option<String>,
    theme: Theme,
}

impl TabularRenderer<CrosstermBackend<Stdout>> {
    /// Take over the real terminal.
    pub fn open(theme: Theme) -> Result<Self, RenderError> {
        let session = TerminalSession::acquire()?;
        let mut renderer = Self::with_backend(CrosstermBackend::new(io::stdout()), theme)?;
        renderer.session = Some(session);
        renderer.terminal.clear()?;
        Ok(renderer)
    }
}

impl<B: Backend> TabularRenderer<B> {
    /// Render into an arbitrary backend without touching terminal modes.
    pub fn with_backend(backend: B, theme: Theme) -> Result<Self, RenderError> {
        Ok(Self {
            terminal: Terminal::new(backend)?,
            session: None,
            columns: Vec::new(),
            margins: Margins::default(),
            dynamic_width: true,
            title: None,
            theme,
        })
    }

    pub fn set_dynamic_width(&mut self, enabled: bool) {
        self.dynamic_width = enabled;
    }

    pub fn set_margins(&mut self, margins: Margins) {
        self.margins = margins;
    }

    /// Status text painted on the line above the header.
    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    /// Append a column. An explicit `width` pins it at that width.
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        formatter: Option<ColumnFormatter>,
        width: Option<usize>,
    ) {
        self.columns.push(Column::new(name, formatter, width));
    }

    /// Remove the first column called `name`, if any.
    pub fn remove_column(&mut self, name: &str) {
        if let Some(pos) = self.columns.iter().position(|c| c.name() == name) {
            self.columns.remove(pos);
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }

    /// Lay out the header and one line per row, then refresh the screen once.
    pub fn update<R: TableRow>(&mut self, rows: &[R]) -> Result<(), RenderError> {
        let values = rows
            .iter()
            .map(|row| self.row_values(row))
            .collect::<Result<Vec<_>, _>>()?;

        if self.dynamic_width {
            for row in &values {
                for (column, value) in self.columns.iter_mut().zip(row) {
                    column.fit(value);
                }
            }
        }

        let mut cells = Vec::new();
        if let Some(title) = &self.title {
            cells.push(PaintCell {
                value: title.clone(),
                x: self.margins.left,
                y: 0,
                width: usize::from(u16::MAX),
                style: CellStyle::Normal,
            });
        }

        let names: Vec<String> = self.columns.iter().map(|c| c.name().to_string()).collect();
        cells.extend(layout_row(
            &self.columns,
            &names,
            HEADER_ROW,
            CellStyle::Emphasized,
            &self.margins,
        ));

        let mut y = CONTENT_ROW;
        for row in &values {
            cells.extend(layout_row(
                &self.columns,
                row,
                y,
                CellStyle::Normal,
                &self.margins,
            ));
            y = y.saturating_add(1);
        }

        let title_style = self.theme.title;
        let theme = &self.theme;
        let right_margin = self.margins.right;
        self.terminal.draw(|frame| {
            let area = frame.area();
            let buf = frame.buffer_mut();
            for cell in &cells {
                let style = if cell.y == 0 {
                    title_style
                } else {
                    theme.style(cell.style)
                };
                paint(buf, area, right_margin, cell, style);
            }
        })?;
        Ok(())
    }

    fn row_values<R: TableRow>(&self, row: &R) -> Result<Vec<String>, RenderError> {
        self.columns
            .iter()
            .map(|column| {
                row.cell(column.name())
                    .map(|v| column.format(v))
                    .ok_or_else(|| RenderError::UnknownColumn(column.name().to_string()))
            })
            .collect()
    }

    /// Give the terminal back in its original mode.
    pub fn close(mut self) -> Result<(), RenderError> {
        self.terminal.show_cursor()?;
        if let Some(mut session) = self.session.take() {
            session.release()?;
        }
        Ok(())
    }
}

/// Write `cell` into `buf`, clipped to `area` minus the right margin.
fn paint(buf: &mut Buffer, area: Rect, right_margin: u16, cell: &PaintCell, style: Style) {
    let right = area.width.saturating_sub(right_margin);
    if cell.y >= area.height || cell.x >= right {
        return;
    }
    let max_width = cell.width.min(usize::from(right - cell.x));
    buf.set_stringn(area.x + cell.x, area.y + cell.y, &cell.value, max_width, style);
}
