pub mod extract;
pub mod render;
pub mod sort;

use serde::Serialize;
use thiserror::Error;

pub use render::{render_table, Column, RenderPlan};
pub use sort::{compare_cells, sort_records, sort_rows, SortDirection, SortState};

/// One displayable table cell as produced by a column extractor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cell {
    Empty,
    Text { text: String },
    Link { text: String, href: String },
    Tooltip { text: String, tooltip: String },
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text { text: value.into() }
    }

    /// The visible text of the cell, which is also what sorting compares.
    pub fn display_text(&self) -> &str {
        match self {
            Cell::Empty => "",
            Cell::Text { text } | Cell::Link { text, .. } | Cell::Tooltip { text, .. } => text,
        }
    }
}

/// Click binding of a header cell: re-sort `table_id` by `column`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SortAction {
    pub table_id: String,
    pub column: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HeaderCell {
    pub label: String,
    pub on_click: SortAction,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Row {
    pub cells: Vec<Cell>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Table {
    pub id: String,
    pub headers: Vec<HeaderCell>,
    pub rows: Vec<Row>,
    pub sort: Option<SortState>,
}

impl Table {
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Runs the click handler bound to header `column`.
    pub fn click_header(&mut self, column: usize) -> Result<SortDirection, RenderError> {
        let action = self
            .headers
            .get(column)
            .map(|h| h.on_click.clone())
            .ok_or(RenderError::ColumnOutOfRange {
                table_id: self.id.clone(),
                column,
                columns: self.headers.len(),
            })?;
        let direction = sort_rows(&mut self.rows, action.column);
        self.sort = Some(SortState {
            column: action.column,
            direction,
        });
        Ok(direction)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("record is missing required field '{field}'")]
    MissingField { field: String },

    #[error("record field '{field}' has unexpected type, expected {expected}")]
    UnexpectedType {
        field: String,
        expected: &'static str,
    },

    #[error("column {column} is out of range for table '{table_id}' ({columns} columns)")]
    ColumnOutOfRange {
        table_id: String,
        column: usize,
        columns: usize,
    },
}
