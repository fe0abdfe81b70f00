//! Table types.

use super::{NodeRef, Provenance};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A table node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableItem {
    /// Identifier (`#/tables/N`)
    pub self_ref: String,

    /// Owning node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeRef>,

    /// Child references
    #[serde(default)]
    pub children: Vec<NodeRef>,

    /// Label
    #[serde(default = "default_table_label")]
    pub label: String,

    /// Page occurrences
    #[serde(default)]
    pub prov: Vec<Provenance>,

    /// Caption references
    #[serde(default)]
    pub captions: Vec<NodeRef>,

    /// Cell data
    #[serde(default)]
    pub data: TableData,

    /// Unrecognised fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_table_label() -> String {
    "table".to_string()
}

impl TableItem {
    /// Create a table node.
    pub fn new(self_ref: impl Into<String>, data: TableData) -> Self {
        Self {
            self_ref: self_ref.into(),
            parent: None,
            children: Vec::new(),
            label: default_table_label(),
            prov: Vec::new(),
            captions: Vec::new(),
            data,
            extra: Map::new(),
        }
    }
}

/// Table cell data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableData {
    /// Cells with their grid offsets
    #[serde(default)]
    pub table_cells: Vec<TableCell>,

    /// Number of rows
    #[serde(default)]
    pub num_rows: usize,

    /// Number of columns
    #[serde(default)]
    pub num_cols: usize,

    /// Expanded grid (spanning cells repeated in every slot they cover)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grid: Vec<Vec<TableCell>>,

    /// Unrecognised fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TableData {
    /// Build table data from rows of text; the first row is a column header.
    pub fn from_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Self {
        let num_rows = rows.len();
        let num_cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut table_cells = Vec::new();

        for (r, row) in rows.iter().enumerate() {
            for (c, text) in row.iter().enumerate() {
                let mut cell = TableCell::new(text.as_ref(), r, c);
                cell.column_header = r == 0;
                table_cells.push(cell);
            }
        }

        Self {
            table_cells,
            num_rows,
            num_cols,
            grid: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Check if the table has no cells.
    pub fn is_empty(&self) -> bool {
        self.grid.iter().all(Vec::is_empty) && self.table_cells.is_empty()
    }

    /// Text grid, one `String` per slot.
    ///
    /// Uses the expanded `grid` when present, otherwise places each cell at
    /// its offsets, repeating spanning cells across the slots they cover.
    pub fn text_grid(&self) -> Vec<Vec<String>> {
        if self.grid.iter().any(|row| !row.is_empty()) {
            return self
                .grid
                .iter()
                .map(|row| row.iter().map(|c| c.text.clone()).collect())
                .collect();
        }

        let rows = self
            .num_rows
            .max(self.table_cells.iter().map(|c| c.end_row()).max().unwrap_or(0));
        let cols = self
            .num_cols
            .max(self.table_cells.iter().map(|c| c.end_col()).max().unwrap_or(0));

        let mut grid = vec![vec![String::new(); cols]; rows];
        for cell in &self.table_cells {
            for row in grid.iter_mut().take(cell.end_row()).skip(cell.start_row_offset_idx) {
                for slot in row.iter_mut().take(cell.end_col()).skip(cell.start_col_offset_idx) {
                    slot.clone_from(&cell.text);
                }
            }
        }
        grid
    }

    /// Number of leading rows made only of column-header cells.
    pub fn header_rows(&self) -> usize {
        let mut header_rows = 0;
        for r in 0..self.num_rows {
            let mut in_row = self
                .table_cells
                .iter()
                .filter(|c| c.start_row_offset_idx == r)
                .peekable();
            if in_row.peek().is_none() || !in_row.all(|c| c.column_header) {
                break;
            }
            header_rows += 1;
        }
        header_rows
    }
}

/// A table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell text
    #[serde(default)]
    pub text: String,

    /// Number of rows spanned
    #[serde(default = "one")]
    pub row_span: usize,

    /// Number of columns spanned
    #[serde(default = "one")]
    pub col_span: usize,

    /// First row covered
    #[serde(default)]
    pub start_row_offset_idx: usize,

    /// One past the last row covered
    #[serde(default)]
    pub end_row_offset_idx: usize,

    /// First column covered
    #[serde(default)]
    pub start_col_offset_idx: usize,

    /// One past the last column covered
    #[serde(default)]
    pub end_col_offset_idx: usize,

    /// Whether the cell is a column header
    #[serde(default)]
    pub column_header: bool,

    /// Whether the cell is a row header
    #[serde(default)]
    pub row_header: bool,

    /// Unrecognised fields (e.g. `bbox`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn one() -> usize {
    1
}

impl TableCell {
    /// Create a 1x1 cell at the given slot.
    pub fn new(text: impl Into<String>, row: usize, col: usize) -> Self {
        Self {
            text: text.into(),
            row_span: 1,
            col_span: 1,
            start_row_offset_idx: row,
            end_row_offset_idx: row + 1,
            start_col_offset_idx: col,
            end_col_offset_idx: col + 1,
            column_header: false,
            row_header: false,
            extra: Map::new(),
        }
    }

    fn end_row(&self) -> usize {
        self.end_row_offset_idx
            .max(self.start_row_offset_idx + self.row_span.max(1))
    }

    fn end_col(&self) -> usize {
        self.end_col_offset_idx
            .max(self.start_col_offset_idx + self.col_span.max(1))
    }
}
