//! Table types.
//!
//! Tables are a read projection of `w:tbl` markup. Substitution never goes
//! through them; it walks paragraphs wherever they live.

use super::Paragraph;
use crate::package::Element;
use serde::{Deserialize, Serialize};

/// A table structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    /// Rows in the table
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Project a `w:tbl` element.
    pub fn from_element(tbl: &Element) -> Self {
        Self {
            rows: tbl
                .elements()
                .filter(|el| el.name == "w:tr")
                .map(TableRow::from_element)
                .collect(),
        }
    }

    /// Add a row to the table.
    pub fn add_row(&mut self, row: TableRow) {
        self.rows.push(row);
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns (based on first row).
    pub fn column_count(&self) -> usize {
        self.rows
            .first()
            .map(|r| r.cells.iter().map(|c| c.colspan as usize).sum())
            .unwrap_or(0)
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get plain text representation of the table.
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Check if the table has merged cells.
    pub fn has_merged_cells(&self) -> bool {
        self.rows
            .iter()
            .flat_map(|r| &r.cells)
            .any(|c| c.colspan > 1 || c.vertical_merge)
    }
}

/// A table row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableRow {
    /// Cells in the row
    pub cells: Vec<TableCell>,
}

impl TableRow {
    /// Create a new row with cells.
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self { cells }
    }

    fn from_element(tr: &Element) -> Self {
        Self::new(
            tr.elements()
                .filter(|el| el.name == "w:tc")
                .map(TableCell::from_element)
                .collect(),
        )
    }

    /// Get plain text representation.
    pub fn plain_text(&self) -> String {
        self.cells
            .iter()
            .map(|c| c.plain_text())
            .collect::<Vec<_>>()
            .join("\t")
    }
}

/// A table cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell paragraphs, including those of nested tables
    pub content: Vec<Paragraph>,

    /// Number of grid columns this cell spans (`w:gridSpan`)
    pub colspan: u8,

    /// Whether the cell takes part in a vertical merge (`w:vMerge`)
    pub vertical_merge: bool,
}

impl TableCell {
    /// Create a cell with text content.
    pub fn text(text: impl Into<String>) -> Self {
        Self::with_content(vec![Paragraph::with_text(text)])
    }

    /// Create a cell with multiple paragraphs.
    pub fn with_content(content: Vec<Paragraph>) -> Self {
        Self {
            content,
            colspan: 1,
            vertical_merge: false,
        }
    }

    fn from_element(tc: &Element) -> Self {
        let props = tc.child("w:tcPr");
        let colspan = props
            .and_then(|p| p.child("w:gridSpan"))
            .and_then(|g| g.attr("w:val"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);
        let vertical_merge = props.is_some_and(|p| p.child("w:vMerge").is_some());

        let mut content = Vec::new();
        tc.walk(&mut |el| {
            if el.name == "w:p" {
                content.push(Paragraph::lift(el.clone()));
            }
        });

        Self {
            content,
            colspan,
            vertical_merge,
        }
    }

    /// Get plain text of the cell, one line per paragraph.
    pub fn plain_text(&self) -> String {
        self.content
            .iter()
            .map(|p| p.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Check if the cell is empty.
    pub fn is_empty(&self) -> bool {
        self.content.iter().all(|p| p.is_empty())
    }
}
