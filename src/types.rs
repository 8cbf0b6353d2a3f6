use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// The four input record sets the pipeline consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Orders,
    Payments,
    Items,
    Reviews,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::Orders,
        TableKind::Payments,
        TableKind::Items,
        TableKind::Reviews,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Orders => "orders",
            TableKind::Payments => "payments",
            TableKind::Items => "items",
            TableKind::Reviews => "reviews",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single raw cell. Empty cells are read as missing.
pub type RawCell = Option<String>;

/// Untyped tabular input as handed over by a `TableSource`
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub kind: TableKind,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    pub fn new(kind: TableKind, headers: Vec<String>) -> Self {
        Self {
            kind,
            headers,
            rows: Vec::new(),
        }
    }

    /// Build a table from string literals; empty strings become missing cells.
    pub fn from_rows(kind: TableKind, headers: &[&str], rows: &[&[&str]]) -> Self {
        let mut table = Self::new(kind, headers.iter().map(|h| h.to_string()).collect());
        for row in rows {
            table.push_row(row.iter().map(|v| raw_cell(v)).collect());
        }
        table
    }

    pub fn push_row(&mut self, cells: Vec<RawCell>) {
        self.rows.push(cells);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolve a column reference to an index into each row.
    pub fn resolve(&self, column: ColumnRef) -> Result<usize> {
        match column {
            ColumnRef::Position(index, label) => {
                if index < self.headers.len() {
                    Ok(index)
                } else {
                    Err(PipelineError::MissingColumn {
                        table: self.kind,
                        column: format!("#{} ({})", index, label),
                    })
                }
            }
            ColumnRef::Name(name) => self
                .headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| PipelineError::MissingColumn {
                    table: self.kind,
                    column: name.to_string(),
                }),
        }
    }
}

/// How a cleaner addresses one of its projected input columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRef {
    /// Fixed position in the source file, with a label for error messages
    Position(usize, &'static str),
    /// Header name
    Name(&'static str),
}

/// Convert a raw string into a cell, treating blank text as missing
pub fn raw_cell(value: &str) -> RawCell {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Borrow a cell from a possibly ragged row
pub fn cell(row: &[RawCell], index: usize) -> Option<&str> {
    row.get(index).and_then(|c| c.as_deref())
}
