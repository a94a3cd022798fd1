//! Result set types for rowshift.
//!
//! Defines the column metadata and the fully materialized result produced by
//! the row materializer.

use serde::{Deserialize, Serialize};

/// A raw cell as delivered by the driver: `None` for database NULL, otherwise
/// the textual rendering of the value as bytes.
pub type RawCell = Option<Vec<u8>>;

/// A row of normalized cells, one per column.
pub type Row = Vec<String>;

/// Coarse classification of a column, decided once per query at describe time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnClass {
    /// Integer, floating point and decimal columns.
    Numeric,
    /// Character columns. Numeric-looking values stay quoted.
    Text,
    /// Everything else (dates, booleans, binary, ...).
    Other,
}

impl ColumnClass {
    /// Returns true for text-classified columns.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text)
    }
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,

    /// Type name as reported by the driver (e.g. `INT4`, `TEXT`).
    pub type_name: String,

    /// Classification used for quoting decisions.
    pub class: ColumnClass,
}

impl ColumnDescriptor {
    /// Creates a new column descriptor.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, class: ColumnClass) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            class,
        }
    }
}

/// A fully materialized query result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Column metadata, in result order.
    pub columns: Vec<ColumnDescriptor>,

    /// Normalized rows, in cursor order.
    pub rows: Vec<Row>,
}

impl ResultSet {
    /// Creates a new empty result set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a result set with the given columns and no rows.
    pub fn with_columns(columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Returns the column names in result order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Returns true if the result set has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
