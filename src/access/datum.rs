//! The shape of one per-group evaluation result.

use crate::access::{Column, Table};

/// Result of evaluating an expression against one group
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    /// No value; a named NULL result removes the column
    Null,
    /// A vector of values
    Vector(Column),
    /// A multi-column composite whose columns are spliced into the output
    Frame(Table),
    /// Any other value; carries a description of its type
    Object(String),
}

impl Datum {
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Number of rows the result would occupy, if it is column-shaped
    pub fn size(&self) -> Option<usize> {
        match self {
            Datum::Vector(column) => Some(column.len()),
            Datum::Frame(table) => Some(table.n_rows()),
            Datum::Null | Datum::Object(_) => None,
        }
    }

    /// Human-readable type description for diagnostics
    pub fn type_name(&self) -> String {
        match self {
            Datum::Null => "NULL".to_string(),
            Datum::Vector(column) => column.data_type().to_string(),
            Datum::Frame(table) => format!("frame<{}>", table.column_names().join(", ")),
            Datum::Object(description) => description.clone(),
        }
    }
}

impl From<Column> for Datum {
    fn from(column: Column) -> Self {
        Datum::Vector(column)
    }
}

impl From<Table> for Datum {
    fn from(table: Table) -> Self {
        Datum::Frame(table)
    }
}
