//! Access layer for column-oriented data.
//!
//! This module provides the data model the mutate engine works on:
//!
//! - **Value**: Type-safe representation of a single cell
//! - **DataType**: Element types and the rules for combining them
//! - **Column**: A typed vector of values
//! - **Table**: Named columns of equal length plus grouping metadata
//! - **Datum**: The shape of one per-group evaluation result

pub mod column;
pub mod datum;
pub mod table;
pub mod value;

pub use column::Column;
pub use datum::Datum;
pub use table::{Grouping, Table};
pub use value::{DataType, Value};
