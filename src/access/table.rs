//! In-memory tables: named columns of equal length plus grouping metadata.

use crate::access::{Column, Value};
use anyhow::{bail, Result};
use std::collections::HashSet;

/// How the rows of a table are split into evaluation groups
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Grouping {
    /// One group spanning every row
    #[default]
    Ungrouped,
    /// One group per distinct combination of these columns
    GroupedBy(Vec<String>),
    /// One group per row; the listed columns identify rows in diagnostics
    Rowwise(Vec<String>),
}

/// An ordered set of named columns sharing one row count
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
    grouping: Grouping,
}

impl Table {
    /// Create an ungrouped table.
    ///
    /// Fails when a name repeats or the columns differ in length. A table
    /// without columns has zero rows; use [`Table::with_row_count`] for
    /// other counts.
    pub fn new(columns: Vec<(String, Column)>) -> Result<Self> {
        let n_rows = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        Self::with_row_count(n_rows, columns)
    }

    /// Create an ungrouped table with an explicit row count
    pub fn with_row_count(n_rows: usize, columns: Vec<(String, Column)>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut names = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());

        for (name, column) in columns {
            if !seen.insert(name.clone()) {
                bail!("Duplicate column name '{}'", name);
            }
            if column.len() != n_rows {
                bail!(
                    "Column '{}' has {} rows, expected {}",
                    name,
                    column.len(),
                    n_rows
                );
            }
            names.push(name);
            values.push(column);
        }

        Ok(Self {
            names,
            columns: values,
            n_rows,
            grouping: Grouping::Ungrouped,
        })
    }

    /// Assemble a table from parts whose invariants the caller has checked
    pub(crate) fn from_parts(
        names: Vec<String>,
        columns: Vec<Column>,
        n_rows: usize,
        grouping: Grouping,
    ) -> Self {
        debug_assert_eq!(names.len(), columns.len());
        debug_assert!(columns.iter().all(|c| c.len() == n_rows));
        Self {
            names,
            columns,
            n_rows,
            grouping,
        }
    }

    /// Group rows by the given columns
    pub fn group_by<S: AsRef<str>>(mut self, vars: &[S]) -> Result<Self> {
        let vars = self.checked_vars(vars)?;
        self.grouping = if vars.is_empty() {
            Grouping::Ungrouped
        } else {
            Grouping::GroupedBy(vars)
        };
        Ok(self)
    }

    /// Put each row in its own group
    pub fn rowwise<S: AsRef<str>>(mut self, id_vars: &[S]) -> Result<Self> {
        let vars = self.checked_vars(id_vars)?;
        self.grouping = Grouping::Rowwise(vars);
        Ok(self)
    }

    fn checked_vars<S: AsRef<str>>(&self, vars: &[S]) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(vars.len());
        for var in vars {
            let var = var.as_ref();
            if !self.contains(var) {
                bail!("Grouping column '{}' does not exist", var);
            }
            if !out.iter().any(|v: &String| v == var) {
                out.push(var.to_string());
            }
        }
        Ok(out)
    }

    pub fn grouping(&self) -> &Grouping {
        &self.grouping
    }

    /// Columns that define or label the groups
    pub fn group_vars(&self) -> &[String] {
        match &self.grouping {
            Grouping::Ungrouped => &[],
            Grouping::GroupedBy(vars) | Grouping::Rowwise(vars) => vars,
        }
    }

    pub fn is_group_var(&self, name: &str) -> bool {
        self.group_vars().iter().any(|v| v == name)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Get a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }

    /// Iterate over `(name, column)` pairs in table order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter())
    }

    pub fn into_columns(self) -> Vec<(String, Column)> {
        self.names.into_iter().zip(self.columns).collect()
    }

    /// Values of one row, in column order
    pub fn row(&self, index: usize) -> Option<Vec<Value>> {
        if index >= self.n_rows {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|c| c.values()[index].clone())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Result<Table> {
        Table::new(vec![
            ("g".to_string(), Column::varchar(["A", "A", "B"])),
            ("x".to_string(), Column::int32([1, 2, 10])),
        ])
    }

    #[test]
    fn test_new_validates_shape() {
        let duplicate = Table::new(vec![
            ("x".to_string(), Column::int32([1])),
            ("x".to_string(), Column::int32([2])),
        ]);
        assert!(duplicate.is_err());

        let ragged = Table::new(vec![
            ("x".to_string(), Column::int32([1, 2])),
            ("y".to_string(), Column::int32([2])),
        ]);
        assert!(ragged.is_err());
    }

    #[test]
    fn test_accessors() -> Result<()> {
        let table = sample()?;
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.n_columns(), 2);
        assert_eq!(table.column_names(), &["g".to_string(), "x".to_string()]);
        assert_eq!(table.column("x"), Some(&Column::int32([1, 2, 10])));
        assert!(table.column("missing").is_none());
        assert_eq!(
            table.row(2),
            Some(vec![Value::String("B".to_string()), Value::Int32(10)])
        );
        assert_eq!(table.row(3), None);
        Ok(())
    }

    #[test]
    fn test_group_by() -> Result<()> {
        let table = sample()?.group_by(&["g"])?;
        assert_eq!(table.grouping(), &Grouping::GroupedBy(vec!["g".to_string()]));
        assert!(table.is_group_var("g"));
        assert!(!table.is_group_var("x"));

        assert!(sample()?.group_by(&["nope"]).is_err());
        Ok(())
    }
}
