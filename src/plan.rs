//! JSON documents for driving `mutate` from outside Rust: an input table
//! with its grouping, and a plan of named expressions plus options.

use crate::access::{Column, DataType, Grouping, Table, Value};
use crate::expression::Expression;
use crate::mutate::{self, MutateOptions, MutateOutput, MutateResult, NamedExpression};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn load_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file {}", what, path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {} file {}", what, path.display()))
}

/// One column of a [`TableDocument`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default)]
    pub values: Vec<Value>,
}

/// Serialized form of a [`Table`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDocument {
    pub columns: Vec<ColumnDocument>,
    /// Grouping columns, or row identifier columns when `rowwise` is set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<String>,
    #[serde(default)]
    pub rowwise: bool,
    /// Row count of a table without columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_rows: Option<usize>,
}

impl TableDocument {
    pub fn load(path: &Path) -> Result<Self> {
        load_json(path, "table")
    }

    /// Build the table, checking every value against its column type
    pub fn into_table(self) -> Result<Table> {
        let mut columns = Vec::with_capacity(self.columns.len());
        for doc in self.columns {
            let column = Column::new(doc.data_type, doc.values)
                .with_context(|| format!("Invalid values in column '{}'", doc.name))?;
            columns.push((doc.name, column));
        }

        let table = match self.n_rows {
            Some(n_rows) => Table::with_row_count(n_rows, columns)?,
            None => Table::new(columns)?,
        };

        if self.rowwise {
            table.rowwise(&self.group_by)
        } else if self.group_by.is_empty() {
            Ok(table)
        } else {
            table.group_by(&self.group_by)
        }
    }

    pub fn from_table(table: &Table) -> Self {
        let columns = table
            .columns()
            .map(|(name, column)| ColumnDocument {
                name: name.to_string(),
                data_type: column.data_type(),
                values: column.values().to_vec(),
            })
            .collect();

        Self {
            columns,
            group_by: table.group_vars().to_vec(),
            rowwise: matches!(table.grouping(), Grouping::Rowwise(_)),
            n_rows: (table.n_columns() == 0).then_some(table.n_rows()),
        }
    }
}

/// One expression of a [`MutatePlan`]; unnamed entries splice frames or
/// are dropped when they evaluate to NULL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub expr: Expression,
}

/// Ordered expressions plus the options of one mutate call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutatePlan {
    pub expressions: Vec<PlanEntry>,
    #[serde(flatten)]
    pub options: MutateOptions,
}

impl MutatePlan {
    pub fn load(path: &Path) -> Result<Self> {
        load_json(path, "plan")
    }

    pub fn named_expressions(&self) -> Vec<NamedExpression> {
        self.expressions
            .iter()
            .map(|entry| match &entry.name {
                Some(name) => NamedExpression::named(name.clone(), entry.expr.clone()),
                None => NamedExpression::unnamed(entry.expr.clone()),
            })
            .collect()
    }

    /// Run the plan against `table`
    pub fn apply(&self, table: &Table) -> MutateResult<MutateOutput> {
        mutate::mutate(table, &self.named_expressions(), &self.options)
    }
}

/// What the command line tool prints for a finished mutate call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutateReport {
    pub table: TableDocument,
    pub used: Vec<String>,
    pub unused: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl From<&MutateOutput> for MutateReport {
    fn from(output: &MutateOutput) -> Self {
        Self {
            table: TableDocument::from_table(&output.table),
            used: output.used_columns().into_iter().map(String::from).collect(),
            unused: output
                .unused_columns()
                .into_iter()
                .map(String::from)
                .collect(),
            warnings: output.warnings.iter().map(|w| w.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutate::{Placement, Retention};

    const TABLE: &str = r#"{
        "columns": [
            {"name": "g", "type": "varchar", "values": ["A", "B", "A"]},
            {"name": "x", "type": "float64", "values": [1, 2.5, 3]}
        ],
        "group_by": ["g"]
    }"#;

    #[test]
    fn test_table_document() -> Result<()> {
        let doc: TableDocument = serde_json::from_str(TABLE)?;
        let table = doc.into_table()?;
        assert_eq!(table.group_vars(), &["g"]);
        assert_eq!(
            table.column("x"),
            Some(&Column::float64([1.0, 2.5, 3.0]))
        );

        let doc = TableDocument::from_table(&table);
        assert_eq!(doc.group_by, vec!["g"]);
        assert!(!doc.rowwise);
        assert_eq!(doc.n_rows, None);
        assert_eq!(doc.into_table()?, table);
        Ok(())
    }

    #[test]
    fn test_table_document_rejects_bad_values() {
        let doc: TableDocument = serde_json::from_str(
            r#"{"columns": [{"name": "x", "type": "int32", "values": [1, "a"]}]}"#,
        )
        .expect("valid json");
        let err = doc.into_table().unwrap_err();
        assert!(err.to_string().contains("Invalid values in column 'x'"));
    }

    #[test]
    fn test_empty_table_keeps_row_count() -> Result<()> {
        let doc: TableDocument = serde_json::from_str(r#"{"columns": [], "n_rows": 4}"#)?;
        let table = doc.into_table()?;
        assert_eq!(table.n_rows(), 4);
        assert_eq!(TableDocument::from_table(&table).n_rows, Some(4));
        Ok(())
    }

    #[test]
    fn test_plan_document() -> Result<()> {
        let plan: MutatePlan = serde_json::from_str(
            r#"{
                "expressions": [
                    {"name": "m", "expr": {"function_call": {"name": "mean", "args": [{"column": "x"}]}}},
                    {"expr": {"literal": null}}
                ],
                "keep": "used",
                "placement": {"after": "g"}
            }"#,
        )?;
        assert_eq!(plan.options.keep, Retention::Used);
        assert_eq!(plan.options.placement, Placement::After("g".to_string()));

        let named = plan.named_expressions();
        assert_eq!(named[0].name(), Some("m"));
        assert_eq!(named[1].name(), None);
        Ok(())
    }

    #[test]
    fn test_plan_defaults() -> Result<()> {
        let plan: MutatePlan = serde_json::from_str(r#"{"expressions": []}"#)?;
        assert_eq!(plan.options, MutateOptions::default());
        Ok(())
    }

    #[test]
    fn test_apply_and_report() -> Result<()> {
        let table: TableDocument = serde_json::from_str(TABLE)?;
        let table = table.into_table()?;
        let plan: MutatePlan = serde_json::from_str(
            r#"{"expressions": [
                {"name": "m", "expr": {"function_call": {"name": "mean", "args": [{"column": "x"}]}}}
            ]}"#,
        )?;

        let output = plan.apply(&table)?;
        assert_eq!(
            output.table.column("m"),
            Some(&Column::float64([2.0, 2.5, 2.0]))
        );

        let report = MutateReport::from(&output);
        assert_eq!(report.used, vec!["x"]);
        assert_eq!(report.unused, vec!["g", "m"]);
        assert!(report.warnings.is_empty());
        Ok(())
    }
}
