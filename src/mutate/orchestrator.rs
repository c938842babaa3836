//! Mutate orchestrator.
//!
//! Runs the expressions of one call in declaration order. Each result is
//! recorded in the result column set and in the cache, so later expressions
//! see it. Finalizing applies the retention policy and column placement.

use crate::access::{Column, Datum, Table};
use crate::mutate::combine::{check_chunk_sizes, combine, Combined, CombinedColumn};
use crate::mutate::evaluator::{evaluate_all_groups, NamedExpression};
use crate::mutate::{
    ChunkCache, GroupLabel, MutateError, MutateOptions, MutateResult, MutateWarning, PartitionMode,
    Placement, ResultColumns, Retention, RowPartition, Slot,
};
use log::{debug, warn};

/// Output of a successful mutate call
#[derive(Debug, Clone, PartialEq)]
pub struct MutateOutput {
    /// The new table; same row count and grouping as the input
    pub table: Table,
    /// Whether each source or created column was referenced, in table then
    /// creation order
    pub usage: Vec<(String, bool)>,
    /// Non-fatal warnings raised while evaluating
    pub warnings: Vec<MutateWarning>,
}

impl MutateOutput {
    /// Source or created columns referenced by at least one expression
    pub fn used_columns(&self) -> Vec<&str> {
        self.usage
            .iter()
            .filter(|(_, used)| *used)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Columns no expression referenced
    pub fn unused_columns(&self) -> Vec<&str> {
        self.usage
            .iter()
            .filter(|(_, used)| !*used)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// State of one in-flight mutate call
pub(crate) struct Orchestrator<'a> {
    table: &'a Table,
    partition: &'a RowPartition,
    cache: ChunkCache<'a>,
    results: ResultColumns,
    warnings: Vec<MutateWarning>,
}

impl<'a> Orchestrator<'a> {
    pub(crate) fn new(table: &'a Table, partition: &'a RowPartition) -> Self {
        Self {
            table,
            partition,
            cache: ChunkCache::new(table, partition),
            results: ResultColumns::new(),
            warnings: Vec::new(),
        }
    }

    /// Evaluate and record one expression
    pub(crate) fn process(&mut self, named: &NamedExpression) -> MutateResult<()> {
        let display = named.to_string();
        let chunks = match self.fast_path(named, &display)? {
            Some(chunks) => chunks,
            None => {
                debug!(
                    "Evaluating `{}` over {} group(s)",
                    display,
                    self.partition.n_groups()
                );
                evaluate_all_groups(&display, named.expr(), &self.cache, &mut self.warnings)?
            }
        };

        match combine(&display, chunks, self.partition)? {
            Combined::Removed => self.record_removal(named, &display),
            Combined::Column(combined) => {
                self.record(&named.output_name(), combined);
            }
            Combined::Frame(columns) => {
                for (column_name, combined) in columns {
                    let name = match named.name() {
                        Some(prefix) => format!("{}.{}", prefix, column_name),
                        None => column_name,
                    };
                    self.record(&name, combined);
                }
            }
        }

        self.cache.reset_memo();
        Ok(())
    }

    /// Reuse cached chunks when the expression is a bare column reference
    fn fast_path(
        &self,
        named: &NamedExpression,
        display: &str,
    ) -> MutateResult<Option<Vec<Datum>>> {
        let Some(name) = named.expr().column_name() else {
            return Ok(None);
        };
        let Some(chunks) = self.cache.resolve(name) else {
            return Ok(None);
        };

        debug!("Reusing cached chunks of `{}` for `{}`", name, display);
        self.cache.used(name);
        if self.partition.mode() == PartitionMode::Rowwise {
            check_chunk_sizes(display, &chunks, self.partition)?;
        }
        Ok(Some(chunks.iter().cloned().map(Datum::Vector).collect()))
    }

    fn record(&mut self, name: &str, combined: CombinedColumn) {
        let CombinedColumn { column, chunks } = combined;
        self.results.set(name, Slot::Column(column));
        self.cache.add(name, chunks);
    }

    fn record_removal(&mut self, named: &NamedExpression, display: &str) {
        // NULL without a name removes nothing
        let Some(name) = named.name() else {
            return;
        };

        if self.table.is_group_var(name) {
            let warning = MutateWarning {
                expression: display.to_string(),
                group: GroupLabel::Whole,
                message: format!("can't remove grouping column `{}`; it is kept", name),
            };
            warn!("{}", warning);
            self.warnings.push(warning);
            return;
        }

        self.results.set(name, Slot::Removed);
        self.cache.remove(name);
    }

    /// Apply retention and placement and build the output table
    pub(crate) fn finalize(self, options: &MutateOptions) -> MutateResult<MutateOutput> {
        let usage = self.cache.used_map();
        let table = self.table;

        // Anchors resolve against the source order, so an anchor dropped by
        // retention still places new columns where it used to be
        let anchor = match &options.placement {
            Placement::Default => None,
            Placement::Before(anchor) => Some((Self::anchor_position(table, anchor)?, false)),
            Placement::After(anchor) => Some((Self::anchor_position(table, anchor)?, true)),
        };

        let mut kept: Vec<(String, Column)> = Vec::new();
        let mut added: Vec<(String, Column)> = Vec::new();
        let mut insert_at = 0;

        for (position, (name, source)) in table.columns().enumerate() {
            let before_anchor = match anchor {
                None => true,
                Some((at, after)) => position < at || (after && position == at),
            };
            let n_kept = kept.len();

            let keep_source = table.is_group_var(name)
                || match options.keep {
                    Retention::All => true,
                    Retention::Used => self.cache.is_used(name),
                    Retention::Unused => !self.cache.is_used(name),
                    Retention::None => false,
                };

            match self.results.get(name) {
                Some(Slot::Removed) => {}
                Some(Slot::Column(column)) => {
                    if keep_source || options.keep != Retention::None {
                        kept.push((name.to_string(), column.clone()));
                    }
                }
                None if keep_source => kept.push((name.to_string(), source.clone())),
                None => {}
            }
            if before_anchor {
                insert_at += kept.len() - n_kept;
            }
        }

        for (name, column) in self.results.columns() {
            if !kept.iter().any(|(n, _)| n == name) {
                added.push((name.to_string(), column.clone()));
            }
        }

        let tail = kept.split_off(insert_at);
        kept.extend(added);
        kept.extend(tail);

        debug!(
            "Mutate finished with {} column(s): {:?}",
            kept.len(),
            kept.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>()
        );

        let (names, columns): (Vec<String>, Vec<Column>) = kept.into_iter().unzip();
        Ok(MutateOutput {
            table: Table::from_parts(
                names,
                columns,
                table.n_rows(),
                table.grouping().clone(),
            ),
            usage,
            warnings: self.warnings,
        })
    }

    fn anchor_position(table: &Table, anchor: &str) -> MutateResult<usize> {
        table
            .column_names()
            .iter()
            .position(|n| n == anchor)
            .ok_or_else(|| MutateError::UnknownColumn(anchor.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{Column, Value};
    use crate::mutate::{FnExpression, GroupContext};
    use anyhow::Result;

    fn constant(label: &str, value: i32) -> NamedExpression {
        NamedExpression::named(
            label,
            FnExpression::new(label.to_string(), move |_: &GroupContext<'_>| {
                Ok(Datum::from(Column::int32([value])))
            }),
        )
    }

    #[test]
    fn test_duplicate_name_replaces_pending_column() -> Result<()> {
        let table = Table::new(vec![("x".to_string(), Column::int32([1, 2]))])?;
        let partition = RowPartition::from_table(&table)?;
        let mut orchestrator = Orchestrator::new(&table, &partition);

        orchestrator.process(&constant("a", 1))?;
        orchestrator.process(&constant("b", 2))?;
        orchestrator.process(&constant("a", 3))?;
        let output = orchestrator.finalize(&MutateOptions::default())?;

        assert_eq!(output.table.column_names(), &["x", "a", "b"]);
        assert_eq!(output.table.column("a"), Some(&Column::int32([3, 3])));
        Ok(())
    }

    #[test]
    fn test_unknown_anchor_fails() -> Result<()> {
        let table = Table::new(vec![("x".to_string(), Column::int32([1]))])?;
        let partition = RowPartition::from_table(&table)?;
        let mut orchestrator = Orchestrator::new(&table, &partition);
        orchestrator.process(&constant("a", 1))?;

        let result = orchestrator.finalize(&MutateOptions::new().before("missing"));
        assert!(matches!(result, Err(MutateError::UnknownColumn(name)) if name == "missing"));
        Ok(())
    }

    #[test]
    fn test_anchor_dropped_by_retention() -> Result<()> {
        let table = Table::new(vec![
            ("x".to_string(), Column::int32([1])),
            ("y".to_string(), Column::int32([2])),
            ("z".to_string(), Column::int32([3])),
        ])?;
        let partition = RowPartition::from_table(&table)?;

        let mut orchestrator = Orchestrator::new(&table, &partition);
        orchestrator.process(&constant("a", 1))?;
        let options = MutateOptions::new().keep(Retention::None).after("y");
        let output = orchestrator.finalize(&options)?;
        assert_eq!(output.table.column_names(), &["a"]);

        let mut orchestrator = Orchestrator::new(&table, &partition);
        orchestrator.process(&constant("a", 1))?;
        let options = MutateOptions::new().keep(Retention::Unused).before("z");
        let output = orchestrator.finalize(&options)?;
        assert_eq!(output.table.column_names(), &["x", "y", "a", "z"]);
        Ok(())
    }

    #[test]
    fn test_removing_grouping_column_is_ignored() -> Result<()> {
        let table = Table::new(vec![
            ("g".to_string(), Column::int32([1, 2])),
            ("x".to_string(), Column::int32([1, 2])),
        ])?
        .group_by(&["g"])?;
        let partition = RowPartition::from_table(&table)?;
        let mut orchestrator = Orchestrator::new(&table, &partition);

        let remove_g = NamedExpression::named(
            "g",
            FnExpression::new("NULL", |_: &GroupContext<'_>| Ok(Datum::Null)),
        );
        orchestrator.process(&remove_g)?;
        let output = orchestrator.finalize(&MutateOptions::default())?;

        assert_eq!(output.table.column_names(), &["g", "x"]);
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(
            output.table.row(1),
            Some(vec![Value::Int32(2), Value::Int32(2)])
        );
        Ok(())
    }
}
