//! Column-computation engine behind `mutate`.
//!
//! A mutate call evaluates named expressions once per group, in declaration
//! order, and returns a table with the same rows and a new column set:
//!
//! - **RowPartition**: which rows belong to which group
//! - **ChunkCache**: one chunk per group for every referenced or created column
//! - **GroupExpression**: the evaluator boundary, called once per group
//! - **combine**: reassembles per-group chunks into full-length columns
//! - **Orchestrator**: threads results between expressions and applies the
//!   retention policy at the end

pub mod cache;
pub mod combine;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod options;
pub mod orchestrator;
pub mod partition;
pub mod result;

pub use cache::{ChunkCache, ChunkList};
pub use combine::{combine, Combined, CombinedColumn};
pub use context::{Diagnostics, GroupContext, MutateWarning};
pub use error::{MutateError, MutateResult};
pub use evaluator::{evaluate_all_groups, FnExpression, GroupExpression, NamedExpression};
pub use options::{MutateOptions, Placement, Retention};
pub use orchestrator::MutateOutput;
pub use partition::{Group, GroupLabel, PartitionMode, RowPartition};
pub use result::{ResultColumns, Slot};

use crate::access::Table;
use log::debug;
use orchestrator::Orchestrator;

/// Compute new columns from `expressions` and return the resulting table.
///
/// Fails without producing a partial table if any expression fails for any
/// group or its results can't be combined into one column.
pub fn mutate(
    table: &Table,
    expressions: &[NamedExpression],
    options: &MutateOptions,
) -> MutateResult<MutateOutput> {
    let partition = RowPartition::from_table(table)?;
    debug!(
        "Mutating {} row(s) in {} group(s) with {} expression(s)",
        table.n_rows(),
        partition.n_groups(),
        expressions.len()
    );

    let mut orchestrator = Orchestrator::new(table, &partition);
    for named in expressions {
        orchestrator.process(named)?;
    }
    orchestrator.finalize(options)
}

/// `mutate` that keeps only grouping columns and the computed ones
pub fn transmute(table: &Table, expressions: &[NamedExpression]) -> MutateResult<MutateOutput> {
    mutate(
        table,
        expressions,
        &MutateOptions::new().keep(Retention::None),
    )
}
