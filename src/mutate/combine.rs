//! Per-group chunk combiner.
//!
//! Turns the ordered-by-group results of one expression into a full-length
//! column, recycling size-1 chunks and scattering each chunk back to the
//! original row positions of its group.

use crate::access::{Column, DataType, Datum, Value};
use crate::mutate::{GroupLabel, MutateError, MutateResult, RowPartition};

/// One column produced by an expression
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedColumn {
    /// Full-length column in original row order
    pub column: Column,
    /// Per-group chunks, recycled to each group's size
    pub chunks: Vec<Column>,
}

/// Outcome of combining the results of one expression
#[derive(Debug, Clone, PartialEq)]
pub enum Combined {
    /// Every group returned NULL
    Removed,
    Column(CombinedColumn),
    /// Every group returned a composite; one entry per sub-column
    Frame(Vec<(String, CombinedColumn)>),
}

/// Combine the per-group results of `expression` into one output
pub fn combine(
    expression: &str,
    chunks: Vec<Datum>,
    partition: &RowPartition,
) -> MutateResult<Combined> {
    debug_assert_eq!(chunks.len(), partition.n_groups());

    let n_null = chunks.iter().filter(|d| d.is_null()).count();
    if n_null == chunks.len() {
        return Ok(Combined::Removed);
    }
    if n_null > 0 {
        return Err(MutateError::MixedNull {
            expression: expression.to_string(),
        });
    }

    let labels: Vec<&GroupLabel> = partition.groups().iter().map(|g| g.label()).collect();
    if let Some(index) = chunks.iter().position(|d| matches!(d, Datum::Object(_))) {
        return Err(MutateError::NotAVector {
            expression: expression.to_string(),
            group: labels[index].clone(),
            type_name: chunks[index].type_name(),
        });
    }

    // Vectors and frames can't be mixed, and frames must agree on columns
    for (index, datum) in chunks.iter().enumerate().skip(1) {
        let first = &chunks[0];
        let same_shape = match (first, datum) {
            (Datum::Vector(_), Datum::Vector(_)) => true,
            (Datum::Frame(a), Datum::Frame(b)) => a.column_names() == b.column_names(),
            _ => false,
        };
        if !same_shape {
            return Err(MutateError::TypeIncompatible {
                expression: expression.to_string(),
                left_type: first.type_name(),
                left_group: labels[0].clone(),
                right_type: datum.type_name(),
                right_group: labels[index].clone(),
            });
        }
    }

    if matches!(chunks[0], Datum::Vector(_)) {
        let vectors = chunks
            .into_iter()
            .filter_map(|d| match d {
                Datum::Vector(column) => Some(column),
                _ => None,
            })
            .collect();
        return combine_vectors(expression, vectors, partition).map(Combined::Column);
    }

    let names: Vec<String> = match &chunks[0] {
        Datum::Frame(table) => table.column_names().to_vec(),
        _ => Vec::new(),
    };
    let mut per_column: Vec<Vec<Column>> = vec![Vec::with_capacity(chunks.len()); names.len()];
    for datum in chunks {
        if let Datum::Frame(table) = datum {
            for (i, (_, column)) in table.into_columns().into_iter().enumerate() {
                per_column[i].push(column);
            }
        }
    }

    let mut columns = Vec::with_capacity(names.len());
    for (name, vectors) in names.into_iter().zip(per_column) {
        let combined = combine_vectors(expression, vectors, partition)?;
        columns.push((name, combined));
    }
    Ok(Combined::Frame(columns))
}

/// Check that every chunk is size 1 or the size of its group
pub fn check_chunk_sizes(
    expression: &str,
    chunks: &[Column],
    partition: &RowPartition,
) -> MutateResult<()> {
    for (chunk, group) in chunks.iter().zip(partition.groups()) {
        if chunk.len() != 1 && chunk.len() != group.len() {
            return Err(MutateError::SizeIncompatible {
                expression: expression.to_string(),
                group: group.label().clone(),
                expected: group.len(),
                actual: chunk.len(),
            });
        }
    }
    Ok(())
}

/// Combine plain vector chunks into one column
pub fn combine_vectors(
    expression: &str,
    chunks: Vec<Column>,
    partition: &RowPartition,
) -> MutateResult<CombinedColumn> {
    check_chunk_sizes(expression, &chunks, partition)?;
    let groups = partition.groups();

    // Common element type, remembering which group introduced it. A chunk
    // holding only NULLs is a placeholder and takes the type of the others.
    let mut common: Option<(DataType, usize)> = None;
    for (index, chunk) in chunks.iter().enumerate() {
        if !chunk.is_empty() && chunk.values().iter().all(Value::is_null) {
            continue;
        }
        common = match common {
            None => Some((chunk.data_type(), index)),
            Some((data_type, origin)) => match data_type.common_type(chunk.data_type()) {
                Some(widened) => Some((widened, origin)),
                None => {
                    return Err(MutateError::TypeIncompatible {
                        expression: expression.to_string(),
                        left_type: data_type.to_string(),
                        left_group: groups[origin].label().clone(),
                        right_type: chunk.data_type().to_string(),
                        right_group: groups[index].label().clone(),
                    });
                }
            },
        };
    }
    let data_type = match common {
        Some((data_type, _)) => data_type,
        None => chunks.first().map_or(DataType::List, Column::data_type),
    };

    let mut recycled = Vec::with_capacity(chunks.len());
    for (chunk, group) in chunks.into_iter().zip(groups) {
        let chunk_type = chunk.data_type();
        let chunk = chunk
            .recycle(group.len())
            .cast(data_type)
            .ok_or_else(|| MutateError::TypeIncompatible {
                expression: expression.to_string(),
                left_type: chunk_type.to_string(),
                left_group: group.label().clone(),
                right_type: data_type.to_string(),
                right_group: group.label().clone(),
            })?;
        recycled.push(chunk);
    }

    let column = if partition.is_single_group() {
        recycled[0].clone()
    } else {
        let mut values = vec![Value::Null; partition.n_rows()];
        for (chunk, rows) in recycled.iter().zip(partition.rows()) {
            for (value, &row) in chunk.values().iter().zip(rows) {
                values[row] = value.clone();
            }
        }
        Column::from_parts(data_type, values)
    };

    Ok(CombinedColumn {
        column,
        chunks: recycled,
    })
}
