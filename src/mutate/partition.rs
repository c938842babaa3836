//! Row partition index.
//!
//! Maps every group to the ordered row positions it owns. Built once per
//! mutate call from the table's grouping metadata and never changed after.

use crate::access::{Grouping, Table, Value};
use crate::mutate::MutateError;
use std::cmp::Ordering;
use std::fmt;

/// How the partition was derived from the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionMode {
    /// A single group covering every row in original order
    Ungrouped,
    /// One group per distinct key of the grouping columns
    Grouped,
    /// One group per row
    Rowwise,
}

/// Identity of a group, used to attribute errors and warnings
#[derive(Debug, Clone, PartialEq)]
pub enum GroupLabel {
    Whole,
    Keys {
        index: usize,
        keys: Vec<(String, Value)>,
    },
    Row {
        index: usize,
        keys: Vec<(String, Value)>,
    },
}

impl GroupLabel {
    /// Zero-based position of the group in partition order
    pub fn index(&self) -> usize {
        match self {
            GroupLabel::Whole => 0,
            GroupLabel::Keys { index, .. } | GroupLabel::Row { index, .. } => *index,
        }
    }
}

fn write_keys(f: &mut fmt::Formatter<'_>, keys: &[(String, Value)]) -> fmt::Result {
    for (i, (name, value)) in keys.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{} = {}", name, value)?;
    }
    Ok(())
}

impl fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupLabel::Whole => write!(f, "ungrouped data"),
            GroupLabel::Keys { index, keys } => {
                write!(f, "group {}: ", index + 1)?;
                write_keys(f, keys)
            }
            GroupLabel::Row { index, keys } => {
                write!(f, "row {}", index + 1)?;
                if !keys.is_empty() {
                    write!(f, ": ")?;
                    write_keys(f, keys)?;
                }
                Ok(())
            }
        }
    }
}

/// One group: its row positions and its label
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    rows: Vec<usize>,
    label: GroupLabel,
}

impl Group {
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn label(&self) -> &GroupLabel {
        &self.label
    }
}

/// Ordered groups that together cover every row exactly once
#[derive(Debug, Clone, PartialEq)]
pub struct RowPartition {
    groups: Vec<Group>,
    n_rows: usize,
    mode: PartitionMode,
}

impl RowPartition {
    /// Single group spanning all rows
    pub fn ungrouped(n_rows: usize) -> Self {
        Self {
            groups: vec![Group {
                rows: (0..n_rows).collect(),
                label: GroupLabel::Whole,
            }],
            n_rows,
            mode: PartitionMode::Ungrouped,
        }
    }

    /// Build the partition described by the table's grouping metadata
    pub fn from_table(table: &Table) -> Result<Self, MutateError> {
        let n_rows = table.n_rows();
        match table.grouping() {
            Grouping::Ungrouped => Ok(Self::ungrouped(n_rows)),
            Grouping::GroupedBy(vars) => Self::grouped(table, vars),
            Grouping::Rowwise(vars) => Self::rowwise(table, vars),
        }
    }

    fn key_columns<'t>(
        table: &'t Table,
        vars: &'t [String],
    ) -> Result<Vec<(&'t str, &'t [Value])>, MutateError> {
        vars.iter()
            .map(|var| {
                table
                    .column(var)
                    .map(|c| (var.as_str(), c.values()))
                    .ok_or_else(|| MutateError::UnknownColumn(var.clone()))
            })
            .collect()
    }

    fn key_of(key_columns: &[(&str, &[Value])], row: usize) -> Vec<(String, Value)> {
        key_columns
            .iter()
            .map(|(name, values)| (name.to_string(), values[row].clone()))
            .collect()
    }

    fn grouped(table: &Table, vars: &[String]) -> Result<Self, MutateError> {
        let n_rows = table.n_rows();
        if n_rows == 0 {
            return Ok(Self {
                mode: PartitionMode::Grouped,
                ..Self::ungrouped(0)
            });
        }

        let key_columns = Self::key_columns(table, vars)?;
        let compare = |a: usize, b: usize| -> Ordering {
            for (_, values) in &key_columns {
                let ord = values[a].total_cmp(&values[b]);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        };

        // Stable sort keeps original row order inside each group
        let mut order: Vec<usize> = (0..n_rows).collect();
        order.sort_by(|&a, &b| compare(a, b));

        let mut groups: Vec<Group> = Vec::new();
        for row in order {
            match groups.last_mut() {
                Some(group) if compare(group.rows[0], row) == Ordering::Equal => {
                    group.rows.push(row);
                }
                _ => {
                    let index = groups.len();
                    groups.push(Group {
                        rows: vec![row],
                        label: GroupLabel::Keys {
                            index,
                            keys: Self::key_of(&key_columns, row),
                        },
                    });
                }
            }
        }

        Ok(Self {
            groups,
            n_rows,
            mode: PartitionMode::Grouped,
        })
    }

    fn rowwise(table: &Table, vars: &[String]) -> Result<Self, MutateError> {
        let n_rows = table.n_rows();
        if n_rows == 0 {
            return Ok(Self {
                mode: PartitionMode::Rowwise,
                ..Self::ungrouped(0)
            });
        }

        let key_columns = Self::key_columns(table, vars)?;
        let groups = (0..n_rows)
            .map(|row| Group {
                rows: vec![row],
                label: GroupLabel::Row {
                    index: row,
                    keys: Self::key_of(&key_columns, row),
                },
            })
            .collect();

        Ok(Self {
            groups,
            n_rows,
            mode: PartitionMode::Rowwise,
        })
    }

    /// Groups in partition order
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Row positions of each group, in partition order
    pub fn rows(&self) -> impl Iterator<Item = &[usize]> {
        self.groups.iter().map(Group::rows)
    }

    pub fn n_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn mode(&self) -> PartitionMode {
        self.mode
    }

    /// True when one group holds every row in original order
    pub fn is_single_group(&self) -> bool {
        self.groups.len() == 1
    }
}
