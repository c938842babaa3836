//! Binding context handed to an expression while it is evaluated for one
//! group, plus the side channel that carries evaluator warnings.

use crate::access::Column;
use crate::expression::ExpressionResult;
use crate::mutate::{ChunkCache, Group, GroupLabel};
use std::cell::RefCell;
use std::fmt;

/// Warning sink an evaluator writes to while evaluating one group
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: RefCell<Vec<String>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, message: String) {
        self.warnings.borrow_mut().push(message);
    }

    /// Take every pending warning
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.warnings.borrow_mut())
    }
}

/// A non-fatal evaluator warning, re-attributed to its expression and group
#[derive(Debug, Clone, PartialEq)]
pub struct MutateWarning {
    pub expression: String,
    pub group: GroupLabel,
    pub message: String,
}

impl fmt::Display for MutateWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "In `{}` ({}): {}",
            self.expression, self.group, self.message
        )
    }
}

/// Everything an expression can see while evaluated for one group
pub struct GroupContext<'c> {
    cache: &'c ChunkCache<'c>,
    group: &'c Group,
    index: usize,
    diagnostics: &'c Diagnostics,
}

impl<'c> GroupContext<'c> {
    pub fn new(
        cache: &'c ChunkCache<'c>,
        group: &'c Group,
        index: usize,
        diagnostics: &'c Diagnostics,
    ) -> Self {
        Self {
            cache,
            group,
            index,
            diagnostics,
        }
    }

    /// The group's slice of a source or previously created column.
    ///
    /// Marks the name as used.
    pub fn column(&self, name: &str) -> Option<Column> {
        let chunks = self.cache.resolve(name)?;
        self.cache.used(name);
        Some(chunks[self.index].clone())
    }

    /// Number of rows in the group
    pub fn group_size(&self) -> usize {
        self.group.len()
    }

    /// Zero-based position of the group in partition order
    pub fn group_index(&self) -> usize {
        self.index
    }

    pub fn group_label(&self) -> &GroupLabel {
        self.group.label()
    }

    /// Raise a non-fatal warning; evaluation continues
    pub fn warn(&self, message: impl Into<String>) {
        self.diagnostics.push(message.into());
    }

    /// Compute `key` once per group until the current expression finishes
    pub fn memoize<F>(&self, key: &str, compute: F) -> ExpressionResult<Column>
    where
        F: FnOnce() -> ExpressionResult<Column>,
    {
        self.cache.memoize(self.index, key, compute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Table;
    use crate::mutate::RowPartition;
    use anyhow::Result;

    #[test]
    fn test_column_marks_used() -> Result<()> {
        let table = Table::new(vec![
            ("g".to_string(), Column::int32([1, 2, 1])),
            ("x".to_string(), Column::int32([5, 6, 7])),
        ])?
        .group_by(&["g"])?;
        let partition = RowPartition::from_table(&table)?;
        let cache = ChunkCache::new(&table, &partition);
        let diagnostics = Diagnostics::new();

        let ctx = GroupContext::new(&cache, &partition.groups()[0], 0, &diagnostics);
        assert_eq!(ctx.column("x"), Some(Column::int32([5, 7])));
        assert_eq!(ctx.group_size(), 2);
        assert!(ctx.column("nope").is_none());

        assert!(cache.is_used("x"));
        assert!(!cache.is_used("nope"));
        Ok(())
    }

    #[test]
    fn test_warnings_drain() {
        let diagnostics = Diagnostics::new();
        diagnostics.push("first".to_string());
        diagnostics.push("second".to_string());
        assert_eq!(diagnostics.drain(), vec!["first", "second"]);
        assert!(diagnostics.drain().is_empty());
    }

    #[test]
    fn test_warning_display() {
        let warning = MutateWarning {
            expression: "r = sqrt(x)".to_string(),
            group: GroupLabel::Whole,
            message: "sqrt() of a negative value produced NULL".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "In `r = sqrt(x)` (ungrouped data): sqrt() of a negative value produced NULL"
        );
    }
}
