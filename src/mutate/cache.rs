//! Group-scoped value cache.
//!
//! Holds one chunk per group for every column referenced or created during a
//! single mutate call. Source columns are sliced lazily on first reference,
//! so a bare column name costs one lookup per group instead of a
//! re-evaluation. The cache also records which names were referenced and
//! owns the per-expression memo layer.

use crate::access::{Column, DataType, Table, Value};
use crate::expression::ExpressionResult;
use crate::mutate::{PartitionMode, RowPartition};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Per-group chunks of one column, in partition order
pub type ChunkList = Rc<[Column]>;

pub struct ChunkCache<'a> {
    table: &'a Table,
    partition: &'a RowPartition,
    chunks: RefCell<HashMap<String, ChunkList>>,
    /// Names removed during this call; hides the source column of that name
    removed: RefCell<HashSet<String>>,
    used: RefCell<HashSet<String>>,
    /// Names added that are not source columns, in creation order
    created: RefCell<Vec<String>>,
    memo: RefCell<HashMap<(usize, String), Column>>,
}

impl<'a> ChunkCache<'a> {
    pub fn new(table: &'a Table, partition: &'a RowPartition) -> Self {
        Self {
            table,
            partition,
            chunks: RefCell::new(HashMap::new()),
            removed: RefCell::new(HashSet::new()),
            used: RefCell::new(HashSet::new()),
            created: RefCell::new(Vec::new()),
            memo: RefCell::new(HashMap::new()),
        }
    }

    pub fn partition(&self) -> &RowPartition {
        self.partition
    }

    /// Chunk list for `name`, slicing the source column on first use.
    ///
    /// Returns `None` when no column of that name is visible.
    pub fn resolve(&self, name: &str) -> Option<ChunkList> {
        if let Some(chunks) = self.chunks.borrow().get(name) {
            return Some(Rc::clone(chunks));
        }
        if self.removed.borrow().contains(name) {
            return None;
        }

        let column = self.table.column(name)?;
        let chunks: ChunkList = self.slice_source(column).into();
        self.chunks
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&chunks));
        Some(chunks)
    }

    fn slice_source(&self, column: &Column) -> Vec<Column> {
        match self.partition.mode() {
            PartitionMode::Ungrouped => vec![column.clone()],
            PartitionMode::Rowwise if column.data_type() == DataType::List => self
                .partition
                .rows()
                .map(|rows| match rows.first().map(|&row| &column.values()[row]) {
                    Some(Value::List(items)) => Column::from_list_element(items.clone()),
                    Some(_) => Column::from_list_element(Vec::new()),
                    // Empty group of an empty table
                    None => column.take(rows),
                })
                .collect(),
            _ => self.partition.rows().map(|rows| column.take(rows)).collect(),
        }
    }

    /// Store the chunk list for `name`, replacing any previous one
    pub fn add(&self, name: &str, chunks: Vec<Column>) {
        debug_assert_eq!(chunks.len(), self.partition.n_groups());
        self.chunks
            .borrow_mut()
            .insert(name.to_string(), chunks.into());
        self.removed.borrow_mut().remove(name);

        let mut created = self.created.borrow_mut();
        if !self.table.contains(name) && !created.iter().any(|n| n == name) {
            created.push(name.to_string());
        }
    }

    /// Evict `name` so later expressions can no longer see it
    pub fn remove(&self, name: &str) {
        self.chunks.borrow_mut().remove(name);
        self.removed.borrow_mut().insert(name.to_string());
    }

    /// Record that `name` was referenced while evaluating an expression
    pub fn used(&self, name: &str) {
        self.used.borrow_mut().insert(name.to_string());
    }

    pub fn is_used(&self, name: &str) -> bool {
        self.used.borrow().contains(name)
    }

    /// Usage flag of every source column (table order) and every created
    /// column (creation order)
    pub fn used_map(&self) -> Vec<(String, bool)> {
        let used = self.used.borrow();
        self.table
            .column_names()
            .iter()
            .chain(self.created.borrow().iter())
            .map(|name| (name.clone(), used.contains(name)))
            .collect()
    }

    /// Memoized computation of `key` for one group.
    ///
    /// Entries live until the next [`ChunkCache::reset_memo`].
    pub fn memoize<F>(&self, group: usize, key: &str, compute: F) -> ExpressionResult<Column>
    where
        F: FnOnce() -> ExpressionResult<Column>,
    {
        let memo_key = (group, key.to_string());
        if let Some(column) = self.memo.borrow().get(&memo_key) {
            return Ok(column.clone());
        }
        let column = compute()?;
        self.memo.borrow_mut().insert(memo_key, column.clone());
        Ok(column)
    }

    /// Drop every memoized value; called after each expression
    pub fn reset_memo(&self) {
        self.memo.borrow_mut().clear();
    }
}
