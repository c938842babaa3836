//! Result column set built up while a mutate call runs.

use crate::access::Column;

/// Pending output for one name
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Column(Column),
    /// The column is to be dropped from the output
    Removed,
}

/// Ordered mapping from output name to its pending value or removal marker.
///
/// Setting a name that already exists replaces the entry in place, so the
/// first position of a name wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultColumns {
    entries: Vec<(String, Slot)>,
}

impl ResultColumns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, slot: Slot) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = slot,
            None => self.entries.push((name.to_string(), slot)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Slot> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, slot)| slot)
    }

    /// Computed columns in insertion order, skipping removal markers
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.entries.iter().filter_map(|(n, slot)| match slot {
            Slot::Column(column) => Some((n.as_str(), column)),
            Slot::Removed => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_in_place() {
        let mut results = ResultColumns::new();
        results.set("a", Slot::Column(Column::int32([1])));
        results.set("b", Slot::Column(Column::int32([2])));
        results.set("a", Slot::Column(Column::int32([3])));

        let names: Vec<&str> = results.columns().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(results.get("a"), Some(&Slot::Column(Column::int32([3]))));
    }

    #[test]
    fn test_removal_marker() {
        let mut results = ResultColumns::new();
        results.set("a", Slot::Column(Column::int32([1])));
        results.set("a", Slot::Removed);
        results.set("b", Slot::Column(Column::int32([2])));

        assert_eq!(results.get("a"), Some(&Slot::Removed));
        assert_eq!(results.get("c"), None);

        let columns: Vec<&str> = results.columns().map(|(n, _)| n).collect();
        assert_eq!(columns, vec!["b"]);
    }
}
