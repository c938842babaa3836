//! Options of a mutate call: column retention and placement.

use serde::{Deserialize, Serialize};

/// Which source columns survive next to the computed ones.
///
/// Grouping columns are kept under every policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Retention {
    /// Every source column
    #[default]
    All,
    /// Source columns referenced while evaluating
    Used,
    /// Source columns never referenced
    Unused,
    /// No source columns besides grouping columns
    None,
}

/// Where newly added columns go
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Appended at the end, in declaration order
    #[default]
    Default,
    Before(String),
    After(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MutateOptions {
    pub keep: Retention,
    pub placement: Placement,
}

impl MutateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keep(mut self, keep: Retention) -> Self {
        self.keep = keep;
        self
    }

    pub fn before(mut self, anchor: impl Into<String>) -> Self {
        self.placement = Placement::Before(anchor.into());
        self
    }

    pub fn after(mut self, anchor: impl Into<String>) -> Self {
        self.placement = Placement::After(anchor.into());
        self
    }
}
