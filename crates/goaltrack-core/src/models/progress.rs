use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Completed vs. total goals in one category.
///
/// Sent by the backend as a two-element array `[completed, total]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct CategoryProgress {
    pub completed: u32,
    pub total: u32,
}

impl From<(u32, u32)> for CategoryProgress {
    fn from((completed, total): (u32, u32)) -> Self {
        Self { completed, total }
    }
}

impl From<CategoryProgress> for (u32, u32) {
    fn from(p: CategoryProgress) -> Self {
        (p.completed, p.total)
    }
}

impl CategoryProgress {
    /// Percentage complete (0-100), rounded down. Zero when there are no goals.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            0
        } else {
            self.completed.min(self.total) * 100 / self.total
        }
    }
}

/// Progress report for a user, keyed by goal category.
pub type Progress = BTreeMap<String, CategoryProgress>;
