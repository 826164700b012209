//! Core types for transactional batch application

use crate::identifier::PackageId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of operation a queue applies.
///
/// Variants are declared in execution order: every purge finishes before
/// any remove starts, and every remove before any install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Remove a package together with its configuration
    Purge,
    /// Remove a package, keeping its configuration
    Remove,
    /// Install a package
    Install,
}

impl Action {
    /// All actions in execution order
    pub const ORDER: [Action; 3] = [Action::Purge, Action::Remove, Action::Install];

    /// Verb used in reports
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Purge => "purge",
            Self::Remove => "remove",
            Self::Install => "install",
        }
    }

    /// Whether a successful run adds the package to the list
    pub fn adds_to_list(&self) -> bool {
        matches!(self, Self::Install)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Result of applying one queue item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The backend made the change
    Applied,
    /// Nothing to do, the package was already in the desired state
    Unchanged,
    /// The change did not happen
    Failed { error: String },
    /// The item was not attempted
    Skipped { reason: String },
}

impl Outcome {
    /// Whether the desired end state holds after this item
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Applied | Self::Unchanged)
    }

    /// Whether this item failed
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Outcome of a single queue item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemResult {
    pub action: Action,
    pub package: PackageId,
    pub outcome: Outcome,
}

/// Counts of outcomes across a commit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub applied: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl CommitSummary {
    /// Add an outcome to the summary
    pub fn add(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Applied => self.applied += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Failed { .. } => self.failed += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
        }
    }

    /// Total number of processed items
    pub fn total(&self) -> usize {
        self.applied + self.unchanged + self.failed + self.skipped
    }

    /// Check if no item failed
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Everything a commit produced
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitReport {
    /// Per-item outcomes in execution order
    pub results: Vec<ItemResult>,
    pub summary: CommitSummary,
}

impl CommitReport {
    pub(crate) fn push(&mut self, result: ItemResult) {
        self.summary.add(&result.outcome);
        self.results.push(result);
    }

    /// Items that failed
    pub fn failures(&self) -> impl Iterator<Item = &ItemResult> {
        self.results.iter().filter(|r| r.outcome.is_failure())
    }
}

/// Options for committing action queues
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Don't call the backend or save the list, just report
    pub dry_run: bool,
    /// Number of items of one queue applied concurrently
    pub jobs: usize,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 1,
        }
    }
}
