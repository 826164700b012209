//! Progress callbacks
//!
//! Lets callers render progress without the crate depending on any
//! terminal UI.

use crate::identifier::PackageId;
use crate::types::{Action, Outcome};

/// Progress callback for commit operations
///
/// With parallel jobs, `on_item_start` is called for every item before the
/// queue runs and `on_item_complete` after the whole queue finished, still
/// in queue order.
pub trait ProgressCallback: Send {
    /// Called when a non-empty queue starts
    fn on_queue_start(&mut self, action: Action, count: usize);

    /// Called right before an item is applied (sequential execution only)
    fn on_item_start(&mut self, action: Action, package: &PackageId);

    /// Called when an item finished
    fn on_item_complete(&mut self, action: Action, package: &PackageId, outcome: &Outcome);

    /// Called when a queue finished
    fn on_queue_complete(&mut self, action: Action);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_queue_start(&mut self, _action: Action, _count: usize) {}
    fn on_item_start(&mut self, _action: Action, _package: &PackageId) {}
    fn on_item_complete(&mut self, _action: Action, _package: &PackageId, _outcome: &Outcome) {}
    fn on_queue_complete(&mut self, _action: Action) {}
}
