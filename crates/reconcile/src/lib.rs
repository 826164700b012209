//! # Reconcile
//!
//! Keeps a declarative list of desired packages in step with what the
//! host's package managers have installed.
//!
//! ## Core Concepts
//!
//! - **PackageId**: `scheme://name`, where the scheme names the owning backend
//! - **Backend**: capability interface of one package manager
//! - **DesiredStateStore**: the persisted, sorted package list
//! - **Sync**: rewrite one scheme's list entries from the backend's
//!   manually installed set
//! - **TransactionExecutor**: apply purge, remove and install queues in that
//!   order, updating the list as items succeed
//!
//! ## Example
//!
//! ```ignore
//! use reconcile::{Action, ActionQueues, BackendRegistry, DesiredStateStore, TransactionExecutor};
//!
//! let registry = BackendRegistry::new(std::sync::Arc::new(my_backend));
//! let mut store = DesiredStateStore::load("/var/lib/unip/packages.list")?;
//! store.normalize(&registry);
//!
//! let mut queues = ActionQueues::new();
//! let rejected = queues.parse_into(Action::Install, ["htop", "apt://vim"], &registry);
//!
//! let report = TransactionExecutor::new(&registry).commit_simple(&queues, &mut store)?;
//! println!("{} applied, {} failed", report.summary.applied, report.summary.failed);
//! ```
//!
//! ## Failure model
//!
//! Identifier parsing and list I/O fail hard with [`Error`]. A backend
//! operation that does not succeed is a soft failure: it is reported as
//! [`Outcome::Failed`] for that item and the rest of the batch continues.
//! There is no rollback.

pub mod backend;
pub mod context;
pub mod error;
pub mod identifier;
pub mod maintenance;
pub mod store;
pub mod sync;
pub mod transaction;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types at crate root
pub use backend::{Backend, BackendRegistry, SharedBackend};
pub use context::{NoProgress, ProgressCallback};
pub use error::{Error, Result};
pub use identifier::{PackageId, SchemeResolver};
pub use maintenance::{Maintenance, MaintenanceResult};
pub use store::DesiredStateStore;
pub use sync::{Drift, SyncDiff};
pub use transaction::{ActionQueues, TransactionExecutor};
pub use types::{Action, CommitReport, CommitSummary, ExecuteOptions, ItemResult, Outcome};
