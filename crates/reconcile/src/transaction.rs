//! Transaction executor - applies purge, remove and install queues
//!
//! Queues run strictly in [`Action::ORDER`]. Within a queue items are
//! independent and may run in parallel. A failing item never stops the
//! rest of the batch; there is no rollback. The list is updated as items
//! succeed and saved exactly once at the end.

use crate::backend::{Backend, BackendRegistry};
use crate::context::{NoProgress, ProgressCallback};
use crate::error::{Error, Result};
use crate::identifier::{PackageId, SchemeResolver};
use crate::store::DesiredStateStore;
use crate::types::{Action, CommitReport, ExecuteOptions, ItemResult, Outcome};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

/// Ordered batches of packages for each action.
///
/// The executor never infers one action from another: a package that should
/// be purged and then reinstalled has to be in both queues.
#[derive(Debug, Clone, Default)]
pub struct ActionQueues {
    purge: Vec<PackageId>,
    remove: Vec<PackageId>,
    install: Vec<PackageId>,
}

impl ActionQueues {
    /// Create empty queues
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a package to the queue for `action`
    pub fn push(&mut self, action: Action, package: PackageId) {
        self.queue_mut(action).push(package);
    }

    /// Append several packages to the queue for `action`
    pub fn extend(&mut self, action: Action, packages: impl IntoIterator<Item = PackageId>) {
        self.queue_mut(action).extend(packages);
    }

    /// Parse identifier text into the queue for `action`.
    ///
    /// Entries that do not parse are skipped and returned so the caller can
    /// report them; the rest of the input is still queued.
    pub fn parse_into<R, I, S>(&mut self, action: Action, texts: I, resolver: &R) -> Vec<Error>
    where
        R: SchemeResolver + ?Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rejected = Vec::new();
        for text in texts {
            match PackageId::parse(text.as_ref(), resolver) {
                Ok(id) => self.push(action, id),
                Err(e) => {
                    log::warn!("Skipping {}: {e}", text.as_ref());
                    rejected.push(e);
                }
            }
        }
        rejected
    }

    /// Packages queued for `action`, in order
    pub fn queue(&self, action: Action) -> &[PackageId] {
        match action {
            Action::Purge => &self.purge,
            Action::Remove => &self.remove,
            Action::Install => &self.install,
        }
    }

    fn queue_mut(&mut self, action: Action) -> &mut Vec<PackageId> {
        match action {
            Action::Purge => &mut self.purge,
            Action::Remove => &mut self.remove,
            Action::Install => &mut self.install,
        }
    }

    /// Total number of queued items
    pub fn total(&self) -> usize {
        self.purge.len() + self.remove.len() + self.install.len()
    }

    /// Whether all queues are empty
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Applies [`ActionQueues`] against the registered backends.
pub struct TransactionExecutor<'a> {
    registry: &'a BackendRegistry,
    options: ExecuteOptions,
}

impl<'a> TransactionExecutor<'a> {
    /// Create an executor with default options (sequential, not a dry run)
    pub fn new(registry: &'a BackendRegistry) -> Self {
        Self {
            registry,
            options: ExecuteOptions::default(),
        }
    }

    /// Use the given options
    pub fn with_options(mut self, options: ExecuteOptions) -> Self {
        self.options = options;
        self
    }

    /// Commit without progress reporting.
    pub fn commit_simple(
        &self,
        queues: &ActionQueues,
        store: &mut DesiredStateStore,
    ) -> Result<CommitReport> {
        self.commit(queues, store, &mut NoProgress)
    }

    /// Apply all queues, update `store` and save it once.
    ///
    /// Only building the worker pool and saving the list can fail; every
    /// backend problem ends up as a per-item [`Outcome::Failed`].
    pub fn commit<P: ProgressCallback>(
        &self,
        queues: &ActionQueues,
        store: &mut DesiredStateStore,
        progress: &mut P,
    ) -> Result<CommitReport> {
        let pool = if self.options.jobs > 1 && !self.options.dry_run {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.jobs)
                .build()
                .map_err(|e| Error::ThreadPool(e.to_string()))?;
            Some(pool)
        } else {
            None
        };

        let mut report = CommitReport::default();
        let shared = Mutex::new(&mut *store);

        for action in Action::ORDER {
            let queue = queues.queue(action);
            if queue.is_empty() {
                continue;
            }

            progress.on_queue_start(action, queue.len());
            let items = mark_duplicates(queue);

            match &pool {
                Some(pool) => {
                    for (package, _) in &items {
                        progress.on_item_start(action, package);
                    }
                    let outcomes: Vec<Outcome> = pool.install(|| {
                        items
                            .par_iter()
                            .map(|(package, first)| self.apply_item(action, package, *first, &shared))
                            .collect()
                    });
                    for ((package, _), outcome) in items.iter().zip(outcomes) {
                        progress.on_item_complete(action, package, &outcome);
                        report.push(item_result(action, package, outcome));
                    }
                }
                None => {
                    for (package, first) in &items {
                        progress.on_item_start(action, package);
                        let outcome = self.apply_item(action, package, *first, &shared);
                        progress.on_item_complete(action, package, &outcome);
                        report.push(item_result(action, package, outcome));
                    }
                }
            }

            progress.on_queue_complete(action);
        }

        drop(shared);

        if self.options.dry_run {
            log::info!("Dry run, package list not saved");
        } else {
            store.save()?;
        }

        Ok(report)
    }

    fn apply_item(
        &self,
        action: Action,
        package: &PackageId,
        first: bool,
        store: &Mutex<&mut DesiredStateStore>,
    ) -> Outcome {
        if !first {
            return Outcome::Skipped {
                reason: "duplicate in queue".to_string(),
            };
        }
        if self.options.dry_run {
            return Outcome::Skipped {
                reason: "dry run".to_string(),
            };
        }

        let Some(backend) = self.registry.get(package.scheme()) else {
            log::warn!("No backend for {package}");
            return Outcome::Failed {
                error: format!("no backend registered for scheme '{}'", package.scheme()),
            };
        };

        let outcome = run_backend(backend.as_ref(), action, package);
        match &outcome {
            Outcome::Failed { error } => log::warn!("Failed to {action} {package}: {error}"),
            other => log::info!("{action} {package}: {other:?}"),
        }

        if outcome.is_satisfied() {
            let mut store = lock_store(store);
            if action.adds_to_list() {
                store.insert(package);
            } else {
                store.remove(package);
            }
        }

        outcome
    }
}

/// Call the backend operation for `action` and classify the result.
///
/// A `false` from the backend is a no-op when the package already is in the
/// desired state, otherwise a failure.
fn run_backend(backend: &dyn Backend, action: Action, package: &PackageId) -> Outcome {
    let name = package.name();
    let changed = match action {
        Action::Purge => backend.purge(name),
        Action::Remove => backend.remove(name),
        Action::Install => backend.install(name),
    };

    match changed {
        Ok(true) => Outcome::Applied,
        Ok(false) => match backend.is_installed(name) {
            Ok(installed) if installed == action.adds_to_list() => Outcome::Unchanged,
            Ok(_) => Outcome::Failed {
                error: format!("{} did not {action} {name}", backend.scheme()),
            },
            Err(e) => Outcome::Failed {
                error: format!("{e:#}"),
            },
        },
        Err(e) => Outcome::Failed {
            error: format!("{e:#}"),
        },
    }
}

/// Pair each queue item with whether it is the first occurrence in its queue
fn mark_duplicates(queue: &[PackageId]) -> Vec<(&PackageId, bool)> {
    let mut seen = HashSet::new();
    queue
        .iter()
        .map(|package| (package, seen.insert(package)))
        .collect()
}

fn item_result(action: Action, package: &PackageId, outcome: Outcome) -> ItemResult {
    ItemResult {
        action,
        package: package.clone(),
        outcome,
    }
}

fn lock_store<'s, 'a>(
    store: &'s Mutex<&'a mut DesiredStateStore>,
) -> MutexGuard<'s, &'a mut DesiredStateStore> {
    match store.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
