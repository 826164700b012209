//! Reconciliation of the package list with a backend
//!
//! Sync makes the list's entries for one scheme equal to the backend's
//! manually installed set. Entries of other schemes are never touched.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::identifier::{PackageId, canonical, validate_name};
use crate::store::DesiredStateStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Changes a sync applies (or would apply) to the list for one scheme
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncDiff {
    /// Scheme the diff was computed for
    pub scheme: String,
    /// Entries installed manually but not listed
    pub added: BTreeSet<String>,
    /// Listed entries no longer installed manually
    pub removed: BTreeSet<String>,
}

impl SyncDiff {
    /// Whether the list already matches the backend
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Total number of changed entries
    pub fn total(&self) -> usize {
        self.added.len() + self.removed.len()
    }
}

/// Query `backend` for its manually installed packages as canonical entries.
///
/// The result is a materialized set: it is both searched and iterated by
/// the diff.
pub fn actual_entries(backend: &dyn Backend) -> Result<BTreeSet<String>> {
    let scheme = backend.scheme();
    let names = backend
        .manual_installed()
        .map_err(|source| Error::Backend {
            scheme: scheme.to_string(),
            source,
        })?;

    Ok(names
        .iter()
        .map(|name| name.trim())
        .filter(|name| match validate_name(name, name) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Ignoring package reported by {scheme}: {e}");
                false
            }
        })
        .map(|name| canonical(scheme, name))
        .collect())
}

/// Compute the diff between `actual` and the list's entries for `scheme`.
pub fn compute_diff(
    scheme: &str,
    actual: &BTreeSet<String>,
    store: &DesiredStateStore,
) -> SyncDiff {
    let removed = store
        .entries_for_scheme(scheme)
        .filter(|entry| !actual.contains(*entry))
        .cloned()
        .collect();

    let added = actual
        .iter()
        .filter(|entry| !store.entries().contains(*entry))
        .cloned()
        .collect();

    SyncDiff {
        scheme: scheme.to_string(),
        added,
        removed,
    }
}

/// Apply a diff to the list in memory.
///
/// The new entry set is built separately and swapped in, never edited
/// while being iterated.
pub fn apply_diff(diff: &SyncDiff, store: &mut DesiredStateStore) {
    let next: BTreeSet<String> = store
        .entries()
        .iter()
        .filter(|entry| !diff.removed.contains(*entry))
        .chain(diff.added.iter())
        .cloned()
        .collect();
    store.replace_entries(next);
}

/// Compute what a sync against `backend` would change, without changing it.
pub fn plan(backend: &dyn Backend, store: &DesiredStateStore) -> Result<SyncDiff> {
    let actual = actual_entries(backend)?;
    Ok(compute_diff(backend.scheme(), &actual, store))
}

/// Sync the list with `backend` and persist it.
///
/// The list is saved even when nothing changed, which also writes it in
/// normalized form.
pub fn sync(backend: &dyn Backend, store: &mut DesiredStateStore) -> Result<SyncDiff> {
    let diff = sync_in_memory(backend, store)?;
    store.save()?;
    Ok(diff)
}

/// Sync the list with several backends, persisting once at the end.
pub fn sync_all<'a, I>(backends: I, store: &mut DesiredStateStore) -> Result<Vec<SyncDiff>>
where
    I: IntoIterator<Item = &'a dyn Backend>,
{
    let mut diffs = Vec::new();
    for backend in backends {
        diffs.push(sync_in_memory(backend, store)?);
    }
    store.save()?;
    Ok(diffs)
}

fn sync_in_memory(backend: &dyn Backend, store: &mut DesiredStateStore) -> Result<SyncDiff> {
    let diff = plan(backend, store)?;
    log::info!(
        "Sync {}: {} added, {} removed",
        diff.scheme,
        diff.added.len(),
        diff.removed.len()
    );
    for entry in &diff.removed {
        log::debug!("Dropping {entry} (no longer installed)");
    }
    for entry in &diff.added {
        log::debug!("Adding {entry}");
    }
    apply_diff(&diff, store);
    Ok(diff)
}

/// Entries tracked in the list for a backend, compared with what it has.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Drift {
    /// Scheme of the backend
    pub scheme: String,
    /// Listed but not installed
    pub missing: Vec<PackageId>,
    /// Installed manually but not listed
    pub untracked: Vec<PackageId>,
}

impl Drift {
    /// Whether list and backend agree
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.untracked.is_empty()
    }
}

/// Report drift between the list and `backend` without changing anything.
///
/// `missing` is checked with [`Backend::is_installed`], so a listed package
/// that is installed only as a dependency does not count as missing.
pub fn drift(backend: &dyn Backend, store: &DesiredStateStore) -> Result<Drift> {
    let scheme = backend.scheme();
    let diff = plan(backend, store)?;
    let backend_err = |source| Error::Backend {
        scheme: scheme.to_string(),
        source,
    };

    let mut missing = Vec::new();
    for entry in &diff.removed {
        let name = entry_name(entry, scheme);
        if !backend.is_installed(name).map_err(backend_err)? {
            missing.push(PackageId::new(scheme, name));
        }
    }

    let untracked = diff
        .added
        .iter()
        .map(|entry| PackageId::new(scheme, entry_name(entry, scheme)))
        .collect();

    Ok(Drift {
        scheme: scheme.to_string(),
        missing,
        untracked,
    })
}

fn entry_name<'a>(entry: &'a str, scheme: &str) -> &'a str {
    entry
        .strip_prefix(scheme)
        .and_then(|rest| rest.strip_prefix(crate::identifier::SCHEME_SEPARATOR))
        .unwrap_or(entry)
}
