//! Desired-state store
//!
//! The persisted list of packages that should be installed: one canonical
//! identifier per line, sorted, no duplicates. It is loaded once, mutated in
//! memory and written back once at the end of a sync or commit.

use crate::error::{Error, Result};
use crate::identifier::{PackageId, SchemeResolver};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Read list entries from `path`.
///
/// Lines are trimmed and blank lines ignored. A missing file is an empty
/// list; any other I/O error is returned.
pub fn load_entries(path: &Path) -> Result<BTreeSet<String>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("Package list {} does not exist yet", path.display());
            return Ok(BTreeSet::new());
        }
        Err(source) => {
            return Err(Error::StoreRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    Ok(parse_entries(&content))
}

/// Parse list content into entries
pub fn parse_entries(content: &str) -> BTreeSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Render entries in persisted form: sorted, newline-terminated
pub fn render_entries<'a>(entries: impl IntoIterator<Item = &'a String>) -> String {
    let mut sorted: Vec<&String> = entries.into_iter().collect();
    sorted.sort();
    sorted.dedup();

    let mut out = String::new();
    for entry in sorted {
        out.push_str(entry);
        out.push('\n');
    }
    out
}

/// Write entries to `path` atomically.
///
/// The content goes to a temporary file in the same directory which then
/// replaces `path`, so a crash never leaves a half-written list.
pub fn save_entries<'a>(path: &Path, entries: impl IntoIterator<Item = &'a String>) -> Result<()> {
    let write_err = |source| Error::StoreWrite {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(write_err)?;

    let content = render_entries(entries);
    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(content.as_bytes()).map_err(write_err)?;
    if let Some(permissions) = list_permissions(path) {
        tmp.as_file().set_permissions(permissions).map_err(write_err)?;
    }
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    log::debug!("Saved package list to {}", path.display());
    Ok(())
}

/// Permissions for the rewritten list: those of the current file, or
/// world-readable for a new one.
fn list_permissions(path: &Path) -> Option<fs::Permissions> {
    if let Ok(meta) = fs::metadata(path) {
        return Some(meta.permissions());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Some(fs::Permissions::from_mode(0o644))
    }
    #[cfg(not(unix))]
    {
        None
    }
}

/// In-memory package list bound to its file.
#[derive(Debug, Clone)]
pub struct DesiredStateStore {
    path: PathBuf,
    entries: BTreeSet<String>,
}

impl DesiredStateStore {
    /// Load the list from `path`, or start empty if it does not exist.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = load_entries(&path)?;
        log::debug!(
            "Loaded {} entries from {}",
            entries.len(),
            path.display()
        );
        Ok(Self { path, entries })
    }

    /// Create a store from entries without touching the filesystem.
    pub fn with_entries<I, S>(path: impl Into<PathBuf>, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into(),
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    /// Write the list back to its file.
    pub fn save(&self) -> Result<()> {
        save_entries(&self.path, &self.entries)
    }

    /// Rewrite parseable entries into canonical form.
    ///
    /// Bare names become `default://name`. Entries that do not parse, such
    /// as ones owned by a backend not registered in this process, are kept
    /// verbatim. Returns the number of rewritten entries.
    pub fn normalize<R: SchemeResolver + ?Sized>(&mut self, resolver: &R) -> usize {
        let mut rewritten = 0;
        let normalized: BTreeSet<String> = self
            .entries
            .iter()
            .map(|entry| match PackageId::parse(entry, resolver) {
                Ok(id) => {
                    let canonical = id.canonical();
                    if canonical != *entry {
                        rewritten += 1;
                    }
                    canonical
                }
                Err(e) => {
                    log::debug!("Keeping unrecognized list entry '{entry}': {e}");
                    entry.clone()
                }
            })
            .collect();
        self.entries = normalized;
        rewritten
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries, sorted
    pub fn entries(&self) -> &BTreeSet<String> {
        &self.entries
    }

    /// Entries owned by `scheme`
    pub fn entries_for_scheme<'a>(&'a self, scheme: &'a str) -> impl Iterator<Item = &'a String> {
        self.entries
            .iter()
            .filter(move |entry| PackageId::entry_has_scheme(entry, scheme))
    }

    /// Whether `id` is listed
    pub fn contains(&self, id: &PackageId) -> bool {
        self.entries.contains(&id.canonical())
    }

    /// Add `id`; returns whether it was absent
    pub fn insert(&mut self, id: &PackageId) -> bool {
        self.entries.insert(id.canonical())
    }

    /// Drop `id`; returns whether it was present
    pub fn remove(&mut self, id: &PackageId) -> bool {
        self.entries.remove(&id.canonical())
    }

    /// Replace every entry at once
    pub(crate) fn replace_entries(&mut self, entries: BTreeSet<String>) {
        self.entries = entries;
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
