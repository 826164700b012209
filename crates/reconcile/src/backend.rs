//! Backend capability and registry
//!
//! A [`Backend`] is one concrete package manager. Backends are registered
//! once at startup in a [`BackendRegistry`] keyed by scheme, and the sync
//! and transaction logic only ever talks to them through this trait.

use crate::identifier::SchemeResolver;
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Capability interface of a package manager.
///
/// Mutating operations return `Ok(true)` when they achieved their goal and
/// `Ok(false)` when they did not, including when there was nothing to do.
/// `Err` is reserved for hard faults such as the package manager binary not
/// being executable.
///
/// All operations are idempotent with respect to the desired end state:
/// installing an installed package is a no-op reporting `false`.
pub trait Backend: Send + Sync {
    /// Scheme this backend owns, e.g. `"apt"`
    fn scheme(&self) -> &str;

    /// Whether the underlying package manager can be used on this host
    fn is_available(&self) -> bool {
        true
    }

    /// Names the user explicitly requested (no auto-installed dependencies)
    fn manual_installed(&self) -> Result<BTreeSet<String>>;

    /// Whether `name` is currently installed
    fn is_installed(&self, name: &str) -> Result<bool>;

    /// Install `name`.
    ///
    /// No-op returning `false` if already installed, otherwise the
    /// post-condition `is_installed(name)`.
    fn install(&self, name: &str) -> Result<bool>;

    /// Remove `name`, keeping its configuration.
    ///
    /// No-op returning `false` if not installed, otherwise the
    /// post-condition `!is_installed(name)`.
    fn remove(&self, name: &str) -> Result<bool>;

    /// Remove `name` together with its configuration.
    ///
    /// Same contract as [`Backend::remove`].
    fn purge(&self, name: &str) -> Result<bool>;

    /// Refresh the package cache
    fn refresh_cache(&self) -> Result<bool>;

    /// Upgrade all installed packages
    fn upgrade_all(&self) -> Result<bool>;

    /// Remove dependencies nothing requires anymore
    fn autoremove(&self) -> Result<bool>;
}

/// A shared backend handle
pub type SharedBackend = Arc<dyn Backend>;

/// Scheme-keyed set of backends, resolved once at startup.
#[derive(Clone)]
pub struct BackendRegistry {
    default_scheme: String,
    backends: BTreeMap<String, SharedBackend>,
}

impl BackendRegistry {
    /// Create a registry whose default scheme is `default`'s.
    pub fn new(default: SharedBackend) -> Self {
        let default_scheme = default.scheme().to_string();
        let mut backends = BTreeMap::new();
        backends.insert(default_scheme.clone(), default);
        Self {
            default_scheme,
            backends,
        }
    }

    /// Register another backend. Replaces any backend with the same scheme.
    pub fn with_backend(mut self, backend: SharedBackend) -> Self {
        self.register(backend);
        self
    }

    /// Register a backend in place.
    pub fn register(&mut self, backend: SharedBackend) {
        let scheme = backend.scheme().to_string();
        if self.backends.insert(scheme.clone(), backend).is_some() {
            log::warn!("Backend '{scheme}' registered twice, keeping the last one");
        }
    }

    /// Look up the backend owning `scheme`
    pub fn get(&self, scheme: &str) -> Option<&SharedBackend> {
        self.backends.get(scheme)
    }

    /// Backend used for bare package names
    pub fn default_backend(&self) -> &SharedBackend {
        &self.backends[&self.default_scheme]
    }

    /// Registered schemes in sorted order
    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.backends.keys().map(String::as_str)
    }

    /// All registered backends, sorted by scheme
    pub fn backends(&self) -> impl Iterator<Item = &SharedBackend> {
        self.backends.values()
    }

    /// Number of registered backends
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Always false: a registry holds at least its default backend
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl SchemeResolver for BackendRegistry {
    fn default_scheme(&self) -> &str {
        &self.default_scheme
    }

    fn is_registered(&self, scheme: &str) -> bool {
        self.backends.contains_key(scheme)
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("default_scheme", &self.default_scheme)
            .field("schemes", &self.backends.keys().collect::<Vec<_>>())
            .finish()
    }
}
