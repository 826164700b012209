pub mod apply;
pub mod config;
pub mod list;
pub mod status;
pub mod sync;

use anyhow::{Context as _, Result};
use aptkit::AptBackend;
use reconcile::{Backend, BackendRegistry, DesiredStateStore};
use std::sync::Arc;

use crate::Context;

/// Register every backend this build knows about.
///
/// apt is the default scheme, so bare package names mean apt packages.
pub fn registry(ctx: &Context) -> Result<BackendRegistry> {
    let apt = AptBackend::new(ctx.config.apt.clone()).context("Could not set up the apt backend")?;
    Ok(BackendRegistry::new(Arc::new(apt)))
}

/// Load the package list and rewrite entries to canonical form.
pub fn open_store(ctx: &Context, registry: &BackendRegistry) -> Result<DesiredStateStore> {
    let path = ctx.list_path();
    let mut store = DesiredStateStore::load(&path)
        .with_context(|| format!("Could not load package list {}", path.display()))?;

    let rewritten = store.normalize(registry);
    if rewritten > 0 {
        log::info!("Normalized {rewritten} entries in {}", path.display());
    }
    Ok(store)
}

/// Backends that can be queried on this host, warning about the rest.
pub fn available_backends(registry: &BackendRegistry) -> Vec<&dyn Backend> {
    registry
        .backends()
        .filter(|backend| {
            let available = backend.is_available();
            if !available {
                log::warn!("Skipping {}: not available on this system", backend.scheme());
            }
            available
        })
        .map(|backend| &**backend)
        .collect()
}
