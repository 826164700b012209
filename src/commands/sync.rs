use anyhow::Result;
use colored::Colorize;
use reconcile::{BackendRegistry, DesiredStateStore, SyncDiff, sync};

use crate::Context;
use crate::cli::SyncArgs;
use crate::progress::Spinner;
use crate::ui;

pub fn run(ctx: &Context, args: &SyncArgs) -> Result<()> {
    let registry = super::registry(ctx)?;
    let mut store = super::open_store(ctx, &registry)?;

    let diffs = perform(ctx, &registry, &mut store, args.dry_run)?;

    if diffs.iter().all(SyncDiff::is_empty) {
        ui::success(&format!(
            "Package list is up to date ({})",
            ui::count(store.len(), "package")
        ));
        return Ok(());
    }

    for diff in &diffs {
        print_diff(diff);
    }

    println!();
    if args.dry_run {
        ui::info("Dry run: package list not saved");
    } else {
        ui::success(&format!("Saved {}", store.path().display()));
    }
    Ok(())
}

/// Sync every available backend into `store`.
///
/// With `dry_run` the diffs are computed but neither applied nor saved.
pub fn perform(
    ctx: &Context,
    registry: &BackendRegistry,
    store: &mut DesiredStateStore,
    dry_run: bool,
) -> Result<Vec<SyncDiff>> {
    let backends = super::available_backends(registry);
    let spinner = Spinner::start("Reading manually installed packages...", ctx.quiet);

    let result = if dry_run {
        backends
            .iter()
            .map(|backend| sync::plan(*backend, store))
            .collect::<reconcile::Result<Vec<_>>>()
    } else {
        sync::sync_all(backends.iter().copied(), store)
    };

    match result {
        Ok(diffs) => {
            let changed: usize = diffs.iter().map(SyncDiff::total).sum();
            spinner.success(&format!(
                "Synced package list ({})",
                ui::count(changed, "change")
            ));
            Ok(diffs)
        }
        Err(e) => {
            spinner.fail("Sync failed");
            Err(e.into())
        }
    }
}

/// Print the entries a sync added and removed.
pub fn print_diff(diff: &SyncDiff) {
    if diff.is_empty() {
        return;
    }

    ui::section(&diff.scheme);
    for entry in &diff.added {
        println!("  {} {}", "+".green(), entry);
    }
    for entry in &diff.removed {
        println!("  {} {}", "-".red(), entry.dimmed());
    }
}
