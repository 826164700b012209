use anyhow::Result;
use colored::Colorize;
use reconcile::{Drift, sync};

use crate::Context;
use crate::cli::StatusArgs;
use crate::progress::Spinner;
use crate::ui;

pub fn run(ctx: &Context, args: &StatusArgs) -> Result<()> {
    let registry = super::registry(ctx)?;
    let store = super::open_store(ctx, &registry)?;

    let spinner = Spinner::start("Comparing package list with installed packages...", ctx.quiet || args.json);
    let drifts = super::available_backends(&registry)
        .into_iter()
        .map(|backend| sync::drift(backend, &store))
        .collect::<reconcile::Result<Vec<Drift>>>();
    spinner.clear();
    let drifts = drifts?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&drifts)?);
        return Ok(());
    }

    ui::header("Package Status");
    ui::kv("List", &store.path().display().to_string());
    ui::kv("Tracked", &store.len().to_string());

    for drift in &drifts {
        print_drift(drift, ctx.verbose > 0);
    }

    println!();
    if drifts.iter().all(Drift::is_clean) {
        ui::success("Package list matches installed packages");
    } else {
        ui::dim("Run 'unip sync' to record installed packages, or 'unip apply -i' to install missing ones.");
    }
    Ok(())
}

fn print_drift(drift: &Drift, verbose: bool) {
    if drift.is_clean() && !verbose {
        return;
    }

    ui::section(&drift.scheme);
    if drift.is_clean() {
        ui::dim("in sync");
        return;
    }

    for package in &drift.missing {
        println!("  {} {} {}", "○".yellow(), package, "(listed, not installed)".dimmed());
    }
    for package in &drift.untracked {
        println!("  {} {} {}", "+".cyan(), package, "(installed, not listed)".dimmed());
    }
}
