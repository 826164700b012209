//! `unip apply`: the one-shot update, sync, commit and cleanup flow.
//!
//! Steps run in a fixed order: refresh caches, sync the list, show the plan,
//! confirm, upgrade, commit the purge/remove/install queues, autoremove.

use anyhow::{Context as _, Result, bail};
use colored::Colorize;
use reconcile::{
    Action, ActionQueues, BackendRegistry, CommitReport, ExecuteOptions, Maintenance, Outcome,
    PackageId, ProgressCallback, SchemeResolver, TransactionExecutor, maintenance, store,
};
use std::fs;
use std::path::Path;

use crate::Context;
use crate::cli::ApplyArgs;
use crate::privilege;
use crate::progress::Spinner;
use crate::ui;

pub fn run(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    if !args.has_work() {
        ui::info("Nothing to do. See 'unip apply --help'.");
        return Ok(());
    }
    if !args.dry_run {
        privilege::require_root()?;
    }

    let registry = super::registry(ctx)?;
    let mut list = super::open_store(ctx, &registry)?;

    if args.update {
        run_maintenance(ctx, &registry, Maintenance::RefreshCache, args.dry_run);
    }

    if args.sync {
        for diff in super::sync::perform(ctx, &registry, &mut list, args.dry_run)? {
            super::sync::print_diff(&diff);
        }
    }

    let (queues, rejected) = build_queues(args, &registry)?;
    for error in &rejected {
        ui::warn(&format!("Skipping: {error}"));
    }

    if queues.is_empty() && !args.upgrade && !args.autoremove {
        if !rejected.is_empty() {
            bail!("No valid packages to apply");
        }
        return Ok(());
    }

    println!();
    if args.autoremove {
        println!("* Autoremove packages");
    }
    if args.upgrade {
        println!("* Upgrade packages");
    }
    for line in plan_lines(&queues) {
        println!("{line}");
    }
    println!();

    if args.dry_run {
        ui::info("Dry run: nothing will be changed");
    } else if !(args.yes || ctx.config.assume_yes) && !confirm_proceed()? {
        ui::info("Aborted");
        return Ok(());
    }

    if args.upgrade {
        run_maintenance(ctx, &registry, Maintenance::UpgradeAll, args.dry_run);
    }

    let report = if queues.is_empty() {
        CommitReport::default()
    } else {
        let options = ExecuteOptions {
            dry_run: args.dry_run,
            jobs: ctx.config.jobs(args.jobs),
        };
        let mut progress = ConsoleProgress { quiet: ctx.quiet };
        TransactionExecutor::new(&registry)
            .with_options(options)
            .commit(&queues, &mut list, &mut progress)
            .context("Could not commit package changes")?
    };

    if args.autoremove {
        run_maintenance(ctx, &registry, Maintenance::Autoremove, args.dry_run);
    }

    if !queues.is_empty() {
        print_summary(&report, args.dry_run);
    }

    if !report.summary.is_success() {
        bail!(
            "{} could not be applied",
            ui::count(report.summary.failed, "package")
        );
    }
    Ok(())
}

/// Parse the requested packages into action queues.
///
/// Entries that don't parse are returned for reporting, everything else is
/// queued. The install file uses the package list format.
pub fn build_queues<R: SchemeResolver + ?Sized>(
    args: &ApplyArgs,
    resolver: &R,
) -> Result<(ActionQueues, Vec<reconcile::Error>)> {
    let mut queues = ActionQueues::new();
    let mut rejected = Vec::new();

    rejected.extend(queues.parse_into(Action::Purge, &args.purge, resolver));
    rejected.extend(queues.parse_into(Action::Remove, &args.remove, resolver));
    if let Some(path) = &args.install_file {
        let entries = read_install_file(path)?;
        rejected.extend(queues.parse_into(Action::Install, &entries, resolver));
    }
    rejected.extend(queues.parse_into(Action::Install, &args.install, resolver));

    Ok((queues, rejected))
}

fn read_install_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read install file {}", path.display()))?;
    Ok(store::parse_entries(&content).into_iter().collect())
}

/// "Packages to <verb>:" blocks for every non-empty queue
pub fn plan_lines(queues: &ActionQueues) -> Vec<String> {
    let mut lines = Vec::new();
    for action in Action::ORDER {
        let queue = queues.queue(action);
        if queue.is_empty() {
            continue;
        }
        let names: Vec<String> = queue.iter().map(PackageId::canonical).collect();
        lines.push(format!("Packages to {action}:"));
        lines.push(format!("    {}", names.join(" ")));
    }
    lines
}

/// Result line for one committed item
pub fn completion_line(action: Action, package: &PackageId, outcome: &Outcome) -> String {
    match outcome {
        Outcome::Applied => match action {
            Action::Install => format!("{} Installed package {package}", "✓".green()),
            Action::Purge | Action::Remove => {
                format!("{} Removed package {package}", "✓".green())
            }
        },
        Outcome::Unchanged => match action {
            Action::Install => format!("{} {package} is already installed", "○".dimmed()),
            Action::Purge | Action::Remove => {
                format!("{} {package} is not installed", "○".dimmed())
            }
        },
        Outcome::Failed { error } => {
            format!("{} Could not {action} {package}: {error}", "✗".red())
        }
        Outcome::Skipped { reason } => format!("{} Skipped {package} ({reason})", "○".dimmed()),
    }
}

/// Prints each item as the executor reports it.
struct ConsoleProgress {
    quiet: bool,
}

impl ProgressCallback for ConsoleProgress {
    fn on_queue_start(&mut self, action: Action, count: usize) {
        log::info!("Starting {action} queue with {count} items");
    }

    fn on_item_start(&mut self, action: Action, package: &PackageId) {
        if !self.quiet {
            println!("{}", ui::action_line(action, &package.canonical()));
        }
    }

    fn on_item_complete(&mut self, action: Action, package: &PackageId, outcome: &Outcome) {
        let line = completion_line(action, package, outcome);
        if outcome.is_failure() {
            eprintln!("{line}");
        } else if !self.quiet {
            println!("{line}");
        }
    }

    fn on_queue_complete(&mut self, action: Action) {
        log::debug!("Finished {action} queue");
    }
}

/// Run a maintenance task on every backend. Failures are reported, not fatal.
fn run_maintenance(ctx: &Context, registry: &BackendRegistry, task: Maintenance, dry_run: bool) {
    if dry_run {
        ui::info(&format!("Would {task}"));
        return;
    }

    let spinner = Spinner::start(&format!("Running {task}..."), ctx.quiet);
    let results = maintenance::run_all(registry, task);
    let failed: Vec<String> = results
        .iter()
        .filter_map(|r| match &r.outcome {
            Outcome::Failed { error } => Some(format!("{}: {error}", r.scheme)),
            _ => None,
        })
        .collect();

    if failed.is_empty() {
        spinner.success(&format!("Finished: {task}"));
    } else if failed.len() < results.len() {
        spinner.warn(&format!("Could not {task} everywhere"));
        for failure in &failed {
            ui::dim(failure);
        }
    } else {
        spinner.fail(&format!("Could not {task}"));
        for failure in &failed {
            ui::error(failure);
        }
    }
}

fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Do you really want to continue?")
        .default(false)
        .interact()?;

    Ok(confirmed)
}

/// Print final summary
fn print_summary(report: &CommitReport, dry_run: bool) {
    let summary = &report.summary;
    println!();
    if dry_run {
        println!("  {} Dry run complete", "ℹ".blue().bold());
    } else if summary.is_success() {
        println!("  {} Packages applied successfully!", "✓".green().bold());
    } else {
        println!("  {} Packages applied with errors", "⚠".yellow().bold());
    }

    if summary.applied > 0 {
        println!("    • {} applied", ui::count(summary.applied, "package"));
    }
    if summary.unchanged > 0 {
        println!("    • {} already satisfied", ui::count(summary.unchanged, "package"));
    }
    if summary.skipped > 0 {
        println!("    • {} skipped", ui::count(summary.skipped, "package"));
    }
    if summary.failed > 0 {
        println!(
            "    • {} {}",
            ui::count(summary.failed, "package"),
            "failed".red()
        );
        for item in report.failures() {
            println!("      {} {}", item.action, item.package);
        }
    }
}
