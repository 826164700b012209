use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "unip")]
#[command(version)]
#[command(about = "Keep a list of manually installed packages in sync with the system", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Package list to use instead of the configured one
    #[arg(long, global = true, env = "UNIP_LIST_FILE", value_name = "PATH")]
    pub list_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Record manually installed packages in the list and drop removed ones
    Sync(SyncArgs),

    /// Purge, remove and install packages, keeping the list up to date
    Apply(ApplyArgs),

    /// Show packages that are listed but missing, or installed but unlisted
    Status(StatusArgs),

    /// Print the package list
    List(ListArgs),

    /// Show resolved paths and effective configuration
    Config,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct SyncArgs {
    /// Show what would change without saving the list
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Refresh package caches first
    #[arg(short = 'u', long)]
    pub update: bool,

    /// Sync the list with installed packages before planning
    #[arg(short, long)]
    pub sync: bool,

    /// Packages to purge (remove with configuration)
    #[arg(short, long, num_args = 1.., value_name = "PKG")]
    pub purge: Vec<String>,

    /// Packages to remove
    #[arg(short, long, num_args = 1.., value_name = "PKG")]
    pub remove: Vec<String>,

    /// Packages to install
    #[arg(short, long, num_args = 1.., value_name = "PKG")]
    pub install: Vec<String>,

    /// Install every package listed in this file
    #[arg(long, value_name = "PATH")]
    pub install_file: Option<PathBuf>,

    /// Upgrade all installed packages before applying changes
    #[arg(short = 'U', long)]
    pub upgrade: bool,

    /// Remove unneeded dependencies afterwards
    #[arg(short, long)]
    pub autoremove: bool,

    /// Don't ask for confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Show what would happen without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Packages of one kind applied in parallel
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}

impl ApplyArgs {
    /// Whether any package manager work was requested at all
    pub fn has_work(&self) -> bool {
        self.update
            || self.sync
            || self.upgrade
            || self.autoremove
            || !self.purge.is_empty()
            || !self.remove.is_empty()
            || !self.install.is_empty()
            || self.install_file.is_some()
    }
}

#[derive(Args)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only show packages of this scheme
    #[arg(long)]
    pub scheme: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_apply_flags() {
        let cli = Cli::try_parse_from([
            "unip", "apply", "-u", "-s", "-p", "vim", "nano", "-r", "emacs", "-i", "htop", "-U",
            "-a", "-y", "-j", "4",
        ])
        .unwrap();

        let Command::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert!(args.update && args.sync && args.upgrade && args.autoremove && args.yes);
        assert_eq!(args.purge, vec!["vim", "nano"]);
        assert_eq!(args.remove, vec!["emacs"]);
        assert_eq!(args.install, vec!["htop"]);
        assert_eq!(args.jobs, Some(4));
        assert!(args.has_work());
    }

    #[test]
    fn test_apply_without_work() {
        let cli = Cli::try_parse_from(["unip", "apply", "--dry-run"]).unwrap();
        let Command::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert!(!args.has_work());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["unip", "list", "-vv", "--list-file", "/tmp/p.list"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.list_file, Some(PathBuf::from("/tmp/p.list")));
    }
}
