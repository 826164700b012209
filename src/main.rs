mod cli;
mod commands;
mod config;
mod paths;
mod privilege;
mod progress;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::Config;
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// `--list-file` / `UNIP_LIST_FILE`
    pub list_file: Option<PathBuf>,
    pub config: Config,
}

impl Context {
    /// Package list in effect for this run
    pub fn list_path(&self) -> PathBuf {
        self.config.list_path(self.list_file.as_deref())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "unip", &mut io::stdout());
        return Ok(());
    }

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        list_file: cli.list_file,
        config: Config::load()?,
    };

    match cli.command {
        Command::Sync(args) => commands::sync::run(&ctx, &args),
        Command::Apply(args) => commands::apply::run(&ctx, &args),
        Command::Status(args) => commands::status::run(&ctx, &args),
        Command::List(args) => commands::list::run(&ctx, &args),
        Command::Config => commands::config::run(&ctx),
        Command::Completions { .. } => Ok(()),
    }
}
