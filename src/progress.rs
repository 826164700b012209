//! Progress indicators for the unip CLI.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A spinner shown while waiting on a package manager.
pub struct Spinner {
    pb: ProgressBar,
    quiet: bool,
}

impl Spinner {
    /// Start a spinner with `msg`. Nothing is drawn when `quiet`.
    pub fn start(msg: &str, quiet: bool) -> Self {
        if quiet {
            return Self {
                pb: ProgressBar::hidden(),
                quiet,
            };
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.green} {msg}")
        {
            pb.set_style(style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        Self { pb, quiet }
    }

    /// Replace the spinner with a success line.
    pub fn success(self, msg: &str) {
        self.pb.finish_and_clear();
        if !self.quiet {
            println!("{} {}", "✓".green(), msg);
        }
    }

    /// Replace the spinner with a warning line.
    pub fn warn(self, msg: &str) {
        self.pb.finish_and_clear();
        if !self.quiet {
            println!("{} {}", "⚠".yellow(), msg);
        }
    }

    /// Replace the spinner with an error line. Printed even when quiet.
    pub fn fail(self, msg: &str) {
        self.pb.finish_and_clear();
        eprintln!("{} {}", "✗".red(), msg);
    }

    /// Remove the spinner without a message.
    pub fn clear(self) {
        self.pb.finish_and_clear();
    }
}
