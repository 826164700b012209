use colored::Colorize;
use reconcile::Action;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Marker printed before each package of a queue
pub fn action_symbol(action: Action) -> &'static str {
    match action {
        Action::Purge => "x",
        Action::Remove => "-",
        Action::Install => "+",
    }
}

/// Line announcing that `package` is about to be processed
pub fn action_line(action: Action, package: &str) -> String {
    match action {
        Action::Purge => format!("{} Purge package {package} ...", action_symbol(action)),
        Action::Remove => format!("{} Remove package {package} ...", action_symbol(action)),
        Action::Install => format!("{} Installing package {package} ...", action_symbol(action)),
    }
}

/// Pluralize a count, e.g. `1 package`, `3 packages`
pub fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}
