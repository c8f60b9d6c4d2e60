//! Leveled console output.
//!
//! Every log line goes to stderr with a colored level tag so that stdout
//! only ever carries the final report. Debug lines are printed when
//! `PHP_ARGINFO_DEBUG` is set in the environment.

use colored::*;

/// Environment variable enabling debug output.
pub const DEBUG_ENV: &str = "PHP_ARGINFO_DEBUG";

/// Whether debug output is enabled.
pub fn debug_enabled() -> bool {
    std::env::var_os(DEBUG_ENV).is_some()
}

pub fn debug(message: impl AsRef<str>) {
    if debug_enabled() {
        eprintln!("{} {}", "[debug]".dimmed(), message.as_ref().dimmed());
    }
}

pub fn info(message: impl AsRef<str>) {
    eprintln!("{} {}", "[Info]".cyan(), message.as_ref());
}

pub fn notice(message: impl AsRef<str>) {
    eprintln!("{} {}", "[Notice]".blue(), message.as_ref());
}

pub fn ok(message: impl AsRef<str>) {
    eprintln!("{} {}", "[OK]".green(), message.as_ref());
}

pub fn success(message: impl AsRef<str>) {
    eprintln!("{} {}", "[Success]".green().bold(), message.as_ref());
}

pub fn warn(message: impl AsRef<str>) {
    eprintln!("{} {}", "[Warning]".yellow(), message.as_ref());
}

pub fn error(message: impl AsRef<str>) {
    eprintln!("{} {}", "[Error]".red().bold(), message.as_ref());
}

/// Turn multi-line subprocess output into a single log-friendly line.
pub fn flatten(output: &str) -> String {
    output.replace('\n', " ")
}
