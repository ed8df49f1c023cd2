//! Terminal output utilities
//!
//! Everything here goes to stderr; stdout is reserved for the rewritten
//! config and JSON summaries so they can be piped.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};

static QUIET: AtomicBool = AtomicBool::new(false);

/// Suppress everything except errors
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

fn quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Print a success message
pub fn success(msg: &str) {
    if !quiet() {
        eprintln!("{} {}", style("✓").green().bold(), msg);
    }
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    if !quiet() {
        eprintln!("{} {}", style("⚠").yellow().bold(), msg);
    }
}

/// Print an info message
pub fn info(msg: &str) {
    if !quiet() {
        eprintln!("{} {}", style("ℹ").blue().bold(), msg);
    }
}

/// Print a header
pub fn header(msg: &str) {
    if !quiet() {
        eprintln!("\n{}", style(msg).bold().underlined());
    }
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    if !quiet() {
        eprintln!("  {}: {}", style(key).dim(), value);
    }
}

/// Create a spinner (hidden in quiet mode)
pub fn spinner(msg: &str) -> ProgressBar {
    if quiet() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(template.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
