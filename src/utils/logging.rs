// file: src/utils/logging.rs
// description: Tracing subscriber initialization with optional ANSI coloring
// reference: https://docs.rs/tracing-subscriber

use colored::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Logs go to stderr; stdout is reserved for command output and the stdio transport.
pub fn init_logger(colored_output: bool, verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .with_ansi(colored_output);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

pub fn format_success(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg.green())
}

/// One-line failure report: the stable error kind, the message, and a retry
/// hint for transient failures.
pub fn format_error(kind: &str, msg: &str, retriable: bool) -> String {
    let hint = if retriable { " (temporary, safe to retry)" } else { "" };
    format!(
        "{} {} {}{}",
        "✗".red().bold(),
        format!("[{}]", kind).red().bold(),
        msg.red(),
        hint.dimmed()
    )
}

pub fn format_warning(msg: &str) -> String {
    format!("{} {}", "⚠".yellow().bold(), msg.yellow())
}

pub fn format_info(msg: &str) -> String {
    format!("{} {}", "ℹ".blue().bold(), msg)
}

pub fn format_heading(msg: &str) -> String {
    format!("{}", msg.cyan().bold())
}
