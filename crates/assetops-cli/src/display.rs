//! Display utilities for the CLI

use colored::*;

use assetops_types::{CompositeOperationResult, CompositeStatus, TransactionStatus};

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", "━".repeat(60).bright_black());
    println!(" {}", title.bright_white().bold());
    println!("{}", "━".repeat(60).bright_black());
}

/// Print a success message
pub fn success(message: &str) {
    println!("  {} {}", "✓".bright_green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    println!("  {} {}", "✗".bright_red(), message.bright_red());
}

/// Print an info message
pub fn info(message: &str) {
    println!("  {} {}", "→".bright_blue(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("  {} {}", "⚠".yellow(), message.yellow());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("      {}: {}", key, value.bright_cyan());
}

fn status_label(status: CompositeStatus) -> ColoredString {
    match status {
        CompositeStatus::Confirmed => "CONFIRMED".bright_green().bold(),
        CompositeStatus::IndexingTimeout => "INDEXING_TIMEOUT".yellow().bold(),
        CompositeStatus::PartialFailure => "PARTIAL_FAILURE".bright_red().bold(),
        CompositeStatus::Rejected => "REJECTED".red().bold(),
        CompositeStatus::Confirming => "CONFIRMING".bright_blue().bold(),
        CompositeStatus::Pending => "PENDING".bright_black().bold(),
    }
}

/// Print every record of a composite result, in request order
pub fn result(result: &CompositeOperationResult) {
    println!("  {} {}", "Status:".bright_white(), status_label(result.status));

    if result.records.is_empty() {
        info("No transaction was broadcast");
    }
    for (position, record) in result.records.iter().enumerate() {
        let marker = match record.status() {
            TransactionStatus::Confirmed => "✓".bright_green(),
            TransactionStatus::TimedOut => "…".yellow(),
            TransactionStatus::Submitted => "○".bright_black(),
        };
        println!(
            "  {} {} {}",
            marker,
            format!("#{}", position + 1).bright_black(),
            record.hash.to_string().bright_cyan()
        );
    }

    if let Some(err) = &result.error {
        error(&err.to_string());
    }
}
