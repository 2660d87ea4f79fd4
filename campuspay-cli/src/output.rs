//! Terminal output for cpay: colored status lines, tables and amounts

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use rust_decimal::{Decimal, RoundingStrategy};

pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Errors go to stderr so `--json` output stays parseable
pub fn error(msg: &str) {
    eprintln!("{} {}", "error:".red().bold(), msg.red());
}

pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Table with the condensed UTF-8 border used by every listing
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Money with two decimal places, as printed on receipts
pub fn amount(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// Human-readable size of the event log database
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    match bytes {
        b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{} bytes", b),
    }
}
