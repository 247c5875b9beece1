//! Human-readable table rendering for terminal output and TXT export.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use stockledger_kernel::{Inventory, LedgerEvent, Record};

const RULE_WIDTH: usize = 70;

/// Message printed instead of a table when a query matched nothing.
pub const EMPTY_MESSAGE: &str = "No records to display.";

fn header() -> String {
    format!(
        "{:<6}{:<30}{:>8}{:>12}{:>14}",
        "ID", "Denumire", "Cant", "Pret", "Valoare"
    )
}

/// One fixed-width table row.
pub fn render_row(record: &Record) -> String {
    format!(
        "{:<6}{:<30}{:>8}{:>12.2}{:>14.2}",
        record.id(),
        record.name(),
        record.quantity(),
        record.unit_price(),
        record.value()
    )
}

/// Header, rule, then one row per record. Always ends with a newline.
pub fn render_table(records: &[Record]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", header());
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    for record in records {
        let _ = writeln!(out, "{}", render_row(record));
    }
    out
}

/// Table for display, or [`EMPTY_MESSAGE`] when there is nothing to show.
pub fn render_listing(records: &[Record]) -> String {
    if records.is_empty() {
        format!("{EMPTY_MESSAGE}\n")
    } else {
        render_table(records)
    }
}

/// Rows per page when a listing is paged.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One page of a listing. `number` is 1-based and already clamped into
/// `1..=total`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Page<'a> {
    pub rows: &'a [Record],
    pub number: usize,
    pub total: usize,
}

/// Cut page `number` (1-based) out of `records`. Page numbers past either end
/// clamp to the first or last page; a zero page size counts as one.
pub fn page_of(records: &[Record], number: usize, page_size: usize) -> Page<'_> {
    let page_size = page_size.max(1);
    let total = records.len().div_ceil(page_size).max(1);
    let number = number.clamp(1, total);
    let start = (number - 1) * page_size;
    let end = (start + page_size).min(records.len());
    Page {
        rows: &records[start..end],
        number,
        total,
    }
}

/// `Page X / Y` banner followed by the table for that page.
pub fn render_page(records: &[Record], number: usize, page_size: usize) -> String {
    if records.is_empty() {
        return format!("{EMPTY_MESSAGE}\n");
    }
    let page = page_of(records, number, page_size);
    format!(
        "Page {} / {}\n\n{}",
        page.number,
        page.total,
        render_table(page.rows)
    )
}

/// Write the whole inventory as a text table.
pub fn export_txt(path: &Path, inventory: &Inventory) -> Result<()> {
    std::fs::write(path, render_table(inventory.records()))
        .with_context(|| format!("cannot write TXT report {}", path.display()))?;
    inventory.record_event(&LedgerEvent::Exported {
        target: path.display().to_string(),
        format: "TXT".into(),
    });
    Ok(())
}
