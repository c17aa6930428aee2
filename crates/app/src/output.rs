//! Terminal rendering: notifications, stats cards and tables.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use recondash_core::table::TablePage;
use recondash_core::{AggregateStats, AnomalyItem, RowStatus, Severity};

pub fn success(msg: &str) {
    println!("{}", msg.green());
}

pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Total anomalies, financial impact and resolution rate. The card shows
/// the impact's magnitude only.
pub fn stats_cards(stats: &AggregateStats) -> Table {
    let mut table = create_table();
    table.set_header(vec!["Total Anomalies", "Financial Impact", "Resolution Rate"]);
    table.add_row(vec![
        stats.total_anomalies.to_string(),
        stats.total_impact.display_unsigned(),
        format!(
            "{} ({}/{})",
            stats.resolution_rate(),
            stats.resolved_count,
            stats.total_count
        ),
    ]);
    table
}

fn status_cell(value: &str) -> Cell {
    let cell = Cell::new(value);
    match value.parse::<RowStatus>() {
        Ok(RowStatus::Reconciled) => cell.fg(Color::Green),
        Ok(RowStatus::Pending) => cell.fg(Color::Yellow),
        Ok(RowStatus::Unmatched) => cell.fg(Color::Red),
        Err(_) => cell,
    }
}

pub fn rows_table(columns: &[String], page: &TablePage<'_>) -> Table {
    let mut table = create_table();
    table.set_header(columns.iter().map(String::as_str));

    for row in &page.rows {
        table.add_row(columns.iter().map(|c| {
            let value = row.display(c);
            if c == "status" {
                status_cell(&value)
            } else {
                Cell::new(value)
            }
        }));
    }
    table
}

/// `Showing 11-20 of 42 rows (page 2 of 5)`.
pub fn pagination_line(page: &TablePage<'_>) -> String {
    match page.row_range() {
        Some((start, end)) => format!(
            "Showing {start}-{end} of {} rows (page {} of {})",
            page.filtered_count, page.current_page, page.total_pages
        ),
        None => format!(
            "No rows on page {} ({} matching rows, {} pages)",
            page.current_page, page.filtered_count, page.total_pages
        ),
    }
}

fn severity_cell(severity: Severity) -> Cell {
    let cell = Cell::new(severity.to_string());
    match severity {
        Severity::High => cell.fg(Color::Red),
        Severity::Medium => cell.fg(Color::Yellow),
        Severity::Low => cell.fg(Color::Blue),
    }
}

pub fn anomaly_table(items: &[AnomalyItem]) -> Table {
    let mut table = create_table();
    table.set_header(vec!["ID", "Title", "Severity", "Count", "Impact", "Status", "Root Cause"]);

    for item in items {
        table.add_row(vec![
            Cell::new(&item.id),
            Cell::new(&item.title),
            severity_cell(item.severity),
            Cell::new(item.anomaly_count.map(|n| n.to_string()).unwrap_or_default()),
            Cell::new(&item.impact),
            Cell::new(item.status.to_string()),
            Cell::new(item.root_causes.join("; ")),
        ]);
    }
    table
}
