//! Table command - browse a CSV file through the table view model

use anyhow::{bail, Context, Result};
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use recondash_core::row::{DATA_TYPE_KEY, STATUS_KEY};
use recondash_core::table::{
    filter_rows, query, sort_rows, ColumnFilter, SortDirection, SortSpec, TableQuery, FILTER_ALL,
};
use recondash_core::{DataType, RowRecord, RowStatus};
use recondash_import::{
    detect_headers, parse_csv, resolve_columns, validate_upload, write_csv, FileFormat,
    StatusPolicy, WeightedRandomStatus,
};
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::output;

#[derive(Args, Debug, Clone)]
pub struct TableArgs {
    /// CSV file to browse
    pub file: PathBuf,
    /// Case-insensitive text matched against every column
    #[arg(long, short)]
    pub search: Option<String>,
    /// Only rows with this status (reconciled, pending, unmatched, all)
    #[arg(long)]
    pub status: Option<String>,
    /// Only rows with this data type tag (current, historical, ..., all)
    #[arg(long)]
    pub data_type: Option<String>,
    /// Data type tag given to the parsed rows
    #[arg(long, default_value = "current")]
    pub tag: String,
    /// Column to sort by
    #[arg(long)]
    pub sort: Option<String>,
    /// Sort descending
    #[arg(long)]
    pub desc: bool,
    /// 1-based page number
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    /// Rows per page (defaults to the configured value)
    #[arg(long)]
    pub per_page: Option<usize>,
    /// Write all filtered and sorted rows to this CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,
    /// Seed for the simulated reconciliation status
    #[arg(long)]
    pub seed: Option<u64>,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Filter values are matched against the rendered cell, so they are parsed
/// and re-rendered to get the canonical spelling.
fn canonical_filter<T>(column: &str, value: &str) -> Result<ColumnFilter>
where
    T: std::str::FromStr<Err = String> + std::fmt::Display,
{
    if value.eq_ignore_ascii_case(FILTER_ALL) {
        return Ok(ColumnFilter::new(column, FILTER_ALL));
    }
    let parsed: T = value.parse().map_err(anyhow::Error::msg)?;
    Ok(ColumnFilter::new(column, parsed.to_string()))
}

pub fn build_query(args: &TableArgs, default_per_page: usize) -> Result<TableQuery> {
    let mut filters = Vec::new();
    if let Some(status) = &args.status {
        filters.push(canonical_filter::<RowStatus>(STATUS_KEY, status)?);
    }
    if let Some(data_type) = &args.data_type {
        filters.push(canonical_filter::<DataType>(DATA_TYPE_KEY, data_type)?);
    }

    Ok(TableQuery {
        search: args.search.clone().unwrap_or_default(),
        filters,
        sort: args.sort.as_ref().map(|column| SortSpec {
            column: column.clone(),
            direction: if args.desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            },
        }),
        page: args.page,
        items_per_page: args.per_page.unwrap_or(default_per_page),
    })
}

pub fn load_rows(args: &TableArgs) -> Result<(Vec<String>, Vec<RowRecord>)> {
    let name = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    if validate_upload(&name, &bytes)? == FileFormat::Excel {
        bail!("{name}: spreadsheets are only parsed by the backend");
    }

    let data_type: DataType = args.tag.parse().map_err(anyhow::Error::msg)?;
    let content = String::from_utf8_lossy(&bytes);

    let mut policy: Box<dyn StatusPolicy> = match args.seed {
        Some(seed) => Box::new(WeightedRandomStatus::new(StdRng::seed_from_u64(seed))),
        None => Box::new(WeightedRandomStatus::thread_local()),
    };
    let rows = parse_csv(&content, &name, data_type, policy.as_mut())?;
    let headers = detect_headers(&content)?;
    let columns = resolve_columns(&rows, Some(headers.as_slice()));
    Ok((columns, rows))
}

/// Every row that passes the filters, in sorted order, ignoring pagination.
pub fn export_rows(rows: &[RowRecord], columns: &[String], q: &TableQuery, out: &Path) -> Result<usize> {
    let mut matched = filter_rows(rows, q);
    if let Some(sort) = &q.sort {
        sort_rows(&mut matched, sort);
    }
    let file = std::fs::File::create(out)
        .with_context(|| format!("Failed to create {}", out.display()))?;
    write_csv(file, columns, &matched)?;
    Ok(matched.len())
}

pub fn run(args: TableArgs, default_per_page: usize) -> Result<()> {
    let (columns, rows) = load_rows(&args)?;
    let q = build_query(&args, default_per_page)?;
    let page = query(&rows, &q);

    if args.json {
        let out = json!({
            "columns": columns,
            "rows": page.rows,
            "filteredCount": page.filtered_count,
            "currentPage": page.current_page,
            "totalPages": page.total_pages,
            "itemsPerPage": page.items_per_page,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", output::rows_table(&columns, &page));
        output::info(&output::pagination_line(&page));
    }

    if let Some(out) = &args.export {
        let count = export_rows(&rows, &columns, &q, out)?;
        output::success(&format!("Exported {count} rows to {}", out.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: TableArgs,
    }

    fn args(argv: &[&str]) -> TableArgs {
        let mut full = vec!["table"];
        full.extend_from_slice(argv);
        Harness::parse_from(full).args
    }

    fn csv_file(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn query_from_flags() {
        let a = args(&["f.csv", "--search", "acme", "--status", "pending", "--sort", "amount", "--desc", "--page", "3"]);
        let q = build_query(&a, 25).unwrap();
        assert_eq!(q.search, "acme");
        assert_eq!(q.filters, vec![ColumnFilter::new(STATUS_KEY, "Pending")]);
        assert_eq!(q.sort.unwrap().direction, SortDirection::Desc);
        assert_eq!(q.page, 3);
        assert_eq!(q.items_per_page, 25);
    }

    #[test]
    fn all_status_is_an_inactive_filter() {
        let q = build_query(&args(&["f.csv", "--status", "ALL"]), 10).unwrap();
        assert!(!q.filters[0].is_active());
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(build_query(&args(&["f.csv", "--status", "lost"]), 10).is_err());
    }

    #[test]
    fn load_rows_resolves_columns() {
        let (_dir, path) = csv_file("Amount,Date,memo\n10,2026-01-02,a\n20,2026-01-03,b\n");
        let a = args(&[path.to_str().unwrap(), "--seed", "4", "--tag", "historical"]);
        let (columns, rows) = load_rows(&a).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].data_type(), Some(DataType::Historical));
        assert_eq!(
            columns,
            vec!["id", "Date", "Amount", "memo", DATA_TYPE_KEY, STATUS_KEY, "source"]
        );
    }

    #[test]
    fn spreadsheets_are_not_parsed_locally() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        std::fs::write(&path, "PK").unwrap();
        assert!(load_rows(&args(&[path.to_str().unwrap()])).is_err());
    }

    #[test]
    fn data_type_filter_uses_canonical_tag() {
        let q = build_query(&args(&["f.csv", "--data-type", "Historical"]), 10).unwrap();
        assert_eq!(q.filters, vec![ColumnFilter::new(DATA_TYPE_KEY, "historical")]);
    }

    #[test]
    fn export_writes_every_matching_row_in_order() {
        let (dir, path) = csv_file("name,amount\nb,2\na,1\nc,3\nd,9\n");
        let a = args(&[path.to_str().unwrap(), "--sort", "amount", "--per-page", "1", "--tag", "original"]);
        let (columns, rows) = load_rows(&a).unwrap();
        assert_eq!(columns[1..3], ["amount", "name"]);

        let out = dir.path().join("out.csv");
        let count = export_rows(&rows, &columns, &build_query(&a, 10).unwrap(), &out).unwrap();
        assert_eq!(count, 4);

        let written = std::fs::read_to_string(&out).unwrap();
        let names: Vec<&str> = written
            .lines()
            .skip(1)
            .map(|l| l.split(',').nth(2).unwrap())
            .collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);

        // only the original-tagged rows exist, so this filter excludes all
        let mut q = build_query(&a, 10).unwrap();
        q.filters.push(ColumnFilter::new(DATA_TYPE_KEY, "current"));
        assert_eq!(export_rows(&rows, &columns, &q, &out).unwrap(), 0);
    }
}
