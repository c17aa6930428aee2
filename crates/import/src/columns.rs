//! Derives one ordered, de-duplicated column list from rows whose key sets
//! differ, optionally seeded by an external header list.
//!
//! Order: priority columns, then external headers, then any other row keys
//! in first-seen order, then the metadata columns.

use recondash_core::RowRecord;
use std::collections::HashSet;

pub const PRIORITY_COLUMNS: [&str; 5] = ["id", "date", "description", "category", "amount"];
pub const TRAILING_COLUMNS: [&str; 3] = ["dataType", "status", "source"];

/// Lowercases and strips whitespace, `_` and `-`: `"Trade_ID"`, `"trade id"`
/// and `"TRADE-ID"` all become `"tradeid"`.
pub fn normalize_column_key(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_trailing(name: &str) -> bool {
    let key = normalize_column_key(name);
    TRAILING_COLUMNS
        .iter()
        .any(|t| normalize_column_key(t) == key)
}

/// First occurrence of each normalized key wins and keeps its label.
pub fn dedupe_headers(headers: &[String]) -> Vec<String> {
    let mut set = ColumnSet::default();
    for h in headers {
        set.push(h);
    }
    set.columns
}

#[derive(Default)]
struct ColumnSet {
    seen: HashSet<String>,
    columns: Vec<String>,
}

impl ColumnSet {
    fn push(&mut self, name: &str) {
        if name.is_empty() {
            return;
        }
        if self.seen.insert(normalize_column_key(name)) {
            self.columns.push(name.to_string());
        }
    }
}

/// First-seen label (headers before row keys) whose normalized form equals
/// that of `wanted`.
fn find_variant<'a>(headers: &'a [String], rows: &'a [RowRecord], wanted: &str) -> Option<&'a str> {
    let key = normalize_column_key(wanted);
    headers
        .iter()
        .map(String::as_str)
        .chain(rows.iter().flat_map(RowRecord::keys))
        .find(|name| normalize_column_key(name) == key)
}

pub fn resolve_columns(rows: &[RowRecord], headers: Option<&[String]>) -> Vec<String> {
    let headers = headers.map(dedupe_headers).unwrap_or_default();
    let mut set = ColumnSet::default();

    for wanted in PRIORITY_COLUMNS {
        if let Some(label) = find_variant(&headers, rows, wanted) {
            set.push(label);
        }
    }

    for header in headers.iter().filter(|h| !is_trailing(h)) {
        set.push(header);
    }

    for row in rows {
        for key in row.keys().filter(|k| !is_trailing(k)) {
            set.push(key);
        }
    }

    for wanted in TRAILING_COLUMNS {
        if let Some(label) = find_variant(&headers, rows, wanted) {
            set.push(label);
        }
    }

    set.columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use recondash_core::{CellValue, DataType, RowStatus};

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn row(extra: &[(&str, f64)]) -> RowRecord {
        let mut r = RowRecord::new("f-1", "f", RowStatus::Pending, DataType::Current);
        for (k, v) in extra {
            r.insert(*k, CellValue::Number(*v));
        }
        r
    }

    #[test]
    fn normalization_ignores_case_space_underscore_hyphen() {
        assert_eq!(normalize_column_key("Trade_ID"), "tradeid");
        assert_eq!(normalize_column_key(" trade id "), "tradeid");
        assert_eq!(normalize_column_key("TRADE-ID"), "tradeid");
    }

    #[test]
    fn case_variants_collapse_to_first_label() {
        let headers = strings(&["Amount", "amount", "AMOUNT"]);
        assert_eq!(resolve_columns(&[], Some(headers.as_slice())), vec!["Amount"]);
    }

    #[test]
    fn priority_then_headers_then_rows_then_trailing() {
        let rows = vec![row(&[("zeta", 1.0), ("amount", 2.0), ("memo", 3.0)])];
        let headers = strings(&["memo", "description", "account"]);
        assert_eq!(
            resolve_columns(&rows, Some(headers.as_slice())),
            vec!["id", "description", "amount", "memo", "account", "zeta", "dataType", "status", "source"]
        );
    }

    #[test]
    fn without_headers_uses_row_key_order() {
        let rows = vec![
            row(&[("b", 1.0), ("a", 2.0)]),
            row(&[("c", 1.0), ("b", 2.0)]),
        ];
        assert_eq!(
            resolve_columns(&rows, None),
            vec!["id", "b", "a", "c", "dataType", "status", "source"]
        );
    }

    #[test]
    fn trailing_headers_are_moved_to_the_end() {
        let headers = strings(&["Status", "ref"]);
        let rows: Vec<RowRecord> = vec![];
        assert_eq!(resolve_columns(&rows, Some(headers.as_slice())), vec!["ref", "Status"]);
    }

    #[test]
    fn normalized_duplicates_across_rows_are_dropped() {
        let rows = vec![row(&[("trade_id", 1.0)]), row(&[("Trade ID", 2.0)])];
        let cols = resolve_columns(&rows, None);
        assert_eq!(cols.iter().filter(|c| normalize_column_key(c) == "tradeid").count(), 1);
        assert!(cols.contains(&"trade_id".to_string()));
    }

    #[test]
    fn priority_column_uses_header_variant_label() {
        let rows = vec![row(&[("Date", 1.0)])];
        let headers = strings(&["DATE"]);
        assert_eq!(resolve_columns(&rows, Some(headers.as_slice()))[1], "DATE");
    }

    #[test]
    fn resolution_is_idempotent() {
        let rows = vec![row(&[("x", 1.0), ("Amount", 2.0)]), row(&[("y", 1.0)])];
        let headers = strings(&["y", "category", "x"]);
        let first = resolve_columns(&rows, Some(headers.as_slice()));
        let second = resolve_columns(&rows, Some(headers.as_slice()));
        assert_eq!(first, second);
    }

    #[test]
    fn empty_input_gives_no_columns() {
        assert!(resolve_columns(&[], None).is_empty());
    }
}
