//! In-memory table querying: categorical filters, free-text search, sorting
//! and 1-based pagination over a borrowed row collection.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::row::{CellValue, RowRecord};

/// Filter value that disables a categorical filter.
pub const FILTER_ALL: &str = "all";

pub const DEFAULT_ITEMS_PER_PAGE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub column: String,
    pub value: String,
}

impl ColumnFilter {
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.value != FILTER_ALL
    }

    fn accepts(&self, row: &RowRecord) -> bool {
        !self.is_active()
            || row
                .get(&self.column)
                .is_some_and(|v| v.to_string() == self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableQuery {
    pub search: String,
    pub filters: Vec<ColumnFilter>,
    pub sort: Option<SortSpec>,
    /// 1-based.
    pub page: usize,
    pub items_per_page: usize,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            filters: Vec::new(),
            sort: None,
            page: 1,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TablePage<'a> {
    pub rows: Vec<&'a RowRecord>,
    pub filtered_count: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub items_per_page: usize,
}

impl TablePage<'_> {
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// 1-based inclusive range of the rows on this page, `None` when empty.
    pub fn row_range(&self) -> Option<(usize, usize)> {
        if self.rows.is_empty() {
            return None;
        }
        let start = (self.current_page - 1) * self.items_per_page + 1;
        Some((start, start + self.rows.len() - 1))
    }
}

/// Filters are applied first (AND across filters), then the search term
/// (OR across every field of the row).
pub fn filter_rows<'a>(rows: &'a [RowRecord], query: &TableQuery) -> Vec<&'a RowRecord> {
    let needle = query.search.to_lowercase();
    rows.iter()
        .filter(|row| query.filters.iter().all(|f| f.accepts(row)))
        .filter(|row| needle.is_empty() || matches_search(row, &needle))
        .collect()
}

fn matches_search(row: &RowRecord, needle: &str) -> bool {
    row.iter()
        .any(|(_, v)| v.to_string().to_lowercase().contains(needle))
}

/// Stable sort; rows missing the column compare as empty text.
pub fn sort_rows(rows: &mut [&RowRecord], sort: &SortSpec) {
    rows.sort_by(|a, b| {
        let ord = compare_values(a.get(&sort.column), b.get(&sort.column));
        match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

/// Dispatches on the runtime type of both values: numbers compare
/// numerically, everything else by locale-style string comparison.
pub fn compare_values(a: Option<&CellValue>, b: Option<&CellValue>) -> Ordering {
    match (a, b) {
        (Some(CellValue::Number(x)), Some(CellValue::Number(y))) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (Some(CellValue::Text(x)), Some(CellValue::Text(y))) => locale_compare(x, y),
        _ => {
            let x = a.map(ToString::to_string).unwrap_or_default();
            let y = b.map(ToString::to_string).unwrap_or_default();
            locale_compare(&x, &y)
        }
    }
}

/// Case-insensitive primary ordering; on a tie lowercase sorts before
/// uppercase (`"a" < "A" < "b"`).
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let primary = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    primary.then_with(|| {
        a.chars()
            .zip(b.chars())
            .find(|(x, y)| x != y)
            .map(|(x, y)| match (x.is_lowercase(), y.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => x.cmp(&y),
            })
            .unwrap_or_else(|| a.len().cmp(&b.len()))
    })
}

pub fn total_pages(count: usize, items_per_page: usize) -> usize {
    count.div_ceil(items_per_page.max(1))
}

/// Navigation helper: keeps a requested page inside `[1, total_pages]`.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Slice `[(page-1)*n, page*n)`. Out-of-range pages are not clamped and
/// yield an empty slice.
pub fn paginate<T>(items: &[T], page: usize, items_per_page: usize) -> &[T] {
    let per_page = items_per_page.max(1);
    let start = page.saturating_sub(1).saturating_mul(per_page);
    if page == 0 || start >= items.len() {
        return &[];
    }
    let end = (start + per_page).min(items.len());
    &items[start..end]
}

pub fn query<'a>(rows: &'a [RowRecord], query: &TableQuery) -> TablePage<'a> {
    let mut matched = filter_rows(rows, query);
    if let Some(sort) = &query.sort {
        sort_rows(&mut matched, sort);
    }

    let items_per_page = query.items_per_page.max(1);
    TablePage {
        rows: paginate(&matched, query.page, items_per_page).to_vec(),
        filtered_count: matched.len(),
        total_pages: total_pages(matched.len(), items_per_page),
        current_page: query.page,
        items_per_page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::{DataType, RowStatus};

    fn row(n: usize, status: RowStatus, desc: &str, amount: f64) -> RowRecord {
        let mut r = RowRecord::new(format!("f.csv-{n}"), "f.csv", status, DataType::Current);
        r.insert("description", CellValue::text(desc));
        r.insert("amount", CellValue::Number(amount));
        r
    }

    fn sample() -> Vec<RowRecord> {
        vec![
            row(1, RowStatus::Reconciled, "Amazon order", 49.99),
            row(2, RowStatus::Pending, "Starbucks", -5.0),
            row(3, RowStatus::Unmatched, "amazon refund", -49.99),
            row(4, RowStatus::Reconciled, "Whole Foods", 120.0),
            row(5, RowStatus::Pending, "Github", 4.0),
        ]
    }

    fn ids(page: &TablePage<'_>) -> Vec<String> {
        page.rows.iter().map(|r| r.id()).collect()
    }

    #[test]
    fn status_filter_keeps_matching_rows() {
        let rows = sample();
        let q = TableQuery {
            filters: vec![ColumnFilter::new("status", "Pending")],
            ..TableQuery::default()
        };
        assert_eq!(ids(&query(&rows, &q)), vec!["f.csv-2", "f.csv-5"]);
    }

    #[test]
    fn all_disables_filter() {
        let rows = sample();
        let q = TableQuery {
            filters: vec![ColumnFilter::new("status", FILTER_ALL)],
            ..TableQuery::default()
        };
        assert_eq!(query(&rows, &q).filtered_count, 5);
    }

    #[test]
    fn filters_are_anded() {
        let rows = sample();
        let q = TableQuery {
            filters: vec![
                ColumnFilter::new("status", "Reconciled"),
                ColumnFilter::new("description", "Whole Foods"),
            ],
            ..TableQuery::default()
        };
        assert_eq!(ids(&query(&rows, &q)), vec!["f.csv-4"]);
    }

    #[test]
    fn filter_on_missing_column_excludes_row() {
        let rows = sample();
        let q = TableQuery {
            filters: vec![ColumnFilter::new("category", "Food")],
            ..TableQuery::default()
        };
        assert_eq!(query(&rows, &q).filtered_count, 0);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let rows = sample();
        let q = TableQuery {
            search: "AMAZON".to_string(),
            ..TableQuery::default()
        };
        assert_eq!(ids(&query(&rows, &q)), vec!["f.csv-1", "f.csv-3"]);

        // numbers are searched by their display form
        let q = TableQuery {
            search: "120".to_string(),
            ..TableQuery::default()
        };
        assert_eq!(ids(&query(&rows, &q)), vec!["f.csv-4"]);
    }

    #[test]
    fn search_term_is_not_trimmed() {
        let rows = sample();
        let q = TableQuery {
            search: " ".to_string(),
            ..TableQuery::default()
        };
        assert_eq!(ids(&query(&rows, &q)), vec!["f.csv-1", "f.csv-3", "f.csv-4"]);

        let q = TableQuery {
            search: "AMAZON ".to_string(),
            ..TableQuery::default()
        };
        assert_eq!(ids(&query(&rows, &q)), vec!["f.csv-1", "f.csv-3"]);

        let q = TableQuery {
            search: "starbucks ".to_string(),
            ..TableQuery::default()
        };
        assert_eq!(query(&rows, &q).filtered_count, 0);
    }

    #[test]
    fn search_applies_after_filters() {
        let rows = sample();
        let q = TableQuery {
            search: "amazon".to_string(),
            filters: vec![ColumnFilter::new("status", "Unmatched")],
            ..TableQuery::default()
        };
        assert_eq!(ids(&query(&rows, &q)), vec!["f.csv-3"]);
    }

    #[test]
    fn filtered_rows_are_a_subset() {
        let rows = sample();
        let q = TableQuery {
            search: "o".to_string(),
            ..TableQuery::default()
        };
        let page = query(&rows, &q);
        assert!(page.rows.iter().all(|r| rows.iter().any(|orig| std::ptr::eq(orig, *r))));
    }

    #[test]
    fn numeric_sort_ascending_and_descending() {
        let rows = sample();
        let mut q = TableQuery {
            sort: Some(SortSpec {
                column: "amount".to_string(),
                direction: SortDirection::Asc,
            }),
            ..TableQuery::default()
        };
        let asc = ids(&query(&rows, &q));
        assert_eq!(asc, vec!["f.csv-3", "f.csv-2", "f.csv-5", "f.csv-1", "f.csv-4"]);

        q.sort.as_mut().unwrap().direction = SortDirection::Desc;
        let desc = ids(&query(&rows, &q));
        let mut reversed = asc.clone();
        reversed.reverse();
        assert_eq!(desc, reversed);
    }

    #[test]
    fn text_sort_is_case_insensitive() {
        let rows = sample();
        let q = TableQuery {
            sort: Some(SortSpec {
                column: "description".to_string(),
                direction: SortDirection::Asc,
            }),
            ..TableQuery::default()
        };
        assert_eq!(
            ids(&query(&rows, &q)),
            vec!["f.csv-1", "f.csv-3", "f.csv-5", "f.csv-2", "f.csv-4"]
        );
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let rows = sample();
        let q = TableQuery {
            sort: Some(SortSpec {
                column: "status".to_string(),
                direction: SortDirection::Asc,
            }),
            ..TableQuery::default()
        };
        assert_eq!(
            ids(&query(&rows, &q)),
            vec!["f.csv-2", "f.csv-5", "f.csv-1", "f.csv-4", "f.csv-3"]
        );
    }

    #[test]
    fn mixed_types_compare_as_strings() {
        let n = CellValue::Number(10.0);
        let t = CellValue::text("9");
        // "10" < "9" lexically
        assert_eq!(compare_values(Some(&n), Some(&t)), Ordering::Less);
        assert_eq!(compare_values(None, Some(&t)), Ordering::Less);
    }

    #[test]
    fn locale_compare_orders_lowercase_first_on_ties() {
        assert_eq!(locale_compare("a", "A"), Ordering::Less);
        assert_eq!(locale_compare("A", "b"), Ordering::Less);
        assert_eq!(locale_compare("abc", "ABC"), Ordering::Less);
        assert_eq!(locale_compare("same", "same"), Ordering::Equal);
    }

    #[test]
    fn pagination_slices_and_counts() {
        let rows: Vec<RowRecord> = (1..=23)
            .map(|n| row(n, RowStatus::Pending, "x", n as f64))
            .collect();
        let mut q = TableQuery {
            items_per_page: 10,
            ..TableQuery::default()
        };

        let mut sizes = Vec::new();
        for page in 1..=3 {
            q.page = page;
            let p = query(&rows, &q);
            assert_eq!(p.total_pages, 3);
            assert!(p.rows.len() <= 10);
            sizes.push(p.rows.len());
        }
        assert_eq!(sizes, vec![10, 10, 3]);
        assert_eq!(sizes.iter().sum::<usize>(), 23);

        q.page = 3;
        assert_eq!(query(&rows, &q).row_range(), Some((21, 23)));
    }

    #[test]
    fn out_of_range_page_is_empty_not_clamped() {
        let rows = sample();
        let q = TableQuery {
            page: 9,
            items_per_page: 2,
            ..TableQuery::default()
        };
        let p = query(&rows, &q);
        assert!(p.rows.is_empty());
        assert_eq!(p.current_page, 9);
        assert_eq!(p.total_pages, 3);
        assert!(!p.has_next());
    }

    #[test]
    fn page_zero_is_empty() {
        let rows = sample();
        assert!(paginate(&rows, 0, 2).is_empty());
    }

    #[test]
    fn clamp_page_bounds() {
        assert_eq!(clamp_page(0, 5), 1);
        assert_eq!(clamp_page(7, 5), 5);
        assert_eq!(clamp_page(3, 0), 1);
    }

    #[test]
    fn zero_items_per_page_is_treated_as_one() {
        assert_eq!(total_pages(3, 0), 3);
        let rows = sample();
        let q = TableQuery {
            items_per_page: 0,
            ..TableQuery::default()
        };
        assert_eq!(query(&rows, &q).rows.len(), 1);
    }
}
