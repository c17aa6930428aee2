use rand::rngs::ThreadRng;
use rand::Rng;
use recondash_core::row::ID_KEY;
use recondash_core::{CellValue, DataType, RowRecord, RowStatus};
use std::collections::HashSet;
use std::io::Read;
use thiserror::Error;

use crate::util::coerce_cell;

/// Rows with this many keys or fewer carry no data columns.
const METADATA_KEY_COUNT: usize = 4;

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV file is empty or has no data rows after the header")]
    EmptyInput,
}

/// Decides the reconciliation status of each freshly parsed row.
pub trait StatusPolicy {
    fn assign(&mut self, line_number: usize) -> RowStatus;
}

/// 60% Reconciled, 30% Pending, 10% Unmatched.
pub struct WeightedRandomStatus<R: Rng> {
    rng: R,
}

impl<R: Rng> WeightedRandomStatus<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl WeightedRandomStatus<ThreadRng> {
    pub fn thread_local() -> Self {
        Self::new(rand::thread_rng())
    }
}

impl<R: Rng> StatusPolicy for WeightedRandomStatus<R> {
    fn assign(&mut self, _line_number: usize) -> RowStatus {
        let roll: f64 = self.rng.gen();
        if roll < 0.6 {
            RowStatus::Reconciled
        } else if roll < 0.9 {
            RowStatus::Pending
        } else {
            RowStatus::Unmatched
        }
    }
}

pub struct FixedStatus(pub RowStatus);

impl StatusPolicy for FixedStatus {
    fn assign(&mut self, _line_number: usize) -> RowStatus {
        self.0
    }
}

/// Cycles through a fixed list; an empty list yields `Pending`.
pub struct StatusSequence {
    statuses: Vec<RowStatus>,
    next: usize,
}

impl StatusSequence {
    pub fn new(statuses: Vec<RowStatus>) -> Self {
        Self { statuses, next: 0 }
    }
}

impl StatusPolicy for StatusSequence {
    fn assign(&mut self, _line_number: usize) -> RowStatus {
        if self.statuses.is_empty() {
            return RowStatus::Pending;
        }
        let status = self.statuses[self.next % self.statuses.len()];
        self.next += 1;
        status
    }
}

/// Keeps an `id` taken from the data when it is non-blank and not yet issued
/// in this batch; otherwise the row falls back to its seeded id, suffixed if
/// a data id already claimed that too.
fn claim_row_id(row: &mut RowRecord, seeded: &str, issued: &mut HashSet<String>) {
    let id = row.id();
    if !id.trim().is_empty() && !issued.contains(&id) {
        issued.insert(id);
        return;
    }

    let mut fallback = seeded.to_string();
    let mut suffix = 2;
    while issued.contains(&fallback) {
        fallback = format!("{seeded}-{suffix}");
        suffix += 1;
    }
    tracing::debug!(seeded, replaced = %id, id = %fallback, "Data id blank or repeated");
    row.insert(ID_KEY, CellValue::Text(fallback.clone()));
    issued.insert(fallback);
}

fn non_empty_lines(content: &str) -> impl Iterator<Item = &str> {
    content.lines().filter(|line| !line.trim().is_empty())
}

fn split_header(line: &str) -> Vec<String> {
    line.split(',').map(|h| h.trim().to_string()).collect()
}

/// Splits one line on commas, treating commas between double quotes as
/// literal. Quote characters are dropped; there is no escaped-quote form and
/// quoting never spans lines.
pub fn split_quoted_line(line: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => values.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    values.push(current);

    values
}

/// Returns the trimmed header names of the first non-empty line.
pub fn detect_headers(content: &str) -> Result<Vec<String>, CsvError> {
    non_empty_lines(content)
        .next()
        .map(split_header)
        .ok_or(CsvError::EmptyInput)
}

pub fn parse_csv(
    content: &str,
    source: &str,
    data_type: DataType,
    policy: &mut dyn StatusPolicy,
) -> Result<Vec<RowRecord>, CsvError> {
    let mut lines = non_empty_lines(content);
    let headers = lines.next().map(split_header).ok_or(CsvError::EmptyInput)?;

    let mut rows = Vec::new();
    let mut issued = HashSet::new();
    let mut data_lines = 0usize;

    for (index, line) in lines.enumerate() {
        data_lines += 1;
        let line_number = index + 1;
        let seeded = format!("{source}-{line_number}");
        let mut row = RowRecord::new(
            seeded.clone(),
            source,
            policy.assign(line_number),
            data_type,
        );

        let values = split_quoted_line(line);
        for (header, value) in headers.iter().zip(values.iter()) {
            if header.is_empty() {
                continue;
            }
            row.insert(header.clone(), coerce_cell(value));
        }

        if row.len() <= METADATA_KEY_COUNT {
            tracing::debug!(source, line_number, "Discarding row without data columns");
            continue;
        }
        claim_row_id(&mut row, &seeded, &mut issued);
        rows.push(row);
    }

    if data_lines == 0 {
        return Err(CsvError::EmptyInput);
    }

    Ok(rows)
}

pub fn import_csv<R: Read>(
    mut data: R,
    source: &str,
    data_type: DataType,
    policy: &mut dyn StatusPolicy,
) -> Result<Vec<RowRecord>, CsvError> {
    let mut content = String::new();
    data.read_to_string(&mut content)?;
    parse_csv(&content, source, data_type, policy)
}
