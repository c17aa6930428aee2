//! Process command - validate, parse and optionally upload a batch of files

use anyhow::{Context, Result};
use recondash_client::{ApiClient, UploadKind, UploadResponse};
use recondash_core::RowRecord;
use recondash_import::{parse_csv, validate_upload, FileFormat, StatusPolicy, WeightedRandomStatus};
use std::path::{Path, PathBuf};

use crate::output;
use crate::SharedState;

#[derive(Debug)]
pub struct ProcessedFile {
    pub name: String,
    pub format: FileFormat,
    pub rows: Vec<RowRecord>,
    pub upload: Option<UploadResponse>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub rows: usize,
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

/// Validates and parses one file. Spreadsheets are accepted but only the
/// backend parses them, so they produce no local rows.
pub async fn process_file(
    path: &Path,
    kind: UploadKind,
    client: Option<&ApiClient>,
    policy: &mut dyn StatusPolicy,
) -> Result<ProcessedFile> {
    let name = display_name(path);
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let format = validate_upload(&name, &bytes)?;

    let rows = match format {
        FileFormat::Csv => {
            let content = String::from_utf8_lossy(&bytes);
            parse_csv(&content, &name, kind.data_type(), policy)?
        }
        FileFormat::Excel => Vec::new(),
    };

    let upload = match client {
        Some(client) => Some(client.upload(kind, &name, bytes).await?),
        None => None,
    };

    tracing::info!(file = %name, rows = rows.len(), uploaded = upload.is_some(), "Processed file");
    Ok(ProcessedFile {
        name,
        format,
        rows,
        upload,
    })
}

/// Files are handled one at a time in the given order; a failure is
/// recorded and the batch moves on.
pub async fn process_batch(
    files: &[PathBuf],
    kind: UploadKind,
    client: Option<&ApiClient>,
    policy: &mut dyn StatusPolicy,
) -> Vec<(PathBuf, Result<ProcessedFile>)> {
    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let result = process_file(path, kind, client, policy).await;
        if let Err(e) = &result {
            tracing::warn!(file = %path.display(), error = %e, "File failed");
        }
        results.push((path.clone(), result));
    }
    results
}

fn report(path: &Path, result: &Result<ProcessedFile>, summary: &mut BatchSummary) {
    match result {
        Ok(file) => {
            summary.succeeded += 1;
            summary.rows += file.rows.len();

            let mut msg = match file.format {
                FileFormat::Csv => format!("✓ {}: {} rows", file.name, file.rows.len()),
                FileFormat::Excel => format!("✓ {}: spreadsheet accepted", file.name),
            };
            if let Some(upload) = &file.upload {
                msg.push_str(&format!(
                    " - {}",
                    upload.message.as_deref().unwrap_or("uploaded")
                ));
                if let Some(statuses) = &upload.match_status_summary {
                    let parts: Vec<String> = statuses.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                    msg.push_str(&format!(" ({})", parts.join(", ")));
                }
            }
            output::success(&msg);
        }
        Err(e) => {
            summary.failed += 1;
            output::error(&format!("✗ {}: {e:#}", path.display()));
        }
    }
}

pub async fn run(state: &SharedState, files: Vec<PathBuf>, kind: UploadKind, upload: bool) -> Result<()> {
    let client = state.lock().await.client.clone();
    let mut policy = WeightedRandomStatus::thread_local();

    let results = process_batch(&files, kind, upload.then_some(&client), &mut policy).await;

    let mut summary = BatchSummary::default();
    for (path, result) in &results {
        report(path, result, &mut summary);
    }

    state.lock().await.store.refresh_stats();

    println!();
    let line = format!(
        "Processed {} of {} files, {} rows",
        summary.succeeded,
        files.len(),
        summary.rows
    );
    if summary.failed == 0 {
        output::info(&line);
    } else {
        output::warning(&format!("{line} ({} failed)", summary.failed));
    }
    Ok(())
}
