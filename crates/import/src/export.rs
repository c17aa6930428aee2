use recondash_core::RowRecord;
use std::io::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    CsvError(#[from] ::csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Writes `columns` as the header and one record per row; cells a row does
/// not have are left empty.
pub fn write_csv<W: Write>(
    writer: W,
    columns: &[String],
    rows: &[&RowRecord],
) -> Result<(), ExportError> {
    let mut out = ::csv::Writer::from_writer(writer);
    out.write_record(columns)?;
    for row in rows {
        out.write_record(columns.iter().map(|c| row.display(c)))?;
    }
    out.flush()?;
    Ok(())
}
