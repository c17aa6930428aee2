use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    /// Accepted for upload only; never parsed locally.
    Excel,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FileError {
    #[error("Unsupported file type '{0}': expected .csv, .xlsx or .xls")]
    UnsupportedExtension(String),
    #[error("File '{0}' is empty")]
    EmptyFile(String),
}

impl FileFormat {
    pub fn from_file_name(file_name: &str) -> Result<Self, FileError> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();
        match ext.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" | "xls" => Ok(FileFormat::Excel),
            _ => Err(FileError::UnsupportedExtension(file_name.to_string())),
        }
    }
}

/// Checks extension and content before a file is parsed or uploaded.
pub fn validate_upload(file_name: &str, bytes: &[u8]) -> Result<FileFormat, FileError> {
    let format = FileFormat::from_file_name(file_name)?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(FileError::EmptyFile(file_name.to_string()));
    }
    Ok(format)
}
