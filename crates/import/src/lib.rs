pub mod columns;
pub mod csv;
pub mod export;
pub mod file;
pub(crate) mod util;

pub use crate::columns::{normalize_column_key, resolve_columns};
pub use crate::csv::{
    detect_headers, import_csv, parse_csv, split_quoted_line, CsvError, FixedStatus,
    StatusPolicy, StatusSequence, WeightedRandomStatus,
};
pub use crate::export::{write_csv, ExportError};
pub use crate::file::{validate_upload, FileError, FileFormat};
pub use crate::util::coerce_cell;
