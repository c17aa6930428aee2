use std::sync::OnceLock;

use recondash_core::CellValue;
use regex::Regex;

fn numeric_pattern() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("invalid regex"))
}

/// Trims `raw` and stores it as a number when it matches `-?digits(.digits)?`.
pub fn coerce_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if numeric_pattern().is_match(trimmed) {
        if let Ok(n) = trimmed.parse::<f64>() {
            return CellValue::Number(n);
        }
    }
    CellValue::Text(trimmed.to_string())
}
