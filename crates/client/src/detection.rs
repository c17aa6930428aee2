use recondash_core::{CellValue, DataType, Money, RowRecord, RowStatus, StatsSource};
use recondash_import::{coerce_cell, parse_csv, FixedStatus};
use serde_json::{Map, Value};

use crate::error::ApiError;

pub const DETECTION_SOURCE: &str = "anomaly-detection";

/// Rows returned by the anomaly-detection endpoint, with the totals the
/// backend reported when it sent JSON.
#[derive(Debug, Clone, Default)]
pub struct DetectionResult {
    pub anomaly_count: Option<u64>,
    pub total_impact: Option<f64>,
    pub rows: Vec<RowRecord>,
}

impl DetectionResult {
    /// Parses a response body. JSON is recognised by content type or by a
    /// leading `{` / `[`; anything else is treated as CSV.
    pub fn from_body(body: &str, json_content_type: bool) -> Result<Self, ApiError> {
        let trimmed = body.trim_start();
        if json_content_type || trimmed.starts_with('{') || trimmed.starts_with('[') {
            let value: Value = serde_json::from_str(body)?;
            return Self::from_json(&value);
        }

        let rows = parse_csv(
            body,
            DETECTION_SOURCE,
            DataType::Anomaly,
            &mut FixedStatus(RowStatus::Unmatched),
        )?;
        Ok(Self {
            anomaly_count: None,
            total_impact: None,
            rows,
        })
    }

    pub fn from_json(value: &Value) -> Result<Self, ApiError> {
        let (records, anomaly_count, total_impact) = match value {
            Value::Array(records) => (records, None, None),
            Value::Object(map) => {
                let records = map
                    .get("data")
                    .and_then(Value::as_array)
                    .ok_or_else(|| {
                        ApiError::ResponseShape("detection response has no data array".to_string())
                    })?;
                (
                    records,
                    map.get("anomaly_count").and_then(Value::as_u64),
                    map.get("total_impact").and_then(Value::as_f64),
                )
            }
            _ => {
                return Err(ApiError::ResponseShape(
                    "detection response is neither an object nor an array".to_string(),
                ))
            }
        };

        let rows = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                record.as_object().map(|obj| row_from_json(index, obj)).ok_or_else(|| {
                    ApiError::ResponseShape(format!("detection record {} is not an object", index + 1))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            anomaly_count,
            total_impact,
            rows,
        })
    }

    /// Server totals when both were reported, otherwise the row count and
    /// the sum of any numeric `impact` column.
    pub fn stats_source(&self) -> StatsSource {
        match (self.anomaly_count, self.total_impact) {
            (Some(total_anomalies), Some(impact)) => StatsSource::ServerReported {
                total_anomalies,
                total_impact: Money::from_f64(impact),
            },
            _ => StatsSource::LocalSum,
        }
    }

    pub fn totals(&self) -> (u64, Money) {
        match self.stats_source() {
            StatsSource::ServerReported {
                total_anomalies,
                total_impact,
            } => (total_anomalies, total_impact),
            StatsSource::LocalSum => (
                self.rows.len() as u64,
                self.rows
                    .iter()
                    .filter_map(|r| r.get("impact").and_then(CellValue::as_number))
                    .map(Money::from_f64)
                    .sum(),
            ),
        }
    }
}

/// Builds an anomaly row from one JSON record. An `id` field is used as the
/// row id when present, otherwise `anomaly-detection-{n}`.
pub fn row_from_json(index: usize, record: &Map<String, Value>) -> RowRecord {
    let id = match record.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("{DETECTION_SOURCE}-{}", index + 1),
    };
    let mut row = RowRecord::new(id, DETECTION_SOURCE, RowStatus::Unmatched, DataType::Anomaly);

    for (key, value) in record {
        if key == "id" {
            continue;
        }
        let cell = match value {
            Value::Null => continue,
            Value::Number(n) => match n.as_f64() {
                Some(f) => CellValue::Number(f),
                None => CellValue::Text(n.to_string()),
            },
            Value::String(s) => coerce_cell(s),
            Value::Bool(b) => CellValue::Text(b.to_string()),
            other => CellValue::Text(other.to_string()),
        };
        row.insert(key.clone(), cell);
    }
    row
}
