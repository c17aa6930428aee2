use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const ID_KEY: &str = "id";
pub const SOURCE_KEY: &str = "source";
pub const STATUS_KEY: &str = "status";
pub const DATA_TYPE_KEY: &str = "dataType";

/// A single table cell. Numeric-looking input is stored as `Number` at
/// ingestion and only turned back into text for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            CellValue::Number(_) => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowStatus {
    Reconciled,
    Pending,
    Unmatched,
}

impl RowStatus {
    pub const ALL: [RowStatus; 3] = [RowStatus::Reconciled, RowStatus::Pending, RowStatus::Unmatched];
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowStatus::Reconciled => write!(f, "Reconciled"),
            RowStatus::Pending => write!(f, "Pending"),
            RowStatus::Unmatched => write!(f, "Unmatched"),
        }
    }
}

impl FromStr for RowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reconciled" => Ok(RowStatus::Reconciled),
            "pending" => Ok(RowStatus::Pending),
            "unmatched" => Ok(RowStatus::Unmatched),
            other => Err(format!("Unknown row status: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Current,
    Historical,
    Anomaly,
    Original,
    Processed,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Current => write!(f, "current"),
            DataType::Historical => write!(f, "historical"),
            DataType::Anomaly => write!(f, "anomaly"),
            DataType::Original => write!(f, "original"),
            DataType::Processed => write!(f, "processed"),
        }
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "current" => Ok(DataType::Current),
            "historical" => Ok(DataType::Historical),
            "anomaly" => Ok(DataType::Anomaly),
            "original" => Ok(DataType::Original),
            "processed" => Ok(DataType::Processed),
            other => Err(format!("Unknown data type: '{other}'")),
        }
    }
}

/// One parsed data line: an insertion-ordered column → value mapping.
///
/// The identity/provenance fields (`id`, `source`, `status`, `dataType`) live
/// in the same mapping as the data columns, so a data column with the same
/// name overwrites them exactly like any other key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowRecord {
    fields: Vec<(String, CellValue)>,
}

impl RowRecord {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        status: RowStatus,
        data_type: DataType,
    ) -> Self {
        let mut row = RowRecord { fields: Vec::with_capacity(8) };
        row.insert(ID_KEY, CellValue::Text(id.into()));
        row.insert(SOURCE_KEY, CellValue::Text(source.into()));
        row.insert(STATUS_KEY, CellValue::Text(status.to_string()));
        row.insert(DATA_TYPE_KEY, CellValue::Text(data_type.to_string()));
        row
    }

    /// Inserts or overwrites `key`, keeping its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: CellValue) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn id(&self) -> String {
        self.display(ID_KEY)
    }

    pub fn source(&self) -> String {
        self.display(SOURCE_KEY)
    }

    pub fn status(&self) -> Option<RowStatus> {
        self.get(STATUS_KEY)?.as_text()?.parse().ok()
    }

    pub fn data_type(&self) -> Option<DataType> {
        self.get(DATA_TYPE_KEY)?.as_text()?.parse().ok()
    }

    /// Display form of a cell, empty when the column is missing.
    pub fn display(&self, key: &str) -> String {
        self.get(key).map(ToString::to_string).unwrap_or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for RowRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
