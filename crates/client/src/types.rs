use recondash_core::DataType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Which upload endpoint a file goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Realtime,
    Historical,
    Reconciliation,
}

impl UploadKind {
    pub fn path(self) -> &'static str {
        match self {
            UploadKind::Realtime => "/upload/realtime",
            UploadKind::Historical => "/upload/historical",
            UploadKind::Reconciliation => "/upload-reconciliation",
        }
    }

    /// Tag given to rows parsed locally from a file of this kind.
    pub fn data_type(self) -> DataType {
        match self {
            UploadKind::Realtime => DataType::Current,
            UploadKind::Historical => DataType::Historical,
            UploadKind::Reconciliation => DataType::Original,
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UploadKind::Realtime => "realtime",
            UploadKind::Historical => "historical",
            UploadKind::Reconciliation => "reconciliation",
        };
        write!(f, "{s}")
    }
}

impl FromStr for UploadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "realtime" | "current" => Ok(UploadKind::Realtime),
            "historical" => Ok(UploadKind::Historical),
            "reconciliation" | "original" => Ok(UploadKind::Reconciliation),
            other => Err(format!("Unknown upload kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default, alias = "rows", alias = "total_rows")]
    pub row_count: Option<u64>,
    /// Rows per split (e.g. `current` / `historical`) when the backend
    /// divides an upload.
    #[serde(default)]
    pub row_split: Option<BTreeMap<String, u64>>,
    #[serde(default)]
    pub match_status_summary: Option<BTreeMap<String, u64>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RuleSuggestion {
    #[serde(default, alias = "rule", alias = "name")]
    pub rule_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RuleSuggestionsEnvelope {
    #[serde(default)]
    pub data: Vec<RuleSuggestion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl FromStr for TicketPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(TicketPriority::High),
            "medium" => Ok(TicketPriority::Medium),
            "low" => Ok(TicketPriority::Low),
            other => Err(format!("Unknown ticket priority: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketRequest {
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_id: Option<String>,
}

/// Sent form-encoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailNotification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MutationResponse {
    #[serde(default)]
    pub message: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
