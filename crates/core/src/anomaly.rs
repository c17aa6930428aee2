use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::{parse_currency, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Grades a bucket by how many anomalies it groups.
    pub fn from_anomaly_count(count: u64) -> Self {
        match count {
            c if c >= 50 => Severity::High,
            c if c >= 10 => Severity::Medium,
            _ => Severity::Low,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Resolved,
    #[default]
    Unresolved,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStatus::Resolved => write!(f, "resolved"),
            ItemStatus::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// Display-ready summary of one group of detected discrepancies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub category: String,
    pub date: String,
    /// Currency-formatted, e.g. `-$1,200.00`.
    pub impact: String,
    pub status: ItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub root_causes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_records: Vec<String>,
}

impl AnomalyItem {
    pub fn is_resolved(&self) -> bool {
        self.status == ItemStatus::Resolved
    }

    /// The impact string parsed back into an amount; `None` when it is not
    /// a currency value.
    pub fn impact_amount(&self) -> Option<Money> {
        parse_currency(&self.impact).ok()
    }
}
