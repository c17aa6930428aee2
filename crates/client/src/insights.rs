//! Canonicalisation of the `/insights` response.
//!
//! The backend has returned insight buckets in several shapes over time: a
//! bare array, an object wrapping the array under one of a few keys, or a
//! single bucket object. Field names vary as well. Everything is reduced to
//! `InsightsResponse` here so the rest of the app sees one shape.

use recondash_core::{AnomalyItem, ItemStatus, Money, Severity, StatsSource};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

const ENVELOPE_KEYS: [&str; 4] = ["insights", "buckets", "data", "results"];

const BUCKET_ID_KEYS: [&str; 4] = ["bucket_id", "bucketId", "bucket", "id"];
const DESCRIPTION_KEYS: [&str; 5] = ["bucket_description", "bucketDescription", "description", "title", "name"];
const COUNT_KEYS: [&str; 3] = ["anomaly_count", "anomalyCount", "count"];
const COMPANY_KEYS: [&str; 5] = ["sample_companies", "sampleCompanies", "companies", "samples", "sample_records"];
const ROOT_CAUSE_KEYS: [&str; 5] = ["root_cause", "rootCause", "root_causes", "rootCauses", "cause"];
const RECOMMENDATION_KEYS: [&str; 5] = ["recommendation", "recommendations", "suggested_action", "suggestedAction", "action"];
const IMPACT_KEYS: [&str; 3] = ["impact", "total_impact", "totalImpact"];

const TOTAL_ANOMALY_KEYS: [&str; 2] = ["total_anomalies", "totalAnomalies"];
const TOTAL_IMPACT_KEYS: [&str; 2] = ["total_impact", "totalImpact"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightBucket {
    pub bucket_id: String,
    pub bucket_description: String,
    pub anomaly_count: u64,
    pub sample_companies: Vec<String>,
    pub root_cause: String,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightsResponse {
    pub buckets: Vec<InsightBucket>,
    pub total_anomalies: Option<u64>,
    pub total_impact: Option<f64>,
}

impl InsightBucket {
    pub fn into_anomaly_item(self, date: &str) -> AnomalyItem {
        let title = if self.bucket_description.is_empty() {
            format!("Bucket {}", self.bucket_id)
        } else {
            self.bucket_description.clone()
        };
        let impact = self.impact.map(Money::from_f64).unwrap_or_default();

        AnomalyItem {
            id: format!("bucket-{}", self.bucket_id),
            title,
            description: if self.root_cause.is_empty() {
                self.bucket_description
            } else {
                self.root_cause.clone()
            },
            severity: Severity::from_anomaly_count(self.anomaly_count),
            category: "Reconciliation".to_string(),
            date: date.to_string(),
            impact: impact.display_signed(),
            status: ItemStatus::Unresolved,
            bucket: Some(self.bucket_id),
            anomaly_count: Some(self.anomaly_count),
            root_causes: non_empty(self.root_cause),
            suggested_actions: non_empty(self.recommendation),
            sample_records: self.sample_companies,
        }
    }
}

impl InsightsResponse {
    pub fn into_anomaly_items(self, date: &str) -> Vec<AnomalyItem> {
        self.buckets
            .into_iter()
            .map(|b| b.into_anomaly_item(date))
            .collect()
    }

    /// Server totals when the response carried `total_anomalies`; a missing
    /// `total_impact` then counts as zero.
    pub fn stats_source(&self) -> StatsSource {
        match self.total_anomalies {
            Some(total_anomalies) => StatsSource::ServerReported {
                total_anomalies,
                total_impact: Money::from_f64(self.total_impact.unwrap_or(0.0)),
            },
            None => StatsSource::LocalSum,
        }
    }
}

fn non_empty(s: String) -> Vec<String> {
    if s.is_empty() {
        Vec::new()
    } else {
        vec![s]
    }
}

fn lookup<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| map.get(*k).filter(|v| !v.is_null()))
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(as_text)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("; "),
        ),
        _ => None,
    }
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => recondash_core::parse_currency(s)
            .ok()
            .and_then(|m| m.as_decimal().to_string().parse().ok()),
        _ => None,
    }
}

fn as_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(as_text)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn looks_like_bucket(map: &Map<String, Value>) -> bool {
    BUCKET_ID_KEYS[..2]
        .iter()
        .chain(DESCRIPTION_KEYS[..2].iter())
        .chain(COUNT_KEYS.iter())
        .any(|k| map.contains_key(*k))
}

fn parse_bucket(index: usize, value: &Value) -> Result<InsightBucket, ApiError> {
    let map = value.as_object().ok_or_else(|| {
        ApiError::ResponseShape(format!("insight bucket {} is not an object", index + 1))
    })?;

    let bucket_id = lookup(map, &BUCKET_ID_KEYS)
        .and_then(as_text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| (index + 1).to_string());

    Ok(InsightBucket {
        bucket_id,
        bucket_description: lookup(map, &DESCRIPTION_KEYS).and_then(as_text).unwrap_or_default(),
        anomaly_count: lookup(map, &COUNT_KEYS).and_then(as_count).unwrap_or(0),
        sample_companies: lookup(map, &COMPANY_KEYS).map(as_list).unwrap_or_default(),
        root_cause: lookup(map, &ROOT_CAUSE_KEYS).and_then(as_text).unwrap_or_default(),
        recommendation: lookup(map, &RECOMMENDATION_KEYS).and_then(as_text).unwrap_or_default(),
        impact: lookup(map, &IMPACT_KEYS).and_then(as_amount),
    })
}

fn parse_buckets(items: &[Value]) -> Result<Vec<InsightBucket>, ApiError> {
    items
        .iter()
        .enumerate()
        .map(|(i, v)| parse_bucket(i, v))
        .collect()
}

pub fn canonicalize_insights(value: &Value) -> Result<InsightsResponse, ApiError> {
    match value {
        Value::Array(items) => Ok(InsightsResponse {
            buckets: parse_buckets(items)?,
            total_anomalies: None,
            total_impact: None,
        }),
        Value::Object(map) => {
            let total_anomalies = lookup(map, &TOTAL_ANOMALY_KEYS).and_then(as_count);
            let total_impact = lookup(map, &TOTAL_IMPACT_KEYS).and_then(as_amount);

            for key in ENVELOPE_KEYS {
                match map.get(key) {
                    Some(Value::Array(items)) => {
                        return Ok(InsightsResponse {
                            buckets: parse_buckets(items)?,
                            total_anomalies,
                            total_impact,
                        });
                    }
                    // e.g. {"insights": {"buckets": [...], "total_anomalies": 4}}
                    Some(nested @ Value::Object(_)) => {
                        let mut inner = canonicalize_insights(nested)?;
                        inner.total_anomalies = inner.total_anomalies.or(total_anomalies);
                        inner.total_impact = inner.total_impact.or(total_impact);
                        return Ok(inner);
                    }
                    _ => {}
                }
            }

            if looks_like_bucket(map) {
                return Ok(InsightsResponse {
                    buckets: vec![parse_bucket(0, value)?],
                    total_anomalies: None,
                    total_impact: None,
                });
            }

            Err(ApiError::ResponseShape(format!(
                "no insight buckets in object with keys [{}]",
                map.keys().cloned().collect::<Vec<_>>().join(", ")
            )))
        }
        other => Err(ApiError::ResponseShape(format!(
            "insights response is not an object or array: {other}"
        ))),
    }
}
