use serde::{Deserialize, Serialize};

use crate::anomaly::AnomalyItem;
use crate::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total_anomalies: u64,
    pub total_impact: Money,
    pub resolved_count: usize,
    pub total_count: usize,
}

impl AggregateStats {
    pub fn resolution_rate(&self) -> String {
        resolution_rate(self.resolved_count, self.total_count)
    }
}

/// Where `total_anomalies` and `total_impact` come from. Callers pick one;
/// the two are never mixed in a single computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsSource {
    /// Sum `anomaly_count` and parsed `impact` over the items.
    LocalSum,
    /// Totals reported by the backend.
    ServerReported {
        total_anomalies: u64,
        total_impact: Money,
    },
}

pub fn aggregate(items: &[AnomalyItem], source: StatsSource) -> AggregateStats {
    let (total_anomalies, total_impact) = match source {
        StatsSource::LocalSum => (
            items.iter().map(|i| i.anomaly_count.unwrap_or(0)).sum(),
            items.iter().filter_map(AnomalyItem::impact_amount).sum(),
        ),
        StatsSource::ServerReported {
            total_anomalies,
            total_impact,
        } => (total_anomalies, total_impact),
    };

    AggregateStats {
        total_anomalies,
        total_impact,
        resolved_count: items.iter().filter(|i| i.is_resolved()).count(),
        total_count: items.len(),
    }
}

/// `round(resolved / total * 100)` as a percentage string; `0%` for an
/// empty collection.
pub fn resolution_rate(resolved: usize, total: usize) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    let pct = (resolved as f64 / total as f64 * 100.0).round();
    format!("{pct}%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::{ItemStatus, Severity};

    fn item(count: Option<u64>, impact: &str, status: ItemStatus) -> AnomalyItem {
        AnomalyItem {
            id: "x".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            severity: Severity::Low,
            category: "c".to_string(),
            date: "2026-01-01".to_string(),
            impact: impact.to_string(),
            status,
            bucket: None,
            anomaly_count: count,
            root_causes: vec![],
            suggested_actions: vec![],
            sample_records: vec![],
        }
    }

    #[test]
    fn resolution_rate_of_empty_is_zero() {
        assert_eq!(resolution_rate(0, 0), "0%");
    }

    #[test]
    fn resolution_rate_rounds() {
        assert_eq!(resolution_rate(3, 10), "30%");
        assert_eq!(resolution_rate(1, 3), "33%");
        assert_eq!(resolution_rate(2, 3), "67%");
        assert_eq!(resolution_rate(5, 5), "100%");
    }

    #[test]
    fn local_sum_treats_missing_counts_as_zero() {
        let items = vec![
            item(Some(4), "-$100.00", ItemStatus::Resolved),
            item(None, "$25.50", ItemStatus::Unresolved),
            item(Some(6), "n/a", ItemStatus::Resolved),
        ];
        let stats = aggregate(&items, StatsSource::LocalSum);
        assert_eq!(stats.total_anomalies, 10);
        assert_eq!(stats.total_impact.to_cents(), -7450);
        assert_eq!(stats.resolved_count, 2);
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.resolution_rate(), "67%");
    }

    #[test]
    fn server_reported_totals_win_verbatim() {
        let items = vec![item(Some(4), "$1.00", ItemStatus::Unresolved)];
        let stats = aggregate(
            &items,
            StatsSource::ServerReported {
                total_anomalies: 120,
                total_impact: Money::from_cents(-990_000),
            },
        );
        assert_eq!(stats.total_anomalies, 120);
        assert_eq!(stats.total_impact.display_unsigned(), "$9,900.00");
        assert_eq!(stats.total_count, 1);
        assert_eq!(stats.resolved_count, 0);
    }

    #[test]
    fn empty_collection_is_zeroed() {
        let stats = aggregate(&[], StatsSource::LocalSum);
        assert_eq!(stats, AggregateStats::default());
        assert_eq!(stats.total_impact.display_unsigned(), "$0.00");
    }
}
