//! Session-wide store for the latest stats and anomaly/insight data.
//!
//! One writer owns the `AppStore`; any number of display surfaces hold a
//! `watch::Receiver` and re-render when a new snapshot is published.
//! Redundant updates are rejected before anything is published.

use recondash_core::{AggregateStats, AnomalyItem, Money};
use std::sync::Arc;
use tokio::sync::watch;

use crate::fingerprint::{fingerprint, Fingerprint};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    /// Bumped on every published change, including `refresh_stats`.
    pub version: u64,
    pub stats: AggregateStats,
    pub anomaly_data: Arc<Vec<AnomalyItem>>,
    pub insights_data: Arc<Vec<AnomalyItem>>,
}

pub struct AppStore {
    tx: watch::Sender<StoreSnapshot>,
    last_stats: Option<(u64, Money)>,
    anomaly_fingerprint: Option<Fingerprint>,
    insights_fingerprint: Option<Fingerprint>,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AppStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(StoreSnapshot::default());
        Self {
            tx,
            last_stats: None,
            anomaly_fingerprint: None,
            insights_fingerprint: None,
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.tx.borrow().clone()
    }

    pub fn stats(&self) -> AggregateStats {
        self.tx.borrow().stats
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.tx.subscribe()
    }

    /// Applies a new anomaly count and impact. `total_count` only ever grows.
    /// Returns `false` when the pair equals the last accepted one.
    pub fn update_stats(&mut self, count: u64, impact: Money) -> bool {
        if self.last_stats == Some((count, impact)) {
            tracing::debug!(count, impact = %impact, "Skipping unchanged stats update");
            return false;
        }
        self.last_stats = Some((count, impact));

        self.tx.send_modify(|s| {
            s.stats.total_anomalies = count;
            s.stats.total_impact = impact;
            s.stats.total_count = s.stats.total_count.max(count as usize);
            s.version += 1;
        });
        true
    }

    /// Replaces the anomaly data unless it is empty or identical in content
    /// to what is already stored.
    pub fn update_anomaly_data(&mut self, items: Vec<AnomalyItem>) -> bool {
        if items.is_empty() {
            tracing::debug!("Skipping empty anomaly data update");
            return false;
        }
        let fp = fingerprint(&items);
        if fp.is_some() && fp == self.anomaly_fingerprint {
            tracing::debug!(items = items.len(), "Skipping unchanged anomaly data");
            return false;
        }
        self.anomaly_fingerprint = fp;

        self.tx.send_modify(|s| {
            adopt_anomaly_data(s, Arc::new(items));
            s.version += 1;
        });
        true
    }

    /// Same guard as `update_anomaly_data`. While no anomaly data exists the
    /// insights also become the anomaly data.
    pub fn update_insights_data(&mut self, items: Vec<AnomalyItem>) -> bool {
        if items.is_empty() {
            tracing::debug!("Skipping empty insights data update");
            return false;
        }
        let fp = fingerprint(&items);
        if fp.is_some() && fp == self.insights_fingerprint {
            tracing::debug!(items = items.len(), "Skipping unchanged insights data");
            return false;
        }
        self.insights_fingerprint = fp;

        let adopt = self.tx.borrow().anomaly_data.is_empty();
        if adopt {
            tracing::info!(items = items.len(), "Using insights as anomaly data");
            self.anomaly_fingerprint = fp;
        }

        let items = Arc::new(items);
        self.tx.send_modify(|s| {
            if adopt {
                adopt_anomaly_data(s, Arc::clone(&items));
            }
            s.insights_data = items;
            s.version += 1;
        });
        true
    }

    /// Re-publishes the current content under a new version so subscribers
    /// re-render.
    pub fn refresh_stats(&mut self) {
        self.tx.send_modify(|s| s.version += 1);
    }
}

fn adopt_anomaly_data(s: &mut StoreSnapshot, items: Arc<Vec<AnomalyItem>>) {
    s.stats.resolved_count = items.iter().filter(|i| i.is_resolved()).count();
    s.stats.total_count = s.stats.total_count.max(items.len());
    s.anomaly_data = items;
}

#[cfg(test)]
mod tests {
    use super::*;
    use recondash_core::{ItemStatus, Severity};

    fn item(id: &str, status: ItemStatus) -> AnomalyItem {
        AnomalyItem {
            id: id.to_string(),
            title: format!("Anomaly {id}"),
            description: "d".to_string(),
            severity: Severity::Medium,
            category: "Pricing".to_string(),
            date: "2026-01-15".to_string(),
            impact: "-$10.00".to_string(),
            status,
            bucket: None,
            anomaly_count: Some(1),
            root_causes: vec![],
            suggested_actions: vec![],
            sample_records: vec![],
        }
    }

    #[test]
    fn new_store_is_zeroed() {
        let store = AppStore::new();
        let snap = store.snapshot();
        assert_eq!(snap.version, 0);
        assert_eq!(snap.stats, AggregateStats::default());
        assert!(snap.anomaly_data.is_empty());
        assert!(snap.insights_data.is_empty());
    }

    #[test]
    fn total_count_is_max_merged_while_anomalies_track_latest() {
        let mut store = AppStore::new();
        assert!(store.update_stats(5, Money::from_cents(-10_000)));
        assert!(store.update_stats(3, Money::from_cents(-5_000)));

        let stats = store.stats();
        assert_eq!(stats.total_count, 5);
        assert_eq!(stats.total_anomalies, 3);
        assert_eq!(stats.total_impact.to_cents(), -5_000);
    }

    #[test]
    fn identical_stats_update_is_rejected() {
        let mut store = AppStore::new();
        assert!(store.update_stats(5, Money::from_cents(100)));
        let version = store.snapshot().version;
        assert!(!store.update_stats(5, Money::from_cents(100)));
        assert_eq!(store.snapshot().version, version);
        // a change in either value is accepted
        assert!(store.update_stats(5, Money::from_cents(200)));
    }

    #[test]
    fn anomaly_data_recomputes_resolved_count() {
        let mut store = AppStore::new();
        let accepted = store.update_anomaly_data(vec![
            item("a", ItemStatus::Resolved),
            item("b", ItemStatus::Unresolved),
            item("c", ItemStatus::Resolved),
        ]);
        assert!(accepted);
        let stats = store.stats();
        assert_eq!(stats.resolved_count, 2);
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.resolution_rate(), "67%");
    }

    #[test]
    fn empty_anomaly_data_is_rejected() {
        let mut store = AppStore::new();
        assert!(!store.update_anomaly_data(vec![]));
        assert_eq!(store.snapshot().version, 0);
    }

    #[test]
    fn identical_anomaly_data_is_rejected() {
        let mut store = AppStore::new();
        assert!(store.update_anomaly_data(vec![item("a", ItemStatus::Resolved)]));
        assert!(!store.update_anomaly_data(vec![item("a", ItemStatus::Resolved)]));
    }

    #[test]
    fn same_length_different_content_is_accepted() {
        let mut store = AppStore::new();
        assert!(store.update_anomaly_data(vec![item("a", ItemStatus::Resolved)]));
        assert!(store.update_anomaly_data(vec![item("b", ItemStatus::Unresolved)]));
        assert_eq!(store.snapshot().anomaly_data[0].id, "b");
        assert_eq!(store.stats().resolved_count, 0);
    }

    #[test]
    fn total_count_never_decreases_on_smaller_data() {
        let mut store = AppStore::new();
        store.update_anomaly_data(vec![item("a", ItemStatus::Resolved), item("b", ItemStatus::Resolved)]);
        store.update_anomaly_data(vec![item("c", ItemStatus::Resolved)]);
        assert_eq!(store.stats().total_count, 2);
    }

    #[test]
    fn insights_fill_empty_anomaly_data() {
        let mut store = AppStore::new();
        assert!(store.update_insights_data(vec![item("i1", ItemStatus::Unresolved)]));
        let snap = store.snapshot();
        assert_eq!(snap.anomaly_data.len(), 1);
        assert_eq!(snap.insights_data.len(), 1);
        assert_eq!(snap.stats.total_count, 1);

        // the adopted set now counts as the stored anomaly data
        assert!(!store.update_anomaly_data(vec![item("i1", ItemStatus::Unresolved)]));
    }

    #[test]
    fn insights_do_not_replace_existing_anomaly_data() {
        let mut store = AppStore::new();
        store.update_anomaly_data(vec![item("a", ItemStatus::Resolved)]);
        assert!(store.update_insights_data(vec![
            item("i1", ItemStatus::Unresolved),
            item("i2", ItemStatus::Unresolved),
        ]));
        let snap = store.snapshot();
        assert_eq!(snap.anomaly_data[0].id, "a");
        assert_eq!(snap.insights_data.len(), 2);
        assert_eq!(snap.stats.resolved_count, 1);
    }

    #[test]
    fn identical_insights_are_rejected() {
        let mut store = AppStore::new();
        assert!(store.update_insights_data(vec![item("i1", ItemStatus::Unresolved)]));
        assert!(!store.update_insights_data(vec![item("i1", ItemStatus::Unresolved)]));
        assert!(!store.update_insights_data(vec![]));
    }

    #[test]
    fn refresh_bumps_version_without_changing_content() {
        let mut store = AppStore::new();
        store.update_stats(4, Money::from_cents(50));
        let before = store.snapshot();
        store.refresh_stats();
        let after = store.snapshot();
        assert_eq!(after.version, before.version + 1);
        assert_eq!(after.stats, before.stats);
        assert!(Arc::ptr_eq(&after.anomaly_data, &before.anomaly_data));
    }

    #[test]
    fn independent_stores_do_not_share_state() {
        let mut a = AppStore::new();
        let b = AppStore::new();
        a.update_stats(9, Money::zero());
        assert_eq!(b.stats().total_count, 0);
    }

    #[tokio::test]
    async fn subscribers_are_notified_of_accepted_updates() {
        let mut store = AppStore::new();
        let mut rx = store.subscribe();

        store.update_stats(2, Money::from_cents(-300));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().stats.total_anomalies, 2);

        // rejected update publishes nothing
        store.update_stats(2, Money::from_cents(-300));
        assert!(!rx.has_changed().unwrap());

        store.refresh_stats();
        assert!(rx.has_changed().unwrap());
    }
}
