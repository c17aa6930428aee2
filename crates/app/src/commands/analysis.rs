//! Detect and insights commands - backend analysis feeding the shared store

use anyhow::Result;
use recondash_client::demo::{demo_detection, demo_insights};
use recondash_client::{DetectionResult, InsightsResponse};
use recondash_core::table::{query, TableQuery};
use recondash_core::{aggregate, AggregateStats, AnomalyItem};
use recondash_import::resolve_columns;
use recondash_state::AppStore;
use serde_json::json;

use super::with_demo_fallback;
use crate::output;
use crate::SharedState;

/// Pushes detection totals into the store and returns the resulting stats.
pub fn apply_detection(store: &mut AppStore, detection: &DetectionResult) -> AggregateStats {
    let (count, impact) = detection.totals();
    store.update_stats(count, impact);
    store.stats()
}

/// Converts insight buckets to anomaly items, stores them and applies their
/// totals (server-reported when present, otherwise summed over the items).
pub fn apply_insights(
    store: &mut AppStore,
    insights: InsightsResponse,
    date: &str,
) -> (Vec<AnomalyItem>, AggregateStats) {
    let source = insights.stats_source();
    let items = insights.into_anomaly_items(date);
    let totals = aggregate(&items, source);

    store.update_insights_data(items.clone());
    store.update_stats(totals.total_anomalies, totals.total_impact);
    (items, store.stats())
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

pub async fn run_detect(state: &SharedState, json: bool) -> Result<()> {
    let (client, config) = {
        let s = state.lock().await;
        (s.client.clone(), s.config.clone())
    };

    output::info("Running anomaly detection...");
    let (detection, demo) = with_demo_fallback(
        client.detect_anomalies().await,
        config.demo_mode,
        "anomaly detection",
        || demo_detection(&mut rand::thread_rng()),
    )?;

    let stats = apply_detection(&mut state.lock().await.store, &detection);

    if json {
        let out = json!({ "demo": demo, "stats": stats, "rows": detection.rows });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", output::stats_cards(&stats));
    if detection.rows.is_empty() {
        output::success("No anomalies detected");
        return Ok(());
    }

    let columns = resolve_columns(&detection.rows, None);
    let page = query(
        &detection.rows,
        &TableQuery {
            items_per_page: config.items_per_page,
            ..TableQuery::default()
        },
    );
    println!("{}", output::rows_table(&columns, &page));
    output::info(&output::pagination_line(&page));
    Ok(())
}

pub async fn run_insights(state: &SharedState, req: u32, json: bool) -> Result<()> {
    let (client, config) = {
        let s = state.lock().await;
        (s.client.clone(), s.config.clone())
    };

    output::info("Generating insights...");
    let (insights, demo) = with_demo_fallback(
        client.fetch_insights(req).await,
        config.demo_mode,
        "insights",
        || demo_insights(&mut rand::thread_rng()),
    )?;

    let (items, stats) = apply_insights(&mut state.lock().await.store, insights, &today());

    if json {
        let out = json!({ "demo": demo, "stats": stats, "items": items });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", output::stats_cards(&stats));
    if items.is_empty() {
        output::warning("The backend returned no insight buckets");
    } else {
        println!("{}", output::anomaly_table(&items));
    }
    Ok(())
}
