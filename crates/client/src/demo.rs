//! Synthesized backend responses for offline demos.
//!
//! Only used when demo mode is switched on and the backend could not be
//! reached. Generic over the RNG so tests can seed it.

use rand::seq::SliceRandom;
use rand::Rng;
use recondash_core::{CellValue, DataType, Money, RowRecord, RowStatus};

use crate::detection::{DetectionResult, DETECTION_SOURCE};
use crate::insights::{InsightBucket, InsightsResponse};

const COMPANIES: [&str; 8] = [
    "Acme Capital",
    "Globex Markets",
    "Initech Securities",
    "Umbrella Asset Mgmt",
    "Stark Holdings",
    "Wayne Investments",
    "Hooli Treasury",
    "Vandelay Imports",
];

const BUCKETS: [(&str, &str, &str); 4] = [
    (
        "Price mismatch between trade and settlement",
        "Stale price feed at booking time",
        "Re-price trades from the end-of-day feed before settlement",
    ),
    (
        "Quantity breaks on partial fills",
        "Partial fills booked as separate trades",
        "Aggregate fills by order id before matching",
    ),
    (
        "Missing counterparty confirmation",
        "Confirmation not received within the settlement window",
        "Escalate unconfirmed trades to the counterparty desk",
    ),
    (
        "Currency conversion differences",
        "FX rate source differs between systems",
        "Align both systems on a single FX fixing",
    ),
];

pub fn demo_detection<R: Rng + ?Sized>(rng: &mut R) -> DetectionResult {
    let count: usize = rng.gen_range(5..=15);
    let mut impact = Money::zero();

    let rows = (1..=count)
        .map(|n| {
            let amount = Money::from_cents(rng.gen_range(10_000..=5_000_000i64));
            let diff = Money::from_cents(-rng.gen_range(100..=250_000i64));
            impact = impact + diff;

            let mut row = RowRecord::new(
                format!("{DETECTION_SOURCE}-{n}"),
                DETECTION_SOURCE,
                RowStatus::Unmatched,
                DataType::Anomaly,
            );
            row.insert("trade_id", CellValue::text(format!("TRD-{:05}", rng.gen_range(0..100_000))));
            row.insert(
                "counterparty",
                CellValue::text(*COMPANIES.choose(&mut *rng).unwrap_or(&COMPANIES[0])),
            );
            row.insert("amount", CellValue::Number(amount.to_cents() as f64 / 100.0));
            row.insert("impact", CellValue::Number(diff.to_cents() as f64 / 100.0));
            row
        })
        .collect::<Vec<_>>();

    DetectionResult {
        anomaly_count: Some(rows.len() as u64),
        total_impact: Some(impact.to_cents() as f64 / 100.0),
        rows,
    }
}

pub fn demo_insights<R: Rng + ?Sized>(rng: &mut R) -> InsightsResponse {
    let buckets: Vec<InsightBucket> = BUCKETS
        .iter()
        .enumerate()
        .map(|(i, (description, root_cause, recommendation))| {
            let mut companies = COMPANIES.to_vec();
            companies.shuffle(&mut *rng);
            InsightBucket {
                bucket_id: format!("B{}", i + 1),
                bucket_description: description.to_string(),
                anomaly_count: rng.gen_range(1..=80),
                sample_companies: companies.into_iter().take(3).map(str::to_string).collect(),
                root_cause: root_cause.to_string(),
                recommendation: recommendation.to_string(),
                impact: Some(-(rng.gen_range(1_000..=5_000_000i64) as f64) / 100.0),
            }
        })
        .collect();

    InsightsResponse {
        total_anomalies: Some(buckets.iter().map(|b| b.anomaly_count).sum()),
        total_impact: Some(buckets.iter().filter_map(|b| b.impact).sum()),
        buckets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use recondash_core::StatsSource;

    #[test]
    fn detection_totals_match_rows() {
        let result = demo_detection(&mut StdRng::seed_from_u64(1));
        assert!((5..=15).contains(&result.rows.len()));
        assert_eq!(result.anomaly_count, Some(result.rows.len() as u64));

        let row_sum: i64 = result
            .rows
            .iter()
            .filter_map(|r| r.get("impact").and_then(CellValue::as_number))
            .map(|f| Money::from_f64(f).to_cents())
            .sum();
        assert_eq!(result.totals().1.to_cents(), row_sum);
        assert!(result.rows.iter().all(|r| r.len() > 4));
    }

    #[test]
    fn insights_are_reproducible_with_a_seed() {
        let a = demo_insights(&mut StdRng::seed_from_u64(9));
        let b = demo_insights(&mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
        assert_eq!(a.buckets.len(), BUCKETS.len());
        assert!(a.buckets.iter().all(|b| b.sample_companies.len() == 3));
    }

    #[test]
    fn insights_report_their_own_totals() {
        let resp = demo_insights(&mut StdRng::seed_from_u64(3));
        let expected: u64 = resp.buckets.iter().map(|b| b.anomaly_count).sum();
        match resp.stats_source() {
            StatsSource::ServerReported { total_anomalies, .. } => assert_eq!(total_anomalies, expected),
            StatsSource::LocalSum => panic!("demo insights should carry totals"),
        }
    }
}
