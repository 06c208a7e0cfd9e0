// lib/src/analytics.rs

use models::{QueueSnapshot, RiskLevel, TriageAnalytics};

/// Default confidence reported when there is nothing to average over.
const EMPTY_QUEUE_CONFIDENCE: f64 = 0.75;

fn median(values: &mut Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).expect("wait times are finite"));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Derives aggregate quality metrics from a queue snapshot. Pure function of
/// the snapshot (plus the queue's lifetime counter); keeps no state of its
/// own.
pub struct AnalyticsEngine;

impl AnalyticsEngine {
    pub fn compute(snapshot: &QueueSnapshot, lifetime_triages: u64) -> TriageAnalytics {
        let total = snapshot.total_patients;

        let avg_confidence = if snapshot.patients.is_empty() {
            EMPTY_QUEUE_CONFIDENCE
        } else {
            snapshot
                .patients
                .iter()
                .map(|e| e.triage_decision.confidence_score)
                .sum::<f64>()
                / snapshot.patients.len() as f64
        };

        let mut wait_times: Vec<f64> = snapshot
            .patients
            .iter()
            .map(|e| e.wait_time_minutes)
            .collect();
        let median_wait_minutes = median(&mut wait_times);

        let high_critical = snapshot
            .by_risk_level
            .get(&RiskLevel::High)
            .copied()
            .unwrap_or(0)
            + snapshot
                .by_risk_level
                .get(&RiskLevel::Critical)
                .copied()
                .unwrap_or(0);
        let high_risk_escalation_rate = if total > 0 {
            high_critical as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        TriageAnalytics {
            total_triages: total,
            lifetime_triages,
            distribution_by_risk: snapshot.by_risk_level.clone(),
            avg_confidence,
            median_wait_minutes,
            high_risk_escalation_rate,
        }
    }
}
