// models/src/snapshot.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decision::RiskLevel;
use crate::entry::TriageEntry;

/// Point-in-time snapshot of the queue, built on top of a ranked view.
/// `by_risk_level` always carries all four levels, zero-filled.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct QueueSnapshot {
    pub total_patients: usize,
    pub by_risk_level: BTreeMap<RiskLevel, usize>,
    pub avg_wait_minutes: f64,
    /// Entries in ranked order, positions already assigned.
    pub patients: Vec<TriageEntry>,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate quality metrics, derived from a fresh snapshot. Stateless with
/// respect to the queue.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TriageAnalytics {
    /// Count of currently-active entries (not a lifetime counter).
    pub total_triages: usize,
    /// Cumulative number of patients ever added to the queue.
    pub lifetime_triages: u64,
    pub distribution_by_risk: BTreeMap<RiskLevel, usize>,
    /// Mean confidence over active entries, 0.75 when the queue is empty.
    pub avg_confidence: f64,
    /// Median wait over active entries, 0 when the queue is empty.
    pub median_wait_minutes: f64,
    /// 100 * (HIGH + CRITICAL) / total, 0 when the queue is empty.
    pub high_risk_escalation_rate: f64,
}

/// Queue health report: size, distribution and human-readable alerts.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct QueueHealth {
    pub queue_size: usize,
    pub distribution: BTreeMap<RiskLevel, usize>,
    pub avg_wait_minutes: f64,
    pub alerts: Vec<String>,
    pub timestamp: DateTime<Utc>,
}
