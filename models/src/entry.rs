// models/src/entry.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decision::TriageDecision;
use crate::intake::PatientIntake;

/// The queue's unit of work: one patient waiting to be seen.
///
/// `queue_position` and `wait_time_minutes` are derived values, refreshed as
/// a side effect of producing a ranked view; they are a display cache, not
/// authoritative state.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TriageEntry {
    /// Unique across currently-active entries.
    pub patient_id: Uuid,
    pub intake: PatientIntake,
    pub triage_decision: TriageDecision,
    /// When the patient was admitted (UTC).
    pub intake_timestamp: DateTime<Utc>,
    /// When triage completed (UTC).
    pub triage_timestamp: DateTime<Utc>,
    /// 1-based position assigned by the last ranking pass, 0 before the first.
    #[serde(default)]
    pub queue_position: usize,
    /// Minutes waited as of the last ranking pass, fractional.
    #[serde(default)]
    pub wait_time_minutes: f64,
    /// Why the patient was escalated, when they were.
    #[serde(default)]
    pub escalation_reason: Option<String>,
}

impl TriageEntry {
    pub fn new(
        patient_id: Uuid,
        intake: PatientIntake,
        triage_decision: TriageDecision,
        intake_timestamp: DateTime<Utc>,
        triage_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            patient_id,
            intake,
            triage_decision,
            intake_timestamp,
            triage_timestamp,
            queue_position: 0,
            wait_time_minutes: 0.0,
            escalation_reason: None,
        }
    }
}
