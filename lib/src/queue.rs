// lib/src/queue.rs

//! Fairness-ranked triage queue.
//!
//! The queue keeps every waiting entry in an id-keyed map and computes the
//! ranked order on demand: clinical urgency first, then symptom severity,
//! then classifier confidence, with arrival time as the final tie-break so
//! equally urgent patients are served FIFO. Every mutation appends exactly
//! one audit record under the same `&mut` borrow, so no observer can see a
//! state change without its audit record or vice versa. Callers that share
//! the queue across tasks wrap it in a single `Arc<Mutex<_>>`; the methods
//! themselves take `&mut self` so exclusive access is enforced by the type
//! system rather than by convention.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use models::{
    AuditAction, AuditRecord, QueueHealth, QueueSnapshot, RiskLevel, TriageEntry, TriageError,
    TriageResult,
};

use crate::audit::AuditLog;

/// A HIGH-risk patient waiting longer than this raises a health alert.
pub const LONG_WAIT_THRESHOLD_MINUTES: f64 = 15.0;

fn wait_minutes(intake_timestamp: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = now.signed_duration_since(intake_timestamp).num_milliseconds();
    (millis as f64 / 60_000.0).max(0.0)
}

/// Lexicographic ranking key, ascending. `Reverse` on the urgency components
/// puts the most urgent first; the raw timestamp keeps the earliest-arrived
/// first among equals.
fn ranking_key(entry: &TriageEntry) -> (Reverse<u32>, Reverse<u8>, Reverse<OrderedFloat<f64>>, DateTime<Utc>) {
    (
        Reverse(entry.triage_decision.risk_level.priority_weight()),
        Reverse(entry.intake.max_severity_score()),
        Reverse(OrderedFloat(entry.triage_decision.confidence_score)),
        entry.intake_timestamp,
    )
}

/// The waiting list: active entries, their derived ranking, and the audit
/// trail of every transition. State lives in memory for the process
/// lifetime only.
#[derive(Debug, Default)]
pub struct FairTriageQueue {
    entries: HashMap<Uuid, TriageEntry>,
    audit: AuditLog,
    lifetime_total: u64,
}

impl FairTriageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cumulative number of patients ever added, across the process
    /// lifetime. Unlike `len`, this never decreases.
    pub fn lifetime_total(&self) -> u64 {
        self.lifetime_total
    }

    /// Adds a new patient. Rejects an id already present in the active set.
    pub fn add_patient(&mut self, mut entry: TriageEntry) -> TriageResult<()> {
        if self.entries.contains_key(&entry.patient_id) {
            return Err(TriageError::DuplicateEntry(entry.patient_id));
        }

        entry.wait_time_minutes = 0.0;
        entry.queue_position = 0; // assigned by the next ranking pass

        let record = AuditRecord::new(AuditAction::PatientAdded, Some(entry.patient_id))
            .with_detail("risk_level", entry.triage_decision.risk_level.as_str())
            .with_detail("queue_size", json!(self.entries.len() + 1));

        info!(
            patient_id = %entry.patient_id,
            risk_level = %entry.triage_decision.risk_level,
            "patient added to triage queue"
        );

        self.entries.insert(entry.patient_id, entry);
        self.lifetime_total += 1;
        self.audit.append(record);
        Ok(())
    }

    /// Ranked view as of now. See [`Self::ranked_view_at`].
    pub fn ranked_view(&mut self) -> Vec<TriageEntry> {
        self.ranked_view_at(Utc::now())
    }

    /// Recomputes every entry's wait time from `now`, sorts by urgency with
    /// the FIFO fairness tie-break, and assigns contiguous 1-based positions
    /// in that order. The ordered entries are returned by value; the
    /// position and wait time written back into backing storage are a
    /// display cache, not something readers of the returned view depend on.
    pub fn ranked_view_at(&mut self, now: DateTime<Utc>) -> Vec<TriageEntry> {
        for entry in self.entries.values_mut() {
            entry.wait_time_minutes = wait_minutes(entry.intake_timestamp, now);
        }

        let mut view: Vec<TriageEntry> = self.entries.values().cloned().collect();
        view.sort_by_key(ranking_key);

        for (index, entry) in view.iter_mut().enumerate() {
            entry.queue_position = index + 1;
            if let Some(stored) = self.entries.get_mut(&entry.patient_id) {
                stored.queue_position = entry.queue_position;
            }
        }

        view
    }

    /// Re-classifies an active patient with a recorded reason. There is no
    /// direction restriction: de-escalation goes through the same path.
    /// Returns `None` when the id is not in the active set.
    pub fn escalate_patient(
        &mut self,
        patient_id: Uuid,
        new_risk_level: RiskLevel,
        reason: &str,
    ) -> Option<TriageEntry> {
        let entry = self.entries.get_mut(&patient_id)?;

        let old_risk_level = entry.triage_decision.risk_level;
        entry.triage_decision.risk_level = new_risk_level;
        entry.escalation_reason = Some(reason.to_string());
        let updated = entry.clone();

        info!(
            %patient_id,
            old = %old_risk_level,
            new = %new_risk_level,
            "patient re-classified"
        );

        self.audit.append(
            AuditRecord::new(AuditAction::Escalation, Some(patient_id))
                .with_detail("old_risk", old_risk_level.as_str())
                .with_detail("new_risk", new_risk_level.as_str())
                .with_detail("reason", reason),
        );

        Some(updated)
    }

    /// Removes a patient from the active set (assigned to a physician). The
    /// removed entry is returned with its final wait time; it survives only
    /// in the audit trail afterwards. Returns `None`, and records nothing,
    /// when the id is unknown.
    pub fn mark_seen(&mut self, patient_id: Uuid) -> Option<TriageEntry> {
        let mut removed = self.entries.remove(&patient_id)?;
        removed.wait_time_minutes = wait_minutes(removed.intake_timestamp, Utc::now());

        info!(
            %patient_id,
            wait_minutes = removed.wait_time_minutes,
            "patient marked seen and removed from queue"
        );

        self.audit.append(
            AuditRecord::new(AuditAction::PatientSeen, Some(patient_id))
                .with_detail("wait_time_minutes", json!(removed.wait_time_minutes))
                .with_detail("risk_level", removed.triage_decision.risk_level.as_str()),
        );

        Some(removed)
    }

    /// Complete queue snapshot as of now.
    pub fn queue_state(&mut self) -> QueueSnapshot {
        self.queue_state_at(Utc::now())
    }

    pub fn queue_state_at(&mut self, now: DateTime<Utc>) -> QueueSnapshot {
        let patients = self.ranked_view_at(now);

        let mut by_risk_level: BTreeMap<RiskLevel, usize> =
            RiskLevel::ALL.iter().map(|level| (*level, 0)).collect();
        for entry in &patients {
            *by_risk_level
                .entry(entry.triage_decision.risk_level)
                .or_insert(0) += 1;
        }

        let avg_wait_minutes = if patients.is_empty() {
            0.0
        } else {
            patients.iter().map(|e| e.wait_time_minutes).sum::<f64>() / patients.len() as f64
        };

        QueueSnapshot {
            total_patients: patients.len(),
            by_risk_level,
            avg_wait_minutes,
            patients,
            timestamp: now,
        }
    }

    /// Health report: alerts for waiting CRITICAL patients and for HIGH-risk
    /// patients waiting past the long-wait threshold.
    pub fn health_check(&mut self) -> QueueHealth {
        let state = self.queue_state();
        let mut alerts = Vec::new();

        let critical_count = state
            .by_risk_level
            .get(&RiskLevel::Critical)
            .copied()
            .unwrap_or(0);
        if critical_count > 0 {
            alerts.push(format!("{} CRITICAL patient(s) waiting", critical_count));
        }

        for entry in &state.patients {
            if entry.triage_decision.risk_level == RiskLevel::High
                && entry.wait_time_minutes > LONG_WAIT_THRESHOLD_MINUTES
            {
                let id = entry.patient_id.to_string();
                alerts.push(format!(
                    "HIGH risk patient {}... waiting {:.1} min",
                    &id[..8],
                    entry.wait_time_minutes
                ));
            }
        }

        QueueHealth {
            queue_size: state.total_patients,
            distribution: state.by_risk_level,
            avg_wait_minutes: state.avg_wait_minutes,
            alerts,
            timestamp: state.timestamp,
        }
    }

    /// Full ordered copy of the audit trail.
    pub fn export_audit_log(&self) -> Vec<AuditRecord> {
        self.audit.export_all()
    }

    pub fn audit_len(&self) -> usize {
        self.audit.len()
    }
}

#[cfg(test)]
mod tests {
    use super::FairTriageQueue;
    use chrono::{Duration, TimeZone, Utc};
    use models::{
        AuditAction, PatientIntake, RiskLevel, Symptom, SymptomSeverity, TriageDecision,
        TriageEntry, TriageError,
    };
    use uuid::Uuid;

    fn intake(severity: SymptomSeverity) -> PatientIntake {
        PatientIntake {
            age: Some(40),
            gender: None,
            chief_complaint: "test".to_string(),
            symptoms: vec![Symptom::new("test symptom", severity)],
            vital_signs: None,
            medical_history: None,
            medications: None,
            allergies: None,
        }
    }

    fn entry(
        risk: RiskLevel,
        severity: SymptomSeverity,
        confidence: f64,
        offset_secs: i64,
    ) -> TriageEntry {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let ts = base + Duration::seconds(offset_secs);
        TriageEntry::new(
            Uuid::new_v4(),
            intake(severity),
            TriageDecision::new(risk, confidence, "summary", "steps"),
            ts,
            ts,
        )
    }

    fn ranking_now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn should_reject_duplicate_patient_id() {
        let mut queue = FairTriageQueue::new();
        let first = entry(RiskLevel::Low, SymptomSeverity::Mild, 0.6, 0);
        let mut second = entry(RiskLevel::High, SymptomSeverity::Severe, 0.9, 1);
        second.patient_id = first.patient_id;

        queue.add_patient(first).unwrap();
        let err = queue.add_patient(second).unwrap_err();
        assert!(matches!(err, TriageError::DuplicateEntry(_)));
        assert_eq!(queue.len(), 1);
        // the rejected add produced no audit record
        assert_eq!(queue.audit_len(), 1);
    }

    #[test]
    fn should_rank_by_urgency_then_severity_then_confidence_then_arrival() {
        let mut queue = FairTriageQueue::new();
        let a = entry(RiskLevel::Medium, SymptomSeverity::Moderate, 0.8, 0);
        let b = entry(RiskLevel::High, SymptomSeverity::Mild, 0.5, 1);
        let c = entry(RiskLevel::High, SymptomSeverity::Mild, 0.5, 0);
        let (a_id, b_id, c_id) = (a.patient_id, b.patient_id, c.patient_id);

        queue.add_patient(a).unwrap();
        queue.add_patient(b).unwrap();
        queue.add_patient(c).unwrap();

        let view = queue.ranked_view_at(ranking_now());
        let order: Vec<Uuid> = view.iter().map(|e| e.patient_id).collect();
        // HIGH beats MEDIUM; within HIGH, equal severity and confidence, the
        // earlier arrival wins.
        assert_eq!(order, vec![c_id, b_id, a_id]);
    }

    #[test]
    fn should_rank_critical_above_high_regardless_of_confidence_and_wait() {
        let mut queue = FairTriageQueue::new();
        let high = entry(RiskLevel::High, SymptomSeverity::Critical, 1.0, 0);
        let critical = entry(RiskLevel::Critical, SymptomSeverity::Mild, 0.1, 1000);
        let critical_id = critical.patient_id;

        queue.add_patient(high).unwrap();
        queue.add_patient(critical).unwrap();

        let view = queue.ranked_view_at(ranking_now());
        assert_eq!(view[0].patient_id, critical_id);
    }

    #[test]
    fn should_assign_contiguous_one_based_positions() {
        let mut queue = FairTriageQueue::new();
        for i in 0..7 {
            queue
                .add_patient(entry(RiskLevel::Medium, SymptomSeverity::Moderate, 0.5, i))
                .unwrap();
        }

        let view = queue.ranked_view_at(ranking_now());
        let positions: Vec<usize> = view.iter().map(|e| e.queue_position).collect();
        assert_eq!(positions, (1..=7).collect::<Vec<usize>>());
    }

    #[test]
    fn should_compute_wait_time_from_intake_timestamp() {
        let mut queue = FairTriageQueue::new();
        queue
            .add_patient(entry(RiskLevel::Low, SymptomSeverity::Mild, 0.6, 0))
            .unwrap();

        let view = queue.ranked_view_at(ranking_now());
        assert!((view[0].wait_time_minutes - 30.0).abs() < 1e-6);
    }

    #[test]
    fn should_reflect_escalation_in_next_ranked_view() {
        let mut queue = FairTriageQueue::new();
        let low = entry(RiskLevel::Low, SymptomSeverity::Mild, 0.6, 0);
        let high = entry(RiskLevel::High, SymptomSeverity::Mild, 0.6, 1);
        let low_id = low.patient_id;

        queue.add_patient(low).unwrap();
        queue.add_patient(high).unwrap();

        let updated = queue
            .escalate_patient(low_id, RiskLevel::Critical, "deteriorating while waiting")
            .unwrap();
        assert_eq!(updated.triage_decision.risk_level, RiskLevel::Critical);
        assert_eq!(
            updated.escalation_reason.as_deref(),
            Some("deteriorating while waiting")
        );

        let view = queue.ranked_view_at(ranking_now());
        assert_eq!(view[0].patient_id, low_id);

        let last = queue.export_audit_log().pop().unwrap();
        assert_eq!(last.action, AuditAction::Escalation);
        assert_eq!(last.details["old_risk"], "LOW");
        assert_eq!(last.details["new_risk"], "CRITICAL");
    }

    #[test]
    fn should_allow_de_escalation() {
        let mut queue = FairTriageQueue::new();
        let e = entry(RiskLevel::High, SymptomSeverity::Moderate, 0.7, 0);
        let id = e.patient_id;
        queue.add_patient(e).unwrap();

        let updated = queue
            .escalate_patient(id, RiskLevel::Low, "symptoms resolved")
            .unwrap();
        assert_eq!(updated.triage_decision.risk_level, RiskLevel::Low);
    }

    #[test]
    fn should_return_none_for_unknown_escalation_target() {
        let mut queue = FairTriageQueue::new();
        assert!(queue
            .escalate_patient(Uuid::new_v4(), RiskLevel::High, "n/a")
            .is_none());
        assert_eq!(queue.audit_len(), 0);
    }

    #[test]
    fn should_remove_seen_patient_from_active_set() {
        let mut queue = FairTriageQueue::new();
        let e = entry(RiskLevel::Medium, SymptomSeverity::Moderate, 0.7, 0);
        let id = e.patient_id;
        queue.add_patient(e).unwrap();

        let removed = queue.mark_seen(id).unwrap();
        assert_eq!(removed.patient_id, id);
        assert!(queue.is_empty());
        assert!(queue.ranked_view_at(ranking_now()).is_empty());

        let last = queue.export_audit_log().pop().unwrap();
        assert_eq!(last.action, AuditAction::PatientSeen);
        assert_eq!(last.details["risk_level"], "MEDIUM");
    }

    #[test]
    fn should_not_audit_mark_seen_for_unknown_id() {
        let mut queue = FairTriageQueue::new();
        assert!(queue.mark_seen(Uuid::new_v4()).is_none());
        assert_eq!(queue.audit_len(), 0);
    }

    #[test]
    fn should_zero_fill_snapshot_distribution() {
        let mut queue = FairTriageQueue::new();
        queue
            .add_patient(entry(RiskLevel::High, SymptomSeverity::Severe, 0.8, 0))
            .unwrap();
        queue
            .add_patient(entry(RiskLevel::High, SymptomSeverity::Mild, 0.6, 1))
            .unwrap();

        let state = queue.queue_state_at(ranking_now());
        assert_eq!(state.total_patients, 2);
        assert_eq!(state.by_risk_level.len(), 4);
        assert_eq!(state.by_risk_level[&RiskLevel::Low], 0);
        assert_eq!(state.by_risk_level[&RiskLevel::Medium], 0);
        assert_eq!(state.by_risk_level[&RiskLevel::High], 2);
        assert_eq!(state.by_risk_level[&RiskLevel::Critical], 0);
        let sum: usize = state.by_risk_level.values().sum();
        assert_eq!(sum, state.total_patients);
    }

    #[test]
    fn should_report_empty_snapshot_without_division() {
        let mut queue = FairTriageQueue::new();
        let state = queue.queue_state_at(ranking_now());
        assert_eq!(state.total_patients, 0);
        assert_eq!(state.avg_wait_minutes, 0.0);
        assert_eq!(state.by_risk_level.len(), 4);
    }

    #[test]
    fn should_alert_on_waiting_critical_patients() {
        let mut queue = FairTriageQueue::new();
        queue
            .add_patient(entry(RiskLevel::Critical, SymptomSeverity::Critical, 0.9, 0))
            .unwrap();
        queue
            .add_patient(entry(RiskLevel::Critical, SymptomSeverity::Severe, 0.9, 1))
            .unwrap();

        let health = queue.health_check();
        assert!(health
            .alerts
            .iter()
            .any(|a| a.contains("2 CRITICAL patient(s) waiting")));
    }

    #[test]
    fn should_alert_on_long_waiting_high_risk_patients() {
        let mut queue = FairTriageQueue::new();
        // Intake 30 minutes ago, well past the 15 minute threshold.
        let mut e = entry(RiskLevel::High, SymptomSeverity::Severe, 0.8, 0);
        e.intake_timestamp = Utc::now() - Duration::minutes(30);
        queue.add_patient(e).unwrap();

        let health = queue.health_check();
        assert!(health.alerts.iter().any(|a| a.contains("HIGH risk patient")));
    }

    #[test]
    fn should_track_lifetime_total_across_removals() {
        let mut queue = FairTriageQueue::new();
        let e = entry(RiskLevel::Low, SymptomSeverity::Mild, 0.6, 0);
        let id = e.patient_id;
        queue.add_patient(e).unwrap();
        queue
            .add_patient(entry(RiskLevel::Medium, SymptomSeverity::Moderate, 0.7, 1))
            .unwrap();
        queue.mark_seen(id).unwrap();

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.lifetime_total(), 2);
    }
}
