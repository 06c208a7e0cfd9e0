// lib/tests/triage_flow.rs
//
// End-to-end flow through the core: classify (or fall back), correct with
// the safety-override chain, queue, rank, escalate and retire.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use lib::{FairTriageQueue, TriageClassifier, TriageService};
use models::{
    AuditAction, PatientIntake, RiskLevel, Symptom, SymptomSeverity, TriageDecision, TriageEntry,
    TriageError, TriageResult, VitalSigns,
};
use uuid::Uuid;

struct UnavailableClassifier;

#[async_trait]
impl TriageClassifier for UnavailableClassifier {
    async fn classify(&self, _intake: &PatientIntake) -> TriageResult<TriageDecision> {
        Err(TriageError::UpstreamUnavailable(
            "connection refused".to_string(),
        ))
    }
}

/// Always classifies LOW with high confidence, no matter the presentation.
struct OverconfidentLowClassifier;

#[async_trait]
impl TriageClassifier for OverconfidentLowClassifier {
    async fn classify(&self, _intake: &PatientIntake) -> TriageResult<TriageDecision> {
        Ok(TriageDecision::new(
            RiskLevel::Low,
            0.95,
            "No acute findings",
            "Discharge with advice",
        ))
    }
}

fn cardiac_intake() -> PatientIntake {
    PatientIntake {
        age: Some(58),
        gender: Some("M".to_string()),
        chief_complaint: "Severe chest pain radiating to left arm".to_string(),
        symptoms: vec![
            Symptom::new("chest pain", SymptomSeverity::Severe),
            Symptom::new("shortness of breath", SymptomSeverity::Moderate),
        ],
        vital_signs: Some(VitalSigns {
            heart_rate: Some(115),
            systolic_bp: Some(165),
            diastolic_bp: Some(105),
            temperature: Some(37.1),
            oxygen_saturation: Some(93),
        }),
        medical_history: Some("Hypertension, previous MI".to_string()),
        medications: Some("Aspirin 81mg daily".to_string()),
        allergies: Some("NKDA".to_string()),
    }
}

fn low_risk_intake() -> PatientIntake {
    PatientIntake {
        age: Some(32),
        gender: Some("F".to_string()),
        chief_complaint: "Mild headache and fatigue".to_string(),
        symptoms: vec![
            Symptom::new("headache", SymptomSeverity::Mild),
            Symptom::new("fatigue", SymptomSeverity::Mild),
        ],
        vital_signs: Some(VitalSigns {
            heart_rate: Some(78),
            systolic_bp: Some(118),
            diastolic_bp: Some(76),
            temperature: Some(36.9),
            oxygen_saturation: Some(98),
        }),
        medical_history: None,
        medications: None,
        allergies: None,
    }
}

fn enqueue(queue: &mut FairTriageQueue, intake: PatientIntake, decision: TriageDecision) -> Uuid {
    let now = Utc::now();
    let entry = TriageEntry::new(Uuid::new_v4(), intake, decision, now, now);
    let id = entry.patient_id;
    queue.add_patient(entry).unwrap();
    id
}

#[tokio::test]
async fn should_triage_with_fallback_when_classifier_is_down() {
    let service = TriageService::new(Arc::new(UnavailableClassifier));

    let decision = service.triage(&cardiac_intake()).await;
    // Fallback says HIGH (keyword + severe symptom); vitals are not in the
    // life-threatening range, so no CRITICAL override; calibration adds 0.1
    // to the fallback's fixed 0.65.
    assert_eq!(decision.risk_level, RiskLevel::High);
    assert!((decision.confidence_score - 0.75).abs() < 1e-9);
    let reasoning = decision.reasoning.as_deref().unwrap();
    assert!(reasoning.contains("Fallback triage"));
}

#[tokio::test]
async fn should_override_unsafe_low_classification() {
    let service = TriageService::new(Arc::new(OverconfidentLowClassifier));

    let decision = service.triage(&cardiac_intake()).await;
    // Red-flag symptom forces at least HIGH even though the classifier was
    // confident in LOW.
    assert!(decision.risk_level >= RiskLevel::High);
    assert!(decision
        .reasoning
        .as_deref()
        .unwrap()
        .contains("red-flag symptom"));
}

#[tokio::test]
async fn should_rank_corrected_decisions_fairly() {
    let service = TriageService::new(Arc::new(UnavailableClassifier));
    let mut queue = FairTriageQueue::new();

    let cardiac = cardiac_intake();
    let cardiac_decision = service.triage(&cardiac).await;
    let cardiac_id = enqueue(&mut queue, cardiac, cardiac_decision);

    let routine = low_risk_intake();
    let routine_decision = service.triage(&routine).await;
    let routine_id = enqueue(&mut queue, routine, routine_decision);

    let view = queue.ranked_view();
    assert_eq!(view.len(), 2);
    assert_eq!(view[0].patient_id, cardiac_id);
    assert_eq!(view[1].patient_id, routine_id);
    assert_eq!(view[0].queue_position, 1);
    assert_eq!(view[1].queue_position, 2);
}

#[tokio::test]
async fn should_keep_audit_trail_consistent_through_full_lifecycle() {
    let service = TriageService::new(Arc::new(UnavailableClassifier));
    let mut queue = FairTriageQueue::new();

    let intake = cardiac_intake();
    let decision = service.triage(&intake).await;
    let id = enqueue(&mut queue, intake, decision);

    queue
        .escalate_patient(id, RiskLevel::Critical, "O2 saturation dropping")
        .unwrap();
    queue.mark_seen(id).unwrap();

    let trail = queue.export_audit_log();
    let actions: Vec<AuditAction> = trail.iter().map(|r| r.action).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::PatientAdded,
            AuditAction::Escalation,
            AuditAction::PatientSeen,
        ]
    );
    assert!(trail.iter().all(|r| r.patient_id == Some(id)));

    // Retired entries participate in nothing but the audit trail.
    assert!(queue.ranked_view().is_empty());
    assert_eq!(queue.lifetime_total(), 1);
}
