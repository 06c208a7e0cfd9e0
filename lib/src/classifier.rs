// lib/src/classifier.rs

//! The classifier seam and the deterministic degraded-mode fallback.
//!
//! Model inference lives behind [`TriageClassifier`] so the core never knows
//! which backend produced a decision. When the backend is unavailable the
//! service substitutes a rule-based fallback rather than failing the
//! submission; the fallback's reasoning and fixed confidence make the
//! degraded quality visible downstream.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use models::{PatientIntake, RiskLevel, SymptomSeverity, TriageDecision, TriageResult};

use crate::overrides::SafetyOverrideEngine;

/// Confidence attached to every fallback decision.
pub const FALLBACK_CONFIDENCE: f64 = 0.65;

/// Chief-complaint keywords that push the fallback straight to HIGH.
pub const HIGH_RISK_KEYWORDS: [&str; 6] = [
    "chest pain",
    "dyspnea",
    "stroke",
    "unconscious",
    "bleeding",
    "severe",
];

/// A probabilistic risk classifier. Implementations are thin I/O wrappers;
/// the semantics of prediction are out of scope here.
#[async_trait]
pub trait TriageClassifier: Send + Sync {
    async fn classify(&self, intake: &PatientIntake) -> TriageResult<TriageDecision>;
}

/// Rule-based fallback used when the classifier call fails, times out or
/// returns unparsable output. Deterministic:
/// HIGH on any high-risk keyword in the chief complaint or any
/// SEVERE/CRITICAL symptom, MEDIUM on more than two symptoms, LOW otherwise.
pub fn fallback_triage(intake: &PatientIntake) -> TriageDecision {
    let complaint = intake.chief_complaint.to_lowercase();
    let keyword_hit = HIGH_RISK_KEYWORDS
        .iter()
        .any(|keyword| complaint.contains(keyword));
    let severe_symptoms = intake
        .symptoms
        .iter()
        .any(|symptom| symptom.severity >= SymptomSeverity::Severe);

    let risk_level = if keyword_hit || severe_symptoms {
        RiskLevel::High
    } else if intake.symptoms.len() > 2 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let mut decision = TriageDecision::new(
        risk_level,
        FALLBACK_CONFIDENCE,
        format!(
            "{} with {} symptom(s)",
            intake.chief_complaint,
            intake.symptoms.len()
        ),
        "Physician evaluation",
    );
    decision.append_reasoning("Fallback triage (classifier unavailable or failed)");
    decision
}

/// Composes classification with the safety-override chain. This is the only
/// place the override chain is applied, which is what keeps its
/// non-idempotent calibration applied exactly once per raw decision.
pub struct TriageService {
    classifier: Arc<dyn TriageClassifier>,
    overrides: SafetyOverrideEngine,
}

impl TriageService {
    pub fn new(classifier: Arc<dyn TriageClassifier>) -> Self {
        Self {
            classifier,
            overrides: SafetyOverrideEngine::new(),
        }
    }

    /// Runs the classifier (falling back locally on failure) and corrects
    /// the result. Never fails the caller: degraded upstream quality is
    /// expressed through the decision itself.
    pub async fn triage(&self, intake: &PatientIntake) -> TriageDecision {
        let raw = match self.classifier.classify(intake).await {
            Ok(decision) => decision,
            Err(err) => {
                warn!(error = %err, "classifier unavailable, using deterministic fallback");
                fallback_triage(intake)
            }
        };
        self.overrides.apply(intake, raw)
    }
}
