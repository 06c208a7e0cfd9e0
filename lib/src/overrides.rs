// lib/src/overrides.rs

//! Deterministic clinical-safety overrides.
//!
//! The override chain corrects a probabilistic risk classification against
//! hard safety rules before the decision ever enters the queue. Rules are
//! pure functions evaluated in a fixed order; a rule may amend the decision
//! and let evaluation continue, or replace it and stop the chain. The chain
//! is applied exactly once per raw decision, on the submit path — the
//! calibration arithmetic is not idempotent, so the single-application
//! contract is enforced at the call site ([`crate::TriageService`]).

use models::{PatientIntake, RiskLevel, SymptomSeverity, TriageDecision};
use tracing::debug;

/// Symptom names whose presence mandates a minimum risk level regardless of
/// classifier confidence. Matched case-insensitively against reported
/// symptom names.
pub const RED_FLAG_SYMPTOMS: [&str; 8] = [
    "chest pain",
    "shortness of breath",
    "breathing difficulty",
    "syncope",
    "unconscious",
    "stroke",
    "seizure",
    "severe bleeding",
];

/// What a single safety rule did with the decision.
#[derive(Clone, Debug)]
pub enum RuleOutcome {
    /// The rule did not fire.
    Unchanged,
    /// The rule replaced the decision; later rules still run.
    Amended(TriageDecision),
    /// The rule replaced the decision and no further rule may run.
    Stop(TriageDecision),
}

/// A single pure safety rule. Missing optional intake fields mean the rule
/// does not fire; rules never error.
pub type SafetyRule = fn(&PatientIntake, &TriageDecision) -> RuleOutcome;

/// Ordered chain of safety rules, composed with an explicit fold.
pub struct SafetyOverrideEngine {
    rules: Vec<SafetyRule>,
}

impl Default for SafetyOverrideEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyOverrideEngine {
    /// The production chain, in evaluation order: objective-vitals
    /// escalation (stops the chain), red-flag symptom escalation, then
    /// severity-aware confidence calibration.
    pub fn new() -> Self {
        Self {
            rules: vec![
                critical_vitals_rule,
                red_flag_symptom_rule,
                confidence_calibration_rule,
            ],
        }
    }

    /// Applies the chain to a raw decision and returns the corrected one.
    pub fn apply(&self, intake: &PatientIntake, decision: TriageDecision) -> TriageDecision {
        let mut current = decision;
        for rule in &self.rules {
            match rule(intake, &current) {
                RuleOutcome::Unchanged => {}
                RuleOutcome::Amended(amended) => current = amended,
                RuleOutcome::Stop(replaced) => {
                    current = replaced;
                    break;
                }
            }
        }
        current
    }
}

/// Rule 1: objective vitals in a life-threatening range force CRITICAL and
/// stop the chain so no later rule can soften the decision.
fn critical_vitals_rule(intake: &PatientIntake, decision: &TriageDecision) -> RuleOutcome {
    let Some(ref vitals) = intake.vital_signs else {
        return RuleOutcome::Unchanged;
    };

    let life_threatening = vitals.oxygen_saturation.is_some_and(|spo2| spo2 < 90)
        || vitals.systolic_bp.is_some_and(|sys| sys < 90)
        || vitals.heart_rate.is_some_and(|hr| hr > 130);

    if !life_threatening {
        return RuleOutcome::Unchanged;
    }

    let mut overridden = decision.clone();
    overridden.risk_level = RiskLevel::Critical;
    overridden.append_reasoning("Critical vitals detected (life-threatening)");
    overridden.set_confidence(overridden.confidence_score + 0.2);
    debug!(patient_risk = %overridden.risk_level, "critical-vitals override fired");
    RuleOutcome::Stop(overridden)
}

/// Rule 2: a red-flag symptom raises LOW/MEDIUM classifications to HIGH.
/// Higher classifications pass through untouched.
fn red_flag_symptom_rule(intake: &PatientIntake, decision: &TriageDecision) -> RuleOutcome {
    if decision.risk_level > RiskLevel::Medium {
        return RuleOutcome::Unchanged;
    }

    let red_flag_present = intake.symptoms.iter().any(|symptom| {
        let name = symptom.name.to_lowercase();
        RED_FLAG_SYMPTOMS.iter().any(|flag| name == *flag)
    });

    if !red_flag_present {
        return RuleOutcome::Unchanged;
    }

    let mut overridden = decision.clone();
    overridden.risk_level = RiskLevel::High;
    overridden.append_reasoning("Safety override: red-flag symptom");
    debug!("red-flag symptom override fired");
    RuleOutcome::Amended(overridden)
}

/// Rule 3: severity-aware confidence calibration. Severe presentations earn
/// a small confidence boost; mild ones lose a little, floored at 0.5.
fn confidence_calibration_rule(intake: &PatientIntake, decision: &TriageDecision) -> RuleOutcome {
    let severe_present = intake
        .symptoms
        .iter()
        .any(|symptom| symptom.severity >= SymptomSeverity::Severe);

    let mut calibrated = decision.clone();
    if severe_present {
        calibrated.set_confidence(calibrated.confidence_score + 0.1);
    } else {
        calibrated.set_confidence((calibrated.confidence_score - 0.05).max(0.5));
    }
    RuleOutcome::Amended(calibrated)
}
