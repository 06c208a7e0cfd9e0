// models/src/decision.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ValidationError, ValidationResult};

/// Ordinal clinical urgency classification, LOW < MEDIUM < HIGH < CRITICAL.
///
/// Closed enum with an explicit weight table; an unknown token is a parse
/// error, not a silent default.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// All levels in ascending urgency. Used to zero-fill distributions so
    /// every level is present even when its count is zero.
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Ranking weight: CRITICAL=100, HIGH=75, MEDIUM=50, LOW=25.
    pub fn priority_weight(&self) -> u32 {
        match self {
            RiskLevel::Critical => 100,
            RiskLevel::High => 75,
            RiskLevel::Medium => 50,
            RiskLevel::Low => 25,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            "CRITICAL" => Ok(RiskLevel::Critical),
            other => Err(ValidationError::UnknownRiskLevel(other.to_string())),
        }
    }
}

/// Triage decision produced by the classifier and corrected by the safety
/// override chain. Mutable only by the override engine and by explicit
/// escalation.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TriageDecision {
    pub risk_level: RiskLevel,
    /// Confidence in the decision, always clamped to [0.0, 1.0].
    pub confidence_score: f64,
    /// Why this risk level was assigned.
    pub clinical_summary: String,
    /// Recommended next steps for the clinical team.
    pub suggested_next_steps: String,
    /// Accumulated reasoning trace, one note per override that fired.
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl TriageDecision {
    pub fn new(
        risk_level: RiskLevel,
        confidence_score: f64,
        clinical_summary: impl Into<String>,
        suggested_next_steps: impl Into<String>,
    ) -> Self {
        Self {
            risk_level,
            confidence_score: confidence_score.clamp(0.0, 1.0),
            clinical_summary: clinical_summary.into(),
            suggested_next_steps: suggested_next_steps.into(),
            reasoning: None,
        }
    }

    /// Sets the confidence score, clamping it to [0.0, 1.0].
    pub fn set_confidence(&mut self, score: f64) {
        self.confidence_score = score.clamp(0.0, 1.0);
    }

    /// Appends a note to the reasoning trace, separated by " | ".
    pub fn append_reasoning(&mut self, note: &str) {
        match self.reasoning {
            Some(ref mut reasoning) => {
                reasoning.push_str(" | ");
                reasoning.push_str(note);
            }
            None => self.reasoning = Some(note.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RiskLevel, TriageDecision};
    use core::str::FromStr;

    #[test]
    fn should_order_risk_levels_by_urgency() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn should_weight_risk_levels() {
        assert_eq!(RiskLevel::Critical.priority_weight(), 100);
        assert_eq!(RiskLevel::High.priority_weight(), 75);
        assert_eq!(RiskLevel::Medium.priority_weight(), 50);
        assert_eq!(RiskLevel::Low.priority_weight(), 25);
    }

    #[test]
    fn should_parse_risk_level_tokens() {
        assert_eq!(RiskLevel::from_str("CRITICAL").unwrap(), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_str(" high ").unwrap(), RiskLevel::High);
        assert!(RiskLevel::from_str("URGENT").is_err());
    }

    #[test]
    fn should_clamp_confidence_on_construction() {
        let decision = TriageDecision::new(RiskLevel::Low, 1.4, "s", "n");
        assert_eq!(decision.confidence_score, 1.0);
        let decision = TriageDecision::new(RiskLevel::Low, -0.2, "s", "n");
        assert_eq!(decision.confidence_score, 0.0);
    }

    #[test]
    fn should_accumulate_reasoning_notes() {
        let mut decision = TriageDecision::new(RiskLevel::Medium, 0.8, "s", "n");
        decision.append_reasoning("first");
        decision.append_reasoning("second");
        assert_eq!(decision.reasoning.as_deref(), Some("first | second"));
    }
}
