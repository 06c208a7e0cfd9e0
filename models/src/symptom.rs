// models/src/symptom.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ValidationError, ValidationResult};

/// Per-symptom clinical intensity, MILD < MODERATE < SEVERE < CRITICAL.
///
/// Exchanged on the wire as the fixed upper-case tokens. A closed enum with
/// an explicit score table makes an invalid severity a type error instead of
/// a silent default.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SymptomSeverity {
    Mild,
    Moderate,
    Severe,
    Critical,
}

impl SymptomSeverity {
    /// Ordinal severity score used by the fairness ranking (1..=4).
    pub fn score(&self) -> u8 {
        match self {
            SymptomSeverity::Mild => 1,
            SymptomSeverity::Moderate => 2,
            SymptomSeverity::Severe => 3,
            SymptomSeverity::Critical => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SymptomSeverity::Mild => "MILD",
            SymptomSeverity::Moderate => "MODERATE",
            SymptomSeverity::Severe => "SEVERE",
            SymptomSeverity::Critical => "CRITICAL",
        }
    }
}

impl Default for SymptomSeverity {
    fn default() -> Self {
        SymptomSeverity::Moderate
    }
}

impl fmt::Display for SymptomSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SymptomSeverity {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "MILD" => Ok(SymptomSeverity::Mild),
            "MODERATE" => Ok(SymptomSeverity::Moderate),
            "SEVERE" => Ok(SymptomSeverity::Severe),
            "CRITICAL" => Ok(SymptomSeverity::Critical),
            other => Err(ValidationError::UnknownSeverity(other.to_string())),
        }
    }
}

/// A reported symptom. Immutable once created.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Symptom {
    /// Symptom name (e.g. "chest pain").
    pub name: String,
    #[serde(default)]
    pub severity: SymptomSeverity,
    /// How long the symptom has been present, in hours.
    #[serde(default)]
    pub duration_hours: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Symptom {
    pub fn new(name: impl Into<String>, severity: SymptomSeverity) -> Self {
        Self {
            name: name.into(),
            severity,
            duration_hours: None,
            notes: None,
        }
    }
}
