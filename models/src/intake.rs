// models/src/intake.rs

use serde::{Deserialize, Serialize};

use crate::errors::{ValidationError, ValidationResult};
use crate::symptom::Symptom;
use crate::vitals::VitalSigns;

/// Initial patient information captured at intake. Immutable after creation.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PatientIntake {
    /// Patient age in years, [0, 150].
    #[serde(default)]
    pub age: Option<u16>,
    #[serde(default)]
    pub gender: Option<String>,
    /// Primary reason for the visit. Required.
    pub chief_complaint: String,
    /// Reported symptoms, in the order they were reported. A valid
    /// submission carries at least one.
    #[serde(default)]
    pub symptoms: Vec<Symptom>,
    #[serde(default)]
    pub vital_signs: Option<VitalSigns>,
    #[serde(default)]
    pub medical_history: Option<String>,
    #[serde(default)]
    pub medications: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
}

impl PatientIntake {
    /// Validates the intake before it may enter the queue. Out-of-range
    /// fields are rejected, never coerced.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.chief_complaint.trim().is_empty() {
            return Err(ValidationError::EmptyChiefComplaint);
        }
        if self.symptoms.is_empty() {
            return Err(ValidationError::NoSymptoms);
        }
        if let Some(age) = self.age {
            if age > 150 {
                return Err(ValidationError::InvalidAge(age));
            }
        }
        if let Some(ref vitals) = self.vital_signs {
            vitals.validate()?;
        }
        Ok(())
    }

    /// Highest severity score among the patient's symptoms, 0 when none are
    /// reported.
    pub fn max_severity_score(&self) -> u8 {
        self.symptoms
            .iter()
            .map(|s| s.severity.score())
            .max()
            .unwrap_or(0)
    }
}
