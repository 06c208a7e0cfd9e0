// models/src/errors.rs

use std::io;
pub use thiserror::Error;
use uuid::Uuid;

use anyhow::Error as AnyhowError;

/// Top-level error for the triage service.
///
/// A patient id that cannot be found is deliberately *not* a variant here:
/// lookups return `Option` and the transport maps `None` to a "not found"
/// response. Only conditions that reject or abort an operation live in this
/// enum.
#[derive(Debug, Error)]
pub enum TriageError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("patient {0} is already in the queue")]
    DuplicateEntry(Uuid),
    #[error("triage classifier unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("an internal error occurred: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for TriageError {
    fn from(err: serde_json::Error) -> Self {
        TriageError::Serialization(format!("JSON processing error: {}", err))
    }
}

impl From<AnyhowError> for TriageError {
    fn from(err: AnyhowError) -> Self {
        TriageError::Internal(format!("{}", err))
    }
}

/// A validation error. Intake fields outside their declared clinical ranges
/// are rejected before they ever reach the queue, never silently coerced.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// The chief complaint is required for every submission.
    #[error("chief complaint must not be empty")]
    EmptyChiefComplaint,
    /// A valid submission carries at least one reported symptom.
    #[error("at least one symptom must be reported")]
    NoSymptoms,
    /// A vital sign is outside its declared clinical range.
    #[error("{field} value {value} is outside the clinical range [{min}, {max}]")]
    VitalOutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// Diastolic blood pressure must be strictly lower than systolic.
    #[error("diastolic BP must be lower than systolic BP")]
    BloodPressureInconsistent,
    /// Patient age outside [0, 150].
    #[error("age {0} is outside [0, 150]")]
    InvalidAge(u16),
    /// A confidence score outside [0.0, 1.0] was supplied.
    #[error("confidence score {0} is outside [0.0, 1.0]")]
    ConfidenceOutOfRange(f64),
    /// An unknown risk level token was supplied.
    #[error("unknown risk level '{0}'")]
    UnknownRiskLevel(String),
    /// An unknown symptom severity token was supplied.
    #[error("unknown symptom severity '{0}'")]
    UnknownSeverity(String),
}

/// A type alias for a `Result` that returns a `TriageError` on failure.
pub type TriageResult<T> = Result<T, TriageError>;

/// A type alias for a `Result` that returns a `ValidationError` on failure.
pub type ValidationResult<T> = Result<T, ValidationError>;
