// models/src/lib.rs

//! Data model for the clinical triage service: intake records, vital signs,
//! triage decisions, queue entries, audit records and the error taxonomy
//! shared across the workspace.

pub mod audit;
pub mod decision;
pub mod entry;
pub mod errors;
pub mod intake;
pub mod snapshot;
pub mod symptom;
pub mod vitals;

pub use audit::{AuditAction, AuditRecord};
pub use decision::{RiskLevel, TriageDecision};
pub use entry::TriageEntry;
pub use errors::{TriageError, TriageResult, ValidationError, ValidationResult};
pub use intake::PatientIntake;
pub use snapshot::{QueueHealth, QueueSnapshot, TriageAnalytics};
pub use symptom::{Symptom, SymptomSeverity};
pub use vitals::VitalSigns;
