// lib/src/lib.rs

//! Core clinical triage engine.
//!
//! The pipeline, leaf first: a classifier (behind the [`TriageClassifier`]
//! seam) produces a raw [`models::TriageDecision`]; the
//! [`SafetyOverrideEngine`] corrects it against deterministic safety rules;
//! the [`FairTriageQueue`] holds the corrected entry in a fairness-ranked
//! order and records every state transition in its [`AuditLog`]; the
//! [`AnalyticsEngine`] derives aggregate metrics from queue snapshots.
//!
//! State is memory-resident for the process lifetime. There is no
//! persistence across restarts; the audit log is the only history kept, and
//! only until the process exits.

pub mod analytics;
pub mod audit;
pub mod classifier;
pub mod overrides;
pub mod queue;

pub use analytics::AnalyticsEngine;
pub use audit::AuditLog;
pub use classifier::{fallback_triage, TriageClassifier, TriageService};
pub use overrides::{RuleOutcome, SafetyOverrideEngine};
pub use queue::FairTriageQueue;
