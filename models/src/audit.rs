// models/src/audit.rs

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The state transitions recorded in the audit trail.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    PatientAdded,
    Escalation,
    PatientSeen,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::PatientAdded => "PATIENT_ADDED",
            AuditAction::Escalation => "ESCALATION",
            AuditAction::PatientSeen => "PATIENT_SEEN",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One append-only record of a state-changing event. Never mutated or
/// deleted once written.
///
/// `patient_id` is optional so queue-wide events can be recorded too. The
/// detail map is a `BTreeMap` so exports serialize in a stable key order.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    #[serde(default)]
    pub patient_id: Option<Uuid>,
    #[serde(default)]
    pub details: BTreeMap<String, Value>,
}

impl AuditRecord {
    pub fn new(action: AuditAction, patient_id: Option<Uuid>) -> Self {
        Self {
            timestamp: Utc::now(),
            action,
            patient_id,
            details: BTreeMap::new(),
        }
    }

    /// Builder-style detail attachment.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}
