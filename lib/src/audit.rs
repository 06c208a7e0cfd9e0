// lib/src/audit.rs

use models::AuditRecord;
use tracing::debug;

/// Append-only ordered record of every state-changing queue event.
///
/// Appending is infallible from the caller's point of view: a logging fault
/// must never roll back the queue mutation it accompanies, so the log keeps
/// its records in process memory and `append` cannot fail. There is no
/// redaction, pagination or persistence beyond the process lifetime.
#[derive(Debug, Default)]
pub struct AuditLog {
    records: Vec<AuditRecord>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: AuditRecord) {
        debug!(action = %record.action, patient_id = ?record.patient_id, "audit record appended");
        self.records.push(record);
    }

    /// Full ordered copy of the trail, for compliance export.
    pub fn export_all(&self) -> Vec<AuditRecord> {
        self.records.clone()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
