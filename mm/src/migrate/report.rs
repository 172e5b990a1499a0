//! Per-item outcomes and the run report

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::orchestrator::MigrationState;

/// What happened to one required metaobject type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeOutcome {
    pub type_name: String,

    #[serde(flatten)]
    pub status: TypeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum TypeStatus {
    /// Already present on the destination; not recreated
    Existing { id: String },
    Created { id: String },
    Failed { reason: String },
}

/// What happened to one source field definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldOutcome {
    /// Namespace on the source
    pub namespace: String,

    /// Namespace written to the destination
    pub destination_namespace: String,

    pub key: String,

    pub type_name: String,

    /// Result of the overwrite pre-delete, when enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion: Option<DeletionStatus>,

    #[serde(flatten)]
    pub status: FieldStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum FieldStatus {
    /// Created; `bound_to` is the metaobject definition id for reference types
    Created {
        id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        bound_to: Option<String>,
    },

    /// Reference type created without its validation; the type id was unknown
    CreatedUnbound { id: String, referenced_type: String },

    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum DeletionStatus {
    NotFound,
    Deleted { id: String },
    Failed { reason: String },
}

/// Counts over a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    pub types_existing: usize,
    pub types_created: usize,
    pub types_failed: usize,
    pub fields_created: usize,
    pub fields_unbound: usize,
    pub fields_failed: usize,
    pub deletions: usize,
    pub deletions_failed: usize,
}

impl MigrationSummary {
    pub fn failures(&self) -> usize {
        self.types_failed + self.fields_failed + self.deletions_failed
    }
}

/// Result of one migration run
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub run_id: String,
    pub owner_type: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub state: MigrationState,
    pub types: Vec<TypeOutcome>,
    pub fields: Vec<FieldOutcome>,
}

impl MigrationReport {
    pub fn summary(&self) -> MigrationSummary {
        let mut summary = MigrationSummary::default();

        for t in &self.types {
            match t.status {
                TypeStatus::Existing { .. } => summary.types_existing += 1,
                TypeStatus::Created { .. } => summary.types_created += 1,
                TypeStatus::Failed { .. } => summary.types_failed += 1,
            }
        }

        for f in &self.fields {
            match f.status {
                FieldStatus::Created { .. } => summary.fields_created += 1,
                FieldStatus::CreatedUnbound { .. } => summary.fields_unbound += 1,
                FieldStatus::Failed { .. } => summary.fields_failed += 1,
            }
            match f.deletion {
                Some(DeletionStatus::Deleted { .. }) => summary.deletions += 1,
                Some(DeletionStatus::Failed { .. }) => summary.deletions_failed += 1,
                Some(DeletionStatus::NotFound) | None => {}
            }
        }

        summary
    }

    /// Whether any type, field or deletion failed
    pub fn has_failures(&self) -> bool {
        self.summary().failures() > 0
    }

    pub fn duration_seconds(&self) -> f64 {
        (self.completed_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}
