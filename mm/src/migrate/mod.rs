//! Schema migration pipeline
//!
//! Data flows strictly forward through the stages:
//!
//! - [`reader`] - list the source's metafield definitions
//! - [`resolver`] - find referenced metaobject types and seed the mapping
//! - [`provisioner`] - create the types the destination lacks
//! - [`namespace`] - relocate reserved namespaces
//! - [`writer`] - recreate each definition on the destination
//! - [`orchestrator`] - sequence the above and collect the report

pub mod namespace;
pub mod orchestrator;
pub mod provisioner;
pub mod reader;
pub mod report;
pub mod resolver;
pub mod writer;

pub use namespace::rewrite_namespace;
pub use orchestrator::{MigrationPlan, MigrationState, Migrator, PlannedField, PlannedType};
pub use provisioner::{create_type, display_name, ensure_types};
pub use reader::fetch_field_definitions;
pub use report::{DeletionStatus, FieldOutcome, FieldStatus, MigrationReport, MigrationSummary, TypeOutcome, TypeStatus};
pub use resolver::{extract_referenced_types, load_existing_types};
pub use writer::{
    Binding, DefinitionInput, PreparedDefinition, ValidationInput, create_field_definition,
    delete_existing_field_definition, prepare_definition, write_definition,
};
