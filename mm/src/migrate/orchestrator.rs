//! Migration orchestrator
//!
//! Drives one run through its states in a fixed order:
//!
//! ```text
//! ReadingSource -> ResolvingTypes -> ProvisioningTypes -> WritingDefinitions -> Done
//! ```
//!
//! Every destination mutation is awaited before the next one starts, so a
//! field definition is only written after every type it may reference has
//! had its single creation attempt.

use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::namespace::rewrite_namespace;
use super::provisioner::ensure_types;
use super::reader::fetch_field_definitions;
use super::report::{FieldOutcome, FieldStatus, MigrationReport, TypeOutcome};
use super::resolver::{extract_referenced_types, load_existing_types};
use super::writer::{Binding, prepare_definition, write_definition};
use crate::config::MigrationConfig;
use crate::error::MigrateError;
use crate::graphql::GraphqlClient;
use crate::schema::TypeMapping;

/// Orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationState {
    ReadingSource,
    ResolvingTypes,
    ProvisioningTypes,
    WritingDefinitions,
    Done,
}

impl std::fmt::Display for MigrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MigrationState::ReadingSource => "reading-source",
            MigrationState::ResolvingTypes => "resolving-types",
            MigrationState::ProvisioningTypes => "provisioning-types",
            MigrationState::WritingDefinitions => "writing-definitions",
            MigrationState::Done => "done",
        };
        f.write_str(s)
    }
}

/// A type the plan would need on the destination
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedType {
    pub type_name: String,

    /// Destination id if the type already exists; `None` means it would be created
    pub existing_id: Option<String>,
}

/// A definition the plan would write
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedField {
    pub namespace: String,
    pub destination_namespace: String,
    pub key: String,
    pub type_name: String,

    /// Referenced metaobject type, for reference fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_type: Option<String>,
}

/// What a run would do, computed from reads only
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationPlan {
    pub owner_type: String,
    pub types: Vec<PlannedType>,
    pub fields: Vec<PlannedField>,
}

impl MigrationPlan {
    /// Types the run would create
    pub fn types_to_create(&self) -> impl Iterator<Item = &PlannedType> {
        self.types.iter().filter(|t| t.existing_id.is_none())
    }
}

/// Runs a schema migration from one store to another
pub struct Migrator {
    source: Arc<dyn GraphqlClient>,
    destination: Arc<dyn GraphqlClient>,
    config: MigrationConfig,
}

impl Migrator {
    pub fn new(source: Arc<dyn GraphqlClient>, destination: Arc<dyn GraphqlClient>, config: MigrationConfig) -> Self {
        debug!(?config, "Migrator::new: called");
        Self {
            source,
            destination,
            config,
        }
    }

    fn transition(state: &mut MigrationState, next: MigrationState) {
        debug!(from = %state, to = %next, "transition");
        *state = next;
    }

    /// Execute the migration
    ///
    /// Fails only if a query against the source, or the destination's type
    /// listing, fails. Per-item failures are recorded in the report.
    pub async fn run(&self) -> Result<MigrationReport, MigrateError> {
        let run_id = uuid::Uuid::now_v7().to_string();
        let started_at = Utc::now();
        let owner_type = self.config.owner_type.as_str();
        info!(%run_id, %owner_type, overwrite = self.config.overwrite_existing, "Starting metafield definition migration");

        let mut state = MigrationState::ReadingSource;
        let definitions = fetch_field_definitions(
            self.source.as_ref(),
            owner_type,
            self.config.field_page_size,
            self.config.type_page_size,
        )
        .await
        .inspect_err(|e| error!(error = %e, fatal = e.is_fatal(), "Reading source definitions failed, aborting"))?;

        let mut types: Vec<TypeOutcome> = Vec::new();
        let mut fields: Vec<FieldOutcome> = Vec::with_capacity(definitions.len());

        if definitions.is_empty() {
            info!("No metafield definitions on source, nothing to migrate");
        } else {
            Self::transition(&mut state, MigrationState::ResolvingTypes);
            let required = extract_referenced_types(&definitions);
            let mut mapping = load_existing_types(self.destination.as_ref(), self.config.type_page_size)
                .await
                .inspect_err(|e| error!(error = %e, fatal = e.is_fatal(), "Reading destination types failed, aborting"))?;

            Self::transition(&mut state, MigrationState::ProvisioningTypes);
            types = ensure_types(self.destination.as_ref(), &required, &mut mapping).await;

            Self::transition(&mut state, MigrationState::WritingDefinitions);
            // destination (namespace, key) -> source namespace that claimed it
            let mut written: HashMap<(String, String), String> = HashMap::new();
            for def in &definitions {
                let destination_namespace = rewrite_namespace(&def.namespace);
                let target = (destination_namespace.clone(), def.key.clone());
                if let Some(earlier) = written.get(&target) {
                    warn!(
                        namespace = %def.namespace,
                        key = %def.key,
                        %destination_namespace,
                        %earlier,
                        "Destination key already written in this run, skipping"
                    );
                    fields.push(FieldOutcome {
                        namespace: def.namespace.clone(),
                        destination_namespace: destination_namespace.clone(),
                        key: def.key.clone(),
                        type_name: def.type_name().to_string(),
                        deletion: None,
                        status: FieldStatus::Failed {
                            reason: format!(
                                "{}.{} was already written in this run from source namespace {}",
                                destination_namespace, def.key, earlier
                            ),
                        },
                    });
                    continue;
                }
                written.insert(target, def.namespace.clone());

                let outcome = write_definition(
                    self.destination.as_ref(),
                    def,
                    &mapping,
                    owner_type,
                    self.config.overwrite_existing,
                )
                .await;
                fields.push(outcome);
            }
        }

        Self::transition(&mut state, MigrationState::Done);
        let report = MigrationReport {
            run_id,
            owner_type: owner_type.to_string(),
            started_at,
            completed_at: Utc::now(),
            state,
            types,
            fields,
        };

        let summary = report.summary();
        info!(
            types_created = summary.types_created,
            types_failed = summary.types_failed,
            fields_created = summary.fields_created,
            fields_unbound = summary.fields_unbound,
            fields_failed = summary.fields_failed,
            "Metafield migration completed"
        );
        Ok(report)
    }

    /// Compute what [`run`](Self::run) would do without mutating the destination
    pub async fn plan(&self) -> Result<MigrationPlan, MigrateError> {
        let owner_type = self.config.owner_type.as_str();
        debug!(%owner_type, "plan: called");

        let definitions = fetch_field_definitions(
            self.source.as_ref(),
            owner_type,
            self.config.field_page_size,
            self.config.type_page_size,
        )
        .await?;

        if definitions.is_empty() {
            return Ok(MigrationPlan {
                owner_type: owner_type.to_string(),
                types: Vec::new(),
                fields: Vec::new(),
            });
        }

        let required: BTreeSet<String> = extract_referenced_types(&definitions);
        let mapping: TypeMapping = load_existing_types(self.destination.as_ref(), self.config.type_page_size).await?;

        let types = required
            .iter()
            .map(|t| PlannedType {
                type_name: t.clone(),
                existing_id: mapping.get(t).map(str::to_string),
            })
            .collect();

        let fields = definitions
            .iter()
            .map(|def| {
                let prepared = prepare_definition(def, &mapping, owner_type);
                let referenced_type = match prepared.binding {
                    Binding::None => None,
                    Binding::Bound { type_name, .. } | Binding::Unbound { type_name } => Some(type_name),
                };
                PlannedField {
                    namespace: def.namespace.clone(),
                    destination_namespace: prepared.input.namespace,
                    key: def.key.clone(),
                    type_name: prepared.input.type_name,
                    referenced_type,
                }
            })
            .collect();

        Ok(MigrationPlan {
            owner_type: owner_type.to_string(),
            types,
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphql::mock::MockGraphqlClient;
    use crate::graphql::{GraphqlErrorEntry, GraphqlResponse};
    use crate::migrate::report::{FieldStatus, TypeStatus};
    use crate::schema::queries;
    use serde_json::json;

    fn migrator(source: Arc<MockGraphqlClient>, destination: Arc<MockGraphqlClient>) -> Migrator {
        Migrator::new(source, destination, MigrationConfig::default())
    }

    fn source_fields(nodes: Vec<serde_json::Value>) -> serde_json::Value {
        json!({"metafieldDefinitions": {"edges": nodes.into_iter().map(|n| json!({"node": n})).collect::<Vec<_>>()}})
    }

    fn node(namespace: &str, key: &str, type_name: &str) -> serde_json::Value {
        json!({
            "id": format!("gid://shopify/MetafieldDefinition/{}", key),
            "name": key,
            "namespace": namespace,
            "key": key,
            "type": {"name": type_name, "category": null},
            "description": null
        })
    }

    #[tokio::test]
    async fn test_empty_source_is_noop() {
        let source = Arc::new(MockGraphqlClient::with_data(vec![source_fields(vec![])]));
        let destination = Arc::new(MockGraphqlClient::new(vec![]));

        let report = migrator(source.clone(), destination.clone()).run().await.unwrap();

        assert_eq!(report.state, MigrationState::Done);
        assert!(report.types.is_empty());
        assert!(report.fields.is_empty());
        assert_eq!(destination.call_count(), 0);
    }

    #[tokio::test]
    async fn test_source_failure_aborts() {
        let source = Arc::new(MockGraphqlClient::new(vec![Ok(GraphqlResponse::from_errors(vec![
            GraphqlErrorEntry::new("Invalid API key or access token"),
        ]))]));
        let destination = Arc::new(MockGraphqlClient::new(vec![]));

        let err = migrator(source, destination.clone()).run().await.unwrap_err();
        assert!(matches!(err, MigrateError::SourceQuery(_)));
        assert_eq!(destination.call_count(), 0);
    }

    #[tokio::test]
    async fn test_destination_type_listing_failure_aborts_before_writes() {
        let source = Arc::new(MockGraphqlClient::with_data(vec![source_fields(vec![node(
            "custom",
            "size",
            "single_line_text_field",
        )])]));
        let destination = Arc::new(MockGraphqlClient::new(vec![Ok(GraphqlResponse::from_errors(vec![
            GraphqlErrorEntry::new("Throttled"),
        ]))]));

        let err = migrator(source, destination.clone()).run().await.unwrap_err();
        assert!(matches!(err, MigrateError::DestinationQuery(_)));
        assert_eq!(destination.operation_names(), vec![queries::OP_LIST_TYPE_DEFINITIONS]);
    }

    #[tokio::test]
    async fn test_failed_type_degrades_field_binding() {
        let source = Arc::new(MockGraphqlClient::with_data(vec![source_fields(vec![node(
            "custom",
            "refs",
            "metaobject_reference",
        )])]));
        let destination = Arc::new(MockGraphqlClient::new(vec![
            Ok(GraphqlResponse::from_data(json!({"metaobjectDefinitions": {"edges": []}}))),
            Ok(GraphqlResponse::from_data(json!({"metaobjectDefinitionCreate": {
                "metaobjectDefinition": null,
                "userErrors": [{"field": ["definition"], "message": "Type is reserved"}]
            }}))),
            Ok(GraphqlResponse::from_data(json!({"metafieldDefinitionCreate": {
                "createdDefinition": {"id": "gid://field"},
                "userErrors": []
            }}))),
        ]));

        let report = migrator(source, destination.clone()).run().await.unwrap();

        assert!(matches!(report.types[0].status, TypeStatus::Failed { .. }));
        assert!(matches!(report.fields[0].status, FieldStatus::CreatedUnbound { .. }));
        let create = &destination.calls()[2];
        assert_eq!(create.variables["definition"]["validations"], json!([]));
        assert!(report.has_failures());
    }

    #[tokio::test]
    async fn test_plan_makes_no_mutations() {
        let source = Arc::new(MockGraphqlClient::with_data(vec![source_fields(vec![
            node("shopify.color", "primary", "single_line_text_field"),
            node("custom", "refs", "list.metaobject_reference"),
        ])]));
        let destination = Arc::new(MockGraphqlClient::with_data(vec![
            json!({"metaobjectDefinitions": {"edges": []}}),
        ]));

        let plan = migrator(source, destination.clone()).plan().await.unwrap();

        assert_eq!(destination.operation_names(), vec![queries::OP_LIST_TYPE_DEFINITIONS]);
        assert_eq!(plan.types_to_create().count(), 1);
        assert_eq!(plan.fields[0].destination_namespace, "custom_color");
        assert_eq!(plan.fields[1].referenced_type.as_deref(), Some("metaobject_reference"));
        assert_eq!(plan.fields[1].type_name, "list.metaobject_reference");
    }

    #[tokio::test]
    async fn test_rewritten_key_collision_is_written_once() {
        let source = Arc::new(MockGraphqlClient::with_data(vec![source_fields(vec![
            node("shopify.color", "primary", "single_line_text_field"),
            node("custom_color", "primary", "single_line_text_field"),
        ])]));
        let destination = Arc::new(MockGraphqlClient::with_data(vec![
            json!({"metaobjectDefinitions": {"edges": []}}),
            json!({"metafieldDefinitions": {"edges": []}}),
            json!({"metafieldDefinitionCreate": {"createdDefinition": {"id": "gid://new1"}, "userErrors": []}}),
        ]));
        let config = MigrationConfig {
            overwrite_existing: true,
            ..MigrationConfig::default()
        };

        let report = Migrator::new(source, destination.clone(), config).run().await.unwrap();

        assert_eq!(
            destination.operation_names(),
            vec![
                queries::OP_LIST_TYPE_DEFINITIONS,
                queries::OP_LOOKUP_FIELD_DEFINITION,
                queries::OP_CREATE_FIELD_DEFINITION,
            ]
        );
        assert!(matches!(report.fields[0].status, FieldStatus::Created { .. }));
        assert_eq!(report.fields[1].deletion, None);
        assert!(matches!(
            &report.fields[1].status,
            FieldStatus::Failed { reason } if reason.contains("shopify.color")
        ));
        let summary = report.summary();
        assert_eq!(summary.fields_created, 1);
        assert_eq!(summary.fields_failed, 1);
        assert_eq!(summary.deletions, 0);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(MigrationState::WritingDefinitions.to_string(), "writing-definitions");
    }
}
