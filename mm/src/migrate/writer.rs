//! Definition writer: recreates source metafield definitions on the destination

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::namespace::rewrite_namespace;
use super::report::{DeletionStatus, FieldOutcome, FieldStatus};
use crate::error::MigrateError;
use crate::graphql::{Connection, GraphqlClient, GraphqlError, UserError};
use crate::schema::{FieldDefinition, METAOBJECT_VALIDATION, TypeMapping, queries};

/// Validation entry of a create request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationInput {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

/// Body of `variables.definition` for the create mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionInput {
    pub name: String,
    pub namespace: String,
    pub key: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub description: String,
    pub owner_type: String,
    pub validations: Vec<ValidationInput>,
}

/// How a definition relates to a metaobject type on the destination
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Not a reference type
    None,
    Bound { type_name: String, id: String },
    /// Reference type whose metaobject type is not on the destination
    Unbound { type_name: String },
}

/// A create request together with the binding it was derived from
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDefinition {
    pub input: DefinitionInput,
    pub binding: Binding,
}

/// Resolve type, binding and namespace of a source definition
///
/// Pure: a mapping miss is an expected outcome, not an error.
pub fn prepare_definition(def: &FieldDefinition, mapping: &TypeMapping, owner_type: &str) -> PreparedDefinition {
    let binding = match def.referenced_type_name() {
        None => Binding::None,
        Some(type_name) => match mapping.get(type_name) {
            Some(id) => Binding::Bound {
                type_name: type_name.to_string(),
                id: id.to_string(),
            },
            None => Binding::Unbound {
                type_name: type_name.to_string(),
            },
        },
    };

    let validations = match &binding {
        Binding::Bound { id, .. } => vec![ValidationInput {
            kind: METAOBJECT_VALIDATION.to_string(),
            value: id.clone(),
        }],
        Binding::None | Binding::Unbound { .. } => Vec::new(),
    };

    PreparedDefinition {
        input: DefinitionInput {
            name: def.name.clone(),
            namespace: rewrite_namespace(&def.namespace),
            key: def.key.clone(),
            type_name: def.type_name().to_string(),
            description: def.description().to_string(),
            owner_type: owner_type.to_string(),
            validations,
        },
        binding,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateFieldData {
    metafield_definition_create: CreateFieldPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateFieldPayload {
    created_definition: Option<CreatedDefinition>,

    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct CreatedDefinition {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupData {
    metafield_definitions: Connection<ExistingDefinition>,
}

#[derive(Debug, Deserialize)]
struct ExistingDefinition {
    id: String,
    namespace: String,
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteFieldData {
    metafield_definition_delete: DeleteFieldPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteFieldPayload {
    deleted_id: Option<String>,

    #[serde(default)]
    user_errors: Vec<UserError>,
}

/// Create one definition on the destination
///
/// Returns the created definition's status; an unknown referenced type yields
/// `CreatedUnbound` rather than an error.
pub async fn create_field_definition(
    destination: &dyn GraphqlClient,
    def: &FieldDefinition,
    mapping: &TypeMapping,
    owner_type: &str,
) -> Result<FieldStatus, MigrateError> {
    let prepared = prepare_definition(def, mapping, owner_type);
    debug!(namespace = %prepared.input.namespace, key = %prepared.input.key, binding = ?prepared.binding, "create_field_definition: called");

    let input = &prepared.input;
    let fail = |cause: GraphqlError| MigrateError::field_creation(input.namespace.as_str(), input.key.as_str(), cause);

    let request = queries::create_field_definition(serde_json::to_value(input).map_err(|e| fail(e.into()))?);
    let data: CreateFieldData = destination
        .execute(&request)
        .await
        .and_then(|r| r.into_data())
        .map_err(fail)?;

    let payload = data.metafield_definition_create;
    if !payload.user_errors.is_empty() {
        return Err(fail(GraphqlError::UserErrors(payload.user_errors)));
    }
    let id = payload
        .created_definition
        .map(|d| d.id)
        .ok_or_else(|| fail(GraphqlError::InvalidResponse("no createdDefinition in payload".to_string())))?;

    Ok(match prepared.binding {
        Binding::None => FieldStatus::Created { id, bound_to: None },
        Binding::Bound { id: type_id, .. } => FieldStatus::Created {
            id,
            bound_to: Some(type_id),
        },
        Binding::Unbound { type_name } => FieldStatus::CreatedUnbound {
            id,
            referenced_type: type_name,
        },
    })
}

/// Delete the destination definition with the same (rewritten) namespace and key
///
/// Returns the deleted id, or `None` when the destination has no such definition.
pub async fn delete_existing_field_definition(
    destination: &dyn GraphqlClient,
    def: &FieldDefinition,
    owner_type: &str,
) -> Result<Option<String>, MigrateError> {
    let namespace = rewrite_namespace(&def.namespace);
    debug!(%namespace, key = %def.key, "delete_existing_field_definition: called");
    let fail = |cause: GraphqlError| MigrateError::field_deletion(namespace.as_str(), def.key.as_str(), cause);

    let lookup: LookupData = destination
        .execute(&queries::lookup_field_definition(owner_type, &namespace, &def.key))
        .await
        .and_then(|r| r.into_data())
        .map_err(fail)?;

    let Some(existing) = lookup
        .metafield_definitions
        .into_nodes()
        .into_iter()
        .find(|d| d.namespace == namespace && d.key == def.key)
    else {
        debug!(%namespace, key = %def.key, "delete_existing_field_definition: nothing to delete");
        return Ok(None);
    };

    let data: DeleteFieldData = destination
        .execute(&queries::delete_field_definition(&existing.id))
        .await
        .and_then(|r| r.into_data())
        .map_err(fail)?;

    let payload = data.metafield_definition_delete;
    if !payload.user_errors.is_empty() {
        return Err(fail(GraphqlError::UserErrors(payload.user_errors)));
    }

    let deleted = payload.deleted_id.unwrap_or(existing.id);
    info!(%namespace, key = %def.key, id = %deleted, "Deleted existing metafield definition");
    Ok(Some(deleted))
}

/// Write one definition, optionally deleting its previous version first
///
/// Never fails: every problem ends up in the returned outcome.
pub async fn write_definition(
    destination: &dyn GraphqlClient,
    def: &FieldDefinition,
    mapping: &TypeMapping,
    owner_type: &str,
    overwrite: bool,
) -> FieldOutcome {
    let destination_namespace = rewrite_namespace(&def.namespace);

    let deletion = if overwrite {
        Some(match delete_existing_field_definition(destination, def, owner_type).await {
            Ok(Some(id)) => DeletionStatus::Deleted { id },
            Ok(None) => DeletionStatus::NotFound,
            Err(e) => {
                warn!(error = %e, "Pre-delete failed, attempting creation anyway");
                DeletionStatus::Failed { reason: e.to_string() }
            }
        })
    } else {
        None
    };

    let status = match create_field_definition(destination, def, mapping, owner_type).await {
        Ok(status) => {
            match &status {
                FieldStatus::CreatedUnbound { referenced_type, .. } => warn!(
                    namespace = %destination_namespace,
                    key = %def.key,
                    %referenced_type,
                    "Created metafield definition without its metaobject validation"
                ),
                _ => info!(namespace = %destination_namespace, key = %def.key, "Created metafield definition"),
            }
            status
        }
        Err(e) => {
            warn!(error = %e, "Metafield definition creation failed, continuing");
            FieldStatus::Failed { reason: e.to_string() }
        }
    };

    FieldOutcome {
        namespace: def.namespace.clone(),
        destination_namespace,
        key: def.key.clone(),
        type_name: def.type_name().to_string(),
        deletion,
        status,
    }
}
