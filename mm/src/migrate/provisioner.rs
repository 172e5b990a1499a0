//! Type provisioner: creates missing metaobject definitions on the destination

use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use super::report::{TypeOutcome, TypeStatus};
use crate::error::MigrateError;
use crate::graphql::{GraphqlClient, GraphqlError, UserError};
use crate::schema::{TypeDefinition, TypeMapping, queries};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTypeData {
    metaobject_definition_create: CreateTypePayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTypePayload {
    metaobject_definition: Option<TypeDefinition>,

    #[serde(default)]
    user_errors: Vec<UserError>,
}

/// Human-readable label for a new metaobject definition: `recipe_card` -> `RECIPE CARD`
pub fn display_name(type_name: &str) -> String {
    type_name.replace('_', " ").to_uppercase()
}

/// Create one metaobject definition on the destination and return its id
pub async fn create_type(destination: &dyn GraphqlClient, type_name: &str) -> Result<String, MigrateError> {
    debug!(%type_name, "create_type: called");
    let request = queries::create_type_definition(type_name, &display_name(type_name));

    let fail = |cause: GraphqlError| MigrateError::type_creation(type_name, cause);

    let data: CreateTypeData = destination
        .execute(&request)
        .await
        .and_then(|r| r.into_data())
        .map_err(fail)?;

    let payload = data.metaobject_definition_create;
    if !payload.user_errors.is_empty() {
        return Err(fail(GraphqlError::UserErrors(payload.user_errors)));
    }

    payload
        .metaobject_definition
        .map(|d| d.id)
        .ok_or_else(|| fail(GraphqlError::InvalidResponse("no metaobjectDefinition in payload".to_string())))
}

/// Make sure every required type is present in `mapping`
///
/// Types already mapped are never recreated. Each missing type gets exactly
/// one creation attempt; successes are recorded in `mapping` immediately and
/// failures are reported without stopping the remaining types.
pub async fn ensure_types(
    destination: &dyn GraphqlClient,
    required: &BTreeSet<String>,
    mapping: &mut TypeMapping,
) -> Vec<TypeOutcome> {
    debug!(required = required.len(), mapped = mapping.len(), "ensure_types: called");
    let mut outcomes = Vec::with_capacity(required.len());

    for type_name in required {
        if let Some(id) = mapping.get(type_name) {
            debug!(%type_name, %id, "ensure_types: already on destination");
            outcomes.push(TypeOutcome {
                type_name: type_name.clone(),
                status: TypeStatus::Existing { id: id.to_string() },
            });
            continue;
        }

        info!(%type_name, "Missing metaobject definition, creating");
        let status = match create_type(destination, type_name).await {
            Ok(id) => {
                info!(%type_name, %id, "Created metaobject definition");
                mapping.insert(type_name.clone(), id.clone());
                TypeStatus::Created { id }
            }
            Err(e) => {
                warn!(%type_name, error = %e, "Metaobject definition creation failed, continuing");
                TypeStatus::Failed { reason: e.to_string() }
            }
        };
        outcomes.push(TypeOutcome {
            type_name: type_name.clone(),
            status,
        });
    }

    outcomes
}
