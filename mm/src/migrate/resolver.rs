//! Reference resolver: which metaobject types the definitions need, and
//! which of them the destination already has

use std::collections::BTreeSet;
use tracing::{debug, info};

use super::reader::list_type_definitions;
use crate::error::MigrateError;
use crate::graphql::GraphqlClient;
use crate::schema::{FieldDefinition, TypeMapping};

/// Deduplicated names of the metaobject types referenced by `definitions`
pub fn extract_referenced_types(definitions: &[FieldDefinition]) -> BTreeSet<String> {
    let required: BTreeSet<String> = definitions
        .iter()
        .filter_map(FieldDefinition::referenced_type_name)
        .map(str::to_string)
        .collect();
    debug!(?required, "extract_referenced_types: done");
    required
}

/// Seed the type mapping from the destination's existing metaobject definitions
pub async fn load_existing_types(destination: &dyn GraphqlClient, page_size: u32) -> Result<TypeMapping, MigrateError> {
    debug!(page_size, "load_existing_types: called");
    let existing = list_type_definitions(destination, page_size)
        .await
        .map_err(MigrateError::DestinationQuery)?;

    let mapping: TypeMapping = existing.into_iter().collect();
    info!(count = mapping.len(), "Fetched destination metaobject definitions");
    Ok(mapping)
}
