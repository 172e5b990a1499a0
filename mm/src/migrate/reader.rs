//! Definition reader: lists the source store's metafield definitions

use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::error::MigrateError;
use crate::graphql::{Connection, GraphqlClient, fetch_all};
use crate::schema::{FieldDefinition, TypeDefinition, queries};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FieldDefinitionsData {
    pub metafield_definitions: Connection<FieldDefinition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TypeDefinitionsData {
    pub metaobject_definitions: Connection<TypeDefinition>,
}

/// List every metaobject definition on a store
pub(crate) async fn list_type_definitions(
    client: &dyn GraphqlClient,
    page_size: u32,
) -> Result<Vec<TypeDefinition>, crate::graphql::GraphqlError> {
    fetch_all(
        client,
        |after| queries::list_type_definitions(page_size, after),
        |data: TypeDefinitionsData| data.metaobject_definitions,
    )
    .await
}

/// Fetch the source's metafield definitions for one owner type
///
/// Follows pagination cursors. Reference definitions carrying a
/// `metaobject_definition_id` validation are annotated with the name of the
/// source type that id belongs to. Zero definitions is a valid, empty result.
pub async fn fetch_field_definitions(
    source: &dyn GraphqlClient,
    owner_type: &str,
    field_page_size: u32,
    type_page_size: u32,
) -> Result<Vec<FieldDefinition>, MigrateError> {
    debug!(%owner_type, field_page_size, "fetch_field_definitions: called");

    let mut definitions = fetch_all(
        source,
        |after| queries::list_field_definitions(owner_type, field_page_size, after),
        |data: FieldDefinitionsData| data.metafield_definitions,
    )
    .await
    .map_err(MigrateError::SourceQuery)?;

    info!(count = definitions.len(), %owner_type, "Fetched source metafield definitions");

    let needs_binding = definitions
        .iter()
        .any(|d| d.is_reference() && d.source_type_binding().is_some());
    if needs_binding {
        bind_source_references(source, &mut definitions, type_page_size).await;
    }

    Ok(definitions)
}

/// Resolve each reference definition's source metaobject id to its type name
///
/// If the source's metaobject definitions cannot be listed, every definition
/// keeps the name derived from its field type.
async fn bind_source_references(source: &dyn GraphqlClient, definitions: &mut [FieldDefinition], type_page_size: u32) {
    debug!("bind_source_references: called");
    let source_types: HashMap<String, String> = match list_type_definitions(source, type_page_size).await {
        Ok(types) => types.into_iter().map(|t| (t.id, t.type_name)).collect(),
        Err(e) => {
            warn!(error = %e, "Cannot list source metaobject definitions, using field type names for references");
            return;
        }
    };

    for def in definitions.iter_mut().filter(|d| d.is_reference()) {
        let Some(binding) = def.source_type_binding().map(str::to_string) else {
            continue;
        };
        match source_types.get(&binding) {
            Some(type_name) => {
                debug!(namespace = %def.namespace, key = %def.key, %type_name, "bind_source_references: bound");
                def.referenced_type = Some(type_name.clone());
            }
            None => {
                warn!(
                    namespace = %def.namespace,
                    key = %def.key,
                    %binding,
                    "Source validation points at an unknown metaobject definition"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphql::mock::MockGraphqlClient;
    use crate::graphql::{GraphqlErrorEntry, GraphqlResponse};
    use serde_json::json;

    fn node(namespace: &str, key: &str, type_name: &str) -> serde_json::Value {
        json!({"node": {
            "id": format!("gid://shopify/MetafieldDefinition/{}", key),
            "name": key,
            "namespace": namespace,
            "key": key,
            "type": {"name": type_name, "category": null},
            "description": "desc",
            "validations": []
        }})
    }

    #[tokio::test]
    async fn test_fetch_single_page() {
        let client = MockGraphqlClient::with_data(vec![json!({"metafieldDefinitions": {
            "edges": [node("shopify.color", "primary", "single_line_text_field")],
            "pageInfo": {"hasNextPage": false, "endCursor": null}
        }})]);

        let defs = fetch_field_definitions(&client, "PRODUCT", 250, 100).await.unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].namespace, "shopify.color");

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].operation_name, queries::OP_LIST_FIELD_DEFINITIONS);
        assert_eq!(calls[0].variables["ownerType"], "PRODUCT");
        assert_eq!(calls[0].variables["first"], 250);
    }

    #[tokio::test]
    async fn test_fetch_empty_is_not_an_error() {
        let client = MockGraphqlClient::with_data(vec![json!({"metafieldDefinitions": {"edges": []}})]);
        let defs = fetch_field_definitions(&client, "PRODUCT", 250, 100).await.unwrap();
        assert!(defs.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_follows_pages() {
        let client = MockGraphqlClient::with_data(vec![
            json!({"metafieldDefinitions": {
                "edges": [node("custom", "a", "single_line_text_field")],
                "pageInfo": {"hasNextPage": true, "endCursor": "c1"}
            }}),
            json!({"metafieldDefinitions": {
                "edges": [node("custom", "b", "number_integer")],
                "pageInfo": {"hasNextPage": false, "endCursor": "c2"}
            }}),
        ]);

        let defs = fetch_field_definitions(&client, "PRODUCT", 1, 100).await.unwrap();
        assert_eq!(defs.iter().map(|d| d.key.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_protocol_errors_are_source_query_errors() {
        let client = MockGraphqlClient::new(vec![Ok(GraphqlResponse::from_errors(vec![GraphqlErrorEntry::new(
            "Access denied for metafieldDefinitions field",
        )]))]);

        let err = fetch_field_definitions(&client, "PRODUCT", 250, 100).await.unwrap_err();
        assert!(matches!(err, MigrateError::SourceQuery(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_binds_reference_to_source_type_name() {
        let mut bound = node("custom.info", "recipe_ref", "metaobject_reference");
        bound["node"]["validations"] = json!([
            {"name": "metaobject_definition_id", "value": "gid://shopify/MetaobjectDefinition/7"}
        ]);
        let mut dangling = node("custom.info", "other_ref", "list.metaobject_reference");
        dangling["node"]["validations"] = json!([
            {"name": "metaobject_definition_id", "value": "gid://shopify/MetaobjectDefinition/404"}
        ]);

        let client = MockGraphqlClient::with_data(vec![
            json!({"metafieldDefinitions": {"edges": [bound, dangling]}}),
            json!({"metaobjectDefinitions": {"edges": [
                {"node": {"id": "gid://shopify/MetaobjectDefinition/7", "type": "recipe", "name": "Recipe"}}
            ]}}),
        ]);

        let defs = fetch_field_definitions(&client, "PRODUCT", 250, 100).await.unwrap();
        assert_eq!(defs[0].referenced_type_name(), Some("recipe"));
        // Unknown binding falls back to the stripped type name
        assert_eq!(defs[1].referenced_type_name(), Some("metaobject_reference"));
        assert_eq!(
            client.operation_names(),
            vec![queries::OP_LIST_FIELD_DEFINITIONS, queries::OP_LIST_TYPE_DEFINITIONS]
        );
    }

    #[tokio::test]
    async fn test_failed_type_lookup_keeps_stripped_names() {
        let mut bound = node("custom.info", "recipe_ref", "list.metaobject_reference");
        bound["node"]["validations"] = json!([
            {"name": "metaobject_definition_id", "value": "gid://shopify/MetaobjectDefinition/7"}
        ]);

        let client = MockGraphqlClient::new(vec![
            Ok(GraphqlResponse::from_data(json!({"metafieldDefinitions": {"edges": [
                node("custom", "size", "single_line_text_field"),
                bound
            ]}}))),
            Ok(GraphqlResponse::from_errors(vec![GraphqlErrorEntry::new(
                "Access denied for metaobjectDefinitions field",
            )])),
        ]);

        let defs = fetch_field_definitions(&client, "PRODUCT", 250, 100).await.unwrap();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[1].referenced_type_name(), Some("metaobject_reference"));
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_no_type_lookup_without_bindings() {
        let client = MockGraphqlClient::with_data(vec![json!({"metafieldDefinitions": {"edges": [
            node("custom", "refs", "list.metaobject_reference")
        ]}})]);

        let defs = fetch_field_definitions(&client, "PRODUCT", 250, 100).await.unwrap();
        assert_eq!(defs[0].referenced_type_name(), Some("metaobject_reference"));
        assert_eq!(client.call_count(), 1);
    }
}
