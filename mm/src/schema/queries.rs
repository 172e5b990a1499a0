//! Admin API GraphQL documents and request builders

use serde_json::json;

use crate::graphql::GraphqlRequest;

pub const OP_LIST_FIELD_DEFINITIONS: &str = "MetafieldDefinitions";
pub const OP_LOOKUP_FIELD_DEFINITION: &str = "MetafieldDefinitionLookup";
pub const OP_CREATE_FIELD_DEFINITION: &str = "CreateMetafieldDefinition";
pub const OP_DELETE_FIELD_DEFINITION: &str = "DeleteMetafieldDefinition";
pub const OP_LIST_TYPE_DEFINITIONS: &str = "MetaobjectDefinitions";
pub const OP_CREATE_TYPE_DEFINITION: &str = "CreateMetaobjectDefinition";

const LIST_FIELD_DEFINITIONS: &str = r#"query MetafieldDefinitions($ownerType: MetafieldOwnerType!, $first: Int!, $after: String) {
  metafieldDefinitions(ownerType: $ownerType, first: $first, after: $after) {
    edges {
      node {
        id
        name
        namespace
        key
        type {
          name
          category
        }
        description
        validations {
          name
          value
        }
      }
    }
    pageInfo {
      hasNextPage
      endCursor
    }
  }
}"#;

const LOOKUP_FIELD_DEFINITION: &str = r#"query MetafieldDefinitionLookup($ownerType: MetafieldOwnerType!, $namespace: String!, $key: String!) {
  metafieldDefinitions(ownerType: $ownerType, namespace: $namespace, key: $key, first: 1) {
    edges {
      node {
        id
        namespace
        key
      }
    }
  }
}"#;

const CREATE_FIELD_DEFINITION: &str = r#"mutation CreateMetafieldDefinition($definition: MetafieldDefinitionInput!) {
  metafieldDefinitionCreate(definition: $definition) {
    createdDefinition {
      id
      name
      namespace
      key
      type {
        name
        category
      }
      description
      ownerType
      validations {
        type
        value
      }
    }
    userErrors {
      field
      message
      code
    }
  }
}"#;

const DELETE_FIELD_DEFINITION: &str = r#"mutation DeleteMetafieldDefinition($id: ID!) {
  metafieldDefinitionDelete(id: $id) {
    deletedId
    userErrors {
      field
      message
      code
    }
  }
}"#;

const LIST_TYPE_DEFINITIONS: &str = r#"query MetaobjectDefinitions($first: Int!, $after: String) {
  metaobjectDefinitions(first: $first, after: $after) {
    edges {
      node {
        id
        type
        name
      }
    }
    pageInfo {
      hasNextPage
      endCursor
    }
  }
}"#;

const CREATE_TYPE_DEFINITION: &str = r#"mutation CreateMetaobjectDefinition($definition: MetaobjectDefinitionCreateInput!) {
  metaobjectDefinitionCreate(definition: $definition) {
    metaobjectDefinition {
      id
      type
    }
    userErrors {
      field
      message
      code
    }
  }
}"#;

pub fn list_field_definitions(owner_type: &str, first: u32, after: Option<&str>) -> GraphqlRequest {
    GraphqlRequest::new(OP_LIST_FIELD_DEFINITIONS, LIST_FIELD_DEFINITIONS).with_variables(json!({
        "ownerType": owner_type,
        "first": first,
        "after": after,
    }))
}

pub fn lookup_field_definition(owner_type: &str, namespace: &str, key: &str) -> GraphqlRequest {
    GraphqlRequest::new(OP_LOOKUP_FIELD_DEFINITION, LOOKUP_FIELD_DEFINITION).with_variables(json!({
        "ownerType": owner_type,
        "namespace": namespace,
        "key": key,
    }))
}

pub fn create_field_definition(definition: serde_json::Value) -> GraphqlRequest {
    GraphqlRequest::new(OP_CREATE_FIELD_DEFINITION, CREATE_FIELD_DEFINITION)
        .with_variables(json!({ "definition": definition }))
}

pub fn delete_field_definition(id: &str) -> GraphqlRequest {
    GraphqlRequest::new(OP_DELETE_FIELD_DEFINITION, DELETE_FIELD_DEFINITION).with_variables(json!({ "id": id }))
}

pub fn list_type_definitions(first: u32, after: Option<&str>) -> GraphqlRequest {
    GraphqlRequest::new(OP_LIST_TYPE_DEFINITIONS, LIST_TYPE_DEFINITIONS).with_variables(json!({
        "first": first,
        "after": after,
    }))
}

pub fn create_type_definition(type_name: &str, display_name: &str) -> GraphqlRequest {
    GraphqlRequest::new(OP_CREATE_TYPE_DEFINITION, CREATE_TYPE_DEFINITION).with_variables(json!({
        "definition": {
            "type": type_name,
            "name": display_name,
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_declare_their_operation_names() {
        let requests = [
            list_field_definitions("PRODUCT", 250, None),
            lookup_field_definition("PRODUCT", "custom", "size"),
            create_field_definition(json!({})),
            delete_field_definition("gid://1"),
            list_type_definitions(100, None),
            create_type_definition("recipe", "RECIPE"),
        ];
        for req in requests {
            assert!(
                req.query.contains(&format!(" {}(", req.operation_name)),
                "{} not declared in its document",
                req.operation_name
            );
        }
    }

    #[test]
    fn test_list_field_definitions_variables() {
        let req = list_field_definitions("PRODUCT", 250, Some("cursor-1"));
        assert_eq!(req.variables["ownerType"], "PRODUCT");
        assert_eq!(req.variables["first"], 250);
        assert_eq!(req.variables["after"], "cursor-1");

        let first_page = list_field_definitions("PRODUCT", 250, None);
        assert!(first_page.variables["after"].is_null());
    }

    #[test]
    fn test_create_type_definition_variables() {
        let req = create_type_definition("recipe_card", "RECIPE CARD");
        assert_eq!(req.variables["definition"]["type"], "recipe_card");
        assert_eq!(req.variables["definition"]["name"], "RECIPE CARD");
    }
}
