//! GraphQL request/response envelope types
//!
//! These model the wire contract of the Admin GraphQL API: a POSTed
//! `{query, variables, operationName}` body and a `{data, errors}` reply.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::GraphqlError;

/// A single GraphQL operation ready to be POSTed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
    /// Operation name, also used by test doubles to route canned responses
    pub operation_name: String,

    /// GraphQL document
    pub query: String,

    /// Operation variables (`null` when the document takes none)
    pub variables: serde_json::Value,
}

impl GraphqlRequest {
    /// Create a request without variables
    pub fn new(operation_name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            query: query.into(),
            variables: serde_json::Value::Null,
        }
    }

    /// Attach variables to the request
    pub fn with_variables(mut self, variables: serde_json::Value) -> Self {
        self.variables = variables;
        self
    }
}

/// Raw response envelope
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<serde_json::Value>,

    #[serde(default)]
    pub errors: Vec<GraphqlErrorEntry>,
}

impl GraphqlResponse {
    /// Build a successful response around a `data` payload
    pub fn from_data(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// Build a response that only carries protocol-level errors
    pub fn from_errors(errors: Vec<GraphqlErrorEntry>) -> Self {
        Self { data: None, errors }
    }

    /// Convert into the typed `data` payload
    ///
    /// A non-empty `errors[]` wins over any partial `data`.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, GraphqlError> {
        debug!(error_count = %self.errors.len(), "into_data: called");
        if !self.errors.is_empty() {
            return Err(GraphqlError::Query(self.errors));
        }
        let data = self
            .data
            .ok_or_else(|| GraphqlError::InvalidResponse("response carried neither data nor errors".to_string()))?;
        Ok(serde_json::from_value(data)?)
    }
}

/// One entry of a top-level `errors[]` array
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GraphqlErrorEntry {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

impl GraphqlErrorEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extensions: None,
        }
    }
}

/// One entry of a mutation payload's `userErrors[]` array
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl UserError {
    /// `field.path: message`, or just the message when no field is named
    pub fn describe(&self) -> String {
        match &self.field {
            Some(path) if !path.is_empty() => format!("{}: {}", path.join("."), self.message),
            _ => self.message.clone(),
        }
    }
}

/// Relay-style connection used by every list query
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,

    #[serde(default)]
    pub page_info: PageInfo,
}

impl<T> Connection<T> {
    /// Consume the connection, yielding its nodes in order
    pub fn into_nodes(self) -> Vec<T> {
        self.edges.into_iter().map(|e| e.node).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

/// Cursor state of a connection page
///
/// Defaults to "no further pages" so a reply without `pageInfo` is treated
/// as a single complete page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,

    #[serde(default)]
    pub end_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Payload {
        shop: Shop,
    }

    #[derive(Debug, Deserialize)]
    struct Shop {
        name: String,
    }

    #[test]
    fn test_request_serializes_operation_name_camel_case() {
        let req = GraphqlRequest::new("Shop", "query Shop { shop { name } }").with_variables(json!({"a": 1}));
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["operationName"], "Shop");
        assert_eq!(body["variables"]["a"], 1);
    }

    #[test]
    fn test_into_data_success() {
        let resp = GraphqlResponse::from_data(json!({"shop": {"name": "dev"}}));
        let payload: Payload = resp.into_data().unwrap();
        assert_eq!(payload.shop.name, "dev");
    }

    #[test]
    fn test_into_data_errors_win_over_partial_data() {
        let resp: GraphqlResponse = serde_json::from_value(json!({
            "data": {"shop": {"name": "dev"}},
            "errors": [{"message": "Throttled", "extensions": {"code": "THROTTLED"}}]
        }))
        .unwrap();
        let err = resp.into_data::<Payload>().unwrap_err();
        assert!(matches!(err, GraphqlError::Query(ref e) if e[0].message == "Throttled"));
    }

    #[test]
    fn test_into_data_missing_data_is_invalid() {
        let err = GraphqlResponse::default().into_data::<Payload>().unwrap_err();
        assert!(matches!(err, GraphqlError::InvalidResponse(_)));
    }

    #[test]
    fn test_connection_without_page_info_is_single_page() {
        let conn: Connection<Shop> = serde_json::from_value(json!({
            "edges": [{"node": {"name": "a"}}, {"node": {"name": "b"}}]
        }))
        .unwrap();
        assert!(!conn.page_info.has_next_page);
        let names: Vec<_> = conn.into_nodes().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
