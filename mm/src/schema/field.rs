//! Metafield definition records as read from the source store

use serde::{Deserialize, Serialize};

/// Substring that marks a field type as a structured (metaobject) reference
pub const REFERENCE_MARKER: &str = "metaobject_reference";

/// Prefix wrapping list-valued field types
pub const LIST_PREFIX: &str = "list.";

/// Type assumed when the source supplied none
pub const DEFAULT_FIELD_TYPE: &str = "single_line_text_field";

/// Validation name binding a reference field to a metaobject definition
pub const METAOBJECT_VALIDATION: &str = "metaobject_definition_id";

/// Whether a field type name denotes a metaobject reference (bare or list)
pub fn is_reference_type(type_name: &str) -> bool {
    type_name.contains(REFERENCE_MARKER)
}

/// Strip a leading `list.` wrapper, if any
pub fn strip_list_prefix(type_name: &str) -> &str {
    type_name.strip_prefix(LIST_PREFIX).unwrap_or(type_name)
}

/// A metafield definition on the source store
///
/// Identity is `(namespace, key)` within one owner type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: String,
    pub name: String,
    pub namespace: String,
    pub key: String,

    #[serde(rename = "type", default)]
    pub field_type: Option<FieldType>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub validations: Vec<Validation>,

    /// Referenced metaobject type, resolved from the source's own validation
    #[serde(skip)]
    pub referenced_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldType {
    pub name: String,

    #[serde(default)]
    pub category: Option<String>,
}

/// A validation rule attached to a source definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub name: String,

    #[serde(default)]
    pub value: Option<String>,
}

impl FieldDefinition {
    /// Effective type name, defaulting to a single-line text field
    pub fn type_name(&self) -> &str {
        self.field_type
            .as_ref()
            .map(|t| t.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_FIELD_TYPE)
    }

    pub fn is_reference(&self) -> bool {
        is_reference_type(self.type_name())
    }

    /// Name of the metaobject type this definition points to
    ///
    /// Uses the type bound on the source when known, otherwise the field type
    /// with its list wrapper stripped. `None` for non-reference fields.
    pub fn referenced_type_name(&self) -> Option<&str> {
        if !self.is_reference() {
            return None;
        }
        Some(
            self.referenced_type
                .as_deref()
                .unwrap_or_else(|| strip_list_prefix(self.type_name())),
        )
    }

    /// Source-side metaobject definition id from the definition's validations
    pub fn source_type_binding(&self) -> Option<&str> {
        self.validations
            .iter()
            .find(|v| v.name == METAOBJECT_VALIDATION)
            .and_then(|v| v.value.as_deref())
            .filter(|v| !v.is_empty())
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}
