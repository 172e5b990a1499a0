//! Metaobject type name to destination id mapping

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A metaobject definition as listed by a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub id: String,

    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default)]
    pub name: Option<String>,
}

/// Destination ids of metaobject types, keyed by type name
///
/// Seeded once per run from the destination and extended as types are
/// provisioned. A name is never remapped once present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TypeMapping {
    entries: BTreeMap<String, String>,
}

impl TypeMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, type_name: &str) -> Option<&str> {
        self.entries.get(type_name).map(String::as_str)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// Record a type id
    ///
    /// Returns false and keeps the existing id if the name is already mapped.
    pub fn insert(&mut self, type_name: impl Into<String>, id: impl Into<String>) -> bool {
        let type_name = type_name.into();
        if self.entries.contains_key(&type_name) {
            debug!(%type_name, "TypeMapping::insert: already mapped, keeping existing id");
            return false;
        }
        self.entries.insert(type_name, id.into());
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<TypeDefinition> for TypeMapping {
    fn from_iter<I: IntoIterator<Item = TypeDefinition>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for def in iter {
            mapping.insert(def.type_name, def.id);
        }
        mapping
    }
}
