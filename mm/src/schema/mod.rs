//! Schema records exchanged with the stores
//!
//! - [`FieldDefinition`] - metafield definitions read from the source
//! - [`TypeMapping`] - metaobject type name to destination id
//! - [`queries`] - the GraphQL documents both stores are addressed with

mod field;
mod mapping;
pub mod queries;

pub use field::{
    DEFAULT_FIELD_TYPE, FieldDefinition, FieldType, LIST_PREFIX, METAOBJECT_VALIDATION, REFERENCE_MARKER, Validation,
    is_reference_type, strip_list_prefix,
};
pub use mapping::{TypeDefinition, TypeMapping};

#[cfg(test)]
pub(crate) use field::fixtures;
