//! Error types for the migration library.

use thiserror::Error;

use crate::graphql::GraphqlError;

/// Main error type for migration operations.
///
/// Only the two query variants abort a run; the rest are recorded per item
/// in the [`MigrationReport`](crate::migrate::MigrationReport).
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Reading the source store failed
    #[error("Source query failed: {0}")]
    SourceQuery(GraphqlError),

    /// Reading destination metaobject definitions failed
    #[error("Destination query failed: {0}")]
    DestinationQuery(GraphqlError),

    /// A metaobject definition could not be created
    #[error("Failed to create metaobject definition {type_name}: {cause}")]
    TypeCreation { type_name: String, cause: GraphqlError },

    /// A metafield definition could not be created
    #[error("Failed to create metafield definition {namespace}.{key}: {cause}")]
    FieldCreation {
        namespace: String,
        key: String,
        cause: GraphqlError,
    },

    /// The overwrite pre-delete of a metafield definition failed
    #[error("Failed to delete metafield definition {namespace}.{key}: {cause}")]
    FieldDeletion {
        namespace: String,
        key: String,
        cause: GraphqlError,
    },
}

impl MigrateError {
    /// Create a TypeCreation error
    pub fn type_creation(type_name: impl Into<String>, cause: GraphqlError) -> Self {
        MigrateError::TypeCreation {
            type_name: type_name.into(),
            cause,
        }
    }

    /// Create a FieldCreation error
    pub fn field_creation(namespace: impl Into<String>, key: impl Into<String>, cause: GraphqlError) -> Self {
        MigrateError::FieldCreation {
            namespace: namespace.into(),
            key: key.into(),
            cause,
        }
    }

    /// Create a FieldDeletion error
    pub fn field_deletion(namespace: impl Into<String>, key: impl Into<String>, cause: GraphqlError) -> Self {
        MigrateError::FieldDeletion {
            namespace: namespace.into(),
            key: key.into(),
            cause,
        }
    }

    /// Whether this error aborts the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, MigrateError::SourceQuery(_) | MigrateError::DestinationQuery(_))
    }
}
