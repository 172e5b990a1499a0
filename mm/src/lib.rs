//! metamigrate - Shopify metafield definition migration
//!
//! Copies the *schema* of product metafields, not their values, from one
//! store to another. Metafield definitions may reference metaobject types
//! that do not exist on the destination yet; those types are discovered,
//! deduplicated against what the destination already has, and created before
//! any definition that needs them. Re-running never creates a type twice.
//!
//! # Modules
//!
//! - [`graphql`] - Admin API client trait, HTTPS client and envelopes
//! - [`schema`] - metafield/metaobject definition records and GraphQL documents
//! - [`migrate`] - the migration pipeline and its report
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use metamigrate::{AdminClient, Config, Migrator};
//!
//! let config = Config::load(None)?;
//! let source = Arc::new(AdminClient::from_config(&config.source, &config.api)?);
//! let destination = Arc::new(AdminClient::from_config(&config.destination, &config.api)?);
//! let report = Migrator::new(source, destination, config.migration).run().await?;
//! println!("{:?}", report.summary());
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod graphql;
pub mod migrate;
pub mod schema;

pub use config::{ApiConfig, Config, MigrationConfig, StoreConfig};
pub use error::MigrateError;
pub use graphql::{AdminClient, GraphqlClient, GraphqlError, GraphqlRequest, GraphqlResponse};
pub use migrate::{MigrationPlan, MigrationReport, MigrationState, MigrationSummary, Migrator};
pub use schema::{FieldDefinition, TypeMapping};
