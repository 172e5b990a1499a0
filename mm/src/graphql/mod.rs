//! GraphQL transport for the Shopify Admin API
//!
//! Provides the client seam every migration component talks through, the
//! HTTPS implementation, and the request/response envelopes.

mod client;
mod error;
mod http;
mod paginate;
mod types;

pub use client::GraphqlClient;
pub use error::GraphqlError;
pub use http::AdminClient;
pub use paginate::fetch_all;
pub use types::{Connection, Edge, GraphqlErrorEntry, GraphqlRequest, GraphqlResponse, PageInfo, UserError};

#[cfg(test)]
pub use client::mock;
