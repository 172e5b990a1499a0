//! GraphqlClient trait definition

use async_trait::async_trait;

use super::{GraphqlError, GraphqlRequest, GraphqlResponse};

/// One store's Admin GraphQL endpoint
///
/// Every migration component talks to a store only through this trait, so a
/// run can be driven against recording fakes in tests. Implementations are
/// stateless per call.
#[async_trait]
pub trait GraphqlClient: Send + Sync {
    /// Execute one operation and return the raw response envelope
    ///
    /// Transport failures are `Err`. A reply carrying `errors[]` is still
    /// `Ok`; callers decide via [`GraphqlResponse::into_data`].
    async fn execute(&self, request: &GraphqlRequest) -> Result<GraphqlResponse, GraphqlError>;
}
