//! GraphQL transport error types

use std::time::Duration;
use thiserror::Error;

use super::types::{GraphqlErrorEntry, UserError};

/// Errors that can occur while talking to an Admin GraphQL endpoint
#[derive(Debug, Error)]
pub enum GraphqlError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response carried a top-level `errors[]` array
    #[error("GraphQL errors: {}", describe_query_errors(.0))]
    Query(Vec<GraphqlErrorEntry>),

    /// The mutation payload carried a non-empty `userErrors[]` array
    #[error("User errors: {}", describe_user_errors(.0))]
    UserErrors(Vec<UserError>),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing credentials: {0}")]
    Credentials(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

fn describe_query_errors(errors: &[GraphqlErrorEntry]) -> String {
    errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join("; ")
}

fn describe_user_errors(errors: &[UserError]) -> String {
    errors.iter().map(UserError::describe).collect::<Vec<_>>().join("; ")
}

impl GraphqlError {
    /// Check if this is a rate limit error
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, GraphqlError::RateLimited { .. })
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            GraphqlError::RateLimited { .. } => true,
            GraphqlError::Http { status, .. } => *status == 408 || *status >= 500,
            GraphqlError::Network(_) => true,
            GraphqlError::Query(_) => false,
            GraphqlError::UserErrors(_) => false,
            GraphqlError::InvalidResponse(_) => false,
            GraphqlError::Credentials(_) => false,
            GraphqlError::Json(_) => false,
        }
    }

    /// Get the retry duration if this is a rate limit error
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            GraphqlError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
