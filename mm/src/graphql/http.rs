//! Shopify Admin GraphQL client over HTTPS
//!
//! Implements the GraphqlClient trait with bounded retry and exponential
//! backoff on transient transport failures.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::{GraphqlClient, GraphqlError, GraphqlRequest, GraphqlResponse};
use crate::config::{ApiConfig, StoreConfig};

/// Header carrying the per-store access token
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Fallback wait when a 429 reply has no usable `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 2;

/// Wait time from a `Retry-After` header given in seconds
fn parse_retry_after(value: Option<&str>) -> Duration {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
        .unwrap_or(Duration::from_secs(DEFAULT_RETRY_AFTER_SECS))
}

/// Error for a non-success HTTP reply
fn status_error(status: u16, retry_after: Option<&str>, body: String) -> GraphqlError {
    match status {
        429 => GraphqlError::RateLimited {
            retry_after: parse_retry_after(retry_after),
        },
        _ => GraphqlError::Http { status, message: body },
    }
}

/// Admin API client bound to one store
pub struct AdminClient {
    endpoint: String,
    access_token: String,
    http: Client,
    max_retries: u32,
    initial_backoff_ms: u64,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("endpoint", &self.endpoint)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl AdminClient {
    /// Create a client for an explicit endpoint and token
    pub fn new(endpoint: impl Into<String>, access_token: impl Into<String>, api: &ApiConfig) -> Result<Self, GraphqlError> {
        let endpoint = endpoint.into();
        debug!(%endpoint, "AdminClient::new: called");

        let http = Client::builder()
            .timeout(Duration::from_millis(api.timeout_ms))
            .build()
            .map_err(GraphqlError::Network)?;

        Ok(Self::with_http(endpoint, access_token, http, api))
    }

    fn with_http(endpoint: impl Into<String>, access_token: impl Into<String>, http: Client, api: &ApiConfig) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_token: access_token.into(),
            http,
            max_retries: api.max_retries,
            initial_backoff_ms: api.initial_backoff_ms,
        }
    }

    /// Create a client from a store section of the config
    ///
    /// Reads the access token from the environment variable the store names.
    pub fn from_config(store: &StoreConfig, api: &ApiConfig) -> Result<Self, GraphqlError> {
        debug!(store = %store.store, "AdminClient::from_config: called");
        let access_token = store
            .access_token()
            .map_err(|e| GraphqlError::Credentials(e.to_string()))?;
        Self::new(store.endpoint(&api.version), access_token, api)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.initial_backoff_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1))))
    }
}

#[async_trait]
impl GraphqlClient for AdminClient {
    async fn execute(&self, request: &GraphqlRequest) -> Result<GraphqlResponse, GraphqlError> {
        debug!(endpoint = %self.endpoint, operation = %request.operation_name, "execute: called");

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = match last_error.as_ref().and_then(GraphqlError::retry_after) {
                    Some(wait) => wait,
                    None => self.backoff(attempt),
                };
                warn!(
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    operation = %request.operation_name,
                    "execute: retrying after transient error"
                );
                tokio::time::sleep(backoff).await;
            }

            let error = match self
                .http
                .post(&self.endpoint)
                .header(ACCESS_TOKEN_HEADER, &self.access_token)
                .header("content-type", "application/json")
                .json(request)
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => {
                    debug!("execute: success");
                    return response
                        .json::<GraphqlResponse>()
                        .await
                        .map_err(|e| GraphqlError::InvalidResponse(format!("undecodable body: {}", e)));
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let retry_after = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    let body = response.text().await.unwrap_or_default();
                    status_error(status, retry_after.as_deref(), body)
                }
                Err(e) => GraphqlError::Network(e),
            };

            if !error.is_retryable() {
                debug!(attempt, error = %error, "execute: permanent failure");
                return Err(error);
            }
            if error.is_rate_limit() {
                debug!(attempt, retry_after = ?error.retry_after(), "execute: rate limited (429)");
            } else {
                debug!(attempt, error = %error, "execute: transient failure");
            }
            last_error = Some(error);
        }

        Err(last_error.unwrap_or_else(|| GraphqlError::InvalidResponse("Max retries exceeded".to_string())))
    }
}
