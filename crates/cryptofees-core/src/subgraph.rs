//! GraphQL client for subgraph indexers.
//!
//! Requests are POSTed as `{"query": ..., "variables": {...}}`. A response is
//! only accepted when it parses, carries no `errors`, and has a `data` object.
//! Calls draw from the registry-wide request budget so a wide date range
//! does not hammer the indexer.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::adapter::SourceError;
use crate::config::AdapterSettings;
use crate::http_client::{HttpClient, HttpRequest};
use crate::retry::{retry_with, send_once, RetryPolicy};
use crate::throttling::RequestThrottle;

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: &'a Value,
}

#[derive(Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

/// Shared subgraph transport with retry and rate limiting.
pub struct SubgraphClient {
    http: Arc<dyn HttpClient>,
    retry: RetryPolicy,
    timeout_ms: u64,
    throttle: RequestThrottle,
}

impl SubgraphClient {
    pub fn new(
        http: Arc<dyn HttpClient>,
        settings: &AdapterSettings,
        throttle: RequestThrottle,
    ) -> Self {
        Self {
            http,
            retry: settings.retry.clone(),
            timeout_ms: settings.timeout_ms,
            throttle,
        }
    }

    /// Run `query` against `endpoint` and decode its `data` object into `T`.
    ///
    /// Retryable failures, including GraphQL `errors` in a 200 response, are
    /// repeated within the retry budget; every attempt takes from the
    /// request budget.
    pub async fn query<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &str,
        variables: Value,
    ) -> Result<T, SourceError> {
        let body = serde_json::to_string(&GraphqlRequest {
            query,
            variables: &variables,
        })
        .map_err(|error| SourceError::internal(format!("failed to encode graphql request: {error}")))?;

        debug!(endpoint, %variables, "subgraph query");

        retry_with(&self.retry, endpoint, || self.attempt(endpoint, &body)).await
    }

    async fn attempt<T: DeserializeOwned>(&self, endpoint: &str, body: &str) -> Result<T, SourceError> {
        self.throttle.until_ready().await;
        let request = HttpRequest::post_json(endpoint, body).with_timeout_ms(self.timeout_ms);
        let response = send_once(self.http.as_ref(), request, &self.retry, endpoint).await?;
        decode_response(&response.body)
    }
}

/// Decode a GraphQL response body, surfacing `errors` as upstream failures.
pub fn decode_response<T: DeserializeOwned>(body: &str) -> Result<T, SourceError> {
    let response: GraphqlResponse<T> = serde_json::from_str(body).map_err(|error| {
        SourceError::invalid_response(format!("malformed subgraph response: {error}"))
    })?;

    if !response.errors.is_empty() {
        let messages = response
            .errors
            .iter()
            .map(|error| error.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(SourceError::upstream_fetch(format!(
            "subgraph returned errors: {messages}"
        )));
    }

    response
        .data
        .ok_or_else(|| SourceError::invalid_response("subgraph response has no data"))
}

/// Parse a subgraph `BigDecimal`/`BigInt` string into a finite `f64`.
pub fn parse_decimal(field: &str, raw: &str) -> Result<f64, SourceError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| SourceError::invalid_response(format!("field '{field}' is not a number: '{raw}'")))
}
