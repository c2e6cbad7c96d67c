use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::validated_fee;
use crate::adapter::{require_fee_attribute, FeeAdapter, QueryFuture, SourceError};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::registry::Registrar;
use crate::retry::{retry_with, send_once, RetryPolicy};
use crate::subgraph::parse_decimal;
use crate::throttling::RequestThrottle;
use crate::{CoreError, DateKey, ProtocolCategory, ProtocolMetadata};

const FEE_METRIC: &str = "FeeTotUSD";

/// Layer-1 chain fees from the CoinMetrics `FeeTotUSD` asset metric.
pub struct CoinMetricsAdapter {
    http: Arc<dyn HttpClient>,
    base_url: String,
    asset: String,
    api_key: Option<String>,
    retry: RetryPolicy,
    timeout_ms: u64,
    throttle: Option<RequestThrottle>,
}

impl CoinMetricsAdapter {
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>, asset: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            asset: asset.into(),
            api_key: None,
            retry: RetryPolicy::default(),
            timeout_ms: 10_000,
            throttle: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_throttle(mut self, throttle: RequestThrottle) -> Self {
        self.throttle = Some(throttle);
        self
    }

    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, SourceError> {
        if let Some(throttle) = &self.throttle {
            throttle.until_ready().await;
        }
        send_once(self.http.as_ref(), request.clone(), &self.retry, "coinmetrics").await
    }

    fn request_url(&self, date: DateKey) -> String {
        let mut url = format!(
            "{}/timeseries/asset-metrics?assets={}&metrics={FEE_METRIC}&frequency=1d&start_time={date}&end_time={date}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.asset),
        );
        if let Some(key) = &self.api_key {
            url.push_str("&api_key=");
            url.push_str(&urlencoding::encode(key));
        }
        url
    }
}

impl FeeAdapter for CoinMetricsAdapter {
    fn query<'a>(&'a self, attribute: &'a str, date: DateKey) -> QueryFuture<'a> {
        Box::pin(async move {
            require_fee_attribute(attribute)?;

            debug!(asset = %self.asset, %date, "coinmetrics fee query");
            let request = HttpRequest::get(self.request_url(date)).with_timeout_ms(self.timeout_ms);
            let response = retry_with(&self.retry, "coinmetrics", || self.send(&request)).await?;

            let payload: MetricsResponse = serde_json::from_str(&response.body).map_err(|error| {
                SourceError::invalid_response(format!("malformed coinmetrics response: {error}"))
            })?;

            let day = date.to_string();
            let row = payload
                .data
                .iter()
                .find(|row| row.time.starts_with(&day))
                .ok_or_else(|| {
                    SourceError::invalid_response(format!(
                        "coinmetrics returned no {FEE_METRIC} row for {} on {day}",
                        self.asset
                    ))
                })?;
            let raw = row.fee_tot_usd.as_deref().ok_or_else(|| {
                SourceError::invalid_response(format!("coinmetrics row for {day} has no {FEE_METRIC}"))
            })?;

            validated_fee(parse_decimal(FEE_METRIC, raw)?)
        })
    }
}

#[derive(Debug, Deserialize)]
struct MetricsResponse {
    #[serde(default)]
    data: Vec<MetricsRow>,
}

#[derive(Debug, Deserialize)]
struct MetricsRow {
    time: String,
    #[serde(rename = "FeeTotUSD")]
    fee_tot_usd: Option<String>,
}

/// Registers `ethereum` and `bitcoin`.
pub fn register(registrar: &mut Registrar<'_>) -> Result<(), CoreError> {
    let settings = registrar.settings();
    let source = format!("{}/timeseries/asset-metrics", settings.endpoints.coinmetrics);

    let chains = [
        (
            "ethereum",
            "eth",
            "Ethereum",
            "ETH",
            "https://ethereum.org",
            "Ethereum is the base layer for most DeFi protocols.",
        ),
        (
            "bitcoin",
            "btc",
            "Bitcoin",
            "BTC",
            "https://bitcoin.org",
            "Bitcoin is the first decentralized cryptocurrency.",
        ),
    ];

    for (id, asset, name, token, website, description) in chains {
        let adapter = CoinMetricsAdapter::new(
            registrar.http_client(),
            settings.endpoints.coinmetrics.clone(),
            asset,
        )
        .with_api_key(settings.coinmetrics_api_key.clone())
        .with_retry(settings.retry.clone())
        .with_timeout_ms(settings.timeout_ms)
        .with_throttle(registrar.throttle());

        registrar.register(
            id,
            Arc::new(adapter),
            ProtocolMetadata::new(name, ProtocolCategory::L1)?
                .with_description(description)
                .with_website(website)
                .with_source(source.clone())
                .with_token(token)
                .with_blockchain(name),
        )?;
    }

    Ok(())
}
