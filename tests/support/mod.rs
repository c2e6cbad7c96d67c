//! Shared doubles for the behavior tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use cryptofees_core::{
    AdapterSettings, BatchResponse, DateKey, Endpoints, FeeAdapter, FeeFetcher, FeeRecord,
    FetchFuture, HttpClient, HttpFuture, HttpRequest, HttpResponse, MissingDatesRequest,
    ProtocolFees, ProtocolId, QueryError, QueryFuture, RetryPolicy, SourceError,
};
use serde_json::Value;

pub const UNISWAP_URL: &str = "http://uniswap.test/subgraph";
pub const SUSHISWAP_URL: &str = "http://sushiswap.test/subgraph";
pub const HONEYSWAP_URL: &str = "http://honeyswap.test/subgraph";
pub const BALANCER_URL: &str = "http://balancer.test/subgraph";
pub const BLOCKS_URL: &str = "http://blocks.test/subgraph";
pub const COINMETRICS_URL: &str = "http://coinmetrics.test/v4";

/// Settings pointing every upstream at a `.test` host, without retries or throttling.
pub fn test_settings() -> AdapterSettings {
    AdapterSettings::default()
        .with_endpoints(Endpoints {
            uniswap_v2: String::from(UNISWAP_URL),
            sushiswap: String::from(SUSHISWAP_URL),
            honeyswap: String::from(HONEYSWAP_URL),
            balancer: String::from(BALANCER_URL),
            ethereum_blocks: String::from(BLOCKS_URL),
            coinmetrics: String::from(COINMETRICS_URL),
        })
        .with_retry(RetryPolicy::no_retry())
        .with_requests_per_second(10_000)
}

pub fn id(value: &str) -> ProtocolId {
    ProtocolId::parse(value).expect("valid protocol id")
}

pub fn day(value: &str) -> DateKey {
    DateKey::parse(value).expect("valid day")
}

/// HTTP double answering from substring routes and recording every request.
///
/// A route matches when its needle occurs in the URL or the body. Requests
/// without a matching route get a 404.
#[derive(Default)]
pub struct RecordingHttpClient {
    routes: Vec<(String, HttpResponse)>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route_json(self, needle: impl Into<String>, body: Value) -> Self {
        self.route(needle, HttpResponse::ok_json(body.to_string()))
    }

    pub fn route(mut self, needle: impl Into<String>, response: HttpResponse) -> Self {
        self.routes.push((needle.into(), response));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("lock").clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("lock").len()
    }
}

impl HttpClient for RecordingHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            let body = request.body.clone().unwrap_or_default();
            let response = self
                .routes
                .iter()
                .find(|(needle, _)| request.url.contains(needle) || body.contains(needle))
                .map(|(_, response)| response.clone())
                .unwrap_or_else(|| HttpResponse::with_status(404, "no route"));
            self.requests.lock().expect("lock").push(request);
            Ok(response)
        })
    }
}

/// Adapter serving fees from a fixed table and counting calls.
#[derive(Default)]
pub struct TableAdapter {
    fees: BTreeMap<DateKey, f64>,
    failing: BTreeSet<DateKey>,
    calls: AtomicUsize,
}

impl TableAdapter {
    pub fn new<I>(fees: I) -> Self
    where
        I: IntoIterator<Item = (DateKey, f64)>,
    {
        Self {
            fees: fees.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn failing_on(mut self, date: DateKey) -> Self {
        self.failing.insert(date);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FeeAdapter for TableAdapter {
    fn query<'a>(&'a self, attribute: &'a str, date: DateKey) -> QueryFuture<'a> {
        Box::pin(async move {
            cryptofees_core::adapter::require_fee_attribute(attribute)?;
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(&date) {
                return Err(SourceError::upstream_fetch(format!("no data for {date}")));
            }
            self.fees
                .get(&date)
                .copied()
                .ok_or_else(|| SourceError::invalid_response(format!("no row for {date}")))
        })
    }
}

/// Fetcher that answers every missing date with `fee_for(protocol, date)` and
/// records the batches it was asked for.
pub struct RecordingFetcher {
    fee_for: fn(&ProtocolId, DateKey) -> f64,
    requests: Mutex<Vec<MissingDatesRequest>>,
    fail: bool,
}

impl RecordingFetcher {
    pub fn new(fee_for: fn(&ProtocolId, DateKey) -> f64) -> Self {
        Self {
            fee_for,
            requests: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(|_, _| 0.0)
        }
    }

    pub fn requests(&self) -> Vec<MissingDatesRequest> {
        self.requests.lock().expect("lock").clone()
    }

    pub fn answer(&self, request: &MissingDatesRequest) -> BatchResponse {
        answer_with(request, self.fee_for)
    }
}

impl FeeFetcher for RecordingFetcher {
    fn fetch_missing<'a>(&'a self, request: MissingDatesRequest) -> FetchFuture<'a> {
        Box::pin(async move {
            self.requests.lock().expect("lock").push(request.clone());
            if self.fail {
                return Err(QueryError::Source {
                    protocol: request.protocol_id.clone(),
                    date: request
                        .missing_dates_by_protocol
                        .values()
                        .flatten()
                        .next()
                        .copied()
                        .unwrap_or_else(DateKey::today),
                    source: SourceError::upstream_fetch("indexer unavailable"),
                });
            }
            Ok(answer_with(&request, self.fee_for))
        })
    }
}

/// Successful batch response for every date in `request`.
pub fn answer_with(
    request: &MissingDatesRequest,
    fee_for: fn(&ProtocolId, DateKey) -> f64,
) -> BatchResponse {
    BatchResponse::succeeded(
        request
            .missing_dates_by_protocol
            .iter()
            .map(|(id, dates)| ProtocolFees {
                id: id.clone(),
                data: dates
                    .iter()
                    .map(|date| FeeRecord::new(*date, fee_for(id, *date)).expect("valid fee"))
                    .collect(),
            })
            .collect(),
    )
}
