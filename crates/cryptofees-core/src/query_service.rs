//! Date-range query service.
//!
//! The boundary between the cache and the adapters. It resolves a protocol
//! through the registry and asks its adapter for one fee per day. Nothing is
//! cached here; the client-side [`FeeCache`](crate::FeeCache) owns that.
//!
//! | Operation | Input | Output |
//! |-----------|-------|--------|
//! | [`get_date_range_data`](DateRangeService::get_date_range_data) | id, start, end | ascending [`FeeRecord`]s |
//! | [`get_missing_dates`](DateRangeService::get_missing_dates) | [`MissingDatesRequest`] | [`BatchResponse`] |
//! | [`snapshot`](DateRangeService::snapshot) | id, window | seeded [`FeeStore`] |
//! | [`get_summary`](DateRangeService::get_summary) | id, today | [`ProtocolSummary`] |
//! | [`get_summaries`](DateRangeService::get_summaries) | today | [`SummaryReport`] |

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::adapter::{SourceError, FEE_ATTRIBUTE};
use crate::cache::{FeeFetcher, FeeStore, FetchFuture};
use crate::registry::{AdapterRegistry, ProtocolRegistration, RegistryError};
use crate::{DateKey, FeeRecord, ProtocolId, ProtocolMetadata, ValidationError, Window};

/// Days averaged into [`ProtocolSummary::seven_day_ma`].
pub const SUMMARY_AVERAGE_DAYS: u32 = 7;

const DEFAULT_MAX_CONCURRENT_QUERIES: usize = 8;

/// Query service failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("fee query for '{protocol}' on {date} failed: {source}")]
    Source {
        protocol: ProtocolId,
        date: DateKey,
        #[source]
        source: SourceError,
    },

    #[error("batch fetch was rejected by the query service")]
    Rejected,
}

/// Batch request: the dates each protocol is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingDatesRequest {
    /// The primary protocol of the view that triggered the fetch.
    pub protocol_id: ProtocolId,
    pub missing_dates_by_protocol: BTreeMap<ProtocolId, Vec<DateKey>>,
}

impl MissingDatesRequest {
    pub fn total_dates(&self) -> usize {
        self.missing_dates_by_protocol.values().map(Vec::len).sum()
    }
}

/// Fee records for one protocol inside a [`BatchResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolFees {
    pub id: ProtocolId,
    pub data: Vec<FeeRecord>,
}

/// Batch response, `{ success, data: [{ id, data }] }` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub success: bool,
    pub data: Vec<ProtocolFees>,
}

impl BatchResponse {
    pub fn succeeded(data: Vec<ProtocolFees>) -> Self {
        Self {
            success: true,
            data,
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            data: Vec::new(),
        }
    }
}

/// Listing row: last complete day and its trailing weekly average.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtocolSummary {
    pub id: ProtocolId,
    pub metadata: ProtocolMetadata,
    pub date: DateKey,
    pub one_day: f64,
    pub seven_day_ma: f64,
}

/// A protocol left out of a [`SummaryReport`] because its query failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedProtocol {
    pub id: ProtocolId,
    pub error: String,
}

/// Every registered protocol's summary, highest one-day fee first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub date: DateKey,
    pub protocols: Vec<ProtocolSummary>,
    pub failed: Vec<FailedProtocol>,
}

/// Resolves fee records for protocol/date pairs through the adapter registry.
#[derive(Debug, Clone)]
pub struct DateRangeService {
    registry: Arc<AdapterRegistry>,
    max_concurrent_queries: usize,
}

impl DateRangeService {
    pub fn new(registry: Arc<AdapterRegistry>) -> Self {
        Self {
            registry,
            max_concurrent_queries: DEFAULT_MAX_CONCURRENT_QUERIES,
        }
    }

    /// Bound on adapter calls in flight per protocol; values below 1 mean 1.
    pub fn with_max_concurrent_queries(mut self, max_concurrent_queries: usize) -> Self {
        self.max_concurrent_queries = max_concurrent_queries.max(1);
        self
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// One record per day in `[start, end]`, ascending.
    ///
    /// # Errors
    ///
    /// - [`QueryError::Validation`] when `start > end`
    /// - [`QueryError::Registry`] when `id` is unknown
    /// - [`QueryError::Source`] for the first day whose adapter call fails
    pub async fn get_date_range_data(
        &self,
        id: &ProtocolId,
        start: DateKey,
        end: DateKey,
    ) -> Result<Vec<FeeRecord>, QueryError> {
        let window = Window::new(start, end)?;
        let registration = self.registry.lookup(id)?;
        self.fetch_days(registration, window.days()).await
    }

    /// Resolve every listed date of every listed protocol.
    ///
    /// Dates keep the order they were given in. The first failure fails the
    /// whole batch.
    pub async fn get_missing_dates(
        &self,
        request: MissingDatesRequest,
    ) -> Result<BatchResponse, QueryError> {
        debug!(
            primary = %request.protocol_id,
            protocols = request.missing_dates_by_protocol.len(),
            dates = request.total_dates(),
            "resolving missing dates"
        );

        let mut data = Vec::with_capacity(request.missing_dates_by_protocol.len());
        for (id, dates) in request.missing_dates_by_protocol {
            let registration = self.registry.lookup(&id)?;
            let records = self.fetch_days(registration, dates).await?;
            data.push(ProtocolFees { id, data: records });
        }

        Ok(BatchResponse::succeeded(data))
    }

    /// A store holding `window` for `id`, used to seed a cache.
    pub async fn snapshot(&self, id: &ProtocolId, window: Window) -> Result<FeeStore, QueryError> {
        let records = self
            .get_date_range_data(id, window.start(), window.end())
            .await?;
        let mut store = FeeStore::new();
        store.merge(id, records);
        Ok(store)
    }

    /// Fee of the day before `today` and the average of the seven days ending there.
    pub async fn get_summary(
        &self,
        id: &ProtocolId,
        today: DateKey,
    ) -> Result<ProtocolSummary, QueryError> {
        let last_day = today.previous().ok_or(ValidationError::DateOutOfRange)?;
        let window = Window::trailing(last_day, SUMMARY_AVERAGE_DAYS)?;
        let metadata = self.registry.metadata(id)?.clone();
        let records = self
            .get_date_range_data(id, window.start(), window.end())
            .await?;

        let one_day = records.last().map_or(0.0, |record| record.fee);
        let seven_day_ma =
            records.iter().map(|record| record.fee).sum::<f64>() / records.len().max(1) as f64;

        Ok(ProtocolSummary {
            id: id.clone(),
            metadata,
            date: last_day,
            one_day,
            seven_day_ma,
        })
    }

    /// Summaries for every registered protocol.
    ///
    /// A failing protocol lands in `failed` instead of aborting the report.
    pub async fn get_summaries(&self, today: DateKey) -> Result<SummaryReport, QueryError> {
        let last_day = today.previous().ok_or(ValidationError::DateOutOfRange)?;
        let ids = self.registry.list_ids();
        let results = join_all(ids.iter().map(|id| self.get_summary(id, today))).await;

        let mut protocols = Vec::with_capacity(ids.len());
        let mut failed = Vec::new();
        for (id, result) in ids.into_iter().zip(results) {
            match result {
                Ok(summary) => protocols.push(summary),
                Err(error) => {
                    warn!(protocol = %id, %error, "summary query failed");
                    failed.push(FailedProtocol {
                        id,
                        error: error.to_string(),
                    });
                }
            }
        }

        protocols.sort_by(|left, right| {
            right
                .one_day
                .total_cmp(&left.one_day)
                .then_with(|| left.id.cmp(&right.id))
        });

        Ok(SummaryReport {
            date: last_day,
            protocols,
            failed,
        })
    }

    async fn fetch_days<I>(
        &self,
        registration: &ProtocolRegistration,
        dates: I,
    ) -> Result<Vec<FeeRecord>, QueryError>
    where
        I: IntoIterator<Item = DateKey>,
    {
        let adapter = registration.adapter.as_ref();
        let protocol = &registration.id;

        stream::iter(dates)
            .map(|date| async move {
                let fee = adapter
                    .query(FEE_ATTRIBUTE, date)
                    .await
                    .map_err(|source| QueryError::Source {
                        protocol: protocol.clone(),
                        date,
                        source,
                    })?;
                FeeRecord::new(date, fee).map_err(|error| QueryError::Source {
                    protocol: protocol.clone(),
                    date,
                    source: SourceError::invalid_response(error.to_string()),
                })
            })
            .buffered(self.max_concurrent_queries.max(1))
            .try_collect()
            .await
    }
}

impl FeeFetcher for DateRangeService {
    fn fetch_missing<'a>(&'a self, request: MissingDatesRequest) -> FetchFuture<'a> {
        Box::pin(self.get_missing_dates(request))
    }
}
