//! # Incremental fee cache
//!
//! Client-side state behind a fee chart. The cache keeps every raw daily fee it
//! has seen in a [`FeeStore`], works out which days a new chart request still
//! needs, fetches only those in one batch, and derives the (optionally
//! smoothed) series from the store.
//!
//! ## Lifecycle
//!
//! ```text
//!  begin(request) ──▶ Plan::Ready(series)            nothing missing
//!        │
//!        └──────────▶ Plan::Fetch { ticket, request } loading = true
//!                           │
//!  complete(ticket, result) ┴─▶ Applied | Stale | Failed   loading = false
//! ```
//!
//! Every `begin` takes a new generation. A completion whose ticket is older
//! than the latest request is discarded without touching the store, so the
//! last requested view always wins. A failed fetch keeps the previous series.

mod series;
mod store;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tracing::{debug, info, warn};

pub use series::derive_series;
pub use store::FeeStore;

use crate::query_service::{BatchResponse, MissingDatesRequest, QueryError};
use crate::{DateKey, ProtocolId, SeriesPoint, ValidationError, Window};

/// Fee cache failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FeeCacheError {
    /// A day needed for derivation is not in the store.
    #[error("no fee stored for '{protocol}' on {date}")]
    MissingCell { protocol: ProtocolId, date: DateKey },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("fee fetch failed: {0}")]
    Fetch(#[from] QueryError),

    #[error("fee fetch was rejected by the query service")]
    Rejected,
}

/// What a chart shows: window, protocols and smoothing factor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    pub window: Window,
    pub primary: ProtocolId,
    pub secondary: Option<ProtocolId>,
    /// Number of preceding days averaged into each point.
    pub smoothing: u32,
}

impl ChartRequest {
    pub fn new(window: Window, primary: ProtocolId) -> Self {
        Self {
            window,
            primary,
            secondary: None,
            smoothing: 0,
        }
    }

    pub fn with_secondary(mut self, secondary: ProtocolId) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn with_smoothing(mut self, smoothing: u32) -> Self {
        self.smoothing = smoothing;
        self
    }

    /// The window extended back by the smoothing factor.
    pub fn fetch_window(&self) -> Result<Window, ValidationError> {
        self.window.extend_back(self.smoothing)
    }

    /// Primary first, then the secondary if it is a different protocol.
    pub fn protocols(&self) -> impl Iterator<Item = &ProtocolId> {
        std::iter::once(&self.primary).chain(
            self.secondary
                .iter()
                .filter(move |secondary| **secondary != self.primary),
        )
    }
}

/// Identifies the request a fetch was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Outcome of [`FeeCache::begin`].
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// Everything was in the store; the series is already derived.
    Ready(Vec<SeriesPoint>),
    /// Fetch `request`, then hand the result to [`FeeCache::complete`] with `ticket`.
    Fetch {
        ticket: FetchTicket,
        request: MissingDatesRequest,
    },
}

/// Outcome of [`FeeCache::complete`].
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Records were merged and the series re-derived.
    Applied { merged: usize },
    /// The ticket belonged to a superseded request; nothing changed.
    Stale,
    /// The fetch or derivation failed; the previous series is kept.
    Failed(FeeCacheError),
}

pub type FetchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<BatchResponse, QueryError>> + Send + 'a>>;

/// Anything that can resolve a batch of missing dates.
pub trait FeeFetcher: Send + Sync {
    fn fetch_missing<'a>(&'a self, request: MissingDatesRequest) -> FetchFuture<'a>;
}

/// Incremental cache for one chart view.
#[derive(Debug, Default)]
pub struct FeeCache {
    store: FeeStore,
    request: Option<ChartRequest>,
    applied: Option<ChartRequest>,
    series: Vec<SeriesPoint>,
    loading: bool,
    generation: u64,
}

impl FeeCache {
    /// Empty cache; the first request fetches everything it shows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache seeded with an initial snapshot that already covers `request`.
    ///
    /// # Errors
    ///
    /// [`FeeCacheError::MissingCell`] when the snapshot does not cover the
    /// request's extended window.
    pub fn seeded(store: FeeStore, request: ChartRequest) -> Result<Self, FeeCacheError> {
        let series = derive_series(&store, &request)?;
        Ok(Self {
            store,
            request: Some(request.clone()),
            applied: Some(request),
            series,
            loading: false,
            generation: 0,
        })
    }

    pub fn series(&self) -> &[SeriesPoint] {
        &self.series
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The latest request passed to [`FeeCache::begin`], even while its
    /// fetch is pending or after it failed.
    pub fn current_request(&self) -> Option<&ChartRequest> {
        self.request.as_ref()
    }

    /// The request that [`FeeCache::series`] was derived for.
    pub fn applied_request(&self) -> Option<&ChartRequest> {
        self.applied.as_ref()
    }

    pub fn store(&self) -> &FeeStore {
        &self.store
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start serving `request`, superseding any request still in flight.
    pub fn begin(&mut self, request: ChartRequest) -> Result<Plan, FeeCacheError> {
        let fetch_window = request.fetch_window()?;
        self.generation += 1;

        let missing_dates_by_protocol = request
            .protocols()
            .filter_map(|id| {
                let missing = self.store.missing_dates(id, fetch_window);
                (!missing.is_empty()).then(|| (id.clone(), missing))
            })
            .collect::<std::collections::BTreeMap<_, _>>();

        if missing_dates_by_protocol.is_empty() {
            let series = derive_series(&self.store, &request)?;
            debug!(
                generation = self.generation,
                points = series.len(),
                "chart served from cache"
            );
            self.series = series.clone();
            self.request = Some(request.clone());
            self.applied = Some(request);
            self.loading = false;
            return Ok(Plan::Ready(series));
        }

        let fetch = MissingDatesRequest {
            protocol_id: request.primary.clone(),
            missing_dates_by_protocol,
        };
        debug!(
            generation = self.generation,
            dates = fetch.total_dates(),
            "chart needs missing dates"
        );
        self.request = Some(request);
        self.loading = true;

        Ok(Plan::Fetch {
            ticket: FetchTicket {
                generation: self.generation,
            },
            request: fetch,
        })
    }

    /// Apply the result of the fetch issued for `ticket`.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<BatchResponse, QueryError>,
    ) -> Completion {
        if ticket.generation != self.generation {
            warn!(
                ticket = ticket.generation,
                latest = self.generation,
                "discarding response for superseded chart request"
            );
            return Completion::Stale;
        }
        self.loading = false;

        let response = match result {
            Ok(response) if response.success => response,
            Ok(_) => {
                warn!(generation = ticket.generation, "batch fetch rejected, keeping previous series");
                return Completion::Failed(FeeCacheError::Rejected);
            }
            Err(error) => {
                warn!(generation = ticket.generation, %error, "batch fetch failed, keeping previous series");
                return Completion::Failed(FeeCacheError::Fetch(error));
            }
        };

        let merged = self.store.merge_response(&response);
        info!(
            generation = ticket.generation,
            merged,
            version = self.store.version(),
            "merged fetched fees"
        );

        let Some(request) = &self.request else {
            return Completion::Applied { merged };
        };
        match derive_series(&self.store, request) {
            Ok(series) => {
                self.series = series;
                self.applied = Some(request.clone());
                Completion::Applied { merged }
            }
            Err(error) => Completion::Failed(error),
        }
    }

    /// Run both phases against `fetcher` and return the resulting series.
    ///
    /// # Errors
    ///
    /// The fetch or derivation error; the cache keeps its previous series.
    pub async fn recompute(
        &mut self,
        request: ChartRequest,
        fetcher: &dyn FeeFetcher,
    ) -> Result<&[SeriesPoint], FeeCacheError> {
        match self.begin(request)? {
            Plan::Ready(_) => {}
            Plan::Fetch { ticket, request } => {
                let result = fetcher.fetch_missing(request).await;
                if let Completion::Failed(error) = self.complete(ticket, result) {
                    return Err(error);
                }
            }
        }
        Ok(&self.series)
    }
}
