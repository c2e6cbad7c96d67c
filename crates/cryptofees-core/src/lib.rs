//! # Cryptofees Core
//!
//! Daily protocol fee aggregation with an incremental client-side cache.
//!
//! ## Overview
//!
//! - **Adapters** turn one upstream (a subgraph or a metrics API) into a daily
//!   USD fee for one protocol
//! - **Registry** maps protocol ids to adapters, built once at startup
//! - **Query service** resolves date ranges and batches of missing days
//! - **Fee cache** fetches only the days a chart does not have yet and derives
//!   the smoothed primary/secondary series
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapter`] | `FeeAdapter` trait and `SourceError` |
//! | [`adapters`] | CoinMetrics, Uniswap-style DEX and Balancer adapters |
//! | [`cache`] | `FeeStore`, `FeeCache` and series derivation |
//! | [`config`] | `AdapterSettings` from `CRYPTOFEES_*` environment variables |
//! | [`domain`] | `ProtocolId`, `DateKey`, `Window`, `FeeRecord` |
//! | [`error`] | Core error types |
//! | [`http_client`] | HTTP client abstraction |
//! | [`query_service`] | `DateRangeService` and batch wire types |
//! | [`registry`] | `AdapterRegistry` and the adapter `Registrar` |
//! | [`retry`] | Retry policy with jittered backoff |
//! | [`subgraph`] | GraphQL client for The Graph subgraphs |
//! | [`throttling`] | Request budget shared by all adapters |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │  FeeCache       │────▶│ DateRangeService │
//! └─────────────────┘     └────────┬─────────┘
//!                                  │
//!                                  ▼
//!                         ┌──────────────────┐
//!                         │ AdapterRegistry  │
//!                         └────────┬─────────┘
//!                                  │
//!                                  ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ SubgraphClient  │◀────│ FeeAdapter impls │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       │
//!          ▼                       ▼
//! ┌──────────────────────────────────────────┐
//! │ HttpClient (reqwest)                     │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cryptofees_core::{
//!     AdapterRegistry, AdapterSettings, ChartRequest, DateKey, DateRangeService, FeeCache,
//!     ProtocolId, ReqwestHttpClient, Window,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = AdapterSettings::from_env();
//!     let registry = AdapterRegistry::bootstrap(&settings, Arc::new(ReqwestHttpClient::new()))?;
//!     let service = DateRangeService::new(Arc::new(registry));
//!
//!     let window = Window::trailing(DateKey::today().previous().unwrap(), 30)?;
//!     let request = ChartRequest::new(window, ProtocolId::parse("ethereum")?).with_smoothing(6);
//!
//!     let mut cache = FeeCache::new();
//!     for point in cache.recompute(request, &service).await? {
//!         println!("{} {:.2}", point.timestamp, point.primary);
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod adapters;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod query_service;
pub mod registry;
pub mod retry;
pub mod subgraph;
pub mod throttling;

// Adapter contract
pub use adapter::{FeeAdapter, QueryFuture, SourceError, SourceErrorKind, FEE_ATTRIBUTE};

// Adapter implementations
pub use adapters::{BalancerAdapter, CoinMetricsAdapter, DexVolumeAdapter, EmptyDayPolicy};

// Cache
pub use cache::{
    derive_series, ChartRequest, Completion, FeeCache, FeeCacheError, FeeFetcher, FeeStore,
    FetchFuture, FetchTicket, Plan,
};

// Configuration
pub use config::{AdapterSettings, Endpoints};

// Domain models
pub use domain::{
    DateKey, DaySequence, FeeRecord, ProtocolCategory, ProtocolId, ProtocolMetadata, SeriesPoint,
    Window, SECONDS_PER_DAY,
};

// Error types
pub use error::{CoreError, ValidationError};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpFuture, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};

// Query service
pub use query_service::{
    BatchResponse, DateRangeService, FailedProtocol, MissingDatesRequest, ProtocolFees,
    ProtocolSummary, QueryError, SummaryReport, SUMMARY_AVERAGE_DAYS,
};

// Registry
pub use registry::{AdapterRegistry, ProtocolRegistration, Registrar, RegistryError};

// Retry
pub use retry::{retry_with, send_once, send_with_retry, RetryPolicy};

// Subgraph transport
pub use subgraph::SubgraphClient;
pub use throttling::RequestThrottle;
