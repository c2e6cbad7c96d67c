//! Per-protocol fee adapters.
//!
//! | Module | Protocols | Upstream |
//! |--------|-----------|----------|
//! | [`coinmetrics`] | `ethereum`, `bitcoin` | CoinMetrics `FeeTotUSD` |
//! | [`dex`] | `uniswap-v2`, `sushiswap`, `honeyswap` | Uniswap-style day volume subgraphs |
//! | [`balancer`] | `balancer` | Balancer + Ethereum blocks subgraphs |
//!
//! Each module exposes one `register` entry point, listed in
//! [`ADAPTER_MODULES`] and run once by [`AdapterRegistry::bootstrap`].
//!
//! [`AdapterRegistry::bootstrap`]: crate::AdapterRegistry::bootstrap

pub mod balancer;
pub mod coinmetrics;
pub mod dex;

pub use balancer::BalancerAdapter;
pub use coinmetrics::CoinMetricsAdapter;
pub use dex::{DexVolumeAdapter, EmptyDayPolicy};

use crate::adapter::SourceError;
use crate::domain::validate_non_negative;
use crate::registry::Registrar;
use crate::CoreError;

/// Signature of an adapter module's registration entry point.
pub type RegisterFn = fn(&mut Registrar<'_>) -> Result<(), CoreError>;

/// Every adapter module, in registration order.
pub const ADAPTER_MODULES: &[RegisterFn] =
    &[coinmetrics::register, dex::register, balancer::register];

/// Final guard on a computed fee before it leaves an adapter.
fn validated_fee(value: f64) -> Result<f64, SourceError> {
    validate_non_negative("fee", value)
        .map(|()| value)
        .map_err(|error| SourceError::invalid_response(error.to_string()))
}
