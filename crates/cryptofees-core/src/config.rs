//! Adapter settings resolved from the environment.
//!
//! # Environment Variables
//!
//! | Setting | Variable | Default |
//! |---------|----------|---------|
//! | Uniswap v2 subgraph | `CRYPTOFEES_UNISWAP_V2_SUBGRAPH` | thegraph hosted `uniswap/uniswap-v2` |
//! | Sushiswap subgraph | `CRYPTOFEES_SUSHISWAP_SUBGRAPH` | thegraph hosted `sushiswap/exchange` |
//! | Sushiswap excluded pairs | `CRYPTOFEES_SUSHISWAP_BLACKLIST` | none (comma separated addresses) |
//! | Honeyswap subgraph | `CRYPTOFEES_HONEYSWAP_SUBGRAPH` | thegraph hosted `1hive/honeyswap-xdai` |
//! | Balancer subgraph | `CRYPTOFEES_BALANCER_SUBGRAPH` | thegraph hosted `balancer-labs/balancer` |
//! | Ethereum blocks subgraph | `CRYPTOFEES_BLOCKS_SUBGRAPH` | thegraph hosted `blocklytics/ethereum-blocks` |
//! | CoinMetrics API base | `CRYPTOFEES_COINMETRICS_URL` | community API v4 |
//! | CoinMetrics API key | `CRYPTOFEES_COINMETRICS_API_KEY` | none |
//! | Request timeout (ms) | `CRYPTOFEES_TIMEOUT_MS` | `10000` |
//! | Retries per call | `CRYPTOFEES_MAX_RETRIES` | `2` |
//! | Upstream requests per second | `CRYPTOFEES_REQUESTS_PER_SECOND` | `10` |
//! | Concurrent day queries | `CRYPTOFEES_MAX_CONCURRENT_QUERIES` | `8` |

use std::env;
use std::str::FromStr;

use crate::retry::RetryPolicy;

const DEFAULT_UNISWAP_V2: &str = "https://api.thegraph.com/subgraphs/name/uniswap/uniswap-v2";
const DEFAULT_SUSHISWAP: &str = "https://api.thegraph.com/subgraphs/name/sushiswap/exchange";
const DEFAULT_HONEYSWAP: &str = "https://api.thegraph.com/subgraphs/name/1hive/honeyswap-xdai";
const DEFAULT_BALANCER: &str = "https://api.thegraph.com/subgraphs/name/balancer-labs/balancer";
const DEFAULT_BLOCKS: &str =
    "https://api.thegraph.com/subgraphs/name/blocklytics/ethereum-blocks";
const DEFAULT_COINMETRICS: &str = "https://community-api.coinmetrics.io/v4";

/// Upstream base URLs, one per data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub uniswap_v2: String,
    pub sushiswap: String,
    pub honeyswap: String,
    pub balancer: String,
    pub ethereum_blocks: String,
    pub coinmetrics: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            uniswap_v2: String::from(DEFAULT_UNISWAP_V2),
            sushiswap: String::from(DEFAULT_SUSHISWAP),
            honeyswap: String::from(DEFAULT_HONEYSWAP),
            balancer: String::from(DEFAULT_BALANCER),
            ethereum_blocks: String::from(DEFAULT_BLOCKS),
            coinmetrics: String::from(DEFAULT_COINMETRICS),
        }
    }
}

/// Everything the adapter modules need at registration time.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterSettings {
    pub endpoints: Endpoints,
    pub coinmetrics_api_key: Option<String>,
    /// Lowercase pair addresses whose volume is excluded from Sushiswap fees.
    pub sushiswap_blacklist: Vec<String>,
    pub timeout_ms: u64,
    pub retry: RetryPolicy,
    /// Request budget shared by every adapter's upstream calls.
    pub requests_per_second: u32,
    pub max_concurrent_queries: usize,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            coinmetrics_api_key: None,
            sushiswap_blacklist: Vec::new(),
            timeout_ms: 10_000,
            retry: RetryPolicy::default(),
            requests_per_second: 10,
            max_concurrent_queries: 8,
        }
    }
}

impl AdapterSettings {
    /// Defaults overlaid with any `CRYPTOFEES_*` variables that are set.
    ///
    /// Unparseable numeric values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let endpoints = Endpoints {
            uniswap_v2: env_string("CRYPTOFEES_UNISWAP_V2_SUBGRAPH")
                .unwrap_or(defaults.endpoints.uniswap_v2),
            sushiswap: env_string("CRYPTOFEES_SUSHISWAP_SUBGRAPH")
                .unwrap_or(defaults.endpoints.sushiswap),
            honeyswap: env_string("CRYPTOFEES_HONEYSWAP_SUBGRAPH")
                .unwrap_or(defaults.endpoints.honeyswap),
            balancer: env_string("CRYPTOFEES_BALANCER_SUBGRAPH")
                .unwrap_or(defaults.endpoints.balancer),
            ethereum_blocks: env_string("CRYPTOFEES_BLOCKS_SUBGRAPH")
                .unwrap_or(defaults.endpoints.ethereum_blocks),
            coinmetrics: env_string("CRYPTOFEES_COINMETRICS_URL")
                .unwrap_or(defaults.endpoints.coinmetrics),
        };

        let retry = env_parse::<u32>("CRYPTOFEES_MAX_RETRIES")
            .map(RetryPolicy::with_max_retries)
            .unwrap_or(defaults.retry);

        let settings = Self {
            endpoints,
            coinmetrics_api_key: env_string("CRYPTOFEES_COINMETRICS_API_KEY"),
            sushiswap_blacklist: Vec::new(),
            timeout_ms: env_parse("CRYPTOFEES_TIMEOUT_MS").unwrap_or(defaults.timeout_ms),
            retry,
            requests_per_second: env_parse("CRYPTOFEES_REQUESTS_PER_SECOND")
                .unwrap_or(defaults.requests_per_second),
            max_concurrent_queries: env_parse("CRYPTOFEES_MAX_CONCURRENT_QUERIES")
                .unwrap_or(defaults.max_concurrent_queries),
        };

        match env_string("CRYPTOFEES_SUSHISWAP_BLACKLIST") {
            Some(value) => settings.with_sushiswap_blacklist(value.split(',')),
            None => settings,
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_coinmetrics_api_key(mut self, key: impl Into<String>) -> Self {
        self.coinmetrics_api_key = Some(key.into());
        self
    }

    pub fn with_sushiswap_blacklist<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.sushiswap_blacklist = addresses
            .into_iter()
            .map(|address| address.as_ref().trim().to_ascii_lowercase())
            .filter(|address| !address.is_empty())
            .collect();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_requests_per_second(mut self, requests_per_second: u32) -> Self {
        self.requests_per_second = requests_per_second;
        self
    }

    pub fn with_max_concurrent_queries(mut self, max_concurrent_queries: usize) -> Self {
        self.max_concurrent_queries = max_concurrent_queries;
        self
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_list_is_trimmed_lowercased_and_compacted() {
        let settings = AdapterSettings::default().with_sushiswap_blacklist(" 0xAbC , ,0xdef".split(','));
        assert_eq!(
            settings.sushiswap_blacklist,
            vec![String::from("0xabc"), String::from("0xdef")]
        );
    }

    #[test]
    fn builder_overrides_defaults() {
        let settings = AdapterSettings::default()
            .with_timeout_ms(500)
            .with_max_concurrent_queries(2)
            .with_sushiswap_blacklist(["0xAA", ""]);

        assert_eq!(settings.timeout_ms, 500);
        assert_eq!(settings.max_concurrent_queries, 2);
        assert_eq!(settings.sushiswap_blacklist, vec![String::from("0xaa")]);
        assert_eq!(settings.endpoints, Endpoints::default());
    }
}
