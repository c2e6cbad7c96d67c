use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::validated_fee;
use crate::adapter::{require_fee_attribute, FeeAdapter, QueryFuture, SourceError};
use crate::registry::Registrar;
use crate::subgraph::{parse_decimal, SubgraphClient};
use crate::{CoreError, DateKey, ProtocolCategory, ProtocolMetadata};

/// Swap fee charged by Uniswap v2 and its forks (0.3%).
pub const UNISWAP_FEE_RATE: f64 = 0.003;

const DAY_VOLUME_QUERY: &str = r#"query dayVolume($date: Int!) {
  uniswapDayDatas(where: { date: $date }) { date dailyVolumeUSD }
}"#;

const DAY_VOLUME_EXCLUDING_PAIRS_QUERY: &str = r#"query dayVolume($date: Int!, $pairs: [Bytes!]!) {
  uniswapDayDatas(where: { date: $date }) { date dailyVolumeUSD }
  pairDayDatas(where: { date: $date, pairAddress_in: $pairs }) { pairAddress dailyVolumeUSD }
}"#;

/// What to report when the subgraph has no day entity for the requested date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyDayPolicy {
    /// Missing day data is an invalid response.
    Reject,
    /// Missing day data means no trading: fee 0. For young chains whose
    /// subgraph history does not reach back as far as the chart.
    Zero,
}

/// Fees for a Uniswap-style DEX: daily USD volume times the swap fee rate,
/// minus the volume of any excluded pairs.
pub struct DexVolumeAdapter {
    client: Arc<SubgraphClient>,
    endpoint: String,
    fee_rate: f64,
    excluded_pairs: Vec<String>,
    empty_day: EmptyDayPolicy,
}

impl DexVolumeAdapter {
    pub fn new(client: Arc<SubgraphClient>, endpoint: impl Into<String>, fee_rate: f64) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            fee_rate,
            excluded_pairs: Vec::new(),
            empty_day: EmptyDayPolicy::Reject,
        }
    }

    /// Pair addresses whose volume is subtracted before the fee rate is applied.
    pub fn with_excluded_pairs(mut self, pairs: Vec<String>) -> Self {
        self.excluded_pairs = pairs;
        self
    }

    pub fn with_empty_day_policy(mut self, policy: EmptyDayPolicy) -> Self {
        self.empty_day = policy;
        self
    }

    async fn fetch_day(&self, date: DateKey) -> Result<DayVolumeResponse, SourceError> {
        let timestamp = date.start_timestamp();
        if self.excluded_pairs.is_empty() {
            self.client
                .query(&self.endpoint, DAY_VOLUME_QUERY, json!({ "date": timestamp }))
                .await
        } else {
            self.client
                .query(
                    &self.endpoint,
                    DAY_VOLUME_EXCLUDING_PAIRS_QUERY,
                    json!({ "date": timestamp, "pairs": self.excluded_pairs }),
                )
                .await
        }
    }
}

impl FeeAdapter for DexVolumeAdapter {
    fn query<'a>(&'a self, attribute: &'a str, date: DateKey) -> QueryFuture<'a> {
        Box::pin(async move {
            require_fee_attribute(attribute)?;

            let response = self.fetch_day(date).await?;
            let Some(day) = response.uniswap_day_datas.first() else {
                return match self.empty_day {
                    EmptyDayPolicy::Zero => {
                        debug!(endpoint = %self.endpoint, %date, "no day data, reporting zero fees");
                        Ok(0.0)
                    }
                    EmptyDayPolicy::Reject => Err(SourceError::invalid_response(format!(
                        "no day data indexed for {date} at {}",
                        self.endpoint
                    ))),
                };
            };

            let volume = parse_decimal("dailyVolumeUSD", &day.daily_volume_usd)?;
            let excluded = response
                .pair_day_datas
                .iter()
                .map(|pair| parse_decimal("dailyVolumeUSD", &pair.daily_volume_usd))
                .sum::<Result<f64, _>>()?;

            validated_fee((volume - excluded).max(0.0) * self.fee_rate)
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DayVolumeResponse {
    uniswap_day_datas: Vec<VolumeRow>,
    #[serde(default)]
    pair_day_datas: Vec<VolumeRow>,
}

#[derive(Debug, Deserialize)]
struct VolumeRow {
    #[serde(rename = "dailyVolumeUSD")]
    daily_volume_usd: String,
}

/// Registers `uniswap-v2`, `sushiswap` and `honeyswap`.
pub fn register(registrar: &mut Registrar<'_>) -> Result<(), CoreError> {
    let settings = registrar.settings();
    let client = registrar.subgraph_client();

    registrar.register(
        "uniswap-v2",
        Arc::new(DexVolumeAdapter::new(
            Arc::clone(&client),
            settings.endpoints.uniswap_v2.clone(),
            UNISWAP_FEE_RATE,
        )),
        ProtocolMetadata::new("Uniswap V2", ProtocolCategory::Dex)?
            .with_description("Uniswap is a decentralized exchange for swapping ERC-20 tokens.")
            .with_website("https://uniswap.org")
            .with_source(settings.endpoints.uniswap_v2.clone())
            .with_token("UNI")
            .with_blockchain("Ethereum"),
    )?;

    registrar.register(
        "sushiswap",
        Arc::new(
            DexVolumeAdapter::new(
                Arc::clone(&client),
                settings.endpoints.sushiswap.clone(),
                UNISWAP_FEE_RATE,
            )
            .with_excluded_pairs(settings.sushiswap_blacklist.clone()),
        ),
        ProtocolMetadata::new("SushiSwap", ProtocolCategory::Dex)?
            .with_description("SushiSwap is a community-run fork of Uniswap.")
            .with_website("https://sushi.com")
            .with_source(settings.endpoints.sushiswap.clone())
            .with_token("SUSHI")
            .with_blockchain("Ethereum"),
    )?;

    registrar.register(
        "honeyswap",
        Arc::new(
            DexVolumeAdapter::new(client, settings.endpoints.honeyswap.clone(), UNISWAP_FEE_RATE)
                .with_empty_day_policy(EmptyDayPolicy::Zero),
        ),
        ProtocolMetadata::new("Honeyswap", ProtocolCategory::Dex)?
            .with_description(
                "Honeyswap is a Uniswap fork on xDai. Days before its subgraph history count as zero.",
            )
            .with_website("https://honeyswap.org")
            .with_source(settings.endpoints.honeyswap.clone())
            .with_token("HNY")
            .with_blockchain("xDai"),
    )?;

    Ok(())
}
