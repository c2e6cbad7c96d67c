use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::validated_fee;
use crate::adapter::{require_fee_attribute, FeeAdapter, QueryFuture, SourceError};
use crate::registry::Registrar;
use crate::subgraph::{parse_decimal, SubgraphClient};
use crate::{CoreError, DateKey, ProtocolCategory, ProtocolMetadata};

const BLOCK_AT_QUERY: &str = r#"query blockAt($timestamp: BigInt!) {
  blocks(first: 1, orderBy: timestamp, orderDirection: asc, where: { timestamp_gte: $timestamp }) { number }
}"#;

const SWAP_FEES_QUERY: &str = r#"query swapFees($block: Int!) {
  balancer(id: "1", block: { number: $block }) { totalSwapFee }
}"#;

/// Balancer fees from the cumulative `totalSwapFee` counter.
///
/// A day's fee is the counter at the first block of the next day minus the
/// counter at the first block of the day, with block numbers resolved through
/// an Ethereum blocks subgraph.
pub struct BalancerAdapter {
    client: Arc<SubgraphClient>,
    endpoint: String,
    blocks_endpoint: String,
}

impl BalancerAdapter {
    pub fn new(
        client: Arc<SubgraphClient>,
        endpoint: impl Into<String>,
        blocks_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            blocks_endpoint: blocks_endpoint.into(),
        }
    }

    async fn block_at(&self, timestamp: i64) -> Result<u64, SourceError> {
        let response: BlocksResponse = self
            .client
            .query(
                &self.blocks_endpoint,
                BLOCK_AT_QUERY,
                json!({ "timestamp": timestamp.to_string() }),
            )
            .await?;

        let block = response.blocks.first().ok_or_else(|| {
            SourceError::upstream_fetch(format!("no block indexed at or after timestamp {timestamp}"))
        })?;
        block.number.trim().parse::<u64>().map_err(|_| {
            SourceError::invalid_response(format!("block number is not an integer: '{}'", block.number))
        })
    }

    async fn total_swap_fee(&self, block: u64) -> Result<f64, SourceError> {
        let response: SwapFeesResponse = self
            .client
            .query(&self.endpoint, SWAP_FEES_QUERY, json!({ "block": block }))
            .await?;

        let balancer = response.balancer.ok_or_else(|| {
            SourceError::invalid_response(format!("balancer factory not indexed at block {block}"))
        })?;
        parse_decimal("totalSwapFee", &balancer.total_swap_fee)
    }
}

impl FeeAdapter for BalancerAdapter {
    fn query<'a>(&'a self, attribute: &'a str, date: DateKey) -> QueryFuture<'a> {
        Box::pin(async move {
            require_fee_attribute(attribute)?;

            let start_block = self.block_at(date.start_timestamp()).await?;
            let end_block = self.block_at(date.end_timestamp()).await?;
            let start_fees = self.total_swap_fee(start_block).await?;
            let end_fees = self.total_swap_fee(end_block).await?;
            debug!(%date, start_block, end_block, start_fees, end_fees, "balancer swap fee counters");

            if end_fees < start_fees {
                return Err(SourceError::invalid_response(format!(
                    "balancer totalSwapFee decreased between blocks {start_block} and {end_block}"
                )));
            }
            validated_fee(end_fees - start_fees)
        })
    }
}

#[derive(Debug, Deserialize)]
struct BlocksResponse {
    blocks: Vec<BlockRow>,
}

#[derive(Debug, Deserialize)]
struct BlockRow {
    number: String,
}

#[derive(Debug, Deserialize)]
struct SwapFeesResponse {
    balancer: Option<SwapFeeCounter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapFeeCounter {
    total_swap_fee: String,
}

/// Registers `balancer`.
pub fn register(registrar: &mut Registrar<'_>) -> Result<(), CoreError> {
    let settings = registrar.settings();
    let adapter = BalancerAdapter::new(
        registrar.subgraph_client(),
        settings.endpoints.balancer.clone(),
        settings.endpoints.ethereum_blocks.clone(),
    );

    registrar.register(
        "balancer",
        Arc::new(adapter),
        ProtocolMetadata::new("Balancer", ProtocolCategory::Dex)?
            .with_description("Balancer is an automated portfolio manager and trading platform.")
            .with_website("https://balancer.finance")
            .with_source(settings.endpoints.balancer.clone())
            .with_token("BAL")
            .with_blockchain("Ethereum"),
    )
}
