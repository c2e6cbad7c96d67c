mod chart;
mod fees;
mod protocols;
mod summary;

use std::sync::Arc;

use cryptofees_core::{AdapterRegistry, AdapterSettings, DateRangeService, ReqwestHttpClient};
use serde_json::Value;
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output::Table;

pub struct CommandResult {
    pub data: Value,
    pub table: Table,
    pub warnings: Vec<String>,
}

impl CommandResult {
    pub fn ok(data: Value, table: Table) -> Self {
        Self {
            data,
            table,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    let settings = settings_for(cli);
    debug!(
        timeout_ms = settings.timeout_ms,
        concurrency = settings.max_concurrent_queries,
        "resolved adapter settings"
    );

    let registry = AdapterRegistry::bootstrap(&settings, Arc::new(ReqwestHttpClient::new()))?;
    let service = DateRangeService::new(Arc::new(registry))
        .with_max_concurrent_queries(settings.max_concurrent_queries);

    match &cli.command {
        Command::Protocols => protocols::run(service.registry()),
        Command::Fees(args) => fees::run(args, &service).await,
        Command::Summary(args) => summary::run(args, &service).await,
        Command::Chart(args) => chart::run(args, &service).await,
    }
}

fn settings_for(cli: &Cli) -> AdapterSettings {
    let mut settings = AdapterSettings::from_env();
    if let Some(timeout_ms) = cli.timeout_ms {
        settings = settings.with_timeout_ms(timeout_ms);
    }
    if let Some(concurrency) = cli.concurrency {
        settings = settings.with_max_concurrent_queries(concurrency);
    }
    settings
}

/// Two decimals, the precision the tables show USD amounts with.
fn usd(value: f64) -> String {
    format!("{value:.2}")
}
