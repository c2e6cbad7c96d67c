use cryptofees_core::{DateKey, DateRangeService, FeeRecord, ProtocolId};
use serde::Serialize;

use crate::cli::FeesArgs;
use crate::error::CliError;
use crate::output::Table;

use super::{usd, CommandResult};

#[derive(Debug, Serialize)]
struct FeesResponseData {
    protocol: ProtocolId,
    start: DateKey,
    end: DateKey,
    total: f64,
    records: Vec<FeeRecord>,
}

pub async fn run(args: &FeesArgs, service: &DateRangeService) -> Result<CommandResult, CliError> {
    let protocol = ProtocolId::parse(&args.protocol)?;
    let start = DateKey::parse(&args.start)?;
    let end = DateKey::parse(&args.end)?;

    let records = service.get_date_range_data(&protocol, start, end).await?;

    let mut table = Table::new(vec!["date", "fee_usd"]);
    for record in &records {
        table.push_row(vec![record.date.to_string(), usd(record.fee)]);
    }

    let data = serde_json::to_value(FeesResponseData {
        protocol,
        start,
        end,
        total: records.iter().map(|record| record.fee).sum(),
        records,
    })?;
    Ok(CommandResult::ok(data, table))
}
