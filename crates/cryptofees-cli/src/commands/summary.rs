use cryptofees_core::{DateKey, DateRangeService};

use crate::cli::SummaryArgs;
use crate::error::CliError;
use crate::output::Table;

use super::{usd, CommandResult};

pub async fn run(
    args: &SummaryArgs,
    service: &DateRangeService,
) -> Result<CommandResult, CliError> {
    let today = match &args.date {
        Some(raw) => DateKey::parse(raw)?,
        None => DateKey::today(),
    };

    let report = service.get_summaries(today).await?;

    let mut table = Table::new(vec!["id", "name", "category", "one_day_usd", "seven_day_ma_usd"]);
    for summary in &report.protocols {
        table.push_row(vec![
            summary.id.to_string(),
            summary.metadata.name.clone(),
            summary.metadata.category.to_string(),
            usd(summary.one_day),
            usd(summary.seven_day_ma),
        ]);
    }

    let warnings = report
        .failed
        .iter()
        .map(|failed| format!("{} left out of summary: {}", failed.id, failed.error))
        .collect();

    let data = serde_json::to_value(&report)?;
    Ok(CommandResult::ok(data, table).with_warnings(warnings))
}
