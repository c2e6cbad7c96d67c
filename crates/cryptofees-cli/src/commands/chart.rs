use cryptofees_core::{
    ChartRequest, DateKey, DateRangeService, FeeCache, ProtocolId, SeriesPoint, ValidationError,
    Window,
};
use serde::Serialize;

use crate::cli::ChartArgs;
use crate::error::CliError;
use crate::output::Table;

use super::{usd, CommandResult};

const DEFAULT_DAYS: u32 = 90;

#[derive(Debug, Serialize)]
struct ChartResponseData<'a> {
    primary: &'a ProtocolId,
    secondary: Option<&'a ProtocolId>,
    smoothing: u32,
    window: Window,
    cached_days: usize,
    points: &'a [SeriesPoint],
}

pub async fn run(args: &ChartArgs, service: &DateRangeService) -> Result<CommandResult, CliError> {
    let mut request = ChartRequest::new(window_for(args)?, ProtocolId::parse(&args.primary)?)
        .with_smoothing(args.smoothing);
    if let Some(secondary) = &args.secondary {
        request = request.with_secondary(ProtocolId::parse(secondary)?);
    }

    let mut cache = FeeCache::new();
    cache.recompute(request.clone(), service).await?;
    let points = cache.series();

    let mut table = Table::new(vec!["date", "primary_usd", "secondary_usd"]);
    for point in points {
        let day = DateKey::from_unix_timestamp(point.timestamp)?;
        table.push_row(vec![day.to_string(), usd(point.primary), usd(point.secondary)]);
    }

    let data = serde_json::to_value(ChartResponseData {
        primary: &request.primary,
        secondary: request.secondary.as_ref(),
        smoothing: request.smoothing,
        window: request.window,
        cached_days: cache.store().len(),
        points,
    })?;
    Ok(CommandResult::ok(data, table))
}

fn window_for(args: &ChartArgs) -> Result<Window, CliError> {
    match (&args.start, &args.end) {
        (Some(start), Some(end)) => Ok(Window::new(DateKey::parse(start)?, DateKey::parse(end)?)?),
        (None, None) => {
            let yesterday = DateKey::today()
                .previous()
                .ok_or(ValidationError::DateOutOfRange)?;
            Ok(Window::trailing(yesterday, args.days.unwrap_or(DEFAULT_DAYS))?)
        }
        _ => Err(CliError::Command(String::from(
            "--start and --end must be given together",
        ))),
    }
}
