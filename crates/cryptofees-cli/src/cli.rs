//! CLI argument definitions for cryptofees.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `protocols` | List registered protocols and their metadata |
//! | `fees` | Daily fees of one protocol over a date range |
//! | `summary` | One-day fee and 7-day average for every protocol |
//! | `chart` | Smoothed primary/secondary series through the incremental cache |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--timeout-ms` | from env, else `10000` | Upstream request timeout |
//! | `--concurrency` | from env, else `8` | Day queries in flight per protocol |
//! | `--log-level` | `RUST_LOG`, else `warn` | Log filter written to stderr |
//!
//! # Examples
//!
//! ```bash
//! cryptofees protocols --format table
//! cryptofees fees uniswap-v2 --start 2020-09-01 --end 2020-09-07
//! cryptofees summary --date 2020-10-01 --format table
//! cryptofees chart uniswap-v2 --secondary sushiswap --smoothing 6 --days 30
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Daily fees paid to blockchains and DeFi protocols.
#[derive(Debug, Parser)]
#[command(
    name = "cryptofees",
    author,
    version,
    about = "Daily fees paid to blockchains and DeFi protocols",
    long_about = "cryptofees queries subgraphs and metrics APIs for the USD fees each \
protocol earned per UTC day.\n\
\n\
Use 'cryptofees <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Upstream request timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Day queries in flight per protocol.
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Log filter directive, e.g. `info` or `cryptofees_core=debug`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON object.
    Json,
    /// Aligned text table.
    Table,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List registered protocols.
    Protocols,

    /// Daily fees of one protocol over an inclusive date range.
    ///
    /// # Examples
    ///
    ///   cryptofees fees ethereum --start 2020-09-01 --end 2020-09-30
    Fees(FeesArgs),

    /// Last complete day's fee and trailing 7-day average per protocol.
    ///
    /// # Examples
    ///
    ///   cryptofees summary
    ///   cryptofees summary --date 2020-10-01 --format table
    Summary(SummaryArgs),

    /// Chart series for a primary and optional secondary protocol.
    ///
    /// # Examples
    ///
    ///   cryptofees chart ethereum --days 90
    ///   cryptofees chart uniswap-v2 --secondary sushiswap --smoothing 6 \
    ///     --start 2020-09-01 --end 2020-09-30
    Chart(ChartArgs),
}

#[derive(Debug, Clone, Args)]
pub struct FeesArgs {
    /// Protocol id, e.g. `uniswap-v2`.
    pub protocol: String,

    /// First day, `YYYY-MM-DD`.
    #[arg(long)]
    pub start: String,

    /// Last day, `YYYY-MM-DD`.
    #[arg(long)]
    pub end: String,
}

#[derive(Debug, Clone, Args)]
pub struct SummaryArgs {
    /// Reference day; the summary covers the day before it. Defaults to today (UTC).
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ChartArgs {
    /// Primary protocol id.
    pub primary: String,

    /// Secondary protocol id plotted alongside the primary.
    #[arg(long)]
    pub secondary: Option<String>,

    /// Preceding days averaged into each point.
    #[arg(long, default_value_t = 0)]
    pub smoothing: u32,

    /// Trailing window length ending yesterday.
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub days: Option<u32>,

    /// First day of the window, `YYYY-MM-DD`.
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// Last day of the window, `YYYY-MM-DD`.
    #[arg(long, requires = "start")]
    pub end: Option<String>,
}
