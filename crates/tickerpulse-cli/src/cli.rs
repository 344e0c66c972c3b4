//! CLI argument definitions for tickerpulse.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `latest` | Latest session for every tracked ticker, plus top movers |
//! | `history` | Every session in a window for every tracked ticker |
//! | `sync` | Append new sessions to the per-ticker CSV store |
//! | `watch` | Re-render `latest` on an interval |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--config` | none | TOML configuration file |
//! | `--format` | `table` | Output format (table, json, ndjson) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Exit with code 5 when no ticker has data |
//! | `--tickers` | config | Ticker override, comma or space separated |
//! | `--retries` | `3` | Attempts per ticker |
//! | `--retry-delay-secs` | `5` | Wait between attempts |
//! | `--concurrency` | `3` | Simultaneous ticker fetches |
//! | `--timeout-ms` | `10000` | Per-request timeout |
//!
//! # Examples
//!
//! ```bash
//! tickerpulse latest
//! tickerpulse --tickers AAPL,MSFT history --period 3mo --format json --pretty
//! tickerpulse history --start 2024-01-02 --end 2024-02-01
//! tickerpulse sync --dir data
//! tickerpulse watch --every-secs 60
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

/// Daily movers for a watch list of tickers.
#[derive(Debug, Parser)]
#[command(
    name = "tickerpulse",
    author,
    version,
    about = "Daily price moves for a watch list of tickers",
    long_about = "tickerpulse fetches daily OHLC bars for a list of tickers, derives the \
upward move (high - low), its percentage of the low and the daily range (close - open), \
and ranks the biggest movers.\n\
\n\
Use 'tickerpulse <command> --help' for command-specific help."
)]
pub struct Cli {
    /// TOML configuration file. Missing keys use built-in defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format for results.
    ///
    /// - table: aligned columns for the terminal (default)
    /// - json: a single JSON document
    /// - ndjson: one JSON object per row
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Fail with exit code 5 when no ticker returns data.
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Tickers separated by commas or spaces, replacing the configured list.
    #[arg(long, global = true)]
    pub tickers: Option<String>,

    /// Attempts per ticker before giving up.
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Seconds to wait between attempts.
    #[arg(long, global = true)]
    pub retry_delay_secs: Option<u64>,

    /// Maximum number of tickers fetched at once.
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Append log events to this file instead of stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns for terminal display.
    Table,
    /// Single JSON document.
    Json,
    /// Newline-delimited JSON (one row per line).
    Ndjson,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Latest session per ticker and the top movers by upward move %.
    ///
    /// # Examples
    ///
    ///   tickerpulse latest
    ///   tickerpulse latest --top 3 --format json
    Latest(LatestArgs),
    /// Every session in a window, per ticker.
    ///
    /// A complete --start/--end pair takes precedence over --period.
    ///
    /// # Examples
    ///
    ///   tickerpulse history --period 3mo
    ///   tickerpulse history --start 2024-01-02 --end 2024-02-01
    History(HistoryArgs),
    /// Append sessions missing from the per-ticker CSV store.
    ///
    /// # Examples
    ///
    ///   tickerpulse sync
    ///   tickerpulse sync --dir ./history --period 1y
    Sync(SyncArgs),
    /// Re-render the latest view on an interval until interrupted.
    ///
    /// Results are cached for the configured TTL, so a short interval does
    /// not refetch on every tick.
    ///
    /// # Examples
    ///
    ///   tickerpulse watch --every-secs 60
    ///   tickerpulse watch --iterations 3
    Watch(WatchArgs),
}

/// Arguments for the `latest` command.
#[derive(Debug, Clone, Args)]
pub struct LatestArgs {
    /// Number of top movers to list (default from config).
    #[arg(long)]
    pub top: Option<usize>,

    /// Ignore cached results and store the fresh ones.
    #[arg(long, default_value_t = false)]
    pub refresh: bool,

    /// Neither read nor write the cache.
    #[arg(long, default_value_t = false, conflicts_with = "refresh")]
    pub no_cache: bool,
}

/// Arguments for the `history` command.
#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Lookback period such as 30d, 2wk, 3mo, 1y, ytd or max.
    #[arg(long)]
    pub period: Option<String>,

    /// First session to include (YYYY-MM-DD).
    #[arg(long)]
    pub start: Option<String>,

    /// Day after the last session to include (YYYY-MM-DD).
    #[arg(long)]
    pub end: Option<String>,
}

/// Arguments for the `sync` command.
#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Store directory (default from config).
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Lookback for tickers with no stored history yet.
    #[arg(long)]
    pub period: Option<String>,
}

/// Arguments for the `watch` command.
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between refreshes.
    #[arg(long, default_value_t = 60)]
    pub every_secs: u64,

    /// Stop after this many refreshes.
    #[arg(long)]
    pub iterations: Option<u32>,

    #[command(flatten)]
    pub latest: LatestArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tickerpulse",
            "latest",
            "--tickers",
            "aapl,msft",
            "--retries",
            "5",
            "--format",
            "json",
            "--top",
            "3",
        ])
        .expect("valid args");

        assert_eq!(cli.tickers.as_deref(), Some("aapl,msft"));
        assert_eq!(cli.retries, Some(5));
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Command::Latest(args) => assert_eq!(args.top, Some(3)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn refresh_and_no_cache_conflict() {
        let err = Cli::try_parse_from(["tickerpulse", "latest", "--refresh", "--no-cache"])
            .expect_err("must conflict");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["tickerpulse", "-v", "-q", "latest"]).is_err());
        let cli = Cli::try_parse_from(["tickerpulse", "-vv", "latest"]).expect("valid");
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn watch_accepts_latest_flags() {
        let cli = Cli::try_parse_from([
            "tickerpulse",
            "watch",
            "--every-secs",
            "5",
            "--iterations",
            "2",
            "--no-cache",
        ])
        .expect("valid args");

        match cli.command {
            Command::Watch(args) => {
                assert_eq!(args.every_secs, 5);
                assert_eq!(args.iterations, Some(2));
                assert!(args.latest.no_cache);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn history_window_flags() {
        let cli = Cli::try_parse_from([
            "tickerpulse",
            "history",
            "--start",
            "2024-01-02",
            "--end",
            "2024-02-01",
        ])
        .expect("valid args");

        match cli.command {
            Command::History(args) => {
                assert_eq!(args.start.as_deref(), Some("2024-01-02"));
                assert_eq!(args.end.as_deref(), Some("2024-02-01"));
                assert!(args.period.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
