use serde_json::json;
use tickerpulse_core::{fetch_many, parse_date, FetchMode, Window};
use tracing::warn;

use crate::cli::HistoryArgs;
use crate::error::CliError;
use crate::output::{metric_cells, records, METRIC_HEADERS};

use super::{period_or, CommandResult, Context, Section};

const LONE_BOUND_WARNING: &str = "--start and --end must be given together; using the period";

pub async fn run(args: &HistoryArgs, ctx: &Context) -> Result<CommandResult, CliError> {
    let period = period_or(args.period.as_deref(), ctx.period)?;
    let start = args.start.as_deref().map(parse_date).transpose()?;
    let end = args.end.as_deref().map(parse_date).transpose()?;

    let mut warnings = Vec::new();
    if start.is_some() != end.is_some() {
        warn!("{LONE_BOUND_WARNING}");
        warnings.push(LONE_BOUND_WARNING.to_owned());
    }
    let window = Window::resolve(period, start, end)?;

    let table = fetch_many(
        ctx.source.clone(),
        &ctx.tickers,
        FetchMode::FullWindow,
        window,
        ctx.retry,
        ctx.concurrency,
    )
    .await;

    if table.is_empty() {
        let mut result = CommandResult::no_data("history");
        warnings.append(&mut result.warnings);
        result.warnings = warnings;
        return Ok(result);
    }

    let sections = table
        .iter()
        .map(|(ticker, ticker_rows)| Section {
            title: format!("{ticker} ({} sessions, {window})", ticker_rows.len()),
            headers: METRIC_HEADERS.to_vec(),
            rows: ticker_rows
                .iter()
                .map(|row| metric_cells(ticker, row))
                .collect(),
        })
        .collect();

    Ok(CommandResult {
        command: "history",
        data: json!({
            "window": window.describe(),
            "history": serde_json::to_value(&table)?,
        }),
        records: records(&table.rows())?,
        sections,
        warnings,
        no_data: false,
    })
}
