use serde_json::json;
use tickerpulse_core::{
    fetch_many, format_date, top_movers, CacheKey, CacheMode, FetchMode, Ticker, TickerRow, Window,
};

use crate::cli::LatestArgs;
use crate::error::CliError;
use crate::output::{metric_cells, records, METRIC_HEADERS};

use super::{ticker_list, CommandResult, Context, Section};

const MOVER_HEADERS: [&str; 5] = ["rank", "ticker", "date", "upward_move_pct", "upward_move"];

fn cache_mode(args: &LatestArgs) -> CacheMode {
    if args.no_cache {
        CacheMode::Bypass
    } else if args.refresh {
        CacheMode::Refresh
    } else {
        CacheMode::Use
    }
}

fn mover_cells(rank: usize, row: &TickerRow) -> Vec<String> {
    vec![
        rank.to_string(),
        row.ticker.to_string(),
        format_date(row.row.date()),
        format!("{:.2}", row.row.metrics.upward_move_pct),
        format!("{:.2}", row.row.metrics.upward_move),
    ]
}

pub async fn run(args: &LatestArgs, ctx: &Context) -> Result<CommandResult, CliError> {
    let window = Window::Relative(ctx.period);
    let key = CacheKey::new("latest")
        .param("tickers", ticker_list(&ctx.tickers))
        .param("window", window);

    let table = ctx
        .cache
        .get_or_fetch(
            &key,
            cache_mode(args),
            fetch_many(
                ctx.source.clone(),
                &ctx.tickers,
                FetchMode::LatestOnly,
                window,
                ctx.retry,
                ctx.concurrency,
            ),
        )
        .await;

    if table.is_empty() {
        return Ok(CommandResult::no_data("latest"));
    }

    let rows = table.rows();
    let movers = top_movers(&table, args.top.unwrap_or(ctx.config.top_n));

    let data = json!({
        "latest": serde_json::to_value(&table)?,
        "top_movers": serde_json::to_value(&movers)?,
    });
    let sections = vec![
        Section {
            title: format!(
                "Latest session ({} of {} tickers)",
                table.len(),
                ctx.tickers.len()
            ),
            headers: METRIC_HEADERS.to_vec(),
            rows: rows
                .iter()
                .map(|row| metric_cells(&row.ticker, &row.row))
                .collect(),
        },
        Section {
            title: format!("Top {} movers by upward move %", movers.len()),
            headers: MOVER_HEADERS.to_vec(),
            rows: movers
                .iter()
                .enumerate()
                .map(|(index, row)| mover_cells(index + 1, row))
                .collect(),
        },
    ];

    let mut result = CommandResult {
        command: "latest",
        data,
        records: records(&rows)?,
        sections,
        warnings: Vec::new(),
        no_data: false,
    };

    let missing: Vec<&str> = ctx
        .tickers
        .iter()
        .filter(|ticker| !table.contains(ticker))
        .map(Ticker::as_str)
        .collect();
    if !missing.is_empty() {
        result = result.with_warning(format!("no data for {}", missing.join(", ")));
    }
    Ok(result)
}
