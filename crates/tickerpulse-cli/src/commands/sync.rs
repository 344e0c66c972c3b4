use serde::Serialize;
use serde_json::json;
use tickerpulse_core::{fetch_each, FetchJob, FetchMode, Ticker};
use tickerpulse_store::CsvStore;
use time::{Date, OffsetDateTime};
use tracing::{info, warn};

use crate::cli::SyncArgs;
use crate::error::CliError;

use super::{period_or, CommandResult, Context, Section, NO_DATA_WARNING};

const SYNC_HEADERS: [&str; 5] = ["ticker", "status", "window", "fetched", "stored"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SyncStatus {
    Updated,
    NoNewRows,
    UpToDate,
    NoData,
}

impl SyncStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::NoNewRows => "no new rows",
            Self::UpToDate => "up to date",
            Self::NoData => "no data",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct SyncOutcome {
    ticker: Ticker,
    status: SyncStatus,
    window: Option<String>,
    fetched: usize,
    stored: usize,
}

impl SyncOutcome {
    fn cells(&self) -> Vec<String> {
        vec![
            self.ticker.to_string(),
            self.status.as_str().to_owned(),
            self.window.clone().unwrap_or_else(|| "-".to_owned()),
            self.fetched.to_string(),
            self.stored.to_string(),
        ]
    }
}

pub async fn run(args: &SyncArgs, ctx: &Context) -> Result<CommandResult, CliError> {
    let today = OffsetDateTime::now_utc().date();
    sync_until(args, ctx, today).await
}

async fn sync_until(
    args: &SyncArgs,
    ctx: &Context,
    today: Date,
) -> Result<CommandResult, CliError> {
    let dir = args
        .dir
        .clone()
        .unwrap_or_else(|| ctx.config.store_dir.clone());
    let store = CsvStore::open(dir)?;
    let fallback = period_or(args.period.as_deref(), ctx.period)?;

    let mut jobs = Vec::new();
    for ticker in &ctx.tickers {
        if let Some(window) = store.next_window(ticker, today, fallback)? {
            jobs.push(FetchJob::new(ticker.clone(), FetchMode::FullWindow, window));
        }
    }
    let planned: Vec<FetchJob> = jobs.clone();

    let table = fetch_each(ctx.source.clone(), jobs, ctx.retry, ctx.concurrency).await;

    let mut outcomes = Vec::with_capacity(ctx.tickers.len());
    for ticker in &ctx.tickers {
        let Some(job) = planned.iter().find(|job| &job.ticker == ticker) else {
            outcomes.push(SyncOutcome {
                ticker: ticker.clone(),
                status: SyncStatus::UpToDate,
                window: None,
                fetched: 0,
                stored: 0,
            });
            continue;
        };

        let outcome = match table.get(ticker) {
            Some(rows) => {
                let stored = store.append(ticker, rows)?;
                SyncOutcome {
                    ticker: ticker.clone(),
                    status: if stored > 0 {
                        SyncStatus::Updated
                    } else {
                        SyncStatus::NoNewRows
                    },
                    window: Some(job.window.describe()),
                    fetched: rows.len(),
                    stored,
                }
            }
            None => SyncOutcome {
                ticker: ticker.clone(),
                status: SyncStatus::NoData,
                window: Some(job.window.describe()),
                fetched: 0,
                stored: 0,
            },
        };
        outcomes.push(outcome);
    }

    let stored: usize = outcomes.iter().map(|o| o.stored).sum();
    info!(dir = %store.dir().display(), tickers = outcomes.len(), stored, "sync complete");

    let no_data = !planned.is_empty() && table.is_empty();
    let mut warnings = Vec::new();
    if no_data {
        warn!(command = "sync", "{NO_DATA_WARNING}");
        warnings.push(NO_DATA_WARNING.to_owned());
    }

    let records = outcomes
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CommandResult {
        command: "sync",
        data: json!({
            "dir": store.dir().display().to_string(),
            "stored": stored,
            "tickers": records,
        }),
        sections: vec![Section {
            title: format!("Store {}", store.dir().display()),
            headers: SYNC_HEADERS.to_vec(),
            rows: outcomes.iter().map(SyncOutcome::cells).collect(),
        }],
        records,
        warnings,
        no_data,
    })
}
