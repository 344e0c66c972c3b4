use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tickerpulse_core::{MetricsRow, Period, Ticker, Window};
use time::Date;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::{StoredRow, COLUMNS};

/// Directory of `<TICKER>.csv` files, one per ticker.
#[derive(Debug, Clone)]
pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, ticker: &Ticker) -> PathBuf {
        self.dir.join(format!("{}.csv", ticker.as_str()))
    }

    /// All stored rows in ascending date order. Empty when nothing is stored.
    pub fn load(&self, ticker: &Ticker) -> Result<Vec<MetricsRow>, StoreError> {
        let path = self.path_for(ticker);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        let mut reader = csv::Reader::from_reader(file);
        let mut rows = Vec::new();
        for record in reader.deserialize::<StoredRow>() {
            let row = record?
                .into_metrics_row()
                .map_err(|source| StoreError::InvalidRecord {
                    path: path.clone(),
                    source,
                })?;
            rows.push(row);
        }

        rows.sort_by_key(MetricsRow::date);
        Ok(rows)
    }

    /// Newest stored date, if any.
    pub fn last_date(&self, ticker: &Ticker) -> Result<Option<Date>, StoreError> {
        Ok(self.load(ticker)?.last().map(MetricsRow::date))
    }

    /// Append rows whose date is not stored yet. Returns how many were written.
    pub fn append(&self, ticker: &Ticker, rows: &[MetricsRow]) -> Result<usize, StoreError> {
        let mut known: HashSet<Date> = self.load(ticker)?.iter().map(MetricsRow::date).collect();
        let fresh: Vec<&MetricsRow> = rows.iter().filter(|row| known.insert(row.date())).collect();
        if fresh.is_empty() {
            debug!(ticker = %ticker, "no new rows to store");
            return Ok(0);
        }

        let path = self.path_for(ticker);
        let needs_header = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(COLUMNS)?;
        }
        for row in &fresh {
            writer.serialize(StoredRow::from(*row))?;
        }
        writer.flush().map_err(|e| StoreError::io(&path, e))?;

        info!(ticker = %ticker, rows = fresh.len(), path = %path.display(), "stored rows");
        Ok(fresh.len())
    }

    /// Window still missing from the store, up to and including `today`.
    ///
    /// `None` when the newest stored row is already `today` or later; the
    /// fallback period when nothing is stored.
    pub fn next_window(
        &self,
        ticker: &Ticker,
        today: Date,
        fallback: Period,
    ) -> Result<Option<Window>, StoreError> {
        let Some(last) = self.last_date(ticker)? else {
            return Ok(Some(Window::Relative(fallback)));
        };

        let (Some(start), Some(end)) = (last.next_day(), today.next_day()) else {
            return Ok(None);
        };
        if start >= end {
            return Ok(None);
        }
        Ok(Window::explicit(start, end).ok())
    }
}
