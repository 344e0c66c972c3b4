use serde_json::{json, Value};
use tickerpulse_core::{format_date, MetricsRow, Ticker, TickerRow};

use crate::cli::OutputFormat;
use crate::commands::{CommandResult, Section};
use crate::error::CliError;

pub const METRIC_HEADERS: [&str; 9] = [
    "ticker",
    "date",
    "open",
    "high",
    "low",
    "close",
    "upward_move",
    "upward_move_pct",
    "daily_range",
];

/// Table cells for one ticker row, in `METRIC_HEADERS` order.
pub fn metric_cells(ticker: &Ticker, row: &MetricsRow) -> Vec<String> {
    let bar = &row.bar;
    let metrics = &row.metrics;
    vec![
        ticker.to_string(),
        format_date(bar.date),
        format!("{:.2}", bar.open),
        format!("{:.2}", bar.high),
        format!("{:.2}", bar.low),
        format!("{:.2}", bar.close),
        format!("{:.2}", metrics.upward_move),
        format!("{:.2}", metrics.upward_move_pct),
        format!("{:.2}", metrics.daily_range),
    ]
}

/// Prints results as they are produced and remembers whether any was empty.
#[derive(Debug)]
pub struct Reporter {
    format: OutputFormat,
    pretty: bool,
    saw_no_data: bool,
}

impl Reporter {
    pub fn new(format: OutputFormat, pretty: bool) -> Self {
        Self {
            format,
            pretty,
            saw_no_data: false,
        }
    }

    pub fn emit(&mut self, result: &CommandResult) -> Result<(), CliError> {
        print!("{}", render(result, self.format, self.pretty)?);
        self.saw_no_data |= result.no_data;
        Ok(())
    }

    pub fn saw_no_data(&self) -> bool {
        self.saw_no_data
    }
}

pub fn render(
    result: &CommandResult,
    format: OutputFormat,
    pretty: bool,
) -> Result<String, CliError> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => {
            let document = json!({
                "command": result.command,
                "data": result.data,
                "warnings": result.warnings,
            });
            let payload = if pretty {
                serde_json::to_string_pretty(&document)?
            } else {
                serde_json::to_string(&document)?
            };
            out.push_str(&payload);
            out.push('\n');
        }
        OutputFormat::Ndjson => {
            for record in &result.records {
                out.push_str(&serde_json::to_string(record)?);
                out.push('\n');
            }
            for warning in &result.warnings {
                out.push_str(&serde_json::to_string(&json!({ "warning": warning }))?);
                out.push('\n');
            }
        }
        OutputFormat::Table => {
            for section in &result.sections {
                render_section(section, &mut out);
                out.push('\n');
            }
            for warning in &result.warnings {
                out.push_str("warning: ");
                out.push_str(warning);
                out.push('\n');
            }
        }
    }
    Ok(out)
}

fn render_section(section: &Section, out: &mut String) {
    out.push_str(&section.title);
    out.push('\n');

    let mut widths: Vec<usize> = section.headers.iter().map(|h| h.len()).collect();
    for row in &section.rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let headers: Vec<String> = section.headers.iter().map(|h| (*h).to_owned()).collect();
    push_line(&headers, &widths, out);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&rule, &widths, out);
    for row in &section.rows {
        push_line(row, &widths, out);
    }
}

fn push_line(cells: &[String], widths: &[usize], out: &mut String) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            if cell.parse::<f64>().is_ok() {
                format!("{cell:>width$}")
            } else {
                format!("{cell:<width$}")
            }
        })
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

/// Serialize ticker rows as one JSON object each.
pub fn records(rows: &[TickerRow]) -> Result<Vec<Value>, CliError> {
    rows.iter()
        .map(|row| serde_json::to_value(row).map_err(CliError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickerpulse_core::PriceBar;
    use time::macros::date;

    fn sample_row() -> TickerRow {
        TickerRow {
            ticker: Ticker::parse("AAPL").expect("valid"),
            row: MetricsRow::from_bar(
                PriceBar::checked(date!(2024 - 01 - 02), 100.0, 105.0, 99.0, 103.0).expect("valid"),
            ),
        }
    }

    fn sample_result() -> CommandResult {
        let rows = vec![sample_row()];
        CommandResult {
            command: "latest",
            data: json!({ "latest": rows }),
            records: records(&rows).expect("serializable"),
            sections: vec![Section {
                title: "Latest".to_owned(),
                headers: METRIC_HEADERS.to_vec(),
                rows: rows
                    .iter()
                    .map(|row| metric_cells(&row.ticker, &row.row))
                    .collect(),
            }],
            warnings: Vec::new(),
            no_data: false,
        }
    }

    #[test]
    fn table_aligns_columns_and_formats_metrics() {
        let text = render(&sample_result(), OutputFormat::Table, false).expect("render");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Latest");
        assert!(lines[1].starts_with("ticker  date"));
        assert!(lines[3].starts_with("AAPL    2024-01-02"));
        assert!(lines[3].contains("6.06"));
        assert!(lines[3].ends_with("3.00"));
    }

    #[test]
    fn ndjson_emits_one_flat_object_per_row() {
        let text = render(&sample_result(), OutputFormat::Ndjson, false).expect("render");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1);

        let value: Value = serde_json::from_str(lines[0]).expect("json line");
        assert_eq!(value["ticker"], "AAPL");
        assert_eq!(value["date"], "2024-01-02");
        assert_eq!(value["upward_move"], 6.0);
        assert_eq!(value["daily_range"], 3.0);
    }

    #[test]
    fn json_wraps_data_and_warnings() {
        let mut result = sample_result();
        result.warnings.push("No data available.".to_owned());

        let text = render(&result, OutputFormat::Json, true).expect("render");
        let value: Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["command"], "latest");
        assert_eq!(value["data"]["latest"][0]["ticker"], "AAPL");
        assert_eq!(value["warnings"][0], "No data available.");
    }

    #[test]
    fn table_prints_warnings_after_sections() {
        let result = CommandResult::no_data("latest");
        let text = render(&result, OutputFormat::Table, false).expect("render");
        assert_eq!(text, "warning: No data available.\n");
    }
}
