use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use tesser_core::Series;
use tesser_indicators::FunctionHandle;

/// Output format of `inspect`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text columns.
    #[default]
    Table,
    /// One JSON document.
    Json,
}

/// Output values of one function at one row.
#[derive(Debug, Clone)]
pub struct RowReport {
    pub row: usize,
    pub timestamp: DateTime<Utc>,
    pub values: Vec<(&'static str, Option<Decimal>)>,
}

/// The trailing rows of one function.
#[derive(Debug, Clone)]
pub struct FunctionReport {
    pub function: String,
    pub rows: Vec<RowReport>,
}

impl FunctionReport {
    /// Samples the last `last` rows of an already computed function.
    pub fn collect(handle: &FunctionHandle, series: &Series, last: usize) -> Self {
        let timestamps = series.timestamps();
        let start = timestamps.len().saturating_sub(last);
        let rows = timestamps
            .iter()
            .enumerate()
            .skip(start)
            .map(|(row, timestamp)| RowReport {
                row,
                timestamp: *timestamp,
                values: handle.sample(row),
            })
            .collect();
        Self {
            function: handle.spec().to_string(),
            rows,
        }
    }
}

#[derive(Serialize)]
struct JsonRow {
    row: usize,
    timestamp: DateTime<Utc>,
    values: Map<String, Value>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    function: &'a str,
    rows: Vec<JsonRow>,
}

pub fn render(reports: &[FunctionReport], format: OutputFormat, out: &mut impl Write) -> Result<()> {
    match format {
        OutputFormat::Table => render_table(reports, out),
        OutputFormat::Json => render_json(reports, out),
    }
}

fn render_table(reports: &[FunctionReport], out: &mut impl Write) -> Result<()> {
    for report in reports {
        writeln!(out, "{}", report.function)?;
        let names: Vec<&str> = report
            .rows
            .first()
            .map(|row| row.values.iter().map(|(name, _)| *name).collect())
            .unwrap_or_default();
        write!(out, "{:>6}  {:<25}", "row", "timestamp")?;
        for name in &names {
            write!(out, "  {name:>16}")?;
        }
        writeln!(out)?;
        for row in &report.rows {
            write!(out, "{:>6}  {:<25}", row.row, row.timestamp.to_rfc3339())?;
            for (_, value) in &row.values {
                let cell = value.map_or_else(|| "-".to_string(), |v| v.round_dp(6).normalize().to_string());
                write!(out, "  {cell:>16}")?;
            }
            writeln!(out)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn render_json(reports: &[FunctionReport], out: &mut impl Write) -> Result<()> {
    let documents: Vec<JsonReport<'_>> = reports
        .iter()
        .map(|report| JsonReport {
            function: &report.function,
            rows: report
                .rows
                .iter()
                .map(|row| JsonRow {
                    row: row.row,
                    timestamp: row.timestamp,
                    values: row
                        .values
                        .iter()
                        .map(|(name, value)| {
                            let value = value.map_or(Value::Null, |v| Value::String(v.to_string()));
                            (name.to_string(), value)
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();
    serde_json::to_writer_pretty(&mut *out, &documents)?;
    writeln!(out)?;
    Ok(())
}
