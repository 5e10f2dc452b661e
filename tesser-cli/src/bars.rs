use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tesser_core::{Candle, Series};
use tracing::info;

#[derive(Debug, Deserialize)]
struct BarRecord {
    timestamp: DateTime<Utc>,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
}

impl From<BarRecord> for Candle {
    fn from(record: BarRecord) -> Self {
        Candle::new(
            record.timestamp,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        )
    }
}

/// Reads `timestamp,open,high,low,close,volume` rows into a new series.
///
/// A repeated timestamp overwrites the previous row, like a live bar update.
pub fn load_csv(path: &Path) -> Result<Series> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let series = Series::new();
    for (line, record) in reader.deserialize::<BarRecord>().enumerate() {
        // header is line 1
        let line = line + 2;
        let record = record.with_context(|| format!("{}:{line}: malformed bar", path.display()))?;
        series
            .push(record.into())
            .with_context(|| format!("{}:{line}: rejected bar", path.display()))?;
    }
    info!(path = %path.display(), rows = series.len(), "loaded bars");
    Ok(series)
}
