use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result alias for series mutations.
pub type SeriesResult<T> = Result<T, SeriesError>;

/// Error type surfaced when a series mutation would break its ordering.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeriesError {
    /// The pushed candle is older than the current last row.
    #[error("candle at {timestamp} is older than the last row at {last}")]
    OutOfOrder {
        /// Timestamp of the rejected candle.
        timestamp: DateTime<Utc>,
        /// Timestamp of the current last row.
        last: DateTime<Utc>,
    },
    /// Truncation was asked to grow the series.
    #[error("cannot truncate a series of {len} rows to {requested} rows")]
    TruncateBeyondEnd {
        /// Current number of rows.
        len: usize,
        /// Requested number of rows.
        requested: usize,
    },
}
