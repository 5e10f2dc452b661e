//! Append-only bar series.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard};
use rust_decimal::Decimal;

use crate::{Candle, Field, SeriesError, SeriesResult, Var};

static NEXT_SERIES_ID: AtomicU64 = AtomicU64::new(1);

/// Corrections kept before the oldest entries are folded together.
const CORRECTION_LOG_LIMIT: usize = 64;

/// Process-unique identity of a [`Series`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesId(u64);

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "series#{}", self.0)
    }
}

/// Opaque token scoping one logical recompute pass.
///
/// [`Series::session`] derives one from the series version, so consumers that
/// use it never have to mint their own ids. Do not mix both schemes against
/// the same functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    /// Wraps a caller-chosen id.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw id.
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Outcome of [`Series::push`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Push {
    /// A new row was appended at the given index.
    Appended(usize),
    /// The last row (same timestamp) was overwritten in place.
    Updated(usize),
}

/// Row data of a series, read under the series lock.
#[derive(Debug)]
pub struct Bars {
    version: u64,
    timestamps: Vec<DateTime<Utc>>,
    open: Var<Decimal>,
    high: Var<Decimal>,
    low: Var<Decimal>,
    close: Var<Decimal>,
    volume: Var<Decimal>,
    // (version, first affected row), both strictly increasing.
    corrections: Vec<(u64, usize)>,
}

impl Bars {
    fn new() -> Self {
        Self {
            version: 0,
            timestamps: Vec::new(),
            open: Var::new("open"),
            high: Var::new("high"),
            low: Var::new("low"),
            close: Var::new("close"),
            volume: Var::new("volume"),
            corrections: Vec::new(),
        }
    }

    /// Mutation counter; bumped by every append, overwrite and truncation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Returns `true` when the series holds no rows.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Index of the last row.
    pub fn last_row(&self) -> Option<usize> {
        self.len().checked_sub(1)
    }

    /// Row timestamps in order.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Row whose timestamp equals `time` exactly.
    pub fn index_of_occurred_time(&self, time: DateTime<Utc>) -> Option<usize> {
        self.timestamps.binary_search(&time).ok()
    }

    /// Base column for `field`.
    pub fn column(&self, field: Field) -> &Var<Decimal> {
        match field {
            Field::Open => &self.open,
            Field::High => &self.high,
            Field::Low => &self.low,
            Field::Close => &self.close,
            Field::Volume => &self.volume,
        }
    }

    /// Value of `field` at `row`.
    pub fn value(&self, field: Field, row: usize) -> Option<Decimal> {
        self.column(field).get(row)
    }

    /// Open at `row`.
    pub fn open(&self, row: usize) -> Option<Decimal> {
        self.open.get(row)
    }

    /// High at `row`.
    pub fn high(&self, row: usize) -> Option<Decimal> {
        self.high.get(row)
    }

    /// Low at `row`.
    pub fn low(&self, row: usize) -> Option<Decimal> {
        self.low.get(row)
    }

    /// Close at `row`.
    pub fn close(&self, row: usize) -> Option<Decimal> {
        self.close.get(row)
    }

    /// Volume at `row`.
    pub fn volume(&self, row: usize) -> Option<Decimal> {
        self.volume.get(row)
    }

    /// Reassembles the candle stored at `row`.
    pub fn candle(&self, row: usize) -> Option<Candle> {
        Some(Candle {
            timestamp: *self.timestamps.get(row)?,
            open: self.open.get(row)?,
            high: self.high.get(row)?,
            low: self.low.get(row)?,
            close: self.close.get(row)?,
            volume: self.volume.get(row)?,
        })
    }

    /// Lowest row rewritten or removed after `version`.
    ///
    /// Derived data at or after this row that was computed at `version` or
    /// earlier is stale. Once the log has been folded, an old `version` may
    /// report a lower row than it strictly needs to.
    pub fn corrected_since(&self, version: u64) -> Option<usize> {
        let first = self.corrections.partition_point(|(at, _)| *at <= version);
        self.corrections.get(first).map(|(_, row)| *row)
    }

    fn write_row(&mut self, row: usize, candle: &Candle) {
        self.open.set(row, candle.open);
        self.high.set(row, candle.high);
        self.low.set(row, candle.low);
        self.close.set(row, candle.close);
        self.volume.set(row, candle.volume);
    }

    fn record_correction(&mut self, row: usize) {
        // A later correction at a lower row dominates every earlier one at or above it.
        while self
            .corrections
            .last()
            .is_some_and(|(_, existing)| *existing >= row)
        {
            self.corrections.pop();
        }
        self.corrections.push((self.version, row));
        if self.corrections.len() > CORRECTION_LOG_LIMIT {
            // Keep the newer version with the older, lower row.
            let (_, oldest_row) = self.corrections.remove(0);
            self.corrections[0].1 = oldest_row;
        }
    }

    fn push(&mut self, candle: Candle) -> SeriesResult<Push> {
        match self.timestamps.last().copied() {
            Some(last) if candle.timestamp < last => Err(SeriesError::OutOfOrder {
                timestamp: candle.timestamp,
                last,
            }),
            Some(last) if candle.timestamp == last => {
                let row = self.len() - 1;
                self.version += 1;
                self.write_row(row, &candle);
                self.record_correction(row);
                Ok(Push::Updated(row))
            }
            _ => {
                let row = self.len();
                self.version += 1;
                self.timestamps.push(candle.timestamp);
                self.write_row(row, &candle);
                Ok(Push::Appended(row))
            }
        }
    }

    fn truncate(&mut self, len: usize) -> SeriesResult<()> {
        if len > self.len() {
            return Err(SeriesError::TruncateBeyondEnd {
                len: self.len(),
                requested: len,
            });
        }
        if len == self.len() {
            return Ok(());
        }
        self.version += 1;
        self.timestamps.truncate(len);
        for field in Field::ALL {
            self.column_mut(field).truncate(len);
        }
        self.record_correction(len);
        Ok(())
    }

    fn column_mut(&mut self, field: Field) -> &mut Var<Decimal> {
        match field {
            Field::Open => &mut self.open,
            Field::High => &mut self.high,
            Field::Low => &mut self.low,
            Field::Close => &mut self.close,
            Field::Volume => &mut self.volume,
        }
    }
}

/// Append-only OHLCV series shared between one producer and many readers.
///
/// Functions derived from a series only observe it; they never own it.
#[derive(Debug)]
pub struct Series {
    id: SeriesId,
    bars: RwLock<Bars>,
}

impl Series {
    /// Creates an empty series with a fresh identity.
    pub fn new() -> Self {
        Self {
            id: SeriesId(NEXT_SERIES_ID.fetch_add(1, Ordering::Relaxed)),
            bars: RwLock::new(Bars::new()),
        }
    }

    /// Builds a series from candles sorted by timestamp.
    pub fn from_candles<I>(candles: I) -> SeriesResult<Self>
    where
        I: IntoIterator<Item = Candle>,
    {
        let series = Self::new();
        {
            let mut bars = series.bars.write();
            for candle in candles {
                bars.push(candle)?;
            }
        }
        Ok(series)
    }

    /// Identity used to key derived functions.
    pub fn id(&self) -> SeriesId {
        self.id
    }

    /// Current mutation counter.
    pub fn version(&self) -> u64 {
        self.read().version()
    }

    /// Session token for the current version of the data.
    pub fn session(&self) -> SessionId {
        SessionId(self.version())
    }

    /// Number of rows.
    pub fn size(&self) -> usize {
        self.read().len()
    }

    /// Alias of [`Series::size`].
    pub fn len(&self) -> usize {
        self.size()
    }

    /// Returns `true` when the series holds no rows.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Index of the last row.
    pub fn last_row(&self) -> Option<usize> {
        self.read().last_row()
    }

    /// Snapshot of the row timestamps.
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.read().timestamps().to_vec()
    }

    /// Row whose timestamp equals `time` exactly.
    pub fn index_of_occurred_time(&self, time: DateTime<Utc>) -> Option<usize> {
        self.read().index_of_occurred_time(time)
    }

    /// Candle stored at `row`.
    pub fn candle(&self, row: usize) -> Option<Candle> {
        self.read().candle(row)
    }

    /// Read access to the rows.
    ///
    /// The lock is taken recursively: a reader that already holds it (a
    /// function pass computing its dependencies) never blocks behind a
    /// waiting writer.
    pub fn read(&self) -> RwLockReadGuard<'_, Bars> {
        self.bars.read_recursive()
    }

    /// Appends a candle, or overwrites the last row when the timestamp matches.
    pub fn push(&self, candle: Candle) -> SeriesResult<Push> {
        self.bars.write().push(candle)
    }

    /// Drops every row at or after `len`.
    pub fn truncate(&self, len: usize) -> SeriesResult<()> {
        self.bars.write().truncate(len)
    }
}

impl Default for Series {
    fn default() -> Self {
        Self::new()
    }
}
