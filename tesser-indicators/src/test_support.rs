use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use tesser_core::{Candle, Series};

pub(crate) fn candle(minute: usize, high: Decimal, low: Decimal, close: Decimal, volume: Decimal) -> Candle {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Candle::new(
        start + Duration::minutes(minute as i64),
        close,
        high,
        low,
        close,
        volume,
    )
}

pub(crate) fn hlcv_series(rows: &[(Decimal, Decimal, Decimal, Decimal)]) -> Arc<Series> {
    let candles = rows
        .iter()
        .enumerate()
        .map(|(i, (high, low, close, volume))| candle(i, *high, *low, *close, *volume));
    Arc::new(Series::from_candles(candles).unwrap())
}

pub(crate) fn hlc_series(rows: &[(Decimal, Decimal, Decimal)]) -> Arc<Series> {
    let rows: Vec<_> = rows
        .iter()
        .map(|(high, low, close)| (*high, *low, *close, Decimal::ONE))
        .collect();
    hlcv_series(&rows)
}

pub(crate) fn close_series(closes: &[Decimal]) -> Arc<Series> {
    let rows: Vec<_> = closes.iter().map(|close| (*close, *close, *close)).collect();
    hlc_series(&rows)
}

pub(crate) fn ints(values: &[i64]) -> Vec<Decimal> {
    values.iter().copied().map(Decimal::from).collect()
}

pub(crate) fn assert_close(actual: Option<Decimal>, expected: Decimal) {
    let actual = actual.unwrap_or_else(|| panic!("expected {expected}, got undefined"));
    let tolerance = Decimal::new(1, 8);
    assert!((actual - expected).abs() <= tolerance, "{actual} != {expected}");
}
