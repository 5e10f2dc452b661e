//! Window statistics over row-indexed values.
//!
//! Every helper takes the row being computed, a period, and an accessor for
//! the input column. A window is defined only once `period` rows exist and
//! every value in it is defined.

use std::ops::RangeInclusive;

use rust_decimal::{Decimal, MathematicalOps};

fn window(row: usize, period: usize) -> Option<RangeInclusive<usize>> {
    (period > 0 && row + 1 >= period).then(|| row + 1 - period..=row)
}

/// Sum of the `period` values ending at `row`.
pub fn sum(row: usize, period: usize, value: impl Fn(usize) -> Option<Decimal>) -> Option<Decimal> {
    window(row, period)?.map(value).sum()
}

/// Arithmetic mean of the `period` values ending at `row`.
pub fn mean(row: usize, period: usize, value: impl Fn(usize) -> Option<Decimal>) -> Option<Decimal> {
    Some(sum(row, period, value)? / Decimal::from(period))
}

/// Highest of the `period` values ending at `row`.
pub fn max(row: usize, period: usize, value: impl Fn(usize) -> Option<Decimal>) -> Option<Decimal> {
    let mut highest: Option<Decimal> = None;
    for r in window(row, period)? {
        let v = value(r)?;
        highest = Some(highest.map_or(v, |h| h.max(v)));
    }
    highest
}

/// Lowest of the `period` values ending at `row`.
pub fn min(row: usize, period: usize, value: impl Fn(usize) -> Option<Decimal>) -> Option<Decimal> {
    let mut lowest: Option<Decimal> = None;
    for r in window(row, period)? {
        let v = value(r)?;
        lowest = Some(lowest.map_or(v, |l| l.min(v)));
    }
    lowest
}

/// Population standard deviation of the `period` values ending at `row`.
pub fn stddev(
    row: usize,
    period: usize,
    value: impl Fn(usize) -> Option<Decimal>,
) -> Option<Decimal> {
    let values = window(row, period)?.map(value).collect::<Option<Vec<_>>>()?;
    let divisor = Decimal::from(period);
    let mean = values.iter().copied().sum::<Decimal>() / divisor;
    let variance = values
        .iter()
        .map(|v| (*v - mean) * (*v - mean))
        .sum::<Decimal>()
        / divisor;
    variance.sqrt()
}

/// Exponential moving average at `row` given the previous row's average.
///
/// Without a previous average the window mean seeds the series, so the first
/// defined value lands on the first complete window.
pub fn ema(
    row: usize,
    period: usize,
    prev: Option<Decimal>,
    value: impl Fn(usize) -> Option<Decimal>,
) -> Option<Decimal> {
    match prev {
        Some(prev) => {
            let alpha = Decimal::from(2) / Decimal::from(period + 1);
            Some(prev + (value(row)? - prev) * alpha)
        }
        None => mean(row, period, value),
    }
}

/// `numerator / denominator`, or zero when the denominator is zero.
pub fn ratio_or_zero(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn column(values: &[Option<Decimal>]) -> impl Fn(usize) -> Option<Decimal> + '_ {
        move |row| values.get(row).copied().flatten()
    }

    #[test]
    fn windows_wait_for_period_rows() {
        let values = [Some(dec!(1)), Some(dec!(2)), Some(dec!(3)), Some(dec!(4))];
        assert_eq!(sum(1, 3, column(&values)), None);
        assert_eq!(sum(2, 3, column(&values)), Some(dec!(6)));
        assert_eq!(mean(3, 3, column(&values)), Some(dec!(3)));
        assert_eq!(max(3, 2, column(&values)), Some(dec!(4)));
        assert_eq!(min(3, 2, column(&values)), Some(dec!(3)));
    }

    #[test]
    fn undefined_values_poison_the_window() {
        let values = [None, Some(dec!(2)), Some(dec!(3)), Some(dec!(4))];
        assert_eq!(sum(2, 3, column(&values)), None);
        assert_eq!(max(2, 3, column(&values)), None);
        assert_eq!(min(3, 3, column(&values)), Some(dec!(2)));
    }

    #[test]
    fn stddev_is_population_deviation() {
        let values: Vec<_> = [2, 4, 4, 4, 5, 5, 7, 9]
            .into_iter()
            .map(|v| Some(Decimal::from(v)))
            .collect();
        let deviation = stddev(7, 8, column(&values)).unwrap();
        assert!((deviation - dec!(2)).abs() < dec!(0.0000001), "{deviation}");
    }

    #[test]
    fn ema_seeds_with_window_mean() {
        let values = [Some(dec!(1)), Some(dec!(2)), Some(dec!(3)), Some(dec!(4))];
        let seed = ema(2, 3, None, column(&values));
        assert_eq!(seed, Some(dec!(2)));
        // alpha = 0.5 for period 3
        assert_eq!(ema(3, 3, seed, column(&values)), Some(dec!(3)));
    }

    #[test]
    fn ratio_guards_zero_denominators() {
        assert_eq!(ratio_or_zero(dec!(5), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(ratio_or_zero(dec!(5), dec!(2)), dec!(2.5));
    }
}
