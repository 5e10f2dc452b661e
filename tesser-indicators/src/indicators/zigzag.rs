//! ZigZag trend reversals.
//!
//! A reversal is only known once a later bar moves `percent` away from the
//! running peak, so this is the one function that writes to rows before the
//! row being computed. Accessors therefore bring the function up to the last
//! available row before reading.

use rust_decimal::Decimal;
use serde::Serialize;
use tesser_core::{Bars, Direction, SessionId, Var};
use tracing::trace;

use crate::core::{BuildContext, ComputePass, Formula, Function, FunctionKind, IndicatorError};
use crate::spec::{FunctionSpec, ZigzagParams};

/// A turning point of the zigzag line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ZigzagPoint {
    /// Row of the peak.
    pub row: usize,
    /// High of a top, low of a bottom.
    pub value: Decimal,
    /// Direction of the leg that ends at this point.
    pub direction: Direction,
}

#[derive(Clone, Copy)]
struct Peaks {
    direction: Direction,
    high: Decimal,
    high_row: usize,
    low: Decimal,
    low_row: usize,
}

impl Peaks {
    fn active(&self) -> ZigzagPoint {
        match self.direction {
            Direction::Long => ZigzagPoint {
                row: self.high_row,
                value: self.high,
                direction: Direction::Long,
            },
            Direction::Short => ZigzagPoint {
                row: self.low_row,
                value: self.low,
                direction: Direction::Short,
            },
        }
    }

    fn inactive(&self) -> ZigzagPoint {
        match self.direction {
            Direction::Long => ZigzagPoint {
                row: self.low_row,
                value: self.low,
                direction: Direction::Short,
            },
            Direction::Short => ZigzagPoint {
                row: self.high_row,
                value: self.high,
                direction: Direction::Long,
            },
        }
    }
}

/// Confirmed turning points (`zigzag`), the same points plus a provisional
/// marker at the live edge (`pseudo_zigzag`), and the trend per row.
///
/// A long trend reverses at row `i` once `(H[i] - peak_hi) / peak_hi` falls
/// to `-percent`; a short trend once `(L[i] - peak_lo) / peak_lo` reaches
/// `percent`. The abandoned peak becomes a confirmed point. A zero peak
/// never reverses.
///
/// Every pass drops the rows after its first recomputed row. A direct
/// [`Function::compute_to`] that stops short of the last row therefore leaves
/// the later rows (and any point they confirmed) undefined until the next
/// pass that reaches the end. The accessors always compute to the end.
#[derive(Debug)]
pub struct Zigzag {
    percent: Decimal,
    pub(crate) zigzag: Var<Decimal>,
    pub(crate) pseudo_zigzag: Var<Decimal>,
    pub(crate) direction: Var<Direction>,
    peak_hi: Var<Decimal>,
    peak_hi_row: Var<usize>,
    peak_lo: Var<Decimal>,
    peak_lo_row: Var<usize>,
    confirmed: Option<ZigzagPoint>,
    tentative: Option<ZigzagPoint>,
}

impl FunctionKind for Zigzag {
    type Params = ZigzagParams;

    fn spec(params: &ZigzagParams) -> FunctionSpec {
        FunctionSpec::Zigzag(*params)
    }

    fn build(_ctx: &BuildContext<'_>, params: ZigzagParams) -> Result<Self, IndicatorError> {
        Ok(Self {
            percent: params.percent,
            zigzag: Var::new("zigzag"),
            pseudo_zigzag: Var::new("pseudo_zigzag"),
            direction: Var::new("zigzag_direction"),
            peak_hi: Var::new("zigzag_peak_hi"),
            peak_hi_row: Var::new("zigzag_peak_hi_row"),
            peak_lo: Var::new("zigzag_peak_lo"),
            peak_lo_row: Var::new("zigzag_peak_lo_row"),
            confirmed: None,
            tentative: None,
        })
    }
}

impl Zigzag {
    fn peaks(&self, row: usize) -> Option<Peaks> {
        Some(Peaks {
            direction: self.direction.get(row)?,
            high: self.peak_hi.get(row)?,
            high_row: self.peak_hi_row.get(row)?,
            low: self.peak_lo.get(row)?,
            low_row: self.peak_lo_row.get(row)?,
        })
    }

    fn store(&mut self, row: usize, peaks: Peaks) {
        self.direction.set(row, peaks.direction);
        self.peak_hi.set(row, peaks.high);
        self.peak_hi_row.set(row, peaks.high_row);
        self.peak_lo.set(row, peaks.low);
        self.peak_lo_row.set(row, peaks.low_row);
    }

    fn confirm(&mut self, point: ZigzagPoint) {
        self.zigzag.set(point.row, point.value);
        self.pseudo_zigzag.set(point.row, point.value);
        self.confirmed = Some(point);
    }

    fn step(&mut self, last: Peaks, high: Decimal, low: Decimal, row: usize) -> Peaks {
        match last.direction {
            Direction::Long => {
                let reversed = !last.high.is_zero()
                    && (high - last.high) / last.high <= -self.percent;
                if reversed {
                    self.confirm(last.active());
                    Peaks {
                        direction: Direction::Short,
                        low,
                        low_row: row,
                        ..last
                    }
                } else if high > last.high {
                    Peaks {
                        high,
                        high_row: row,
                        ..last
                    }
                } else {
                    last
                }
            }
            Direction::Short => {
                let reversed =
                    !last.low.is_zero() && (low - last.low) / last.low >= self.percent;
                if reversed {
                    self.confirm(last.active());
                    Peaks {
                        direction: Direction::Long,
                        high,
                        high_row: row,
                        ..last
                    }
                } else if low < last.low {
                    Peaks {
                        low,
                        low_row: row,
                        ..last
                    }
                } else {
                    last
                }
            }
        }
    }

    fn truncate(&mut self, len: usize) {
        self.zigzag.truncate(len);
        self.pseudo_zigzag.truncate(len);
        self.direction.truncate(len);
        self.peak_hi.truncate(len);
        self.peak_hi_row.truncate(len);
        self.peak_lo.truncate(len);
        self.peak_lo_row.truncate(len);
    }
}

impl Formula for Zigzag {
    fn clear_row(&mut self, row: usize) {
        self.zigzag.reset(row);
        self.pseudo_zigzag.reset(row);
        self.direction.reset(row);
        self.peak_hi.reset(row);
        self.peak_hi_row.reset(row);
        self.peak_lo.reset(row);
        self.peak_lo_row.reset(row);
    }

    fn pre_compute(&mut self, pass: &ComputePass<'_>) {
        if let Some(marker) = self.tentative.take() {
            self.pseudo_zigzag.reset(marker.row);
        }
        self.truncate(pass.begin);
        self.confirmed = None;

        // Only the peak still active at `begin - 1` can have been confirmed by
        // the rows about to be recomputed.
        let Some(peaks) = pass.begin.checked_sub(1).and_then(|row| self.peaks(row)) else {
            return;
        };
        let active = peaks.active();
        self.zigzag.reset(active.row);
        self.pseudo_zigzag.reset(active.row);

        let inactive = peaks.inactive();
        if self.zigzag.get(inactive.row).is_some() {
            self.confirmed = Some(inactive);
        }
    }

    fn compute_spot(&mut self, bars: &Bars, row: usize) {
        let (Some(high), Some(low)) = (bars.high(row), bars.low(row)) else {
            return;
        };
        let peaks = match row.checked_sub(1) {
            None => Peaks {
                direction: Direction::Long,
                high,
                high_row: row,
                low,
                low_row: row,
            },
            Some(prev) => match self.peaks(prev) {
                Some(last) => self.step(last, high, low, row),
                None => return,
            },
        };
        self.store(row, peaks);
    }

    fn post_compute(&mut self, pass: &ComputePass<'_>) {
        if !pass.reaches_last_row() {
            return;
        }
        let Some(last) = pass.bars.last_row() else {
            return;
        };
        if let Some(point) = self.confirmed {
            if self.pseudo_zigzag.get(point.row).is_none() {
                self.pseudo_zigzag.set(point.row, point.value);
            }
        }
        let Some(peaks) = self.peaks(last) else {
            return;
        };
        let marker = peaks.active();
        self.pseudo_zigzag.set(marker.row, marker.value);
        self.tentative = Some(marker);
        trace!(row = marker.row, value = %marker.value, "stamped tentative zigzag peak");
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![
            ("zigzag", self.zigzag.get(row)),
            ("pseudo_zigzag", self.pseudo_zigzag.get(row)),
            ("direction", self.direction.get(row).map(Direction::signum)),
        ]
    }
}

impl Function<Zigzag> {
    /// Confirmed turning point at `idx`, if one lies there.
    pub fn zigzag(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to_end(session);
        self.read(|f| f.zigzag.get(idx))
    }

    /// Confirmed point or the provisional live-edge peak at `idx`.
    pub fn pseudo_zigzag(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to_end(session);
        self.read(|f| f.pseudo_zigzag.get(idx))
    }

    /// Trend direction at `idx`.
    pub fn zigzag_direction(&self, session: SessionId, idx: usize) -> Option<Direction> {
        self.compute_to_end(session);
        self.read(|f| f.direction.get(idx))
    }

    /// Most recent confirmed turning point.
    pub fn last_confirmed(&self, session: SessionId) -> Option<ZigzagPoint> {
        self.compute_to_end(session);
        self.read(|f| f.confirmed)
    }

    /// Unconfirmed extreme of the active trend at the live edge.
    pub fn tentative(&self, session: SessionId) -> Option<ZigzagPoint> {
        self.compute_to_end(session);
        self.read(|f| f.tentative)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::registry::FunctionRegistry;
    use crate::test_support::{candle, hlc_series};

    fn bar(high: Decimal, low: Decimal) -> (Decimal, Decimal, Decimal) {
        (high, low, low)
    }

    fn params() -> ZigzagParams {
        ZigzagParams {
            percent: dec!(0.1),
        }
    }

    #[test]
    fn confirms_the_abandoned_peak() {
        let series = hlc_series(&[
            bar(dec!(10), dec!(9)),
            bar(dec!(12), dec!(11)),
            bar(dec!(15), dec!(14)),
            bar(dec!(14), dec!(13)),
            bar(dec!(13), dec!(12)),
            bar(dec!(12), dec!(11)),
        ]);
        let registry = FunctionRegistry::new();
        let zigzag = registry.get::<Zigzag>(&series, params()).unwrap();
        let session = series.session();

        // (13 - 15) / 15 is the first drop past ten percent
        assert_eq!(zigzag.zigzag_direction(session, 3), Some(Direction::Long));
        assert_eq!(zigzag.zigzag_direction(session, 4), Some(Direction::Short));
        let confirmed: Vec<_> = (0..6).filter_map(|i| zigzag.zigzag(session, i)).collect();
        assert_eq!(confirmed, vec![dec!(15)]);
        assert_eq!(zigzag.zigzag(session, 2), Some(dec!(15)));
        assert_eq!(
            zigzag.last_confirmed(session),
            Some(ZigzagPoint {
                row: 2,
                value: dec!(15),
                direction: Direction::Long,
            })
        );
    }

    #[test]
    fn pseudo_marks_the_live_extreme() {
        let series = hlc_series(&[
            bar(dec!(10), dec!(9)),
            bar(dec!(15), dec!(14)),
            bar(dec!(13), dec!(12)),
            bar(dec!(12), dec!(11)),
        ]);
        let registry = FunctionRegistry::new();
        let zigzag = registry.get::<Zigzag>(&series, params()).unwrap();

        let session = series.session();
        assert_eq!(zigzag.pseudo_zigzag(session, 1), Some(dec!(15)));
        assert_eq!(zigzag.pseudo_zigzag(session, 3), Some(dec!(11)));
        assert_eq!(zigzag.zigzag(session, 3), None);

        series
            .push(candle(4, dec!(10.5), dec!(10), dec!(10), Decimal::ONE))
            .unwrap();
        let session = series.session();
        assert_eq!(zigzag.pseudo_zigzag(session, 3), None);
        assert_eq!(zigzag.pseudo_zigzag(session, 4), Some(dec!(10)));
        assert_eq!(zigzag.pseudo_zigzag(session, 1), Some(dec!(15)));
        assert_eq!(
            zigzag.tentative(session).map(|point| point.row),
            Some(4)
        );
    }

    #[test]
    fn partial_pass_defers_later_rows_to_the_next_full_pass() {
        let series = hlc_series(&[
            bar(dec!(10), dec!(9)),
            bar(dec!(12), dec!(11)),
            bar(dec!(15), dec!(14)),
            bar(dec!(14), dec!(13)),
            bar(dec!(13), dec!(12)),
            bar(dec!(12), dec!(11)),
        ]);
        let registry = FunctionRegistry::new();
        let zigzag = registry.get::<Zigzag>(&series, params()).unwrap();
        assert_eq!(zigzag.zigzag(series.session(), 2), Some(dec!(15)));

        zigzag.compute_to(SessionId::new(u64::MAX), 3);
        assert_eq!(zigzag.computed_idx(), Some(3));
        let read = |row| zigzag.read(|f| (f.zigzag.get(row), f.direction.get(row)));
        assert_eq!(read(2), (None, Some(Direction::Long)));
        assert_eq!(read(4), (None, None));

        assert_eq!(zigzag.zigzag(series.session(), 2), Some(dec!(15)));
        assert_eq!(zigzag.zigzag_direction(series.session(), 4), Some(Direction::Short));
        assert_eq!(zigzag.computed_idx(), Some(5));
    }

    #[test]
    fn zero_peak_never_reverses() {
        let series = hlc_series(&[
            bar(dec!(0), dec!(0)),
            bar(dec!(0), dec!(0)),
            bar(dec!(5), dec!(0)),
        ]);
        let registry = FunctionRegistry::new();
        let zigzag = registry.get::<Zigzag>(&series, params()).unwrap();
        let session = series.session();
        assert_eq!(zigzag.zigzag_direction(session, 2), Some(Direction::Long));
        assert_eq!(zigzag.last_confirmed(session), None);
    }
}
