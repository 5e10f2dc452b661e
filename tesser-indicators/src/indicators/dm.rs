//! Directional movement.

use rust_decimal::Decimal;
use tesser_core::{Bars, SessionId, Var};

use crate::core::{BuildContext, Formula, Function, FunctionKind, IndicatorError};
use crate::spec::FunctionSpec;

/// Upward (`dm_plus`) and downward (`dm_minus`) directional movement.
///
/// Rows are classified by comparing the high and low against the previous
/// bar; the first matching case wins:
///
/// | case | condition | `(+DM, -DM)` |
/// |------|-----------|--------------|
/// | 1 | `H > H1` and `L > L1` | `(H - H1, 0)` |
/// | 2 | `H < H1` and `L < L1` | `(0, L1 - L)` |
/// | 3 | `H > H1` and `L < L1` | the larger move, the other side 0 |
/// | 4 | `H < H1` and `L > L1` | `(0, 0)` |
/// | 5 | `H == H1` and `L == L1` | `(0, 0)` |
/// | 6 | `L > H1` | `(H - H, 0)`, i.e. zero |
/// | 7 | `H < L1` | `(0, L1 - L)` |
/// | 8 | otherwise | `(0, 0)` |
///
/// Cases 6 and 7 only match bars whose low lies above their high.
#[derive(Debug)]
pub struct Dm {
    pub(crate) dm_plus: Var<Decimal>,
    pub(crate) dm_minus: Var<Decimal>,
}

impl FunctionKind for Dm {
    type Params = ();

    fn spec(_params: &()) -> FunctionSpec {
        FunctionSpec::Dm
    }

    fn build(_ctx: &BuildContext<'_>, _params: ()) -> Result<Self, IndicatorError> {
        Ok(Self {
            dm_plus: Var::new("dm_plus"),
            dm_minus: Var::new("dm_minus"),
        })
    }
}

#[allow(clippy::if_same_then_else, clippy::eq_op)]
pub(crate) fn directional_movement(
    high: Decimal,
    low: Decimal,
    prev_high: Decimal,
    prev_low: Decimal,
) -> (Decimal, Decimal) {
    let zero = Decimal::ZERO;
    let up = high - prev_high;
    let down = prev_low - low;
    if high > prev_high && low > prev_low {
        (up, zero)
    } else if high < prev_high && low < prev_low {
        (zero, down)
    } else if high > prev_high && low < prev_low {
        if up > down {
            (up, zero)
        } else {
            (zero, down)
        }
    } else if high < prev_high && low > prev_low {
        (zero, zero)
    } else if high == prev_high && low == prev_low {
        (zero, zero)
    } else if low > prev_high {
        (high - high, zero)
    } else if high < prev_low {
        (zero, down)
    } else {
        (zero, zero)
    }
}

impl Formula for Dm {
    fn clear_row(&mut self, row: usize) {
        self.dm_plus.reset(row);
        self.dm_minus.reset(row);
    }

    fn compute_spot(&mut self, bars: &Bars, row: usize) {
        let movement = row.checked_sub(1).and_then(|prev| {
            Some(directional_movement(
                bars.high(row)?,
                bars.low(row)?,
                bars.high(prev)?,
                bars.low(prev)?,
            ))
        });
        let (plus, minus) = movement.unzip();
        self.dm_plus.put(row, plus);
        self.dm_minus.put(row, minus);
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![
            ("dm_plus", self.dm_plus.get(row)),
            ("dm_minus", self.dm_minus.get(row)),
        ]
    }
}

impl Function<Dm> {
    /// Upward movement at `idx`.
    pub fn dm_plus(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.dm_plus.get(idx))
    }

    /// Downward movement at `idx`.
    pub fn dm_minus(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.dm_minus.get(idx))
    }
}
