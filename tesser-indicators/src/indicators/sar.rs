//! Parabolic stop-and-reverse.

use rust_decimal::Decimal;
use tesser_core::{Bars, Direction, SessionId, Var};

use crate::core::{BuildContext, Formula, Function, FunctionKind, IndicatorError};
use crate::spec::{FunctionSpec, SarParams};

/// Wilder's parabolic SAR.
///
/// The first row starts long with the stop at its low. Each row moves the
/// stop toward the extreme point by the acceleration factor, never past the
/// previous two bars' lows (long) or highs (short). Price crossing the stop
/// reverses the trend: the stop jumps to the old extreme and acceleration
/// restarts at `initial`.
#[derive(Debug)]
pub struct Sar {
    params: SarParams,
    pub(crate) sar: Var<Decimal>,
    pub(crate) direction: Var<Direction>,
    extreme: Var<Decimal>,
    acceleration: Var<Decimal>,
}

#[derive(Clone, Copy)]
struct SarState {
    sar: Decimal,
    direction: Direction,
    extreme: Decimal,
    acceleration: Decimal,
}

impl FunctionKind for Sar {
    type Params = SarParams;

    fn spec(params: &SarParams) -> FunctionSpec {
        FunctionSpec::Sar(*params)
    }

    fn build(_ctx: &BuildContext<'_>, params: SarParams) -> Result<Self, IndicatorError> {
        Ok(Self {
            params,
            sar: Var::new("sar"),
            direction: Var::new("sar_direction"),
            extreme: Var::new("sar_extreme"),
            acceleration: Var::new("sar_acceleration"),
        })
    }
}

impl Sar {
    fn state(&self, row: usize) -> Option<SarState> {
        Some(SarState {
            sar: self.sar.get(row)?,
            direction: self.direction.get(row)?,
            extreme: self.extreme.get(row)?,
            acceleration: self.acceleration.get(row)?,
        })
    }

    fn next_state(&self, bars: &Bars, row: usize) -> Option<SarState> {
        let SarParams {
            initial,
            step,
            maximum,
        } = self.params;
        let (high, low) = (bars.high(row)?, bars.low(row)?);
        let Some(prev) = row.checked_sub(1) else {
            return Some(SarState {
                sar: low,
                direction: Direction::Long,
                extreme: high,
                acceleration: initial,
            });
        };
        let last = self.state(prev)?;
        let earlier = prev.checked_sub(1);
        let mut sar = last.sar + last.acceleration * (last.extreme - last.sar);

        let next = match last.direction {
            Direction::Long => {
                sar = sar.min(bars.low(prev)?);
                if let Some(earlier) = earlier {
                    sar = sar.min(bars.low(earlier)?);
                }
                if low < sar {
                    SarState {
                        sar: last.extreme,
                        direction: Direction::Short,
                        extreme: low,
                        acceleration: initial,
                    }
                } else if high > last.extreme {
                    SarState {
                        sar,
                        direction: Direction::Long,
                        extreme: high,
                        acceleration: (last.acceleration + step).min(maximum),
                    }
                } else {
                    SarState { sar, ..last }
                }
            }
            Direction::Short => {
                sar = sar.max(bars.high(prev)?);
                if let Some(earlier) = earlier {
                    sar = sar.max(bars.high(earlier)?);
                }
                if high > sar {
                    SarState {
                        sar: last.extreme,
                        direction: Direction::Long,
                        extreme: high,
                        acceleration: initial,
                    }
                } else if low < last.extreme {
                    SarState {
                        sar,
                        direction: Direction::Short,
                        extreme: low,
                        acceleration: (last.acceleration + step).min(maximum),
                    }
                } else {
                    SarState { sar, ..last }
                }
            }
        };
        Some(next)
    }
}

impl Formula for Sar {
    fn clear_row(&mut self, row: usize) {
        self.sar.reset(row);
        self.direction.reset(row);
        self.extreme.reset(row);
        self.acceleration.reset(row);
    }

    fn compute_spot(&mut self, bars: &Bars, row: usize) {
        let Some(state) = self.next_state(bars, row) else {
            return;
        };
        self.sar.set(row, state.sar);
        self.direction.set(row, state.direction);
        self.extreme.set(row, state.extreme);
        self.acceleration.set(row, state.acceleration);
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![
            ("sar", self.sar.get(row)),
            ("direction", self.direction.get(row).map(Direction::signum)),
        ]
    }
}

impl Function<Sar> {
    /// Stop level at `idx`.
    pub fn sar(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.sar.get(idx))
    }

    /// Trend direction at `idx`.
    pub fn sar_direction(&self, session: SessionId, idx: usize) -> Option<Direction> {
        self.compute_to(session, idx);
        self.read(|f| f.direction.get(idx))
    }
}
