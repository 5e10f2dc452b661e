//! Relative Strength Index (RSI).

use rust_decimal::Decimal;
use tesser_core::{Bars, SessionId, Var};

use crate::core::{BuildContext, Formula, Function, FunctionKind, IndicatorError};
use crate::spec::{FunctionSpec, PeriodParams};
use crate::stats;

/// `100 * up / (up + down)` over rolling sums of close-to-close gains and
/// losses, scaled between 0 and 100. Zero on a window with no movement.
#[derive(Debug)]
pub struct Rsi {
    period: usize,
    up: Var<Decimal>,
    down: Var<Decimal>,
    pub(crate) rsi: Var<Decimal>,
}

impl FunctionKind for Rsi {
    type Params = PeriodParams;

    fn spec(params: &PeriodParams) -> FunctionSpec {
        FunctionSpec::Rsi(*params)
    }

    fn build(_ctx: &BuildContext<'_>, params: PeriodParams) -> Result<Self, IndicatorError> {
        Ok(Self {
            period: params.period,
            up: Var::new("rsi_up"),
            down: Var::new("rsi_down"),
            rsi: Var::new("rsi"),
        })
    }
}

fn close_change(bars: &Bars, row: usize) -> Option<Decimal> {
    let prev = row.checked_sub(1)?;
    Some(bars.close(row)? - bars.close(prev)?)
}

impl Formula for Rsi {
    fn clear_row(&mut self, row: usize) {
        self.up.reset(row);
        self.down.reset(row);
        self.rsi.reset(row);
    }

    fn compute_spot(&mut self, bars: &Bars, row: usize) {
        let change = close_change(bars, row);
        self.up.put(row, change.map(|c| c.max(Decimal::ZERO)));
        self.down.put(row, change.map(|c| (-c).max(Decimal::ZERO)));

        let up = stats::sum(row, self.period, |r| self.up.get(r));
        let down = stats::sum(row, self.period, |r| self.down.get(r));
        let rsi = up
            .zip(down)
            .map(|(up, down)| stats::ratio_or_zero(up * Decimal::from(100), up + down));
        self.rsi.put(row, rsi);
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("rsi", self.rsi.get(row))]
    }
}

impl Function<Rsi> {
    /// RSI at `idx`.
    pub fn rsi(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.rsi.get(idx))
    }
}
