//! Commodity channel index.

use rust_decimal::Decimal;
use tesser_core::{Bars, SessionId, Var};

use crate::core::{BuildContext, Formula, Function, FunctionKind, IndicatorError};
use crate::spec::{CciParams, FunctionSpec};
use crate::stats;

/// `(TP - MA(TP)) / (alpha * MD)`, with the typical price
/// `TP = (H + 2C + L) / 4` and `MD` the rolling mean of `|TP - MA(TP)|`.
///
/// Zero while the mean deviation is zero.
#[derive(Debug)]
pub struct Cci {
    params: CciParams,
    tp: Var<Decimal>,
    deviation: Var<Decimal>,
    pub(crate) cci: Var<Decimal>,
}

impl FunctionKind for Cci {
    type Params = CciParams;

    fn spec(params: &CciParams) -> FunctionSpec {
        FunctionSpec::Cci(*params)
    }

    fn build(_ctx: &BuildContext<'_>, params: CciParams) -> Result<Self, IndicatorError> {
        Ok(Self {
            params,
            tp: Var::new("cci_tp"),
            deviation: Var::new("cci_deviation"),
            cci: Var::new("cci"),
        })
    }
}

fn typical_price(bars: &Bars, row: usize) -> Option<Decimal> {
    let (high, low, close) = (bars.high(row)?, bars.low(row)?, bars.close(row)?);
    Some((high + close * Decimal::from(2) + low) / Decimal::from(4))
}

impl Formula for Cci {
    fn clear_row(&mut self, row: usize) {
        self.tp.reset(row);
        self.deviation.reset(row);
        self.cci.reset(row);
    }

    fn compute_spot(&mut self, bars: &Bars, row: usize) {
        let CciParams { period, alpha } = self.params;
        let tp = typical_price(bars, row);
        self.tp.put(row, tp);

        let average = stats::mean(row, period, |r| self.tp.get(r));
        let spread = tp.zip(average).map(|(tp, average)| tp - average);
        self.deviation.put(row, spread.map(|spread| spread.abs()));

        let mean_deviation = stats::mean(row, period, |r| self.deviation.get(r));
        let cci = spread
            .zip(mean_deviation)
            .map(|(spread, md)| stats::ratio_or_zero(spread, alpha * md));
        self.cci.put(row, cci);
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("cci", self.cci.get(row))]
    }
}

impl Function<Cci> {
    /// CCI at `idx`.
    pub fn cci(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.cci.get(idx))
    }
}
