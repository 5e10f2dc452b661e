//! Momentum.

use rust_decimal::Decimal;
use tesser_core::{Bars, SessionId, Var};

use crate::core::{BuildContext, Formula, Function, FunctionKind, IndicatorError};
use crate::spec::{FunctionSpec, SmoothedParams};
use crate::stats;

/// Difference between the current value and the value `period` rows back,
/// plus its moving average over `period_smooth` rows.
#[derive(Debug)]
pub struct Mtm {
    params: SmoothedParams,
    pub(crate) mtm: Var<Decimal>,
    pub(crate) mtm_ma: Var<Decimal>,
}

impl FunctionKind for Mtm {
    type Params = SmoothedParams;

    fn spec(params: &SmoothedParams) -> FunctionSpec {
        FunctionSpec::Mtm(*params)
    }

    fn build(_ctx: &BuildContext<'_>, params: SmoothedParams) -> Result<Self, IndicatorError> {
        Ok(Self {
            params,
            mtm: Var::new("mtm"),
            mtm_ma: Var::new("mtm_ma"),
        })
    }
}

impl Formula for Mtm {
    fn clear_row(&mut self, row: usize) {
        self.mtm.reset(row);
        self.mtm_ma.reset(row);
    }

    fn compute_spot(&mut self, bars: &Bars, row: usize) {
        let SmoothedParams {
            field,
            period,
            period_smooth,
        } = self.params;
        let mtm = row
            .checked_sub(period)
            .and_then(|base| Some(bars.value(field, row)? - bars.value(field, base)?));
        self.mtm.put(row, mtm);
        let smoothed = stats::mean(row, period_smooth, |r| self.mtm.get(r));
        self.mtm_ma.put(row, smoothed);
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("mtm", self.mtm.get(row)), ("mtm_ma", self.mtm_ma.get(row))]
    }
}

impl Function<Mtm> {
    /// Momentum at `idx`.
    pub fn mtm(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.mtm.get(idx))
    }

    /// Smoothed momentum at `idx`.
    pub fn mtm_ma(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.mtm_ma.get(idx))
    }
}
