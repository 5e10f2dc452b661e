//! Simple Moving Average (MA).

use rust_decimal::Decimal;
use tesser_core::{Bars, SessionId, Var};

use crate::core::{BuildContext, Formula, Function, FunctionKind, IndicatorError};
use crate::spec::{FunctionSpec, WindowParams};
use crate::stats;

/// Arithmetic mean of a base field over a rolling window.
#[derive(Debug)]
pub struct Ma {
    params: WindowParams,
    pub(crate) ma: Var<Decimal>,
}

impl FunctionKind for Ma {
    type Params = WindowParams;

    fn spec(params: &WindowParams) -> FunctionSpec {
        FunctionSpec::Ma(*params)
    }

    fn build(_ctx: &BuildContext<'_>, params: WindowParams) -> Result<Self, IndicatorError> {
        Ok(Self {
            params,
            ma: Var::new("ma"),
        })
    }
}

impl Formula for Ma {
    fn clear_row(&mut self, row: usize) {
        self.ma.reset(row);
    }

    fn compute_spot(&mut self, bars: &Bars, row: usize) {
        let WindowParams { field, period } = self.params;
        self.ma.put(row, stats::mean(row, period, |r| bars.value(field, r)));
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("ma", self.ma.get(row))]
    }
}

impl Function<Ma> {
    /// Moving average at `idx`.
    pub fn ma(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.ma.get(idx))
    }
}
