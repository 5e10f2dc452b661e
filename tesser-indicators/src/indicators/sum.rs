//! Rolling sum.

use rust_decimal::Decimal;
use tesser_core::{Bars, SessionId, Var};

use crate::core::{BuildContext, Formula, Function, FunctionKind, IndicatorError};
use crate::spec::{FunctionSpec, WindowParams};
use crate::stats;

/// Sum of a base field over a rolling window.
#[derive(Debug)]
pub struct Sum {
    params: WindowParams,
    pub(crate) sum: Var<Decimal>,
}

impl FunctionKind for Sum {
    type Params = WindowParams;

    fn spec(params: &WindowParams) -> FunctionSpec {
        FunctionSpec::Sum(*params)
    }

    fn build(_ctx: &BuildContext<'_>, params: WindowParams) -> Result<Self, IndicatorError> {
        Ok(Self {
            params,
            sum: Var::new("sum"),
        })
    }
}

impl Formula for Sum {
    fn clear_row(&mut self, row: usize) {
        self.sum.reset(row);
    }

    fn compute_spot(&mut self, bars: &Bars, row: usize) {
        let WindowParams { field, period } = self.params;
        let sum = stats::sum(row, period, |r| bars.value(field, r));
        self.sum.put(row, sum);
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("sum", self.sum.get(row))]
    }
}

impl Function<Sum> {
    /// Window sum at `idx`.
    pub fn sum(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.sum.get(idx))
    }
}
