//! Rolling standard deviation.

use rust_decimal::Decimal;
use tesser_core::{Bars, SessionId, Var};

use crate::core::{BuildContext, Formula, Function, FunctionKind, IndicatorError};
use crate::spec::{FunctionSpec, WindowParams};
use crate::stats;

/// Population standard deviation of a base field over a rolling window.
#[derive(Debug)]
pub struct StdDev {
    params: WindowParams,
    pub(crate) stddev: Var<Decimal>,
}

impl FunctionKind for StdDev {
    type Params = WindowParams;

    fn spec(params: &WindowParams) -> FunctionSpec {
        FunctionSpec::StdDev(*params)
    }

    fn build(_ctx: &BuildContext<'_>, params: WindowParams) -> Result<Self, IndicatorError> {
        Ok(Self {
            params,
            stddev: Var::new("stddev"),
        })
    }
}

impl Formula for StdDev {
    fn clear_row(&mut self, row: usize) {
        self.stddev.reset(row);
    }

    fn compute_spot(&mut self, bars: &Bars, row: usize) {
        let WindowParams { field, period } = self.params;
        let deviation = stats::stddev(row, period, |r| bars.value(field, r));
        self.stddev.put(row, deviation);
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("stddev", self.stddev.get(row))]
    }
}

impl Function<StdDev> {
    /// Standard deviation at `idx`.
    pub fn stddev(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.stddev.get(idx))
    }
}
