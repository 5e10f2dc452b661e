//! Rolling maximum.

use rust_decimal::Decimal;
use tesser_core::{Bars, SessionId, Var};

use crate::core::{BuildContext, Formula, Function, FunctionKind, IndicatorError};
use crate::spec::{FunctionSpec, WindowParams};
use crate::stats;

/// Highest value of a base field over a rolling window.
#[derive(Debug)]
pub struct Max {
    params: WindowParams,
    pub(crate) max: Var<Decimal>,
}

impl FunctionKind for Max {
    type Params = WindowParams;

    fn spec(params: &WindowParams) -> FunctionSpec {
        FunctionSpec::Max(*params)
    }

    fn build(_ctx: &BuildContext<'_>, params: WindowParams) -> Result<Self, IndicatorError> {
        Ok(Self {
            params,
            max: Var::new("max"),
        })
    }
}

impl Formula for Max {
    fn clear_row(&mut self, row: usize) {
        self.max.reset(row);
    }

    fn compute_spot(&mut self, bars: &Bars, row: usize) {
        let WindowParams { field, period } = self.params;
        self.max.put(row, stats::max(row, period, |r| bars.value(field, r)));
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("max", self.max.get(row))]
    }
}

impl Function<Max> {
    /// Window maximum at `idx`.
    pub fn max(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.max.get(idx))
    }
}
