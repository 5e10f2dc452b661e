//! Directional movement index.

use std::sync::Arc;

use rust_decimal::Decimal;
use tesser_core::{Bars, SessionId, Var};

use crate::core::{BuildContext, ComputePass, Formula, Function, FunctionKind, IndicatorError};
use crate::indicators::Di;
use crate::spec::{FunctionSpec, PeriodParams};
use crate::stats;

/// `|+DI - -DI| / (+DI + -DI) * 100`, zero when both indicators are zero.
#[derive(Debug)]
pub struct Dx {
    di: Arc<Function<Di>>,
    pub(crate) dx: Var<Decimal>,
}

impl FunctionKind for Dx {
    type Params = PeriodParams;

    fn spec(params: &PeriodParams) -> FunctionSpec {
        FunctionSpec::Dx(*params)
    }

    fn build(ctx: &BuildContext<'_>, params: PeriodParams) -> Result<Self, IndicatorError> {
        Ok(Self {
            di: ctx.get::<Di>(params)?,
            dx: Var::new("dx"),
        })
    }
}

impl Formula for Dx {
    fn clear_row(&mut self, row: usize) {
        self.dx.reset(row);
    }

    fn pre_compute(&mut self, pass: &ComputePass<'_>) {
        self.di.compute_to(pass.session, pass.idx);
    }

    fn compute_spot(&mut self, _bars: &Bars, row: usize) {
        let indicators = self
            .di
            .read(|di| Some((di.di_plus.get(row)?, di.di_minus.get(row)?)));
        let dx = indicators.map(|(plus, minus)| {
            stats::ratio_or_zero((plus - minus).abs(), plus + minus) * Decimal::from(100)
        });
        self.dx.put(row, dx);
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("dx", self.dx.get(row))]
    }
}

impl Function<Dx> {
    /// DX at `idx`.
    pub fn dx(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.dx.get(idx))
    }
}
