//! Directional indicators.

use std::sync::Arc;

use rust_decimal::Decimal;
use tesser_core::{Bars, SessionId, Var};

use crate::core::{BuildContext, ComputePass, Formula, Function, FunctionKind, IndicatorError};
use crate::indicators::{Dm, Tr};
use crate::spec::{FunctionSpec, PeriodParams};
use crate::stats;

/// `+DI` and `-DI`: averaged directional movement as a percentage of the
/// averaged true range, zero while the averaged range is zero.
#[derive(Debug)]
pub struct Di {
    period: usize,
    dm: Arc<Function<Dm>>,
    tr: Arc<Function<Tr>>,
    pub(crate) di_plus: Var<Decimal>,
    pub(crate) di_minus: Var<Decimal>,
}

impl FunctionKind for Di {
    type Params = PeriodParams;

    fn spec(params: &PeriodParams) -> FunctionSpec {
        FunctionSpec::Di(*params)
    }

    fn build(ctx: &BuildContext<'_>, params: PeriodParams) -> Result<Self, IndicatorError> {
        Ok(Self {
            period: params.period,
            dm: ctx.get::<Dm>(())?,
            tr: ctx.get::<Tr>(())?,
            di_plus: Var::new("di_plus"),
            di_minus: Var::new("di_minus"),
        })
    }
}

impl Di {
    fn indicators(&self, row: usize) -> Option<(Decimal, Decimal)> {
        let dm_plus = stats::mean(row, self.period, |r| self.dm.read(|dm| dm.dm_plus.get(r)))?;
        let dm_minus = stats::mean(row, self.period, |r| self.dm.read(|dm| dm.dm_minus.get(r)))?;
        let tr = stats::mean(row, self.period, |r| self.tr.read(|tr| tr.tr.get(r)))?;
        let hundred = Decimal::from(100);
        Some((
            stats::ratio_or_zero(dm_plus, tr) * hundred,
            stats::ratio_or_zero(dm_minus, tr) * hundred,
        ))
    }
}

impl Formula for Di {
    fn clear_row(&mut self, row: usize) {
        self.di_plus.reset(row);
        self.di_minus.reset(row);
    }

    fn pre_compute(&mut self, pass: &ComputePass<'_>) {
        self.dm.compute_to(pass.session, pass.idx);
        self.tr.compute_to(pass.session, pass.idx);
    }

    fn compute_spot(&mut self, _bars: &Bars, row: usize) {
        let (plus, minus) = self.indicators(row).unzip();
        self.di_plus.put(row, plus);
        self.di_minus.put(row, minus);
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![
            ("di_plus", self.di_plus.get(row)),
            ("di_minus", self.di_minus.get(row)),
        ]
    }
}

impl Function<Di> {
    /// `+DI` at `idx`.
    pub fn di_plus(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.di_plus.get(idx))
    }

    /// `-DI` at `idx`.
    pub fn di_minus(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.di_minus.get(idx))
    }
}
