//! Average directional index.

use std::sync::Arc;

use rust_decimal::Decimal;
use tesser_core::{Bars, SessionId, Var};

use crate::core::{BuildContext, ComputePass, Formula, Function, FunctionKind, IndicatorError};
use crate::indicators::Dx;
use crate::spec::{AdxParams, FunctionSpec, PeriodParams};
use crate::stats;

/// Moving average of DX over `period_adx` rows.
#[derive(Debug)]
pub struct Adx {
    period_adx: usize,
    dx: Arc<Function<Dx>>,
    pub(crate) adx: Var<Decimal>,
}

impl FunctionKind for Adx {
    type Params = AdxParams;

    fn spec(params: &AdxParams) -> FunctionSpec {
        FunctionSpec::Adx(*params)
    }

    fn build(ctx: &BuildContext<'_>, params: AdxParams) -> Result<Self, IndicatorError> {
        Ok(Self {
            period_adx: params.period_adx,
            dx: ctx.get::<Dx>(PeriodParams::new(params.period))?,
            adx: Var::new("adx"),
        })
    }
}

impl Formula for Adx {
    fn clear_row(&mut self, row: usize) {
        self.adx.reset(row);
    }

    fn pre_compute(&mut self, pass: &ComputePass<'_>) {
        self.dx.compute_to(pass.session, pass.idx);
    }

    fn compute_spot(&mut self, _bars: &Bars, row: usize) {
        let adx = stats::mean(row, self.period_adx, |r| self.dx.read(|dx| dx.dx.get(r)));
        self.adx.put(row, adx);
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("adx", self.adx.get(row))]
    }
}

impl Function<Adx> {
    /// ADX at `idx`.
    pub fn adx(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.adx.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::registry::FunctionRegistry;
    use crate::test_support::hlc_series;

    #[test]
    fn smooths_dx() {
        let series = hlc_series(&[
            (dec!(10), dec!(8), dec!(9)),
            (dec!(11), dec!(9), dec!(10)),
            (dec!(12), dec!(10), dec!(11)),
            (dec!(11), dec!(9), dec!(10)),
        ]);
        let registry = FunctionRegistry::new();
        let adx = registry
            .get::<Adx>(&series, AdxParams { period: 2, period_adx: 2 })
            .unwrap();
        let session = series.session();
        assert_eq!(adx.adx(session, 2), None);
        assert_eq!(adx.adx(session, 3), Some(dec!(50)));
    }

    #[test]
    fn shares_the_dx_instance() {
        let series = hlc_series(&[(dec!(10), dec!(8), dec!(9)); 3]);
        let registry = FunctionRegistry::new();
        let _adx = registry
            .get::<Adx>(&series, AdxParams { period: 14, period_adx: 14 })
            .unwrap();
        // ADX, DX, DI, DM and TR
        assert_eq!(registry.live_count(&series), 5);
        let dx = registry.get::<Dx>(&series, PeriodParams::new(14)).unwrap();
        assert_eq!(registry.live_count(&series), 5);
        drop(dx);
    }
}
