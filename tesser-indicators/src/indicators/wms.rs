//! Williams %R.

use std::sync::Arc;

use rust_decimal::Decimal;
use tesser_core::{Bars, Field, SessionId, Var};

use crate::core::{BuildContext, ComputePass, Formula, Function, FunctionKind, IndicatorError};
use crate::indicators::{Max, Min};
use crate::spec::{FunctionSpec, PeriodParams, WindowParams};
use crate::stats;

/// `(HH - C) / (HH - LL) * 100`, zero on a flat range.
#[derive(Debug)]
pub struct Wms {
    highest: Arc<Function<Max>>,
    lowest: Arc<Function<Min>>,
    pub(crate) wms: Var<Decimal>,
}

impl FunctionKind for Wms {
    type Params = PeriodParams;

    fn spec(params: &PeriodParams) -> FunctionSpec {
        FunctionSpec::Wms(*params)
    }

    fn build(ctx: &BuildContext<'_>, params: PeriodParams) -> Result<Self, IndicatorError> {
        Ok(Self {
            highest: ctx.get::<Max>(WindowParams::new(Field::High, params.period))?,
            lowest: ctx.get::<Min>(WindowParams::new(Field::Low, params.period))?,
            wms: Var::new("wms"),
        })
    }
}

impl Formula for Wms {
    fn clear_row(&mut self, row: usize) {
        self.wms.reset(row);
    }

    fn pre_compute(&mut self, pass: &ComputePass<'_>) {
        self.highest.compute_to(pass.session, pass.idx);
        self.lowest.compute_to(pass.session, pass.idx);
    }

    fn compute_spot(&mut self, bars: &Bars, row: usize) {
        let highest = self.highest.read(|max| max.max.get(row));
        let lowest = self.lowest.read(|min| min.min.get(row));
        let wms = match (highest, lowest, bars.close(row)) {
            (Some(highest), Some(lowest), Some(close)) => {
                Some(stats::ratio_or_zero(highest - close, highest - lowest) * Decimal::from(100))
            }
            _ => None,
        };
        self.wms.put(row, wms);
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("wms", self.wms.get(row))]
    }
}

impl Function<Wms> {
    /// Williams %R at `idx`.
    pub fn wms(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.wms.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::registry::FunctionRegistry;
    use crate::test_support::hlc_series;

    #[test]
    fn measures_distance_from_the_high() {
        let series = hlc_series(&[
            (dec!(10), dec!(8), dec!(9)),
            (dec!(12), dec!(9), dec!(11)),
            (dec!(11), dec!(7), dec!(8)),
        ]);
        let registry = FunctionRegistry::new();
        let wms = registry.get::<Wms>(&series, PeriodParams::new(2)).unwrap();
        let session = series.session();
        assert_eq!(wms.wms(session, 0), None);
        assert_eq!(wms.wms(session, 1), Some(dec!(25)));
        assert_eq!(wms.wms(session, 2), Some(dec!(80)));
    }

    #[test]
    fn shares_extremes_with_stochastics() {
        use crate::indicators::Stoch;
        use crate::spec::StochParams;

        let series = hlc_series(&[(dec!(10), dec!(8), dec!(9)); 3]);
        let registry = FunctionRegistry::new();
        let _wms = registry.get::<Wms>(&series, PeriodParams::new(5)).unwrap();
        let _stoch = registry
            .get::<Stoch>(
                &series,
                StochParams {
                    period: 5,
                    period_k: 3,
                    period_d: 3,
                },
            )
            .unwrap();
        // WMS, STOCH and one MAX(high,5) / MIN(low,5) pair
        assert_eq!(registry.live_count(&series), 4);
    }
}
