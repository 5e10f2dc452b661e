//! Rate of change.

use rust_decimal::Decimal;
use tesser_core::{Bars, SessionId, Var};

use crate::core::{BuildContext, Formula, Function, FunctionKind, IndicatorError};
use crate::spec::{FunctionSpec, SmoothedParams};
use crate::stats;

/// Percentage change against the value `period` rows back, plus its moving
/// average over `period_smooth` rows. Zero when the base value is zero.
#[derive(Debug)]
pub struct Roc {
    params: SmoothedParams,
    pub(crate) roc: Var<Decimal>,
    pub(crate) roc_ma: Var<Decimal>,
}

impl FunctionKind for Roc {
    type Params = SmoothedParams;

    fn spec(params: &SmoothedParams) -> FunctionSpec {
        FunctionSpec::Roc(*params)
    }

    fn build(_ctx: &BuildContext<'_>, params: SmoothedParams) -> Result<Self, IndicatorError> {
        Ok(Self {
            params,
            roc: Var::new("roc"),
            roc_ma: Var::new("roc_ma"),
        })
    }
}

impl Formula for Roc {
    fn clear_row(&mut self, row: usize) {
        self.roc.reset(row);
        self.roc_ma.reset(row);
    }

    fn compute_spot(&mut self, bars: &Bars, row: usize) {
        let SmoothedParams {
            field,
            period,
            period_smooth,
        } = self.params;
        let roc = row.checked_sub(period).and_then(|base| {
            let (current, base) = (bars.value(field, row)?, bars.value(field, base)?);
            Some(stats::ratio_or_zero(current - base, base) * Decimal::from(100))
        });
        self.roc.put(row, roc);
        let smoothed = stats::mean(row, period_smooth, |r| self.roc.get(r));
        self.roc_ma.put(row, smoothed);
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("roc", self.roc.get(row)), ("roc_ma", self.roc_ma.get(row))]
    }
}

impl Function<Roc> {
    /// Rate of change at `idx`, in percent.
    pub fn roc(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.roc.get(idx))
    }

    /// Smoothed rate of change at `idx`.
    pub fn roc_ma(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.roc_ma.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use tesser_core::Field;

    use super::*;
    use crate::registry::FunctionRegistry;
    use crate::test_support::{close_series, ints};

    fn params() -> SmoothedParams {
        SmoothedParams {
            field: Field::Close,
            period: 2,
            period_smooth: 2,
        }
    }

    #[test]
    fn reports_percentage_change() {
        let series = close_series(&ints(&[1, 2, 4, 7]));
        let registry = FunctionRegistry::new();
        let roc = registry.get::<Roc>(&series, params()).unwrap();
        let session = series.session();
        assert_eq!(roc.roc(session, 1), None);
        assert_eq!(roc.roc(session, 2), Some(dec!(300)));
        assert_eq!(roc.roc(session, 3), Some(dec!(250)));
        assert_eq!(roc.roc_ma(session, 3), Some(dec!(275)));
    }

    #[test]
    fn zero_base_scores_zero() {
        let series = close_series(&ints(&[0, 1, 2]));
        let registry = FunctionRegistry::new();
        let roc = registry.get::<Roc>(&series, params()).unwrap();
        assert_eq!(roc.roc(series.session(), 2), Some(Decimal::ZERO));
    }
}
