//! Rolling minimum.

use rust_decimal::Decimal;
use tesser_core::{Bars, SessionId, Var};

use crate::core::{BuildContext, Formula, Function, FunctionKind, IndicatorError};
use crate::spec::{FunctionSpec, WindowParams};
use crate::stats;

/// Lowest value of a base field over a rolling window.
#[derive(Debug)]
pub struct Min {
    params: WindowParams,
    pub(crate) min: Var<Decimal>,
}

impl FunctionKind for Min {
    type Params = WindowParams;

    fn spec(params: &WindowParams) -> FunctionSpec {
        FunctionSpec::Min(*params)
    }

    fn build(_ctx: &BuildContext<'_>, params: WindowParams) -> Result<Self, IndicatorError> {
        Ok(Self {
            params,
            min: Var::new("min"),
        })
    }
}

impl Formula for Min {
    fn clear_row(&mut self, row: usize) {
        self.min.reset(row);
    }

    fn compute_spot(&mut self, bars: &Bars, row: usize) {
        let WindowParams { field, period } = self.params;
        self.min.put(row, stats::min(row, period, |r| bars.value(field, r)));
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("min", self.min.get(row))]
    }
}

impl Function<Min> {
    /// Window minimum at `idx`.
    pub fn min(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.min.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use tesser_core::Field;

    use super::*;
    use crate::registry::FunctionRegistry;
    use crate::test_support::hlc_series;

    #[test]
    fn tracks_the_lowest_low() {
        let series = hlc_series(&[
            (dec!(10), dec!(8), dec!(9)),
            (dec!(12), dec!(9), dec!(11)),
            (dec!(11), dec!(7), dec!(8)),
            (dec!(13), dec!(10), dec!(12)),
        ]);
        let registry = FunctionRegistry::new();
        let min = registry
            .get::<Min>(&series, WindowParams::new(Field::Low, 3))
            .unwrap();
        let session = series.session();
        assert_eq!(min.min(session, 1), None);
        assert_eq!(min.min(session, 2), Some(dec!(7)));
        assert_eq!(min.min(session, 3), Some(dec!(7)));
    }
}
