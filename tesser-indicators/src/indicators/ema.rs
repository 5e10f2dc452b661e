//! Exponential Moving Average (EMA).

use rust_decimal::Decimal;
use tesser_core::{Bars, SessionId, Var};

use crate::core::{BuildContext, Formula, Function, FunctionKind, IndicatorError};
use crate::spec::{FunctionSpec, WindowParams};
use crate::stats;

/// Exponentially-weighted moving average with `alpha = 2 / (period + 1)`.
///
/// The first defined value is the simple mean of the first complete window;
/// every later row folds in the current value against the previous average.
#[derive(Debug)]
pub struct Ema {
    params: WindowParams,
    pub(crate) ema: Var<Decimal>,
}

impl FunctionKind for Ema {
    type Params = WindowParams;

    fn spec(params: &WindowParams) -> FunctionSpec {
        FunctionSpec::Ema(*params)
    }

    fn build(_ctx: &BuildContext<'_>, params: WindowParams) -> Result<Self, IndicatorError> {
        Ok(Self {
            params,
            ema: Var::new("ema"),
        })
    }
}

impl Formula for Ema {
    fn clear_row(&mut self, row: usize) {
        self.ema.reset(row);
    }

    fn compute_spot(&mut self, bars: &Bars, row: usize) {
        let WindowParams { field, period } = self.params;
        let prev = row.checked_sub(1).and_then(|prev| self.ema.get(prev));
        let ema = stats::ema(row, period, prev, |r| bars.value(field, r));
        self.ema.put(row, ema);
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("ema", self.ema.get(row))]
    }
}

impl Function<Ema> {
    /// Exponential average at `idx`.
    pub fn ema(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.ema.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::registry::FunctionRegistry;
    use crate::test_support::{close_series, ints};

    #[test]
    fn ema_seeds_with_sma() {
        let series = close_series(&ints(&[1, 2, 3, 4]));
        let registry = FunctionRegistry::new();
        let ema = registry.get::<Ema>(&series, WindowParams::close(3)).unwrap();
        let session = series.session();
        assert_eq!(ema.ema(session, 1), None);
        assert_eq!(ema.ema(session, 2), Some(dec!(2)));
        // alpha = 0.5: 2 + (4 - 2) * 0.5
        assert_eq!(ema.ema(session, 3), Some(dec!(3)));
    }

    #[test]
    fn incremental_rows_match_a_single_pass() {
        let closes = ints(&[5, 7, 6, 9, 11, 10, 12]);
        let registry = FunctionRegistry::new();

        let whole = close_series(&closes);
        let once = registry.get::<Ema>(&whole, WindowParams::close(3)).unwrap();
        let expected = once.ema(whole.session(), 6);

        let stepped = close_series(&closes);
        let ema = registry.get::<Ema>(&stepped, WindowParams::close(3)).unwrap();
        for idx in 0..=6 {
            ema.ema(stepped.session(), idx);
        }
        assert_eq!(ema.ema(stepped.session(), 6), expected);
    }
}
