//! Moving Average Convergence Divergence.

use std::sync::Arc;

use rust_decimal::Decimal;
use tesser_core::{Bars, SessionId, Var};

use crate::core::{BuildContext, ComputePass, Formula, Function, FunctionKind, IndicatorError};
use crate::indicators::Ema;
use crate::spec::{FunctionSpec, MacdParams, WindowParams};
use crate::stats;

/// MACD line (fast EMA minus slow EMA), its signal line (an EMA of the MACD
/// line) and the histogram between the two.
#[derive(Debug)]
pub struct Macd {
    signal_period: usize,
    fast: Arc<Function<Ema>>,
    slow: Arc<Function<Ema>>,
    pub(crate) macd: Var<Decimal>,
    pub(crate) signal: Var<Decimal>,
    pub(crate) histogram: Var<Decimal>,
}

impl FunctionKind for Macd {
    type Params = MacdParams;

    fn spec(params: &MacdParams) -> FunctionSpec {
        FunctionSpec::Macd(*params)
    }

    fn build(ctx: &BuildContext<'_>, params: MacdParams) -> Result<Self, IndicatorError> {
        Ok(Self {
            signal_period: params.signal,
            fast: ctx.get::<Ema>(WindowParams::new(params.field, params.fast))?,
            slow: ctx.get::<Ema>(WindowParams::new(params.field, params.slow))?,
            macd: Var::new("macd"),
            signal: Var::new("macd_signal"),
            histogram: Var::new("macd_histogram"),
        })
    }
}

impl Formula for Macd {
    fn clear_row(&mut self, row: usize) {
        self.macd.reset(row);
        self.signal.reset(row);
        self.histogram.reset(row);
    }

    fn pre_compute(&mut self, pass: &ComputePass<'_>) {
        self.fast.compute_to(pass.session, pass.idx);
        self.slow.compute_to(pass.session, pass.idx);
    }

    fn compute_spot(&mut self, _bars: &Bars, row: usize) {
        let fast = self.fast.read(|ema| ema.ema.get(row));
        let slow = self.slow.read(|ema| ema.ema.get(row));
        let macd = fast.zip(slow).map(|(fast, slow)| fast - slow);
        self.macd.put(row, macd);

        let prev = row.checked_sub(1).and_then(|prev| self.signal.get(prev));
        let signal = stats::ema(row, self.signal_period, prev, |r| self.macd.get(r));
        self.signal.put(row, signal);
        self.histogram
            .put(row, macd.zip(signal).map(|(macd, signal)| macd - signal));
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![
            ("macd", self.macd.get(row)),
            ("signal", self.signal.get(row)),
            ("histogram", self.histogram.get(row)),
        ]
    }
}

impl Function<Macd> {
    /// MACD line at `idx`.
    pub fn macd(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.macd.get(idx))
    }

    /// Signal line at `idx`.
    pub fn macd_signal(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.signal.get(idx))
    }

    /// Histogram at `idx`.
    pub fn macd_histogram(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.histogram.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use tesser_core::Field;

    use super::*;
    use crate::registry::FunctionRegistry;
    use crate::test_support::{assert_close, close_series, ints};

    fn params() -> MacdParams {
        MacdParams {
            field: Field::Close,
            fast: 2,
            slow: 3,
            signal: 2,
        }
    }

    #[test]
    fn signal_waits_for_a_full_macd_window() {
        let series = close_series(&ints(&[1, 2, 3, 4, 5, 6]));
        let registry = FunctionRegistry::new();
        let macd = registry.get::<Macd>(&series, params()).unwrap();
        let session = series.session();
        assert_eq!(macd.macd(session, 1), None);
        assert_close(macd.macd(session, 2), dec!(0.5));
        assert_eq!(macd.macd_signal(session, 2), None);
        assert_close(macd.macd_signal(session, 3), dec!(0.5));
        assert_close(macd.macd_histogram(session, 5), Decimal::ZERO);
    }

    #[test]
    fn depends_on_two_shared_emas() {
        let series = close_series(&ints(&[1, 2, 3]));
        let registry = FunctionRegistry::new();
        let _macd = registry.get::<Macd>(&series, params()).unwrap();
        let slow = registry.get::<Ema>(&series, WindowParams::close(3)).unwrap();
        assert_eq!(registry.live_count(&series), 3);
        assert_eq!(slow.ema(series.session(), 2), Some(dec!(2)));
    }
}
