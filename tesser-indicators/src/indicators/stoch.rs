//! Stochastic oscillator.

use std::sync::Arc;

use rust_decimal::Decimal;
use tesser_core::{Bars, Field, SessionId, Var};

use crate::core::{BuildContext, ComputePass, Formula, Function, FunctionKind, IndicatorError};
use crate::indicators::{Max, Min};
use crate::spec::{FunctionSpec, StochParams, WindowParams};
use crate::stats;

/// Stochastic K/D/J lines.
///
/// The raw value `(C - LL) / (HH - LL) * 100` (zero on a flat range) is
/// smoothed into `K`, `K` into `D`, and `J = 3K - 2D`.
#[derive(Debug)]
pub struct Stoch {
    period_k: usize,
    period_d: usize,
    highest: Arc<Function<Max>>,
    lowest: Arc<Function<Min>>,
    raw: Var<Decimal>,
    pub(crate) k: Var<Decimal>,
    pub(crate) d: Var<Decimal>,
    pub(crate) j: Var<Decimal>,
}

impl FunctionKind for Stoch {
    type Params = StochParams;

    fn spec(params: &StochParams) -> FunctionSpec {
        FunctionSpec::Stoch(*params)
    }

    fn build(ctx: &BuildContext<'_>, params: StochParams) -> Result<Self, IndicatorError> {
        Ok(Self {
            period_k: params.period_k,
            period_d: params.period_d,
            highest: ctx.get::<Max>(WindowParams::new(Field::High, params.period))?,
            lowest: ctx.get::<Min>(WindowParams::new(Field::Low, params.period))?,
            raw: Var::new("stoch_raw"),
            k: Var::new("stoch_k"),
            d: Var::new("stoch_d"),
            j: Var::new("stoch_j"),
        })
    }
}

impl Stoch {
    fn raw_value(&self, bars: &Bars, row: usize) -> Option<Decimal> {
        let highest = self.highest.read(|max| max.max.get(row))?;
        let lowest = self.lowest.read(|min| min.min.get(row))?;
        let close = bars.close(row)?;
        Some(stats::ratio_or_zero(close - lowest, highest - lowest) * Decimal::from(100))
    }
}

impl Formula for Stoch {
    fn clear_row(&mut self, row: usize) {
        self.raw.reset(row);
        self.k.reset(row);
        self.d.reset(row);
        self.j.reset(row);
    }

    fn pre_compute(&mut self, pass: &ComputePass<'_>) {
        self.highest.compute_to(pass.session, pass.idx);
        self.lowest.compute_to(pass.session, pass.idx);
    }

    fn compute_spot(&mut self, bars: &Bars, row: usize) {
        let raw = self.raw_value(bars, row);
        self.raw.put(row, raw);
        let k = stats::mean(row, self.period_k, |r| self.raw.get(r));
        self.k.put(row, k);
        let d = stats::mean(row, self.period_d, |r| self.k.get(r));
        self.d.put(row, d);
        let j = k
            .zip(d)
            .map(|(k, d)| k * Decimal::from(3) - d * Decimal::from(2));
        self.j.put(row, j);
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![
            ("k", self.k.get(row)),
            ("d", self.d.get(row)),
            ("j", self.j.get(row)),
        ]
    }
}

impl Function<Stoch> {
    /// `K` at `idx`.
    pub fn stoch_k(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.k.get(idx))
    }

    /// `D` at `idx`.
    pub fn stoch_d(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.d.get(idx))
    }

    /// `J` at `idx`.
    pub fn stoch_j(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.j.get(idx))
    }
}
