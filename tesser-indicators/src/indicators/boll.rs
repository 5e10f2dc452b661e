//! Bollinger bands.

use std::sync::Arc;

use rust_decimal::Decimal;
use tesser_core::{Bars, SessionId, Var};

use crate::core::{BuildContext, ComputePass, Formula, Function, FunctionKind, IndicatorError};
use crate::indicators::{Ma, StdDev};
use crate::spec::{BollParams, FunctionSpec, WindowParams};

/// Moving average with bands `alpha` standard deviations above and below.
#[derive(Debug)]
pub struct Boll {
    alpha: Decimal,
    ma: Arc<Function<Ma>>,
    stddev: Arc<Function<StdDev>>,
    pub(crate) middle: Var<Decimal>,
    pub(crate) upper: Var<Decimal>,
    pub(crate) lower: Var<Decimal>,
}

impl FunctionKind for Boll {
    type Params = BollParams;

    fn spec(params: &BollParams) -> FunctionSpec {
        FunctionSpec::Boll(*params)
    }

    fn build(ctx: &BuildContext<'_>, params: BollParams) -> Result<Self, IndicatorError> {
        let window = WindowParams::new(params.field, params.period);
        Ok(Self {
            alpha: params.alpha,
            ma: ctx.get::<Ma>(window)?,
            stddev: ctx.get::<StdDev>(window)?,
            middle: Var::new("boll_middle"),
            upper: Var::new("boll_upper"),
            lower: Var::new("boll_lower"),
        })
    }
}

impl Formula for Boll {
    fn clear_row(&mut self, row: usize) {
        self.middle.reset(row);
        self.upper.reset(row);
        self.lower.reset(row);
    }

    fn pre_compute(&mut self, pass: &ComputePass<'_>) {
        self.ma.compute_to(pass.session, pass.idx);
        self.stddev.compute_to(pass.session, pass.idx);
    }

    fn compute_spot(&mut self, _bars: &Bars, row: usize) {
        let middle = self.ma.read(|ma| ma.ma.get(row));
        let deviation = self.stddev.read(|stddev| stddev.stddev.get(row));
        let width = deviation.map(|deviation| deviation * self.alpha);
        self.middle.put(row, middle);
        self.upper.put(row, middle.zip(width).map(|(m, w)| m + w));
        self.lower.put(row, middle.zip(width).map(|(m, w)| m - w));
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![
            ("middle", self.middle.get(row)),
            ("upper", self.upper.get(row)),
            ("lower", self.lower.get(row)),
        ]
    }
}

impl Function<Boll> {
    /// Middle band at `idx`.
    pub fn boll_middle(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.middle.get(idx))
    }

    /// Upper band at `idx`.
    pub fn boll_upper(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.upper.get(idx))
    }

    /// Lower band at `idx`.
    pub fn boll_lower(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.lower.get(idx))
    }
}
