//! Money flow index.

use rust_decimal::Decimal;
use tesser_core::{Bars, SessionId, Var};

use crate::core::{BuildContext, Formula, Function, FunctionKind, IndicatorError};
use crate::spec::{FunctionSpec, PeriodParams};
use crate::stats;

/// Volume-weighted momentum: `100 - 100 / (1 + positive / negative)` over
/// the typical price `(H + L + C) / 3`.
///
/// Money flow `TP * V` counts as positive when the typical price rose, as
/// negative when it fell. The index is zero while the negative flow is zero.
#[derive(Debug)]
pub struct Mfi {
    period: usize,
    tp: Var<Decimal>,
    positive_flow: Var<Decimal>,
    negative_flow: Var<Decimal>,
    pub(crate) mfi: Var<Decimal>,
}

impl FunctionKind for Mfi {
    type Params = PeriodParams;

    fn spec(params: &PeriodParams) -> FunctionSpec {
        FunctionSpec::Mfi(*params)
    }

    fn build(_ctx: &BuildContext<'_>, params: PeriodParams) -> Result<Self, IndicatorError> {
        Ok(Self {
            period: params.period,
            tp: Var::new("mfi_tp"),
            positive_flow: Var::new("mfi_positive"),
            negative_flow: Var::new("mfi_negative"),
            mfi: Var::new("mfi"),
        })
    }
}

fn typical_price(bars: &Bars, row: usize) -> Option<Decimal> {
    let (high, low, close) = (bars.high(row)?, bars.low(row)?, bars.close(row)?);
    Some((high + low + close) / Decimal::from(3))
}

impl Mfi {
    fn flows(&self, bars: &Bars, row: usize) -> Option<(Decimal, Decimal)> {
        let tp = self.tp.get(row)?;
        let prev_tp = self.tp.get(row.checked_sub(1)?)?;
        let flow = tp * bars.volume(row)?;
        let zero = Decimal::ZERO;
        Some(if tp > prev_tp {
            (flow, zero)
        } else if tp < prev_tp {
            (zero, flow)
        } else {
            (zero, zero)
        })
    }
}

impl Formula for Mfi {
    fn clear_row(&mut self, row: usize) {
        self.tp.reset(row);
        self.positive_flow.reset(row);
        self.negative_flow.reset(row);
        self.mfi.reset(row);
    }

    fn compute_spot(&mut self, bars: &Bars, row: usize) {
        self.tp.put(row, typical_price(bars, row));

        let (positive, negative) = self.flows(bars, row).unzip();
        self.positive_flow.put(row, positive);
        self.negative_flow.put(row, negative);

        let positive = stats::sum(row, self.period, |r| self.positive_flow.get(r));
        let negative = stats::sum(row, self.period, |r| self.negative_flow.get(r));
        let hundred = Decimal::from(100);
        let mfi = positive.zip(negative).map(|(positive, negative)| {
            if negative.is_zero() {
                Decimal::ZERO
            } else {
                hundred - hundred / (Decimal::ONE + positive / negative)
            }
        });
        self.mfi.put(row, mfi);
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("mfi", self.mfi.get(row))]
    }
}

impl Function<Mfi> {
    /// MFI at `idx`.
    pub fn mfi(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.mfi.get(idx))
    }
}
