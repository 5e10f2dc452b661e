//! On-balance volume.

use rust_decimal::Decimal;
use tesser_core::{Bars, SessionId, Var};

use crate::core::{BuildContext, Formula, Function, FunctionKind, IndicatorError};
use crate::spec::FunctionSpec;

/// Running total of volume, added on up-closes and subtracted on down-closes.
///
/// Starts at zero on the first row.
#[derive(Debug)]
pub struct Obv {
    pub(crate) obv: Var<Decimal>,
}

impl FunctionKind for Obv {
    type Params = ();

    fn spec(_params: &()) -> FunctionSpec {
        FunctionSpec::Obv
    }

    fn build(_ctx: &BuildContext<'_>, _params: ()) -> Result<Self, IndicatorError> {
        Ok(Self {
            obv: Var::new("obv"),
        })
    }
}

impl Obv {
    fn balance(&self, bars: &Bars, row: usize) -> Option<Decimal> {
        let Some(prev) = row.checked_sub(1) else {
            return Some(Decimal::ZERO);
        };
        let running = self.obv.get(prev)?;
        let (close, prev_close) = (bars.close(row)?, bars.close(prev)?);
        let volume = bars.volume(row)?;
        Some(if close > prev_close {
            running + volume
        } else if close < prev_close {
            running - volume
        } else {
            running
        })
    }
}

impl Formula for Obv {
    fn clear_row(&mut self, row: usize) {
        self.obv.reset(row);
    }

    fn compute_spot(&mut self, bars: &Bars, row: usize) {
        let balance = self.balance(bars, row);
        self.obv.put(row, balance);
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("obv", self.obv.get(row))]
    }
}

impl Function<Obv> {
    /// Running balance at `idx`.
    pub fn obv(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.obv.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::registry::FunctionRegistry;
    use crate::test_support::hlcv_series;

    #[test]
    fn accumulates_signed_volume() {
        let series = hlcv_series(&[
            (dec!(10), dec!(10), dec!(10), dec!(1)),
            (dec!(11), dec!(11), dec!(11), dec!(2)),
            (dec!(11), dec!(11), dec!(11), dec!(3)),
            (dec!(9), dec!(9), dec!(9), dec!(4)),
        ]);
        let registry = FunctionRegistry::new();
        let obv = registry.get::<Obv>(&series, ()).unwrap();
        let session = series.session();
        assert_eq!(obv.obv(session, 0), Some(dec!(0)));
        assert_eq!(obv.obv(session, 1), Some(dec!(2)));
        assert_eq!(obv.obv(session, 2), Some(dec!(2)));
        assert_eq!(obv.obv(session, 3), Some(dec!(-2)));
    }
}
