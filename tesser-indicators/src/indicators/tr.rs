//! True range.

use rust_decimal::Decimal;
use tesser_core::{Bars, SessionId, Var};

use crate::core::{BuildContext, Formula, Function, FunctionKind, IndicatorError};
use crate::spec::FunctionSpec;

/// Largest of `H - L`, `|H - C[-1]|` and `|L - C[-1]|`.
///
/// Undefined on the first row, which has no previous close.
#[derive(Debug)]
pub struct Tr {
    pub(crate) tr: Var<Decimal>,
}

impl FunctionKind for Tr {
    type Params = ();

    fn spec(_params: &()) -> FunctionSpec {
        FunctionSpec::Tr
    }

    fn build(_ctx: &BuildContext<'_>, _params: ()) -> Result<Self, IndicatorError> {
        Ok(Self { tr: Var::new("tr") })
    }
}

fn true_range(bars: &Bars, row: usize) -> Option<Decimal> {
    let prev_close = bars.close(row.checked_sub(1)?)?;
    let (high, low) = (bars.high(row)?, bars.low(row)?);
    let high_low = high - low;
    let high_close = (high - prev_close).abs();
    let low_close = (low - prev_close).abs();
    Some(high_low.max(high_close).max(low_close))
}

impl Formula for Tr {
    fn clear_row(&mut self, row: usize) {
        self.tr.reset(row);
    }

    fn compute_spot(&mut self, bars: &Bars, row: usize) {
        self.tr.put(row, true_range(bars, row));
    }

    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        vec![("tr", self.tr.get(row))]
    }
}

impl Function<Tr> {
    /// True range at `idx`.
    pub fn tr(&self, session: SessionId, idx: usize) -> Option<Decimal> {
        self.compute_to(session, idx);
        self.read(|f| f.tr.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::registry::FunctionRegistry;
    use crate::test_support::hlc_series;

    #[test]
    fn gaps_widen_the_range() {
        let series = hlc_series(&[
            (dec!(10), dec!(9), dec!(9.5)),
            (dec!(11), dec!(10.5), dec!(10.8)),
            (dec!(8), dec!(7.5), dec!(7.8)),
            (dec!(8.2), dec!(7.6), dec!(8)),
        ]);
        let registry = FunctionRegistry::new();
        let tr = registry.get::<Tr>(&series, ()).unwrap();
        let session = series.session();
        assert_eq!(tr.tr(session, 0), None);
        // gap up: |H - C[-1]| = 1.5
        assert_eq!(tr.tr(session, 1), Some(dec!(1.5)));
        // gap down: |L - C[-1]| = 3.3
        assert_eq!(tr.tr(session, 2), Some(dec!(3.3)));
        assert_eq!(tr.tr(session, 3), Some(dec!(0.6)));
    }
}
