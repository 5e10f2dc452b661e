//! The incremental-compute contract shared by every function.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tesser_core::{Bars, Series, SessionId};
use thiserror::Error;
use tracing::trace;

use crate::registry::FunctionRegistry;
use crate::spec::FunctionSpec;

/// Errors raised while constructing functions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndicatorError {
    /// A lookback period was zero.
    #[error("{name} period must be greater than zero (got {period})")]
    InvalidPeriod {
        /// Function kind name.
        name: &'static str,
        /// Offending period.
        period: usize,
    },
    /// Any other parameter outside its valid range.
    #[error("{name} parameter `{parameter}` is invalid: {value}")]
    InvalidParameter {
        /// Function kind name.
        name: &'static str,
        /// Parameter name.
        parameter: &'static str,
        /// Rendered offending value.
        value: String,
    },
}

impl IndicatorError {
    /// Builds an [`IndicatorError::InvalidPeriod`].
    pub fn invalid_period(name: &'static str, period: usize) -> Self {
        Self::InvalidPeriod { name, period }
    }

    /// Builds an [`IndicatorError::InvalidParameter`].
    pub fn invalid_parameter(
        name: &'static str,
        parameter: &'static str,
        value: impl fmt::Display,
    ) -> Self {
        Self::InvalidParameter {
            name,
            parameter,
            value: value.to_string(),
        }
    }
}

/// Rows covered by one `compute_to` pass, handed to the pass hooks.
pub struct ComputePass<'a> {
    /// Session of the pass.
    pub session: SessionId,
    /// First row recomputed by the pass.
    pub begin: usize,
    /// Requested high-water mark; may lie beyond the data.
    pub idx: usize,
    /// Base series rows, locked for the whole pass.
    pub bars: &'a Bars,
}

impl ComputePass<'_> {
    /// Last row the pass actually computes, if any.
    pub fn end(&self) -> Option<usize> {
        self.bars
            .last_row()
            .map(|last| last.min(self.idx))
            .filter(|end| *end >= self.begin)
    }

    /// Whether the pass reaches the last row of the series.
    pub fn reaches_last_row(&self) -> bool {
        self.bars.last_row().is_some_and(|last| self.idx >= last)
    }
}

/// Per-row formula of a function.
///
/// A formula owns its output columns. `compute_spot` may read base rows and
/// dependency outputs up to `row`, and its own rows before `row`.
pub trait Formula: Send + 'static {
    /// Marks `row` undefined in every output column, allocating it if needed.
    fn clear_row(&mut self, row: usize);

    /// Computes every output at `row`.
    fn compute_spot(&mut self, bars: &Bars, row: usize);

    /// Runs before the row loop; dependencies are brought up to date here.
    fn pre_compute(&mut self, _pass: &ComputePass<'_>) {}

    /// Runs after the high-water mark moved.
    fn post_compute(&mut self, _pass: &ComputePass<'_>) {}

    /// Named output values at `row`.
    fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)>;
}

/// A formula the registry knows how to key and construct.
pub trait FunctionKind: Formula + Sized {
    /// Strongly-typed parameters; part of the cache key.
    type Params: Copy + fmt::Debug;

    /// Cache key for `params`.
    fn spec(params: &Self::Params) -> FunctionSpec;

    /// Builds the formula, resolving dependencies through `ctx`.
    fn build(ctx: &BuildContext<'_>, params: Self::Params) -> Result<Self, IndicatorError>;
}

/// Handed to [`FunctionKind::build`] so composite functions can obtain
/// their dependencies from the same registry and series.
pub struct BuildContext<'a> {
    pub(crate) registry: &'a FunctionRegistry,
    pub(crate) series: &'a Arc<Series>,
}

impl BuildContext<'_> {
    /// Resolves a dependency on the same series.
    pub fn get<K: FunctionKind>(&self, params: K::Params) -> Result<Arc<Function<K>>, IndicatorError> {
        self.registry.get::<K>(self.series, params)
    }
}

struct FunctionState<F> {
    session: Option<SessionId>,
    computed_idx: Option<usize>,
    filled_idx: Option<usize>,
    seen_version: u64,
    formula: F,
}

impl<F> FunctionState<F> {
    fn lower_to(&mut self, row: usize) {
        let cap = row.checked_sub(1);
        self.computed_idx = cap_at(self.computed_idx, cap);
        self.filled_idx = cap_at(self.filled_idx, cap);
    }

    fn begin_for(&self, idx: usize) -> usize {
        let next = match (self.computed_idx, self.filled_idx) {
            (Some(computed), Some(filled)) => computed.min(filled) + 1,
            _ => 0,
        };
        next.min(idx)
    }
}

fn cap_at(value: Option<usize>, cap: Option<usize>) -> Option<usize> {
    match (value, cap) {
        (Some(value), Some(cap)) => Some(value.min(cap)),
        _ => None,
    }
}

/// A memoized, incrementally computed function of one series.
///
/// Calls to [`Function::compute_to`] are serialized per instance.
pub struct Function<F> {
    spec: FunctionSpec,
    series: Weak<Series>,
    state: Mutex<FunctionState<F>>,
}

impl<F: Formula> Function<F> {
    pub(crate) fn new(spec: FunctionSpec, series: &Arc<Series>, formula: F) -> Self {
        Self {
            spec,
            series: Arc::downgrade(series),
            state: Mutex::new(FunctionState {
                session: None,
                computed_idx: None,
                filled_idx: None,
                seen_version: series.version(),
                formula,
            }),
        }
    }

    /// Kind and parameters of this instance.
    pub fn spec(&self) -> &FunctionSpec {
        &self.spec
    }

    /// The observed series, while it is alive.
    pub fn series(&self) -> Option<Arc<Series>> {
        self.series.upgrade()
    }

    /// Highest row known valid, as last requested.
    pub fn computed_idx(&self) -> Option<usize> {
        self.state.lock().computed_idx
    }

    /// Session of the last pass.
    pub fn session(&self) -> Option<SessionId> {
        self.state.lock().session
    }

    /// Brings every output up to date through row `idx`.
    ///
    /// Within one session, a request at or below the high-water mark returns
    /// immediately. Requests beyond the data compute as far as rows exist.
    pub fn compute_to(&self, session: SessionId, idx: usize) {
        let Some(series) = self.series.upgrade() else {
            trace!(function = %self.spec, "series dropped; nothing to compute");
            return;
        };
        let bars = series.read();
        let mut state = self.state.lock();

        if let Some(row) = bars.corrected_since(state.seen_version) {
            state.lower_to(row);
        }
        state.seen_version = bars.version();

        if state.session == Some(session) && state.computed_idx.is_some_and(|done| idx <= done) {
            return;
        }
        state.session = Some(session);

        let pass = ComputePass {
            session,
            begin: state.begin_for(idx),
            idx,
            bars: &bars,
        };
        state.formula.pre_compute(&pass);
        let end = pass.end();
        if let Some(end) = end {
            for row in pass.begin..=end {
                state.formula.clear_row(row);
                state.formula.compute_spot(&bars, row);
            }
            state.filled_idx = Some(end);
        }
        state.computed_idx = Some(idx);
        state.formula.post_compute(&pass);

        trace!(
            function = %self.spec,
            session = session.value(),
            begin = pass.begin,
            end = ?end,
            idx,
            "computed function rows"
        );
    }

    /// Computes through the last available row and returns its index.
    pub fn compute_to_end(&self, session: SessionId) -> Option<usize> {
        let last = self.series()?.last_row()?;
        self.compute_to(session, last);
        Some(last)
    }

    /// Lowers the high-water mark so the next pass recomputes from `row`.
    pub fn invalidate_from(&self, row: usize) {
        self.state.lock().lower_to(row);
    }

    /// Reads the formula under the instance lock.
    pub fn read<R>(&self, read: impl FnOnce(&F) -> R) -> R {
        read(&self.state.lock().formula)
    }

    /// Named output values at `row`, as currently computed.
    pub fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        self.read(|formula| formula.sample(row))
    }
}

impl<F> fmt::Debug for Function<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use tesser_core::{Push, Var};

    use super::*;
    use crate::spec::WindowParams;
    use crate::test_support::{candle, close_series, ints};

    struct Recording {
        close: Var<Decimal>,
        cleared: Vec<usize>,
        visited: Vec<usize>,
    }

    impl Recording {
        fn new() -> Self {
            Self {
                close: Var::new("close"),
                cleared: Vec::new(),
                visited: Vec::new(),
            }
        }
    }

    impl Formula for Recording {
        fn clear_row(&mut self, row: usize) {
            self.cleared.push(row);
            self.close.reset(row);
        }

        fn compute_spot(&mut self, bars: &Bars, row: usize) {
            self.visited.push(row);
            self.close.put(row, bars.close(row));
        }

        fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
            vec![("close", self.close.get(row))]
        }
    }

    fn recording(series: &Arc<Series>) -> Function<Recording> {
        Function::new(FunctionSpec::Sum(WindowParams::close(1)), series, Recording::new())
    }

    fn visited_since(function: &Function<Recording>, from: usize) -> (Vec<usize>, Vec<usize>) {
        function.read(|f| (f.cleared[from..].to_vec(), f.visited[from..].to_vec()))
    }

    #[test]
    fn later_requests_only_compute_the_new_rows() {
        let series = close_series(&ints(&[1, 2, 3, 4, 5, 6]));
        let function = recording(&series);
        let session = series.session();

        function.compute_to(session, 3);
        assert_eq!(visited_since(&function, 0), (vec![0, 1, 2, 3], vec![0, 1, 2, 3]));
        let settled: Vec<_> = (0..=3).map(|row| function.sample(row)).collect();

        function.compute_to(session, 5);
        assert_eq!(visited_since(&function, 4), (vec![4, 5], vec![4, 5]));
        assert_eq!(function.computed_idx(), Some(5));
        let after: Vec<_> = (0..=3).map(|row| function.sample(row)).collect();
        assert_eq!(after, settled);

        function.compute_to(session, 2);
        assert_eq!(function.read(|f| f.visited.len()), 6);
    }

    #[test]
    fn appends_and_live_updates_touch_only_their_rows() {
        let series = close_series(&ints(&[1, 2, 3, 4]));
        let function = recording(&series);
        function.compute_to(series.session(), 3);
        let settled: Vec<_> = (0..=3).map(|row| function.sample(row)).collect();

        series.push(candle(4, dec!(9), dec!(9), dec!(9), dec!(1))).unwrap();
        series.push(candle(5, dec!(8), dec!(8), dec!(8), dec!(1))).unwrap();
        function.compute_to(series.session(), 5);
        assert_eq!(visited_since(&function, 4), (vec![4, 5], vec![4, 5]));
        let after: Vec<_> = (0..=3).map(|row| function.sample(row)).collect();
        assert_eq!(after, settled);

        let update = series.push(candle(5, dec!(7), dec!(7), dec!(7), dec!(1)));
        assert_eq!(update, Ok(Push::Updated(5)));
        function.compute_to(series.session(), 5);
        assert_eq!(visited_since(&function, 6), (vec![5], vec![5]));
        assert_eq!(function.sample(5), vec![("close", Some(dec!(7)))]);
        assert_eq!(function.sample(4), vec![("close", Some(dec!(9)))]);
    }
}
