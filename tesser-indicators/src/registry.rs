//! Per-series cache of function instances.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tesser_core::{Series, SeriesId, SessionId};
use tracing::debug;

use crate::core::{BuildContext, Formula, Function, FunctionKind, IndicatorError};
use crate::indicators::{
    Adx, Boll, Cci, Di, Dm, Dx, Ema, Ma, Macd, Max, Mfi, Min, Mtm, Obv, Roc, Rsi, Sar, StdDev,
    Stoch, Sum, Tr, Wms, Zigzag,
};
use crate::spec::FunctionSpec;

static REGISTRY: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::new);

/// Returns the process-wide registry.
pub fn registry() -> &'static FunctionRegistry {
    &REGISTRY
}

/// Type-erased view of a function held by the registry.
trait ErasedFunction: Send + Sync {
    fn invalidate_from(&self, row: usize);
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<F: Formula> ErasedFunction for Function<F> {
    fn invalidate_from(&self, row: usize) {
        Function::invalidate_from(self, row);
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[derive(Default)]
struct FunctionSet {
    entries: HashMap<FunctionSpec, Weak<dyn ErasedFunction>>,
}

impl FunctionSet {
    fn find<K: FunctionKind>(&self, spec: &FunctionSpec) -> Option<Arc<Function<K>>> {
        let live = self.entries.get(spec)?.upgrade()?;
        live.into_any().downcast::<Function<K>>().ok()
    }

    fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.strong_count() > 0);
        before - self.entries.len()
    }

    fn live(&self) -> impl Iterator<Item = Arc<dyn ErasedFunction>> + '_ {
        self.entries.values().filter_map(Weak::upgrade)
    }
}

/// Cache of function instances derived from each series.
///
/// Instances are keyed by (series, [`FunctionSpec`]) and held weakly: the
/// caller's handle keeps a function alive, the registry never does.
/// Lookup-or-create is atomic per series, so value-equal requests always
/// resolve to the same instance.
#[derive(Default)]
pub struct FunctionRegistry {
    sets: RwLock<HashMap<SeriesId, Arc<Mutex<FunctionSet>>>>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn set_for(&self, id: SeriesId) -> Arc<Mutex<FunctionSet>> {
        if let Some(set) = self.sets.read().get(&id) {
            return set.clone();
        }
        self.sets.write().entry(id).or_default().clone()
    }

    /// Returns the instance of `K` for `params` on `series`, creating it on miss.
    ///
    /// Dependencies are resolved before the series' set is locked; the set is
    /// then checked again so only one instance is ever published.
    pub fn get<K: FunctionKind>(
        &self,
        series: &Arc<Series>,
        params: K::Params,
    ) -> Result<Arc<Function<K>>, IndicatorError> {
        let spec = K::spec(&params);
        spec.validate()?;
        let set = self.set_for(series.id());
        if let Some(found) = set.lock().find::<K>(&spec) {
            return Ok(found);
        }

        let formula = K::build(&BuildContext { registry: self, series }, params)?;

        let mut entries = set.lock();
        if let Some(found) = entries.find::<K>(&spec) {
            return Ok(found);
        }
        let pruned = entries.prune();
        let function = Arc::new(Function::new(spec, series, formula));
        let erased: Arc<dyn ErasedFunction> = function.clone();
        entries.entries.insert(spec, Arc::downgrade(&erased));
        debug!(
            series = %series.id(),
            function = %spec,
            pruned,
            live = entries.entries.len(),
            "created function instance"
        );
        Ok(function)
    }

    /// Untyped entry point: resolves `spec` to a strong handle.
    pub fn get_instance(
        &self,
        series: &Arc<Series>,
        spec: FunctionSpec,
    ) -> Result<FunctionHandle, IndicatorError> {
        let handle = match spec {
            FunctionSpec::Sum(p) => FunctionHandle::Sum(self.get::<Sum>(series, p)?),
            FunctionSpec::Max(p) => FunctionHandle::Max(self.get::<Max>(series, p)?),
            FunctionSpec::Min(p) => FunctionHandle::Min(self.get::<Min>(series, p)?),
            FunctionSpec::Ma(p) => FunctionHandle::Ma(self.get::<Ma>(series, p)?),
            FunctionSpec::Ema(p) => FunctionHandle::Ema(self.get::<Ema>(series, p)?),
            FunctionSpec::StdDev(p) => FunctionHandle::StdDev(self.get::<StdDev>(series, p)?),
            FunctionSpec::Tr => FunctionHandle::Tr(self.get::<Tr>(series, ())?),
            FunctionSpec::Dm => FunctionHandle::Dm(self.get::<Dm>(series, ())?),
            FunctionSpec::Di(p) => FunctionHandle::Di(self.get::<Di>(series, p)?),
            FunctionSpec::Dx(p) => FunctionHandle::Dx(self.get::<Dx>(series, p)?),
            FunctionSpec::Adx(p) => FunctionHandle::Adx(self.get::<Adx>(series, p)?),
            FunctionSpec::Boll(p) => FunctionHandle::Boll(self.get::<Boll>(series, p)?),
            FunctionSpec::Cci(p) => FunctionHandle::Cci(self.get::<Cci>(series, p)?),
            FunctionSpec::Macd(p) => FunctionHandle::Macd(self.get::<Macd>(series, p)?),
            FunctionSpec::Mfi(p) => FunctionHandle::Mfi(self.get::<Mfi>(series, p)?),
            FunctionSpec::Mtm(p) => FunctionHandle::Mtm(self.get::<Mtm>(series, p)?),
            FunctionSpec::Obv => FunctionHandle::Obv(self.get::<Obv>(series, ())?),
            FunctionSpec::Roc(p) => FunctionHandle::Roc(self.get::<Roc>(series, p)?),
            FunctionSpec::Rsi(p) => FunctionHandle::Rsi(self.get::<Rsi>(series, p)?),
            FunctionSpec::Sar(p) => FunctionHandle::Sar(self.get::<Sar>(series, p)?),
            FunctionSpec::Stoch(p) => FunctionHandle::Stoch(self.get::<Stoch>(series, p)?),
            FunctionSpec::Wms(p) => FunctionHandle::Wms(self.get::<Wms>(series, p)?),
            FunctionSpec::Zigzag(p) => FunctionHandle::Zigzag(self.get::<Zigzag>(series, p)?),
        };
        Ok(handle)
    }

    /// Number of live instances derived from `series`.
    pub fn live_count(&self, series: &Series) -> usize {
        self.sets
            .read()
            .get(&series.id())
            .map_or(0, |set| set.lock().live().count())
    }

    /// Lowers the high-water mark of every live function of `series`.
    pub fn invalidate_from(&self, series: &Series, row: usize) {
        let Some(set) = self.sets.read().get(&series.id()).cloned() else {
            return;
        };
        let live: Vec<_> = set.lock().live().collect();
        debug!(series = %series.id(), row, functions = live.len(), "invalidating functions");
        for function in live {
            function.invalidate_from(row);
        }
    }

    /// Drops dead entries, and sets that no longer hold any.
    pub fn prune(&self) -> usize {
        let mut sets = self.sets.write();
        let mut pruned = 0;
        sets.retain(|_, set| {
            let mut set = set.lock();
            pruned += set.prune();
            !set.entries.is_empty()
        });
        if pruned > 0 {
            debug!(pruned, "pruned dead function instances");
        }
        pruned
    }
}

/// A strong handle to any function kind.
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub enum FunctionHandle {
    Sum(Arc<Function<Sum>>),
    Max(Arc<Function<Max>>),
    Min(Arc<Function<Min>>),
    Ma(Arc<Function<Ma>>),
    Ema(Arc<Function<Ema>>),
    StdDev(Arc<Function<StdDev>>),
    Tr(Arc<Function<Tr>>),
    Dm(Arc<Function<Dm>>),
    Di(Arc<Function<Di>>),
    Dx(Arc<Function<Dx>>),
    Adx(Arc<Function<Adx>>),
    Boll(Arc<Function<Boll>>),
    Cci(Arc<Function<Cci>>),
    Macd(Arc<Function<Macd>>),
    Mfi(Arc<Function<Mfi>>),
    Mtm(Arc<Function<Mtm>>),
    Obv(Arc<Function<Obv>>),
    Roc(Arc<Function<Roc>>),
    Rsi(Arc<Function<Rsi>>),
    Sar(Arc<Function<Sar>>),
    Stoch(Arc<Function<Stoch>>),
    Wms(Arc<Function<Wms>>),
    Zigzag(Arc<Function<Zigzag>>),
}

macro_rules! dispatch {
    ($handle:expr, $function:ident => $body:expr) => {
        match $handle {
            FunctionHandle::Sum($function) => $body,
            FunctionHandle::Max($function) => $body,
            FunctionHandle::Min($function) => $body,
            FunctionHandle::Ma($function) => $body,
            FunctionHandle::Ema($function) => $body,
            FunctionHandle::StdDev($function) => $body,
            FunctionHandle::Tr($function) => $body,
            FunctionHandle::Dm($function) => $body,
            FunctionHandle::Di($function) => $body,
            FunctionHandle::Dx($function) => $body,
            FunctionHandle::Adx($function) => $body,
            FunctionHandle::Boll($function) => $body,
            FunctionHandle::Cci($function) => $body,
            FunctionHandle::Macd($function) => $body,
            FunctionHandle::Mfi($function) => $body,
            FunctionHandle::Mtm($function) => $body,
            FunctionHandle::Obv($function) => $body,
            FunctionHandle::Roc($function) => $body,
            FunctionHandle::Rsi($function) => $body,
            FunctionHandle::Sar($function) => $body,
            FunctionHandle::Stoch($function) => $body,
            FunctionHandle::Wms($function) => $body,
            FunctionHandle::Zigzag($function) => $body,
        }
    };
}

impl FunctionHandle {
    /// Kind and parameters of the instance.
    pub fn spec(&self) -> FunctionSpec {
        dispatch!(self, function => *function.spec())
    }

    /// See [`Function::compute_to`].
    pub fn compute_to(&self, session: SessionId, idx: usize) {
        dispatch!(self, function => function.compute_to(session, idx))
    }

    /// See [`Function::compute_to_end`].
    pub fn compute_to_end(&self, session: SessionId) -> Option<usize> {
        dispatch!(self, function => function.compute_to_end(session))
    }

    /// See [`Function::invalidate_from`].
    pub fn invalidate_from(&self, row: usize) {
        dispatch!(self, function => function.invalidate_from(row))
    }

    /// See [`Function::computed_idx`].
    pub fn computed_idx(&self) -> Option<usize> {
        dispatch!(self, function => function.computed_idx())
    }

    /// Named output values at `row`, as currently computed.
    pub fn sample(&self, row: usize) -> Vec<(&'static str, Option<Decimal>)> {
        dispatch!(self, function => function.sample(row))
    }

    /// Whether both handles point at the same instance.
    pub fn ptr_eq(&self, other: &FunctionHandle) -> bool {
        let this: *const () = dispatch!(self, function => Arc::as_ptr(function).cast());
        let that: *const () = dispatch!(other, function => Arc::as_ptr(function).cast());
        std::ptr::eq(this, that)
    }
}
