#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

//! Incremental, memoized indicator functions over bar series.

/// The compute contract: formulas, function instances and errors.
pub mod core;
/// Built-in function kinds.
pub mod indicators;
/// Per-series cache of function instances.
pub mod registry;
/// Function kinds and their parameters.
pub mod spec;
/// Window statistics shared by the formulas.
pub mod stats;

#[cfg(test)]
mod test_support;

/// Re-export of the core contract to make the crate easy to consume.
pub use crate::core::{
    BuildContext, ComputePass, Formula, Function, FunctionKind, IndicatorError,
};
pub use crate::registry::{registry, FunctionHandle, FunctionRegistry};
pub use crate::spec::{
    AdxParams, BollParams, CciParams, FunctionSpec, MacdParams, PeriodParams, SarParams,
    SmoothedParams, StochParams, WindowParams, ZigzagParams,
};
