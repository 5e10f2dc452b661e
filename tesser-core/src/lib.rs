//! Core series primitives for the Tesser indicator engine.
//!
//! A [`Series`] is an append-only sequence of [`Candle`] rows keyed by strictly
//! increasing timestamps. Its base columns, and every derived output column,
//! are [`Var`]s: typed projections addressable by row index where `None`
//! marks an undefined row.

#![deny(missing_docs)]

mod candle;
mod error;
mod series;
mod var;

pub use candle::{Candle, Direction, Field};
pub use error::{SeriesError, SeriesResult};
pub use series::{Bars, Push, Series, SeriesId, SessionId};
pub use var::Var;
