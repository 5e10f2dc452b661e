//! Built-in function kinds provided by the crate.

pub mod adx;
pub mod boll;
pub mod cci;
pub mod di;
pub mod dm;
pub mod dx;
pub mod ema;
pub mod ma;
pub mod macd;
pub mod max;
pub mod mfi;
pub mod min;
pub mod mtm;
pub mod obv;
pub mod roc;
pub mod rsi;
pub mod sar;
pub mod stddev;
pub mod stoch;
pub mod sum;
pub mod tr;
pub mod wms;
pub mod zigzag;

pub use adx::Adx;
pub use boll::Boll;
pub use cci::Cci;
pub use di::Di;
pub use dm::Dm;
pub use dx::Dx;
pub use ema::Ema;
pub use ma::Ma;
pub use macd::Macd;
pub use max::Max;
pub use mfi::Mfi;
pub use min::Min;
pub use mtm::Mtm;
pub use obv::Obv;
pub use roc::Roc;
pub use rsi::Rsi;
pub use sar::Sar;
pub use stddev::StdDev;
pub use stoch::Stoch;
pub use sum::Sum;
pub use tr::Tr;
pub use wms::Wms;
pub use zigzag::{Zigzag, ZigzagPoint};
