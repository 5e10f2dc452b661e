//! Function kinds and their typed parameters.
//!
//! A [`FunctionSpec`] identifies a function on a series: two specs that
//! compare equal by value resolve to the same instance in the registry.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tesser_core::Field;

use crate::core::IndicatorError;

/// A base field and a lookback period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowParams {
    /// Input column.
    #[serde(default)]
    pub field: Field,
    /// Lookback period in rows.
    pub period: usize,
}

impl WindowParams {
    /// Window over `field`.
    pub fn new(field: Field, period: usize) -> Self {
        Self { field, period }
    }

    /// Window over closing prices.
    pub fn close(period: usize) -> Self {
        Self::new(Field::Close, period)
    }
}

/// A single lookback period over the bar itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodParams {
    /// Lookback period in rows.
    pub period: usize,
}

impl PeriodParams {
    /// Wraps `period`.
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

/// Parameters of the average directional index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdxParams {
    /// Period of the underlying DI/DX.
    pub period: usize,
    /// Smoothing period applied to DX.
    pub period_adx: usize,
}

/// Parameters of Bollinger bands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BollParams {
    /// Input column.
    #[serde(default)]
    pub field: Field,
    /// Lookback period in rows.
    pub period: usize,
    /// Band width in standard deviations.
    pub alpha: Decimal,
}

/// Parameters of the commodity channel index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CciParams {
    /// Lookback period in rows.
    pub period: usize,
    /// Scaling constant, conventionally `0.015`.
    pub alpha: Decimal,
}

/// Parameters of MACD.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacdParams {
    /// Input column.
    #[serde(default)]
    pub field: Field,
    /// Fast EMA period.
    pub fast: usize,
    /// Slow EMA period.
    pub slow: usize,
    /// Signal line EMA period.
    pub signal: usize,
}

/// A momentum-style lookback plus a smoothing period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SmoothedParams {
    /// Input column.
    #[serde(default)]
    pub field: Field,
    /// Lookback distance in rows.
    pub period: usize,
    /// Moving average period applied to the raw value.
    pub period_smooth: usize,
}

/// Parameters of the parabolic stop-and-reverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SarParams {
    /// Acceleration factor after a reversal.
    pub initial: Decimal,
    /// Acceleration added on each new extreme.
    pub step: Decimal,
    /// Acceleration ceiling.
    pub maximum: Decimal,
}

/// Parameters of the stochastic oscillator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StochParams {
    /// High/low lookback period.
    pub period: usize,
    /// Smoothing period of %K.
    pub period_k: usize,
    /// Smoothing period of %D.
    pub period_d: usize,
}

/// Parameters of the zigzag trend-reversal indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZigzagParams {
    /// Relative move that confirms a reversal, e.g. `0.05` for five percent.
    pub percent: Decimal,
}

/// Every function kind the engine can instantiate, with its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FunctionSpec {
    /// Rolling sum.
    Sum(WindowParams),
    /// Rolling maximum.
    Max(WindowParams),
    /// Rolling minimum.
    Min(WindowParams),
    /// Simple moving average.
    Ma(WindowParams),
    /// Exponential moving average.
    Ema(WindowParams),
    /// Population standard deviation.
    #[serde(rename = "stddev")]
    StdDev(WindowParams),
    /// True range.
    Tr,
    /// Directional movement.
    Dm,
    /// Directional indicators.
    Di(PeriodParams),
    /// Directional movement index.
    Dx(PeriodParams),
    /// Average directional index.
    Adx(AdxParams),
    /// Bollinger bands.
    Boll(BollParams),
    /// Commodity channel index.
    Cci(CciParams),
    /// Moving average convergence/divergence.
    Macd(MacdParams),
    /// Money flow index.
    Mfi(PeriodParams),
    /// Momentum.
    Mtm(SmoothedParams),
    /// On-balance volume.
    Obv,
    /// Rate of change.
    Roc(SmoothedParams),
    /// Relative strength index.
    Rsi(PeriodParams),
    /// Parabolic stop-and-reverse.
    Sar(SarParams),
    /// Stochastic oscillator (K/D/J).
    Stoch(StochParams),
    /// Williams %R.
    Wms(PeriodParams),
    /// Zigzag trend reversals.
    Zigzag(ZigzagParams),
}

impl FunctionSpec {
    /// Lowercase identifiers accepted in configuration, in declaration order.
    pub const KINDS: [&'static str; 23] = [
        "sum", "max", "min", "ma", "ema", "stddev", "tr", "dm", "di", "dx", "adx", "boll", "cci",
        "macd", "mfi", "mtm", "obv", "roc", "rsi", "sar", "stoch", "wms", "zigzag",
    ];

    /// Display name of the kind.
    pub fn kind(&self) -> &'static str {
        match self {
            FunctionSpec::Sum(_) => "SUM",
            FunctionSpec::Max(_) => "MAX",
            FunctionSpec::Min(_) => "MIN",
            FunctionSpec::Ma(_) => "MA",
            FunctionSpec::Ema(_) => "EMA",
            FunctionSpec::StdDev(_) => "STDDEV",
            FunctionSpec::Tr => "TR",
            FunctionSpec::Dm => "DM",
            FunctionSpec::Di(_) => "DI",
            FunctionSpec::Dx(_) => "DX",
            FunctionSpec::Adx(_) => "ADX",
            FunctionSpec::Boll(_) => "BOLL",
            FunctionSpec::Cci(_) => "CCI",
            FunctionSpec::Macd(_) => "MACD",
            FunctionSpec::Mfi(_) => "MFI",
            FunctionSpec::Mtm(_) => "MTM",
            FunctionSpec::Obv => "OBV",
            FunctionSpec::Roc(_) => "ROC",
            FunctionSpec::Rsi(_) => "RSI",
            FunctionSpec::Sar(_) => "SAR",
            FunctionSpec::Stoch(_) => "STOCH",
            FunctionSpec::Wms(_) => "WMS",
            FunctionSpec::Zigzag(_) => "ZIGZAG",
        }
    }

    /// Checks parameter ranges.
    pub fn validate(&self) -> Result<(), IndicatorError> {
        let name = self.kind();
        match self {
            FunctionSpec::Sum(p)
            | FunctionSpec::Max(p)
            | FunctionSpec::Min(p)
            | FunctionSpec::Ma(p)
            | FunctionSpec::Ema(p)
            | FunctionSpec::StdDev(p) => positive(name, p.period),
            FunctionSpec::Tr | FunctionSpec::Dm | FunctionSpec::Obv => Ok(()),
            FunctionSpec::Di(p)
            | FunctionSpec::Dx(p)
            | FunctionSpec::Mfi(p)
            | FunctionSpec::Rsi(p)
            | FunctionSpec::Wms(p) => positive(name, p.period),
            FunctionSpec::Adx(p) => {
                positive(name, p.period)?;
                positive(name, p.period_adx)
            }
            FunctionSpec::Boll(p) => {
                positive(name, p.period)?;
                if p.alpha.is_sign_negative() {
                    return Err(IndicatorError::invalid_parameter(name, "alpha", p.alpha));
                }
                Ok(())
            }
            FunctionSpec::Cci(p) => {
                positive(name, p.period)?;
                if p.alpha <= Decimal::ZERO {
                    return Err(IndicatorError::invalid_parameter(name, "alpha", p.alpha));
                }
                Ok(())
            }
            FunctionSpec::Macd(p) => {
                positive(name, p.fast)?;
                positive(name, p.slow)?;
                positive(name, p.signal)
            }
            FunctionSpec::Mtm(p) | FunctionSpec::Roc(p) => {
                positive(name, p.period)?;
                positive(name, p.period_smooth)
            }
            FunctionSpec::Sar(p) => {
                if p.initial <= Decimal::ZERO {
                    return Err(IndicatorError::invalid_parameter(name, "initial", p.initial));
                }
                if p.step.is_sign_negative() {
                    return Err(IndicatorError::invalid_parameter(name, "step", p.step));
                }
                if p.maximum < p.initial {
                    return Err(IndicatorError::invalid_parameter(name, "maximum", p.maximum));
                }
                Ok(())
            }
            FunctionSpec::Stoch(p) => {
                positive(name, p.period)?;
                positive(name, p.period_k)?;
                positive(name, p.period_d)
            }
            FunctionSpec::Zigzag(p) => {
                if p.percent <= Decimal::ZERO {
                    return Err(IndicatorError::invalid_parameter(name, "percent", p.percent));
                }
                Ok(())
            }
        }
    }
}

fn positive(name: &'static str, period: usize) -> Result<(), IndicatorError> {
    if period == 0 {
        Err(IndicatorError::invalid_period(name, period))
    } else {
        Ok(())
    }
}

impl fmt::Display for FunctionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.kind();
        match self {
            FunctionSpec::Sum(p)
            | FunctionSpec::Max(p)
            | FunctionSpec::Min(p)
            | FunctionSpec::Ma(p)
            | FunctionSpec::Ema(p)
            | FunctionSpec::StdDev(p) => write!(f, "{kind}({},{})", p.field, p.period),
            FunctionSpec::Tr | FunctionSpec::Dm | FunctionSpec::Obv => f.write_str(kind),
            FunctionSpec::Di(p)
            | FunctionSpec::Dx(p)
            | FunctionSpec::Mfi(p)
            | FunctionSpec::Rsi(p)
            | FunctionSpec::Wms(p) => write!(f, "{kind}({})", p.period),
            FunctionSpec::Adx(p) => write!(f, "{kind}({},{})", p.period, p.period_adx),
            FunctionSpec::Boll(p) => write!(f, "{kind}({},{},{})", p.field, p.period, p.alpha),
            FunctionSpec::Cci(p) => write!(f, "{kind}({},{})", p.period, p.alpha),
            FunctionSpec::Macd(p) => {
                write!(f, "{kind}({},{},{},{})", p.field, p.fast, p.slow, p.signal)
            }
            FunctionSpec::Mtm(p) | FunctionSpec::Roc(p) => {
                write!(f, "{kind}({},{},{})", p.field, p.period, p.period_smooth)
            }
            FunctionSpec::Sar(p) => write!(f, "{kind}({},{},{})", p.initial, p.step, p.maximum),
            FunctionSpec::Stoch(p) => {
                write!(f, "{kind}({},{},{})", p.period, p.period_k, p.period_d)
            }
            FunctionSpec::Zigzag(p) => write!(f, "{kind}({})", p.percent),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn value_equal_params_are_equal_keys() {
        let a = FunctionSpec::Boll(BollParams {
            field: Field::Close,
            period: 20,
            alpha: dec!(2.0),
        });
        let b = FunctionSpec::Boll(BollParams {
            field: Field::Close,
            period: 20,
            alpha: dec!(2),
        });
        assert_eq!(a, b);
        assert_ne!(a, FunctionSpec::Ma(WindowParams::close(20)));
    }

    #[test]
    fn rejects_zero_periods() {
        let err = FunctionSpec::Rsi(PeriodParams::new(0)).validate().unwrap_err();
        assert_eq!(err, IndicatorError::invalid_period("RSI", 0));
    }

    #[test]
    fn rejects_non_positive_zigzag_percent() {
        let err = FunctionSpec::Zigzag(ZigzagParams { percent: dec!(0) })
            .validate()
            .unwrap_err();
        assert!(matches!(err, IndicatorError::InvalidParameter { .. }));
    }

    #[test]
    fn deserializes_tagged_specs() {
        let spec: FunctionSpec = toml::from_str("kind = \"macd\"\nfast = 12\nslow = 26\nsignal = 9").unwrap();
        assert_eq!(
            spec,
            FunctionSpec::Macd(MacdParams {
                field: Field::Close,
                fast: 12,
                slow: 26,
                signal: 9,
            })
        );
        let tr: FunctionSpec = toml::from_str("kind = \"tr\"").unwrap();
        assert_eq!(tr, FunctionSpec::Tr);
    }

    #[test]
    fn renders_compact_names() {
        assert_eq!(FunctionSpec::Ema(WindowParams::close(12)).to_string(), "EMA(close,12)");
        assert_eq!(FunctionSpec::Dm.to_string(), "DM");
    }
}
