//! Typed configuration for the function engine.
//!
//! Settings come from an optional TOML file layered under `TESSER__`
//! prefixed environment variables, e.g. `TESSER__LOGGING__FILTER=debug`.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tesser_indicators::FunctionSpec;
use tracing::warn;

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "TESSER";

/// Top-level settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Functions to instantiate on every loaded series.
    #[serde(default)]
    pub functions: Vec<FunctionSpec>,
}

/// Log output settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_filter() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

impl EngineConfig {
    /// Validates every function spec and drops duplicates, keeping the first.
    pub fn validated(mut self) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut functions = Vec::with_capacity(self.functions.len());
        for spec in self.functions {
            spec.validate()
                .with_context(|| format!("invalid function {spec}"))?;
            if seen.insert(spec) {
                functions.push(spec);
            } else {
                warn!(function = %spec, "ignoring duplicate function");
            }
        }
        self.functions = functions;
        Ok(self)
    }
}

/// Loads configuration from `path` (if any) and the environment.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
    }
    let config = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()
        .context("failed to read configuration")?;
    let config: EngineConfig = config
        .try_deserialize()
        .context("failed to parse configuration")?;
    config.validated()
}

/// Parses a single function spec written as a TOML inline table, e.g.
/// `{ kind = "rsi", period = 14 }`.
pub fn parse_inline_spec(input: &str) -> Result<FunctionSpec> {
    #[derive(Deserialize)]
    struct Inline {
        function: FunctionSpec,
    }

    let inline: Inline = toml::from_str(&format!("function = {}", input.trim()))
        .with_context(|| format!("invalid function spec `{input}`"))?;
    inline
        .function
        .validate()
        .with_context(|| format!("invalid function {}", inline.function))?;
    Ok(inline.function)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rust_decimal_macros::dec;
    use tesser_indicators::{MacdParams, PeriodParams, ZigzagParams};

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_functions_and_logging() {
        let file = write_config(
            r#"
[logging]
filter = "debug"

[[functions]]
kind = "rsi"
period = 14

[[functions]]
kind = "macd"
fast = 12
slow = 26
signal = 9

[[functions]]
kind = "zigzag"
percent = 0.05
"#,
        );
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.logging.filter, "debug");
        assert!(!config.logging.json);
        assert_eq!(
            config.functions,
            vec![
                FunctionSpec::Rsi(PeriodParams::new(14)),
                FunctionSpec::Macd(MacdParams {
                    field: Default::default(),
                    fast: 12,
                    slow: 26,
                    signal: 9,
                }),
                FunctionSpec::Zigzag(ZigzagParams {
                    percent: dec!(0.05)
                }),
            ]
        );
    }

    #[test]
    fn defaults_without_a_file() {
        let config = EngineConfig::default().validated().unwrap();
        assert_eq!(config.logging, LoggingConfig::default());
        assert!(config.functions.is_empty());
    }

    #[test]
    fn rejects_invalid_periods() {
        let file = write_config("[[functions]]\nkind = \"ma\"\nperiod = 0\n");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("period"), "{err:#}");
    }

    #[test]
    fn drops_duplicate_functions() {
        let config = EngineConfig {
            logging: LoggingConfig::default(),
            functions: vec![
                FunctionSpec::Obv,
                FunctionSpec::Tr,
                FunctionSpec::Obv,
            ],
        }
        .validated()
        .unwrap();
        assert_eq!(config.functions, vec![FunctionSpec::Obv, FunctionSpec::Tr]);
    }

    #[test]
    fn parses_inline_specs() {
        let spec = parse_inline_spec(r#"{ kind = "rsi", period = 6 }"#).unwrap();
        assert_eq!(spec, FunctionSpec::Rsi(PeriodParams::new(6)));
        assert_eq!(parse_inline_spec(r#"{ kind = "dm" }"#).unwrap(), FunctionSpec::Dm);
        assert!(parse_inline_spec(r#"{ kind = "nope" }"#).is_err());
        assert!(parse_inline_spec(r#"{ kind = "wms", period = 0 }"#).is_err());
    }
}
