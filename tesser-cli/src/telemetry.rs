use anyhow::{anyhow, Context, Result};
use tesser_config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Logs go to stderr so stdout stays
/// machine-readable.
pub fn init(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&logging.filter)
        .with_context(|| format!("invalid log filter `{}`", logging.filter))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}
