use eyre::{Result, eyre};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor `LOG_LEVEL` is set
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Output format for [`init_tracing`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// `LOG_FORMAT=json` selects JSON lines; anything else is human readable
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Pick the filter directive: `RUST_LOG` first, then `LOG_LEVEL`, then the default
pub fn filter_directive(rust_log: Option<String>, log_level: Option<String>) -> String {
    rust_log
        .or(log_level)
        .filter(|directive| !directive.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

/// Install the global tracing subscriber.
///
/// Fails if a subscriber is already installed or the filter does not parse.
pub fn init_tracing() -> Result<()> {
    let directive = filter_directive(std::env::var("RUST_LOG").ok(), std::env::var("LOG_LEVEL").ok());
    let filter = EnvFilter::try_new(&directive).map_err(|e| eyre!("Invalid log filter `{}`: {}", directive, e))?;
    let format = LogFormat::from_env_value(std::env::var("LOG_FORMAT").ok().as_deref());

    tracing_subscriber::registry()
        .with(filter)
        .with((format == LogFormat::Json).then(|| fmt::layer().json().with_target(true)))
        .with((format == LogFormat::Pretty).then(|| fmt::layer().with_target(true)))
        .try_init()
        .map_err(|e| eyre!("Failed to install tracing subscriber: {}", e))
}
