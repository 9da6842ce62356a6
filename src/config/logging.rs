use {
    crate::{Error, Result},
    serde::Deserialize,
    std::str::FromStr,
};

///
/// Output format for the tracing subscriber installed by [`setup_tracing`].
/// The default format is `default`, which is "full" human-readable format.
/// Other options are `json`, `compact`, and `pretty`.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Default,
    Compact,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "default" | "full" => Ok(LogFormat::Default),
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(Error::config(format!(
                "unknown log format `{other}`, expected json, default, compact or pretty"
            ))),
        }
    }
}

///
/// Installs a global tracing subscriber filtered by `RUST_LOG`.
///
/// Advisories are logged at `warn` and violations at `debug`, so an embedding
/// binary typically runs with `RUST_LOG=oidc_conf=warn` or finer. Installing a
/// second subscriber is a no-op.
///
pub fn setup_tracing(format: LogFormat) {
    use tracing_subscriber::{EnvFilter, prelude::*};
    let env_filter = EnvFilter::from_default_env();
    match format {
        LogFormat::Json => {
            let _ = tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().json())
                .with(env_filter)
                .try_init();
        }
        LogFormat::Default => {
            let _ = tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer())
                .with(env_filter)
                .try_init();
        }
        LogFormat::Compact => {
            let _ = tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().compact())
                .with(env_filter)
                .try_init();
        }
        LogFormat::Pretty => {
            let _ = tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().pretty())
                .with(env_filter)
                .try_init();
        }
    }
}
