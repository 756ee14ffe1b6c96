use crate::cli::LogFormatArg;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_tracing(format: LogFormatArg) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormatArg::Json => registry
            .with(fmt::layer().json().with_target(true))
            .init(),
        LogFormatArg::Text => registry.with(fmt::layer().with_target(true)).init(),
    }
}
