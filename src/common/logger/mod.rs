use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub mod formatter;

pub use formatter::*;

use crate::configs::LoggingConfig;

/// Builds the filter directive string from the `[logging]` section.
pub fn filter_directives(config: &LoggingConfig) -> String {
    let log_level = config.level.as_deref().unwrap_or("info");
    let filters = config.filters.as_deref().unwrap_or("");

    if filters.is_empty() {
        format!("{},hyper=warn,reqwest=warn", log_level)
    } else {
        format!("{},hyper=warn,reqwest=warn,{}", log_level, filters)
    }
}

pub fn init(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));

    let stdout_layer = fmt::layer()
        .event_format(CustomFormatter::new(config.ansi))
        .with_ansi(config.ansi);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .init();
}
