use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub mod formatter;

pub use formatter::*;

use crate::configs::Config;

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &Config) {
    let log_level = config
        .logging
        .as_ref()
        .and_then(|l| l.level.as_deref())
        .unwrap_or("info");

    let filters = config
        .logging
        .as_ref()
        .and_then(|l| l.filters.as_deref())
        .unwrap_or("");

    let filter_str = if filters.is_empty() {
        format!("{},symphonia=warn", log_level)
    } else {
        format!("{},symphonia=warn,{}", log_level, filters)
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    let use_ansi = config
        .logging
        .as_ref()
        .map(|l| l.ansi)
        .unwrap_or(true);

    let stdout_layer = fmt::layer()
        .event_format(SessionFormatter::new(use_ansi))
        .with_ansi(use_ansi);

    // A second init (tests, embedding apps) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .try_init();
}
