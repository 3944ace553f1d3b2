//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSection;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over the configured filter. Returns false when a
/// subscriber was already installed (tests, embedding), which is harmless.
pub fn init(config: &LoggingSection) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    }
}
