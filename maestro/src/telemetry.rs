//! Subscriber setup for applications built on maestro.
//!
//! The library crates only emit `tracing` events. Binaries and tests call
//! [`init_tracing`] once to print them.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Output layout of the installed subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Error returned when a global subscriber is already installed.
pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Install a text subscriber filtered by `RUST_LOG`, or `info` when unset.
pub fn init_tracing() -> Result<(), InitError> {
    init_tracing_with(DEFAULT_FILTER, LogFormat::Text)
}

/// Install a subscriber with an explicit fallback filter and format.
///
/// `RUST_LOG` still wins over `default_filter` when it is set and valid.
pub fn init_tracing_with(default_filter: &str, format: LogFormat) -> Result<(), InitError> {
    let filter = env_filter(default_filter);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match format {
        LogFormat::Text => builder.try_init()?,
        LogFormat::Json => builder.json().try_init()?,
    }
    tracing::debug!(?format, default_filter, "Tracing initialized");
    Ok(())
}

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails_without_panicking() {
        // Another test may have installed a subscriber first.
        let _ = init_tracing();
        assert!(init_tracing_with("debug", LogFormat::Json).is_err());
    }
}
