//! Logging initialization and configuration.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "session_gate=info";

/// Build the filter: the configured level wins, then `RUST_LOG`, then the default.
///
/// A bare level applies to this crate and the HTTP trace layer; anything
/// containing `=` is taken as a full directive list.
fn build_filter(level: Option<&str>) -> EnvFilter {
    let filter = match level {
        Some(level) if level.contains('=') => EnvFilter::try_new(level).ok(),
        Some(level) => EnvFilter::try_new(format!("session_gate={level},tower_http={level}")).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    };
    filter.unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize the logging system.
///
/// Uses the `RUST_LOG` environment variable for filtering. If not set,
/// defaults to `session_gate=info`.
///
/// # Panics
///
/// Panics if called more than once, or if another tracing subscriber
/// has already been set.
pub fn init() {
    init_with_level(None);
}

/// Initialize logging with a level taken from configuration.
///
/// The configuration layer already resolves CLI, `SESSION_GATE_LOG_LEVEL`
/// and `RUST_LOG`, so a given level is used as is.
///
/// # Panics
///
/// Same conditions as [`init`].
pub fn init_with_level(level: Option<&str>) {
    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(tracing_subscriber::fmt::layer().compact())
        .init();
}

/// Try to initialize the logging system.
///
/// Returns `Ok(())` if successful, or `Err` if logging has already been
/// initialized.
pub fn try_init() -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(build_filter(None))
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_init_idempotent() {
        // Either call may be the first one depending on test order
        let _ = try_init();
        let _ = try_init();
    }

    #[test]
    fn test_filter_accepts_configured_level() {
        let filter = build_filter(Some("debug"));
        assert!(!filter.to_string().is_empty());
    }

    #[test]
    fn test_configured_level_beats_rust_log() {
        std::env::set_var("RUST_LOG", "warn");
        let filter = build_filter(Some("debug")).to_string();
        std::env::remove_var("RUST_LOG");

        assert!(filter.contains("session_gate=debug"), "filter was {filter}");
        assert!(!filter.contains("warn"), "filter was {filter}");
    }

    #[test]
    fn test_configured_directives_used_verbatim() {
        let filter = build_filter(Some("session_gate=trace,hyper=warn")).to_string();
        assert!(filter.contains("session_gate=trace"));
        assert!(filter.contains("hyper=warn"));
    }

    #[test]
    fn test_logging_works() {
        let _ = try_init();

        tracing::info!("test info message");
        tracing::debug!("test debug message");
        tracing::warn!("test warn message");
    }
}
