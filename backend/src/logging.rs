//! Tracing subscriber setup for hosts embedding the backend.

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `filter` (an env-filter directive such
/// as `info` or `target_tracker_backend=debug`). `RUST_LOG` takes precedence
/// when set. Safe to call more than once; later calls are ignored.
pub fn init_logging(filter: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging("debug");
        init_logging("not a [valid filter");
        tracing::info!("logging initialized");
    }
}
