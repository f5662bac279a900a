// file: src/logging/logger.rs
// version: 1.0.0
// guid: 435a41b7-6b3c-4c6b-b75d-36f090a75831

//! Logger initialization and configuration

use crate::{CudetError, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive for the given verbosity flags
pub fn filter_directive(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Initialize the logging system
pub fn init_logger(verbose: bool, quiet: bool) -> Result<()> {
    let filter = EnvFilter::new(filter_directive(verbose, quiet));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init()
        .map_err(|e| CudetError::config(format!("Failed to initialize logger: {}", e)))?;

    Ok(())
}

/// Run `f` inside a named operation span
pub fn with_operation_span<F, R>(operation: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    let span = tracing::info_span!("operation", name = operation);
    let _enter = span.enter();
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive(false, false), "info");
        assert_eq!(filter_directive(true, false), "debug");
        // quiet wins over verbose
        assert_eq!(filter_directive(true, true), "error");
    }

    #[test]
    fn test_init_logger_twice() {
        // the global subscriber can only be set once per process
        let first = init_logger(false, false);
        let second = init_logger(true, false);
        assert!(first.is_err() || second.is_err());
    }

    #[test]
    fn test_with_operation_span() {
        let result = with_operation_span("update-db", || 2 + 2);
        assert_eq!(result, 4);
    }
}
