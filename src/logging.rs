//! Logging setup.
//!
//! The provider logs through `tracing`. Output goes to **stderr** by default
//! (stdout belongs to the plugin host) or, when the provider configuration
//! sets `file_debug`, to that file.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls log levels (e.g., `info`, `junos_provider=debug`)
//!
//! # Examples
//!
//! ```bash
//! # Show the lines sent to the device and the commit messages
//! RUST_LOG=junos_provider=debug ./my-provider
//! ```

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::ProviderError;

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn layer<S, W>(writer: W) -> fmt::Layer<S, fmt::format::DefaultFields, fmt::format::Format, W>
where
    W: for<'w> MakeWriter<'w> + 'static,
{
    fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
}

/// Initialize logging to stderr, defaulting to `info` when `RUST_LOG` is
/// not set.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Like [`init_logging`] with a custom default level.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(layer(std::io::stderr))
        .init();
}

/// Try to initialize logging to stderr, returning false if already
/// initialized.
pub fn try_init_logging() -> bool {
    tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(layer(std::io::stderr))
        .try_init()
        .is_ok()
}

/// Send debug logs to `path`, appending to it.
///
/// The filter defaults to `debug` for this crate. Fails when the file cannot
/// be opened or a global subscriber is already set.
pub fn try_init_logging_to_file(path: impl AsRef<Path>) -> Result<(), ProviderError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())?;
    tracing_subscriber::registry()
        .with(env_filter("junos_provider=debug"))
        .with(layer(Mutex::new(file)).with_ansi(false))
        .try_init()
        .map_err(|err| ProviderError::Configuration(format!("debug log file: {}", err)))
}

#[cfg(test)]
mod tests {
    // The global subscriber can only be set once per process, so these
    // tests stop short of installing one.

    use super::*;

    #[test]
    fn test_env_filter_parsing() {
        assert!(EnvFilter::try_new("info").is_ok());
        assert!(EnvFilter::try_new("junos_provider=debug").is_ok());
        assert!(EnvFilter::try_new("warn,junos_provider=debug").is_ok());
    }

    #[test]
    fn test_file_logging_reports_open_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir").join("debug.log");
        let err = try_init_logging_to_file(&missing).unwrap_err();
        assert!(matches!(err, ProviderError::Io(_)));
    }
}
