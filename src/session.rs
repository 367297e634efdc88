//! The device session abstraction.
//!
//! The transport (NETCONF over SSH in production) lives outside this crate.
//! Callers plug it in through three traits: a [`ClientBuilder`] turns the
//! provider configuration into a [`Client`], the client opens [`Session`]s,
//! and a session runs commands and stages candidate configuration.
//!
//! Commit semantics follow the device: [`Session::commit`] applies the
//! candidate and releases the configuration lock, while
//! [`Session::config_clear`] discards the candidate and releases the lock.

use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::parse::is_empty_output;

/// One open session with a device.
#[async_trait]
pub trait Session: Send + Sync {
    /// Run an operational command and return its text output.
    async fn command(&self, command: &str) -> Result<String, ProviderError>;

    /// Stage a batch of `set`/`delete` lines in the candidate configuration.
    async fn config_set(&self, lines: &[String]) -> Result<(), ProviderError>;

    /// Try once to take the exclusive configuration lock.
    ///
    /// Returns `Ok(false)` when another session holds it.
    async fn config_lock(&self) -> Result<bool, ProviderError>;

    /// Commit the candidate with a log message and release the lock.
    ///
    /// Returns the non-fatal warnings the device reported.
    async fn commit(&self, message: &str) -> Result<Vec<String>, ProviderError>;

    /// Discard the uncommitted candidate and release the lock.
    ///
    /// Best effort: failures come back as messages rather than an error.
    async fn config_clear(&self) -> Vec<String>;

    /// Close the session.
    async fn close(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// A connected device able to open sessions.
#[async_trait]
pub trait Client: Send + Sync + 'static {
    /// The session type this client hands out.
    type Session: Session;

    /// Open a new session.
    async fn start_session(&self) -> Result<Self::Session, ProviderError>;
}

/// Builds a [`Client`] from the provider configuration.
pub trait ClientBuilder: Send + Sync + 'static {
    /// The client type produced.
    type Client: Client;

    /// Build a client for the configured device.
    ///
    /// Sessions of the client wait [`ProviderConfig::sleep_short`] between
    /// two commands sent to the device; the orchestrator itself never
    /// sleeps outside lock retries.
    fn build(&self, config: &ProviderConfig) -> Result<Self::Client, ProviderError>;
}

const PIPE_DISPLAY_SET: &str = " | display set";
const PIPE_DISPLAY_SET_RELATIVE: &str = " | display set relative";

/// `show configuration <path> | display set`
pub fn show_config_command(path: &str) -> String {
    format!("show configuration {}{}", path, PIPE_DISPLAY_SET)
}

/// `show configuration <path> | display set relative`
pub fn show_config_relative_command(path: &str) -> String {
    format!("show configuration {}{}", path, PIPE_DISPLAY_SET_RELATIVE)
}

/// Check whether anything is configured at `path`.
pub async fn config_exists<S>(session: &S, path: &str) -> Result<bool, ProviderError>
where
    S: Session + ?Sized,
{
    let show = session.command(&show_config_command(path)).await?;
    Ok(!is_empty_output(&show))
}
