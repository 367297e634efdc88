//! Error types for the Junos provider.

use std::num::ParseIntError;

use thiserror::Error;

use crate::schema::Diagnostic;

/// Errors that can occur while rendering, applying or reading configuration.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested object was not found on the device.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The object already exists on the device (create conflict).
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// A validation error occurred before touching the device.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A provider configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is not registered.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A serialization/deserialization error occurred while mapping state.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The device session failed (connection or command failure).
    #[error("Session error: {0}")]
    Session(String),

    /// The device rejected the commit.
    #[error("Commit failed: {0}")]
    Commit(String),

    /// The configuration lock could not be acquired in time.
    #[error("Lock timeout: {0}")]
    LockTimeout(String),

    /// The device state disagrees with what was just committed.
    #[error("{0} => check your config")]
    Consistency(String),

    /// A token in the device output was not a valid integer.
    #[error("failed to convert value from '{value}' to integer: {source}")]
    ParseInt {
        /// The offending token.
        value: String,
        /// The underlying conversion error.
        #[source]
        source: ParseIntError,
    },

    /// A `$9$` secret could not be decoded.
    #[error("decoding password: {0}")]
    Decode(String),

    /// Writing to the set file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// Get the error message as a string.
    ///
    /// Returns a reference to the error message for any variant.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) => msg,
            Self::AlreadyExists(msg) => msg,
            Self::Validation(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
            Self::Session(msg) => msg,
            Self::Commit(msg) => msg,
            Self::LockTimeout(msg) => msg,
            Self::Consistency(msg) => msg,
            Self::ParseInt { value, .. } => value,
            Self::Decode(msg) => msg,
            Self::Io(_err) => "i/o error (see Debug output)",
        }
    }

    /// Build the error returned when a parsed token is not an integer.
    pub fn parse_int(value: impl Into<String>, source: ParseIntError) -> Self {
        Self::ParseInt {
            value: value.into(),
            source,
        }
    }
}

impl From<&ProviderError> for Diagnostic {
    fn from(err: &ProviderError) -> Self {
        let diag = Diagnostic::error(err.to_string());
        match err {
            ProviderError::Consistency(_) => {
                diag.with_detail("the device configuration does not match what was committed")
            }
            _ => diag,
        }
    }
}

/// A failed operation together with the warnings collected before it failed.
///
/// Commit warnings and best-effort rollback errors are not fatal on their
/// own, so they travel next to the hard error instead of replacing it.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct OperationError {
    /// The error that stopped the operation.
    #[source]
    pub error: ProviderError,
    /// Warnings gathered before the failure.
    pub warnings: Vec<Diagnostic>,
}

impl OperationError {
    /// Wrap an error with the warnings collected so far.
    pub fn new(error: ProviderError, warnings: Vec<Diagnostic>) -> Self {
        Self { error, warnings }
    }

    /// Flatten into diagnostics: warnings first, then the error.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        let mut diagnostics = self.warnings;
        diagnostics.push(Diagnostic::from(&self.error));
        diagnostics
    }
}

impl From<ProviderError> for OperationError {
    fn from(error: ProviderError) -> Self {
        Self::new(error, Vec::new())
    }
}
