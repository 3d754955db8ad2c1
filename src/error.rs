//! Domain-specific error types for rsprovision.
//!
//! This module defines `ProvisionError`, a `thiserror`-based enum that
//! provides typed error variants for the failure modes of a provisioning
//! run. Public API functions return `Result<T, ProvisionError>` for
//! programmatic error handling, while trait boundaries continue to use
//! `anyhow::Result`.
//!
//! `ProvisionError` implements `Into<anyhow::Error>`, so the `?` operator
//! converts it automatically at trait boundaries that return `anyhow::Result`,
//! and callers can recover the typed variant with `downcast_ref`.

use std::io;
use std::time::Duration;

/// Formats an IO error kind into a human-readable message.
///
/// Provides consistent messages for common IO error kinds
/// (e.g., "I/O error: not found") instead of the OS-level messages
/// (e.g., "No such file or directory (os error 2)").
pub(crate) fn io_error_kind_message(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "I/O error: not found".to_string(),
        io::ErrorKind::PermissionDenied => "I/O error: permission denied".to_string(),
        io::ErrorKind::IsADirectory => "I/O error: is a directory".to_string(),
        _ => format!("I/O error: {}", err),
    }
}

/// Domain-specific error type for rsprovision.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProvisionError {
    /// A remote command exited with a non-zero status.
    #[error("remote command failed: {command}: {status}")]
    CommandFailed {
        /// The command as it was sent to the host.
        command: String,
        /// Exit status and any captured diagnostic output.
        status: String,
    },

    /// No backend is registered for the detected OS identifier.
    #[error("unsupported operating system: {id:?}")]
    UnsupportedOs {
        /// The OS identifier that missed the registry.
        id: String,
    },

    /// The retry primitive exhausted its budget.
    #[error("timed out after {attempts} attempt(s) in {elapsed:?}")]
    Timeout {
        /// Number of probe invocations made.
        attempts: u32,
        /// Wall-clock time spent waiting.
        elapsed: Duration,
    },

    /// A daemon configuration template could not be parsed or rendered.
    #[error("template error: {0}")]
    Template(String),

    /// A validation constraint was violated.
    #[error("validation error: {0}")]
    Validation(String),

    /// A host profile could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O operation failed with contextual information.
    #[error("{context}: {message}")]
    Io {
        /// What was being done when the error occurred (usually a path).
        context: String,
        /// Human-readable description derived from [`io_error_kind_message`].
        message: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl ProvisionError {
    /// Creates an `Io` variant with the `message` field derived from `source`.
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            message: io_error_kind_message(&source),
            source,
        }
    }
}
