//! Helpers for composing remote shell commands.
//!
//! The command channel executes plain strings, so every value interpolated
//! into a command is either validated against a strict pattern (host names,
//! package names, versions) or single-quoted with [`quote`].

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ProvisionError;

static HOSTNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?",
        r"(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$"
    ))
    .expect("hostname pattern is valid")
});

static PACKAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9+._-]*$").expect("package pattern is valid")
});

static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+(-[A-Za-z0-9.]+)?$").expect("version pattern is valid")
});

/// Quotes a value for a POSIX shell using single quotes.
///
/// Embedded single quotes are emitted as `'\''`.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Validates a host name before it is used in a remote command.
pub fn validate_hostname(name: &str) -> Result<(), ProvisionError> {
    if name.len() > 253 || !HOSTNAME.is_match(name) {
        return Err(ProvisionError::Validation(format!("invalid hostname: {:?}", name)));
    }
    Ok(())
}

/// Validates a package name before it is passed to a package manager.
pub fn validate_package_name(name: &str) -> Result<(), ProvisionError> {
    if !PACKAGE_NAME.is_match(name) {
        return Err(ProvisionError::Validation(format!("invalid package name: {:?}", name)));
    }
    Ok(())
}

/// Validates a runtime version string (`MAJOR.MINOR.PATCH[-suffix]`).
pub fn validate_version(version: &str) -> Result<(), ProvisionError> {
    if !VERSION.is_match(version) {
        return Err(ProvisionError::Validation(format!("invalid runtime version: {:?}", version)));
    }
    Ok(())
}
