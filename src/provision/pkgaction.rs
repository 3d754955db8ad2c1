//! Package and service actions understood by every backend.

use strum::Display;

/// Package manager operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PackageAction {
    Install,
    Remove,
    Upgrade,
}

impl PackageAction {
    /// Whether package metadata must be refreshed before the action runs.
    pub fn refreshes_metadata(&self) -> bool {
        match self {
            Self::Install | Self::Upgrade => true,
            Self::Remove => false,
        }
    }
}

/// Service manager operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ServiceAction {
    Start,
    Stop,
    Restart,
    Enable,
    Disable,
    DaemonReload,
}
