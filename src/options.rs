//! Option bundles supplied to a provisioning run.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// TLS material locations, local and remote.
///
/// The local paths come from the caller; the remote paths are filled in by
/// the provisioner once the docker options directory is known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthOptions {
    #[serde(default)]
    pub ca_cert_path: Option<Utf8PathBuf>,
    #[serde(default)]
    pub server_cert_path: Option<Utf8PathBuf>,
    #[serde(default)]
    pub server_key_path: Option<Utf8PathBuf>,
    #[serde(default)]
    pub ca_cert_remote_path: String,
    #[serde(default)]
    pub server_cert_remote_path: String,
    #[serde(default)]
    pub server_key_remote_path: String,
}

/// Docker engine settings rendered into the daemon options file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineOptions {
    /// `--label` entries, in order
    #[serde(default)]
    pub labels: Vec<String>,
    /// `--insecure-registry` entries, in order
    #[serde(default)]
    pub insecure_registry: Vec<String>,
    /// `--registry-mirror` entries, in order
    #[serde(default)]
    pub registry_mirror: Vec<String>,
    /// Raw flags rendered as `--<flag>`
    #[serde(default)]
    pub arbitrary_flags: Vec<String>,
    /// Storage driver; the backend default is used when unset
    #[serde(default)]
    pub storage_driver: Option<String>,
    /// Engine version to install; the backend's bundled version when unset
    #[serde(default)]
    pub install_version: Option<String>,
}

/// Cluster membership settings, consumed by a [`ClusterConfigurator`].
///
/// [`ClusterConfigurator`]: crate::provision::ClusterConfigurator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterOptions {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub master: bool,
    #[serde(default)]
    pub discovery: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub strategy: String,
    #[serde(default)]
    pub arbitrary_flags: Vec<String>,
}

/// Snapshot of all options for one provisioning run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionerOptions {
    pub auth: AuthOptions,
    pub engine: EngineOptions,
    pub cluster: ClusterOptions,
}
