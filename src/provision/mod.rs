//! Host provisioning: OS backends, their registry and the generic sequence.

pub mod backend;
pub mod centos6;
pub mod centos7;
pub mod deploy;
pub mod detect;
pub mod generic;
pub mod pkgaction;
pub mod registry;
pub mod ubuntu;

use anyhow::Result;

use crate::options::{AuthOptions, ClusterOptions};

pub use backend::OsBackend;
pub use deploy::{EngineConfigDeployer, StandaloneCluster};
pub use detect::{OsRelease, detect_os};
pub use generic::{DEFAULT_DOCKER_PORT, GenericProvisioner};
pub use pkgaction::{PackageAction, ServiceAction};
pub use registry::{Registry, register_all_backends, registry};

/// Rendered daemon options and where they belong on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerOptions {
    pub engine_options: String,
    pub engine_options_path: String,
}

/// Deploys TLS material once the remote auth paths are known.
pub trait AuthConfigurator: Send + Sync {
    fn configure_auth(&self, provisioner: &GenericProvisioner, auth: &AuthOptions) -> Result<()>;
}

/// Joins the host to a cluster after the daemon is secured.
pub trait ClusterConfigurator: Send + Sync {
    fn configure_cluster(
        &self,
        provisioner: &GenericProvisioner,
        cluster: &ClusterOptions,
    ) -> Result<()>;
}
