//! OS-independent provisioning sequence.
//!
//! [`GenericProvisioner`] owns one backend for one run and drives the
//! ordered steps of [`GenericProvisioner::provision`]. Host-dependent work is
//! delegated to the backend; TLS deployment and cluster membership are
//! delegated to the injected collaborators.

use anyhow::Result;
use tracing::{info, warn};

use super::backend::OsBackend;
use super::deploy::{EngineConfigDeployer, StandaloneCluster};
use super::pkgaction::PackageAction;
use super::{AuthConfigurator, ClusterConfigurator, DockerOptions};
use crate::host::RemoteHost;
use crate::options::{AuthOptions, ClusterOptions, EngineOptions, ProvisionerOptions};
use crate::retry::{self, RetryPolicy};
use crate::shell;

/// Default TLS port of the docker daemon.
pub const DEFAULT_DOCKER_PORT: u16 = 2376;

/// Shared provisioning skeleton wrapping an [`OsBackend`].
pub struct GenericProvisioner {
    backend: Box<dyn OsBackend>,
    options: ProvisionerOptions,
    docker_port: u16,
    readiness: RetryPolicy,
    auth_configurator: Box<dyn AuthConfigurator>,
    cluster_configurator: Box<dyn ClusterConfigurator>,
}

impl GenericProvisioner {
    pub fn new(backend: Box<dyn OsBackend>) -> Self {
        Self {
            backend,
            options: ProvisionerOptions::default(),
            docker_port: DEFAULT_DOCKER_PORT,
            readiness: RetryPolicy::default(),
            auth_configurator: Box::new(EngineConfigDeployer),
            cluster_configurator: Box::new(StandaloneCluster),
        }
    }

    #[must_use]
    pub fn with_docker_port(mut self, docker_port: u16) -> Self {
        self.docker_port = docker_port;
        self
    }

    /// Sets the budget for the daemon readiness probe.
    #[must_use]
    pub fn with_readiness(mut self, readiness: RetryPolicy) -> Self {
        self.readiness = readiness;
        self
    }

    #[must_use]
    pub fn with_auth_configurator(mut self, configurator: Box<dyn AuthConfigurator>) -> Self {
        self.auth_configurator = configurator;
        self
    }

    #[must_use]
    pub fn with_cluster_configurator(mut self, configurator: Box<dyn ClusterConfigurator>) -> Self {
        self.cluster_configurator = configurator;
        self
    }

    pub fn backend(&self) -> &dyn OsBackend {
        self.backend.as_ref()
    }

    pub fn host(&self) -> &RemoteHost {
        self.backend.host()
    }

    pub fn options(&self) -> &ProvisionerOptions {
        &self.options
    }

    /// Replaces the option snapshot without provisioning.
    pub fn set_options(&mut self, options: ProvisionerOptions) {
        self.options = options;
    }

    pub fn docker_port(&self) -> u16 {
        self.docker_port
    }

    /// Provisions the host.
    ///
    /// Runs, in order: hostname, base packages, runtime install, readiness
    /// wait, options directory, remote auth paths, auth collaborator,
    /// cluster collaborator. The first failing step's error is returned as
    /// is and later steps do not run. Completed steps are not undone.
    pub fn provision(
        &mut self,
        cluster: ClusterOptions,
        auth: AuthOptions,
        engine: EngineOptions,
    ) -> Result<()> {
        info!(
            "provisioning {} as {}",
            self.host().machine_name(),
            self.backend.os_release_id()
        );
        self.options = ProvisionerOptions {
            auth,
            engine,
            cluster,
        };

        let machine_name = self.host().machine_name().to_string();
        self.set_hostname(&machine_name)?;

        for package in self.backend.packages() {
            self.backend.package(package, PackageAction::Install)?;
        }

        let version = self
            .options
            .engine
            .install_version
            .clone()
            .unwrap_or_else(|| self.backend.bundled_version().to_string());
        self.backend.install_runtime(&version)?;

        self.wait_for_daemon()?;

        self.make_docker_options_dir()?;

        self.options.auth = self.set_remote_auth_options();

        self.auth_configurator.configure_auth(self, &self.options.auth)?;

        self.cluster_configurator
            .configure_cluster(self, &self.options.cluster)?;

        info!("provisioning of {} completed", self.host().machine_name());
        Ok(())
    }

    /// Sets the running and persistent hostname and the `127.0.1.1` entry.
    pub fn set_hostname(&self, name: &str) -> Result<()> {
        shell::validate_hostname(name)?;
        info!("setting hostname to {}", name);
        let host = self.host();
        host.run_privileged(format!("hostname {name} && echo {name} > /etc/hostname"))?;
        host.run_privileged(format!(
            "if grep -xq '127.0.1.1.*' /etc/hosts; then \
            sed -i 's/^127.0.1.1.*/127.0.1.1 {name}/' /etc/hosts; \
            else echo '127.0.1.1 {name}' >> /etc/hosts; fi"
        ))?;
        Ok(())
    }

    /// Creates the remote directory holding the daemon's TLS material.
    pub fn make_docker_options_dir(&self) -> Result<()> {
        let dir = self.backend.docker_options_dir();
        self.host().run_privileged(format!("mkdir -p {}", shell::quote(dir)))?;
        Ok(())
    }

    /// Auth options with remote paths pointing into the docker options dir.
    pub fn set_remote_auth_options(&self) -> AuthOptions {
        let dir = self.backend.docker_options_dir().trim_end_matches('/');
        AuthOptions {
            ca_cert_remote_path: format!("{}/ca.pem", dir),
            server_cert_remote_path: format!("{}/server.pem", dir),
            server_key_remote_path: format!("{}/server-key.pem", dir),
            ..self.options.auth.clone()
        }
    }

    /// Whether the daemon answers a trivial command.
    pub fn docker_daemon_responding(&self) -> bool {
        match self.host().run_privileged("docker version") {
            Ok(_) => true,
            Err(e) => {
                warn!("error running command to check if the daemon is up: {:#}", e);
                false
            }
        }
    }

    /// Blocks until the daemon responds or the readiness budget is spent.
    pub fn wait_for_daemon(&self) -> Result<()> {
        info!("waiting for docker daemon");
        retry::wait_for(&self.readiness, || self.docker_daemon_responding())?;
        Ok(())
    }

    /// Renders the daemon options from the current option snapshot.
    pub fn generate_docker_options(&self) -> Result<DockerOptions> {
        self.backend
            .generate_docker_options(self.docker_port, &self.options)
    }
}
