//! OS backend trait and the machinery shared by its implementations.
//!
//! A backend knows one OS family's package manager, service manager, file
//! layout and daemon options syntax. Package and service dialects are
//! described by [`PackageManager`] and [`ServiceManager`]; the runtime
//! install sequence is described by a [`RuntimeInstall`] plan executed by
//! [`install_runtime_with`].

use anyhow::Result;
use tracing::{debug, info};
use url::Url;

use super::DockerOptions;
use super::pkgaction::{PackageAction, ServiceAction};
use crate::error::ProvisionError;
use crate::host::RemoteHost;
use crate::options::ProvisionerOptions;
use crate::shell;
use crate::template::{self, EngineConfigContext};

/// Network flag appended to the daemon startup options on install.
pub(crate) const NETWORK_FLAG: &str = "--bridge=none";

/// Release builds of the docker binary, one file per version.
const DOCKER_BUILDS_URL: &str = "https://get.docker.com/builds/Linux/x86_64/";

/// OS-specific half of provisioning.
pub trait OsBackend: Send + Sync {
    /// Identifier this backend is registered under (e.g. `centos6`).
    fn os_release_id(&self) -> &'static str;

    /// Remote path of the daemon options file.
    fn daemon_options_file(&self) -> &'static str;

    /// Remote directory holding TLS material for the daemon.
    fn docker_options_dir(&self) -> &'static str {
        "/etc/docker"
    }

    /// Packages that must be present before the runtime is installed.
    fn packages(&self) -> &'static [&'static str];

    /// Engine version shipped by the OS package.
    fn bundled_version(&self) -> &'static str;

    /// The host this backend operates on.
    fn host(&self) -> &RemoteHost;

    /// Runs a package manager action.
    fn package(&self, name: &str, action: PackageAction) -> Result<()>;

    /// Runs a service manager action.
    fn service(&self, name: &str, action: ServiceAction) -> Result<()>;

    /// Installs and starts the container runtime at `version`.
    fn install_runtime(&self, version: &str) -> Result<()>;

    /// Renders the daemon options file for `docker_port`.
    fn generate_docker_options(
        &self,
        docker_port: u16,
        options: &ProvisionerOptions,
    ) -> Result<DockerOptions>;

    /// Makes the daemon pick up a freshly written options file.
    fn reload_daemon(&self) -> Result<()> {
        self.service("docker", ServiceAction::Restart)
    }
}

/// Package manager dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Yum,
    Apt,
}

impl PackageManager {
    /// Command that refreshes package metadata.
    pub fn refresh_command(&self) -> &'static str {
        match self {
            Self::Yum => "yum -y makecache",
            Self::Apt => "apt-get update",
        }
    }

    /// Command that applies `action` to the (already substituted) package.
    pub fn action_command(&self, action: PackageAction, name: &str) -> String {
        match (self, action) {
            (Self::Yum, action) => format!("yum -y {} {}", action, name),
            (Self::Apt, PackageAction::Install) => {
                format!("DEBIAN_FRONTEND=noninteractive apt-get install -y -q {}", name)
            }
            (Self::Apt, PackageAction::Remove) => format!("apt-get remove -y -q {}", name),
            (Self::Apt, PackageAction::Upgrade) => format!(
                "DEBIAN_FRONTEND=noninteractive apt-get install -y -q --only-upgrade {}",
                name
            ),
        }
    }

    /// Runs `action` for the logical package `name` on `host`.
    ///
    /// The name is mapped through `substitutions` first. Install and Upgrade
    /// refresh metadata with a separate command; a refresh failure aborts the
    /// call.
    pub fn run(
        &self,
        host: &RemoteHost,
        substitutions: &[(&str, &str)],
        name: &str,
        action: PackageAction,
    ) -> Result<()> {
        debug!("{} - {} begin", name, action);
        let name = substitute(substitutions, name);
        shell::validate_package_name(name)?;

        if action.refreshes_metadata() {
            info!("updating package metadata");
            host.run_privileged(self.refresh_command())?;
        }

        info!("running {} for {}", action, name);
        host.run_privileged(self.action_command(action, name))?;
        Ok(())
    }
}

/// Maps a logical package name to the OS-specific one.
pub fn substitute<'a>(substitutions: &[(&'a str, &'a str)], name: &'a str) -> &'a str {
    substitutions
        .iter()
        .find(|(logical, _)| *logical == name)
        .map_or(name, |(_, actual)| actual)
}

/// Service manager dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceManager {
    /// `service` plus `chkconfig` (Red Hat SysV init)
    SysVinit,
    /// `service` plus `/etc/init/<name>.override` (Upstart)
    Upstart,
    /// `systemctl`
    Systemd,
}

impl ServiceManager {
    /// Command for `action` on `name`, or `None` when the action is a no-op.
    pub fn command(&self, name: &str, action: ServiceAction) -> Option<String> {
        match (self, action) {
            (Self::Systemd, ServiceAction::DaemonReload) => {
                Some("systemctl daemon-reload".to_string())
            }
            (Self::Systemd, action) => Some(format!("systemctl {} {}", action, name)),
            (_, ServiceAction::DaemonReload) => None,
            (Self::SysVinit, ServiceAction::Enable) => Some(format!("chkconfig {} on", name)),
            (Self::SysVinit, ServiceAction::Disable) => Some(format!("chkconfig {} off", name)),
            (Self::Upstart, ServiceAction::Enable) => {
                Some(format!("rm -f /etc/init/{}.override", name))
            }
            (Self::Upstart, ServiceAction::Disable) => {
                Some(format!("echo manual > /etc/init/{}.override", name))
            }
            (_, action) => Some(format!("service {} {}", name, action)),
        }
    }

    /// Runs `action` on service `name`; channel errors are returned unchanged.
    pub fn run(&self, host: &RemoteHost, name: &str, action: ServiceAction) -> Result<()> {
        shell::validate_package_name(name)?;
        match self.command(name, action) {
            Some(command) => {
                host.run_privileged(command)?;
            }
            None => debug!("{} {} is a no-op for {:?}", name, action, self),
        }
        Ok(())
    }
}

/// OS-specific inputs to the runtime install sequence.
#[derive(Debug, Clone)]
pub struct RuntimeInstall {
    /// Logical package name passed to [`OsBackend::package`]
    pub package: &'static str,
    /// Path of the daemon binary
    pub binary: &'static str,
    /// Service name passed to [`OsBackend::service`]
    pub service: &'static str,
    /// Command that adds [`NETWORK_FLAG`] to the startup options file
    pub options_patch: String,
}

/// Download URL of a specific docker release binary.
pub fn docker_download_url(version: &str) -> Result<Url, ProvisionError> {
    shell::validate_version(version)?;
    Url::parse(DOCKER_BUILDS_URL)
        .and_then(|base| base.join(&format!("docker-{}", version)))
        .map_err(|e| {
            ProvisionError::Validation(format!("invalid download url for {}: {}", version, e))
        })
}

/// Runs the install sequence:
/// package installed, binary replaced (only when `version` differs from the
/// bundled version), options patched, service started.
///
/// Each step must succeed before the next runs; nothing is rolled back.
pub fn install_runtime_with(
    backend: &dyn OsBackend,
    plan: &RuntimeInstall,
    version: &str,
) -> Result<()> {
    let host = backend.host();
    let replace_binary = version != backend.bundled_version();
    let url = if replace_binary {
        Some(docker_download_url(version)?)
    } else {
        None
    };

    info!("installing {} from the package manager", plan.package);
    backend.package(plan.package, PackageAction::Install)?;

    if let Some(url) = url {
        let staged = format!("{}-{}", plan.binary, version);
        info!("downloading docker {}", version);
        host.run_privileged(format!("curl -fsSL -o {} {}", staged, shell::quote(url.as_str())))?;
        host.run_privileged(format!(
            "mv {bin} {bin}.bak && mv {staged} {bin} && chmod +x {bin}",
            bin = plan.binary,
            staged = staged
        ))?;
    } else {
        debug!("keeping bundled docker {}", version);
    }

    host.run_privileged(plan.options_patch.clone())?;

    info!("starting docker daemon");
    backend.service(plan.service, ServiceAction::Start)?;
    Ok(())
}

/// Renders `definition` for `backend` into its daemon options file.
///
/// A `provider=<driver>` label is appended to a copy of the engine labels;
/// `options` itself is left untouched.
pub fn generate_with(
    backend: &dyn OsBackend,
    definition: &str,
    default_storage_driver: &str,
    docker_port: u16,
    options: &ProvisionerOptions,
) -> Result<DockerOptions> {
    let host = backend.host();
    let mut engine = options.engine.clone();
    engine.labels.push(format!("provider={}", host.driver_name()));

    let storage_driver = engine
        .storage_driver
        .clone()
        .unwrap_or_else(|| default_storage_driver.to_string());

    let ctx = EngineConfigContext {
        docker_port,
        other_args: host.engine_args().to_string(),
        storage_driver,
        auth: options.auth.clone(),
        engine,
    };

    let engine_options = template::render(backend.os_release_id(), definition, &ctx)?;
    Ok(DockerOptions {
        engine_options,
        engine_options_path: backend.daemon_options_file().to_string(),
    })
}
