//! Host profile loading and validation.
//!
//! A profile is a YAML document describing one machine to provision: how to
//! reach it, which backend to use (or none, to detect it), and the option
//! bundles handed to the provisioner.

use std::fs::File;
use std::io::BufReader;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use tracing::debug;

use crate::error::ProvisionError;
use crate::executor::SshTarget;
use crate::options::{AuthOptions, ClusterOptions, EngineOptions};
use crate::privilege::PrivilegeMethod;
use crate::provision::{DEFAULT_DOCKER_PORT, registry};
use crate::retry::RetryPolicy;
use crate::shell;

/// Machine identity and connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineConfig {
    /// Logical machine name, set as the remote hostname
    pub name: String,
    /// Name of the driver that created the machine
    pub driver: String,
    /// Host name or IP address used for SSH
    pub address: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    #[serde(default)]
    pub identity_file: Option<Utf8PathBuf>,
    /// Extra raw daemon arguments supplied by the driver
    #[serde(default)]
    pub engine_args: String,
}

/// Daemon readiness polling budget.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadinessConfig {
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            delay_secs: default_delay_secs(),
        }
    }
}

/// A complete host profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub machine: MachineConfig,
    /// Backend identifier; detected from the host when absent
    #[serde(default)]
    pub os: Option<String>,
    /// Privilege escalation method; `null` when logging in as root
    #[serde(default = "default_privilege")]
    pub privilege: Option<PrivilegeMethod>,
    #[serde(default = "default_docker_port")]
    pub docker_port: u16,
    #[serde(default)]
    pub engine: EngineOptions,
    #[serde(default)]
    pub auth: AuthOptions,
    #[serde(default)]
    pub cluster: ClusterOptions,
    #[serde(default)]
    pub readiness: ReadinessConfig,
}

fn default_user() -> String {
    "root".to_string()
}

fn default_ssh_port() -> u16 {
    22
}

fn default_attempts() -> u32 {
    60
}

fn default_delay_secs() -> u64 {
    3
}

fn default_privilege() -> Option<PrivilegeMethod> {
    Some(PrivilegeMethod::Sudo)
}

fn default_docker_port() -> u16 {
    DEFAULT_DOCKER_PORT
}

impl Profile {
    /// Checks the profile for values that would fail mid-run.
    pub fn validate(&self) -> Result<(), ProvisionError> {
        shell::validate_hostname(&self.machine.name)?;

        if self.machine.address.trim().is_empty() {
            return Err(ProvisionError::Validation("machine.address must not be empty".to_string()));
        }
        if self.machine.driver.trim().is_empty() {
            return Err(ProvisionError::Validation("machine.driver must not be empty".to_string()));
        }
        if self.docker_port == 0 {
            return Err(ProvisionError::Validation("docker_port must not be 0".to_string()));
        }
        if self.readiness.attempts == 0 {
            return Err(ProvisionError::Validation(
                "readiness.attempts must be at least 1".to_string(),
            ));
        }

        if let Some(ref os) = self.os {
            if !registry().contains(os) {
                return Err(ProvisionError::UnsupportedOs { id: os.clone() });
            }
        }

        if let Some(ref version) = self.engine.install_version {
            shell::validate_version(version)?;
        }

        let local_certs = [
            &self.auth.ca_cert_path,
            &self.auth.server_cert_path,
            &self.auth.server_key_path,
        ];
        for path in local_certs.into_iter().flatten() {
            if !path.is_file() {
                return Err(ProvisionError::Validation(format!(
                    "certificate file does not exist: {}",
                    path
                )));
            }
        }

        Ok(())
    }

    /// SSH connection parameters for the machine.
    pub fn ssh_target(&self) -> SshTarget {
        SshTarget {
            address: self.machine.address.clone(),
            user: self.machine.user.clone(),
            port: self.machine.port,
            identity_file: self.machine.identity_file.clone(),
        }
    }

    /// Readiness budget as a fixed-delay retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(self.readiness.attempts, Duration::from_secs(self.readiness.delay_secs))
    }
}

/// Loads a profile from a YAML file.
pub fn load_profile(path: &Utf8Path) -> Result<Profile, ProvisionError> {
    let file = File::open(path)
        .map_err(|e| ProvisionError::io(format!("failed to load file: {}", path), e))?;
    let reader = BufReader::new(file);
    let profile: Profile = serde_yaml::from_reader(reader)
        .map_err(|e| ProvisionError::Config(format!("failed to parse yaml: {}: {}", path, e)))?;
    debug!("loaded profile for {}", profile.machine.name);
    Ok(profile)
}
