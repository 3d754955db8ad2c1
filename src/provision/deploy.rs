//! Default collaborators for the last two provisioning steps.

use std::fs;

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info};

use super::generic::GenericProvisioner;
use super::{AuthConfigurator, ClusterConfigurator};
use crate::error::ProvisionError;
use crate::host::RemoteHost;
use crate::options::{AuthOptions, ClusterOptions};
use crate::shell;

/// Deploys TLS material and the rendered daemon options, then restarts the
/// daemon and waits for it.
///
/// Local certificate paths that are set are uploaded to their remote
/// location. Unset ones must already exist on the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct EngineConfigDeployer;

impl AuthConfigurator for EngineConfigDeployer {
    fn configure_auth(&self, provisioner: &GenericProvisioner, auth: &AuthOptions) -> Result<()> {
        let host = provisioner.host();
        let pairs = [
            (&auth.ca_cert_path, &auth.ca_cert_remote_path),
            (&auth.server_cert_path, &auth.server_cert_remote_path),
            (&auth.server_key_path, &auth.server_key_remote_path),
        ];
        for (local, remote) in pairs {
            deploy_file(host, local.as_deref(), remote)?;
        }

        let options = provisioner.generate_docker_options()?;
        info!("writing daemon options to {}", options.engine_options_path);
        write_remote_file(host, &options.engine_options_path, &options.engine_options)?;

        provisioner.backend().reload_daemon()?;
        provisioner.wait_for_daemon()
    }
}

fn deploy_file(host: &RemoteHost, local: Option<&Utf8Path>, remote: &str) -> Result<()> {
    if remote.is_empty() {
        return Err(
            ProvisionError::Validation("remote certificate path is empty".to_string()).into(),
        );
    }
    match local {
        Some(local) => {
            debug!("uploading {} to {}", local, remote);
            let content = fs::read_to_string(local)
                .map_err(|e| ProvisionError::io(format!("failed to read {}", local), e))?;
            write_remote_file(host, remote, &content)
        }
        None => {
            debug!("expecting {} to exist on the host", remote);
            host.run_privileged(format!("test -f {}", shell::quote(remote)))?;
            Ok(())
        }
    }
}

/// Writes `content` to `path` on the host, creating the parent directory.
///
/// The content travels on standard input so it never appears on a command
/// line.
fn write_remote_file(host: &RemoteHost, path: &str, content: &str) -> Result<()> {
    let dir = Utf8PathBuf::from(path)
        .parent()
        .map(Utf8Path::to_string)
        .filter(|dir| !dir.is_empty())
        .unwrap_or_else(|| "/".to_string());
    host.run_privileged_with_input(
        format!("mkdir -p {} && cat > {}", shell::quote(&dir), shell::quote(path)),
        content,
    )?;
    Ok(())
}

/// Cluster collaborator for standalone hosts.
///
/// Succeeds when cluster membership is disabled and rejects enabled
/// cluster options, since no cluster agent is deployed.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandaloneCluster;

impl ClusterConfigurator for StandaloneCluster {
    fn configure_cluster(
        &self,
        _provisioner: &GenericProvisioner,
        cluster: &ClusterOptions,
    ) -> Result<()> {
        if cluster.enabled {
            return Err(ProvisionError::Validation(format!(
                "cluster membership is not supported (discovery {:?})",
                cluster.discovery
            ))
            .into());
        }
        debug!("cluster membership disabled");
        Ok(())
    }
}
