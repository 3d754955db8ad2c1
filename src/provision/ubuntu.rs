//! Ubuntu backend: apt, Upstart, `/etc/default/docker`.

use std::sync::Arc;

use anyhow::Result;

use super::DockerOptions;
use super::backend::{
    NETWORK_FLAG, OsBackend, PackageManager, RuntimeInstall, ServiceManager, generate_with,
    install_runtime_with,
};
use super::pkgaction::{PackageAction, ServiceAction};
use crate::host::RemoteHost;
use crate::options::ProvisionerOptions;

pub const OS_ID: &str = "ubuntu";

const DAEMON_OPTIONS_FILE: &str = "/etc/default/docker";
const BUNDLED_VERSION: &str = "1.6.2";
const STORAGE_DRIVER: &str = "aufs";
const PACKAGES: &[&str] = &["curl"];
const NAME_SUBSTITUTIONS: &[(&str, &str)] = &[("docker", "docker.io")];

const ENGINE_TEMPLATE: &str = r#"DOCKER_OPTS='
-H tcp://0.0.0.0:{{ docker_port }}
-H unix:///var/run/docker.sock
--storage-driver {{ storage_driver }}
{{ other_args }}
--tlsverify
--tlscacert {{ auth.ca_cert_remote_path }}
--tlscert {{ auth.server_cert_remote_path }}
--tlskey {{ auth.server_key_remote_path }}
{% for label in engine.labels %}--label {{ label }}
{% endfor %}{% for registry in engine.insecure_registry %}--insecure-registry {{ registry }}
{% endfor %}{% for mirror in engine.registry_mirror %}--registry-mirror {{ mirror }}
{% endfor %}{% for flag in engine.arbitrary_flags %}--{{ flag }}
{% endfor %}'
"#;

pub struct UbuntuBackend {
    host: Arc<RemoteHost>,
}

/// Registry constructor.
pub fn new(host: Arc<RemoteHost>) -> Box<dyn OsBackend> {
    Box::new(UbuntuBackend { host })
}

impl OsBackend for UbuntuBackend {
    fn os_release_id(&self) -> &'static str {
        OS_ID
    }

    fn daemon_options_file(&self) -> &'static str {
        DAEMON_OPTIONS_FILE
    }

    fn packages(&self) -> &'static [&'static str] {
        PACKAGES
    }

    fn bundled_version(&self) -> &'static str {
        BUNDLED_VERSION
    }

    fn host(&self) -> &RemoteHost {
        &self.host
    }

    fn package(&self, name: &str, action: PackageAction) -> Result<()> {
        PackageManager::Apt.run(&self.host, NAME_SUBSTITUTIONS, name, action)
    }

    fn service(&self, name: &str, action: ServiceAction) -> Result<()> {
        ServiceManager::Upstart.run(&self.host, name, action)
    }

    fn install_runtime(&self, version: &str) -> Result<()> {
        let plan = RuntimeInstall {
            package: "docker",
            binary: "/usr/bin/docker",
            service: "docker",
            options_patch: format!(
                r#"grep -q -- '{flag}' {file} || echo 'DOCKER_OPTS="{flag}"' >> {file}"#,
                flag = NETWORK_FLAG,
                file = DAEMON_OPTIONS_FILE
            ),
        };
        install_runtime_with(self, &plan, version)
    }

    fn generate_docker_options(
        &self,
        docker_port: u16,
        options: &ProvisionerOptions,
    ) -> Result<DockerOptions> {
        generate_with(self, ENGINE_TEMPLATE, STORAGE_DRIVER, docker_port, options)
    }
}
