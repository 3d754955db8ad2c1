//! CentOS 7 backend: yum, systemd, and a `docker.service` drop-in.
//!
//! The drop-in replaces `ExecStart` but still reads `$OPTIONS` from
//! `/etc/sysconfig/docker`, which is where the install step adds the network
//! flag.

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

pub const OS_ID: &str = "centos7";

const DAEMON_OPTIONS_FILE: &str = "/etc/systemd/system/docker.service.d/10-machine.conf";
const SYSCONFIG_FILE: &str = "/etc/sysconfig/docker";
const BUNDLED_VERSION: &str = "1.8.2";
const STORAGE_DRIVER: &str = "devicemapper";
const PACKAGES: &[&str] = &["curl"];

const ENGINE_TEMPLATE: &str = r#"[Service]
EnvironmentFile=-/etc/sysconfig/docker
ExecStart=
ExecStart=/usr/bin/docker daemon $OPTIONS \
-H tcp://0.0.0.0:{{ docker_port }} \
-H unix:///var/run/docker.sock \
{% if other_args %}{{ other_args }} \
{% endif %}--tlsverify \
--tlscacert {{ auth.ca_cert_remote_path }} \
--tlscert {{ auth.server_cert_remote_path }} \
--tlskey {{ auth.server_key_remote_path }} \
{% for label in engine.labels %}--label {{ label }} \
{% endfor %}{% for registry in engine.insecure_registry %}--insecure-registry {{ registry }} \
{% endfor %}{% for mirror in engine.registry_mirror %}--registry-mirror {{ mirror }} \
{% endfor %}{% for flag in engine.arbitrary_flags %}--{{ flag }} \
{% endfor %}--storage-driver {{ storage_driver }}
MountFlags=slave
LimitNOFILE=1048576
LimitNPROC=1048576
LimitCORE=infinity
"#;

pub struct CentOs7Backend {
    host: Arc<RemoteHost>,
}

/// Registry constructor.
pub fn new(host: Arc<RemoteHost>) -> Box<dyn OsBackend> {
    Box::new(CentOs7Backend { host })
}

impl OsBackend for CentOs7Backend {
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
        PackageManager::Yum.run(&self.host, &[], name, action)
    }

    fn service(&self, name: &str, action: ServiceAction) -> Result<()> {
        ServiceManager::Systemd.run(&self.host, name, action)
    }

    fn install_runtime(&self, version: &str) -> Result<()> {
        let plan = RuntimeInstall {
            package: "docker",
            binary: "/usr/bin/docker",
            service: "docker",
            options_patch: format!(
                concat!(
                    r#"grep -q -- '{flag}' {file} || "#,
                    r#"{{ sed -r -i "s/^OPTIONS='?([^']*)'?$/OPTIONS='\1 {flag}'/" {file}"#,
                    r#" && grep -q -- '{flag}' {file}; }}"#,
                ),
                flag = NETWORK_FLAG,
                file = SYSCONFIG_FILE
            ),
        };
        install_runtime_with(self, &plan, version)?;
        self.service(plan.service, ServiceAction::Enable)
    }

    fn generate_docker_options(
        &self,
        docker_port: u16,
        options: &ProvisionerOptions,
    ) -> Result<DockerOptions> {
        generate_with(self, ENGINE_TEMPLATE, STORAGE_DRIVER, docker_port, options)
    }

    fn reload_daemon(&self) -> Result<()> {
        self.service("docker", ServiceAction::DaemonReload)?;
        self.service("docker", ServiceAction::Restart)
    }
}
