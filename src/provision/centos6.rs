//! CentOS 6 backend: yum, SysV init scripts, `/etc/sysconfig/docker`.

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

pub const OS_ID: &str = "centos6";

const DAEMON_OPTIONS_FILE: &str = "/etc/sysconfig/docker";
const BUNDLED_VERSION: &str = "1.5.0";
const STORAGE_DRIVER: &str = "devicemapper";
const PACKAGES: &[&str] = &["curl"];
const NAME_SUBSTITUTIONS: &[(&str, &str)] = &[("docker", "docker-io")];

const ENGINE_TEMPLATE: &str = r#"
other_args='
-H tcp://0.0.0.0:{{ docker_port }}
-H unix:///var/run/docker.sock
{{ other_args }}
--tlsverify
--tlscacert {{ auth.ca_cert_remote_path }}
--tlscert {{ auth.server_cert_remote_path }}
--tlskey {{ auth.server_key_remote_path }}
{% for label in engine.labels %}--label {{ label }}
{% endfor %}{% for registry in engine.insecure_registry %}--insecure-registry {{ registry }}
{% endfor %}{% for mirror in engine.registry_mirror %}--registry-mirror {{ mirror }}
{% endfor %}{% for flag in engine.arbitrary_flags %}--{{ flag }}
{% endfor %}
'
"#;

pub struct CentOs6Backend {
    host: Arc<RemoteHost>,
}

/// Registry constructor.
pub fn new(host: Arc<RemoteHost>) -> Box<dyn OsBackend> {
    Box::new(CentOs6Backend { host })
}

impl OsBackend for CentOs6Backend {
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
        PackageManager::Yum.run(&self.host, NAME_SUBSTITUTIONS, name, action)
    }

    fn service(&self, name: &str, action: ServiceAction) -> Result<()> {
        ServiceManager::SysVinit.run(&self.host, name, action)
    }

    fn install_runtime(&self, version: &str) -> Result<()> {
        let plan = RuntimeInstall {
            package: "docker",
            binary: "/usr/bin/docker",
            service: "docker",
            options_patch: format!(
                concat!(
                    r#"grep -q -- '{flag}' {file} || "#,
                    r#"{{ sed -r -i 's/^other_args="?([^"]*)"?$/other_args="\1 {flag}"/' {file}"#,
                    r#" && grep -q -- '{flag}' {file}; }}"#,
                ),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{AuthOptions, EngineOptions};
    use crate::test_support::{RecordingExecutor, host, position};

    fn backend(exec: &Arc<RecordingExecutor>) -> Box<dyn OsBackend> {
        new(host(exec))
    }

    #[test]
    fn install_uses_substituted_docker_package() {
        let exec = Arc::new(RecordingExecutor::new());
        backend(&exec).package("docker", PackageAction::Install).unwrap();
        let commands = exec.commands();
        assert_eq!(commands, vec!["yum -y makecache", "yum -y install docker-io"]);
        assert!(!commands.iter().any(|c| c.ends_with(" docker")));
    }

    #[test]
    fn remove_skips_metadata_refresh() {
        let exec = Arc::new(RecordingExecutor::new());
        backend(&exec).package("curl", PackageAction::Remove).unwrap();
        assert_eq!(exec.commands(), vec!["yum -y remove curl"]);
    }

    #[test]
    fn upgrade_refreshes_first() {
        let exec = Arc::new(RecordingExecutor::new());
        backend(&exec).package("curl", PackageAction::Upgrade).unwrap();
        assert_eq!(exec.commands(), vec!["yum -y makecache", "yum -y upgrade curl"]);
    }

    #[test]
    fn service_uses_sysv_syntax() {
        let exec = Arc::new(RecordingExecutor::new());
        backend(&exec).service("docker", ServiceAction::Restart).unwrap();
        assert_eq!(exec.commands(), vec!["service docker restart"]);
    }

    #[test]
    fn install_bundled_version_skips_binary_swap() {
        let exec = Arc::new(RecordingExecutor::new());
        backend(&exec).install_runtime(BUNDLED_VERSION).unwrap();
        let commands = exec.commands();
        assert!(position(&commands, "curl -fsSL").is_none());
        assert!(position(&commands, "docker.bak").is_none());
        let install = position(&commands, "yum -y install docker-io").unwrap();
        let patch = position(&commands, "other_args").unwrap();
        let start = position(&commands, "service docker start").unwrap();
        assert!(install < patch && patch < start);
    }

    #[test]
    fn install_other_version_swaps_binary_before_patch_and_start() {
        let exec = Arc::new(RecordingExecutor::new());
        backend(&exec).install_runtime("1.6.2").unwrap();
        let commands = exec.commands();
        let install = position(&commands, "yum -y install docker-io").unwrap();
        let download = position(&commands, "curl -fsSL -o /usr/bin/docker-1.6.2").unwrap();
        let swap = position(&commands, "mv /usr/bin/docker /usr/bin/docker.bak").unwrap();
        let patch = position(&commands, "other_args").unwrap();
        let start = position(&commands, "service docker start").unwrap();
        assert!(install < download);
        assert!(download < swap);
        assert!(swap < patch);
        assert!(patch < start);
        assert!(commands[swap].contains("chmod +x /usr/bin/docker"));
    }

    #[test]
    fn failed_download_halts_install() {
        let exec = Arc::new(RecordingExecutor::new().failing_on("curl -fsSL"));
        assert!(backend(&exec).install_runtime("1.6.2").is_err());
        let commands = exec.commands();
        assert!(position(&commands, "mv /usr/bin/docker").is_none());
        assert!(position(&commands, "service docker start").is_none());
    }

    #[test]
    fn options_patch_accepts_bare_values_and_verifies() {
        let exec = Arc::new(RecordingExecutor::new());
        backend(&exec).install_runtime(BUNDLED_VERSION).unwrap();
        let commands = exec.commands();
        let patch = &commands[position(&commands, "other_args").unwrap()];
        assert_eq!(
            patch,
            concat!(
                "grep -q -- '--bridge=none' /etc/sysconfig/docker || ",
                r#"{ sed -r -i 's/^other_args="?([^"]*)"?$/other_args="\1 --bridge=none"/' "#,
                "/etc/sysconfig/docker && grep -q -- '--bridge=none' /etc/sysconfig/docker; }"
            )
        );
    }

    #[test]
    fn unpatched_options_file_fails_install() {
        let exec = Arc::new(RecordingExecutor::new().failing_on("sed -r -i"));
        let err = backend(&exec).install_runtime(BUNDLED_VERSION).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::error::ProvisionError>(),
            Some(crate::error::ProvisionError::CommandFailed { .. })
        ));
        assert!(position(&exec.commands(), "service docker start").is_none());
    }

    #[test]
    fn generate_appends_provider_label_and_targets_sysconfig() {
        let exec = Arc::new(RecordingExecutor::new());
        let options = ProvisionerOptions {
            engine: EngineOptions {
                labels: vec!["env=prod".to_string()],
                ..Default::default()
            },
            auth: AuthOptions {
                ca_cert_remote_path: "/etc/docker/ca.pem".to_string(),
                server_cert_remote_path: "/etc/docker/server.pem".to_string(),
                server_key_remote_path: "/etc/docker/server-key.pem".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let out = backend(&exec).generate_docker_options(2376, &options).unwrap();
        assert_eq!(out.engine_options_path, "/etc/sysconfig/docker");
        assert!(out.engine_options.starts_with("\nother_args='\n"));
        assert!(out.engine_options.contains("--label env=prod\n--label provider=aliyun\n"));
        assert!(out.engine_options.contains("--tlskey /etc/docker/server-key.pem\n"));
        assert_eq!(options.engine.labels, vec!["env=prod"], "caller options must not change");
        assert!(exec.commands().is_empty(), "rendering must not touch the host");
    }
}
