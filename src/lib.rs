pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod host;
pub mod options;
pub mod privilege;
pub mod provision;
pub mod retry;
pub mod shell;
pub mod template;

#[cfg(test)]
mod test_support;

pub use error::ProvisionError;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{FmtSubscriber, filter::LevelFilter};

use crate::executor::{CommandExecutor, SshExecutor};
use crate::host::RemoteHost;
use crate::options::ProvisionerOptions;
use crate::provision::{DockerOptions, GenericProvisioner, OsBackend, detect_os, registry};

pub fn init_logging(log_level: cli::LogLevel) -> Result<()> {
    let filter = match log_level {
        cli::LogLevel::Trace => LevelFilter::TRACE,
        cli::LogLevel::Debug => LevelFilter::DEBUG,
        cli::LogLevel::Info => LevelFilter::INFO,
        cli::LogLevel::Warn => LevelFilter::WARN,
        cli::LogLevel::Error => LevelFilter::ERROR,
    };

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder().with_max_level(filter).finish(),
    )
    .context("failed to set global default tracing subscriber")
}

fn remote_host(profile: &config::Profile, executor: Arc<dyn CommandExecutor>) -> Arc<RemoteHost> {
    Arc::new(
        RemoteHost::new(&profile.machine.name, &profile.machine.driver, executor)
            .with_engine_args(&profile.machine.engine_args)
            .with_privilege(profile.privilege),
    )
}

/// Selects the backend named by the profile, detecting the OS when unset.
fn select_backend(profile: &config::Profile, host: Arc<RemoteHost>) -> Result<Box<dyn OsBackend>> {
    let os_id = match profile.os {
        Some(ref os) => os.clone(),
        None => detect_os(&host)
            .context("failed to detect the remote operating system")?
            .provisioner_id(),
    };
    info!("using {} backend", os_id);
    Ok(registry().get(&os_id, host)?)
}

/// Builds a provisioner for `profile` that talks to the host through `executor`.
pub fn build_provisioner(
    profile: &config::Profile,
    executor: Arc<dyn CommandExecutor>,
) -> Result<GenericProvisioner> {
    let backend = select_backend(profile, remote_host(profile, executor))?;
    Ok(GenericProvisioner::new(backend)
        .with_docker_port(profile.docker_port)
        .with_readiness(profile.retry_policy()))
}

pub fn run_provision(opts: &cli::ProvisionArgs, executor: Arc<dyn CommandExecutor>) -> Result<()> {
    let file = &opts.common.file;
    let profile = config::load_profile(file)
        .with_context(|| format!("failed to load profile from {}", file))?;
    profile.validate().context("profile validation failed")?;

    if opts.dry_run && profile.os.is_none() {
        anyhow::bail!("dry run requires `os` in the profile; the host cannot be probed");
    }

    let mut provisioner = build_provisioner(&profile, executor)?;
    provisioner
        .provision(profile.cluster.clone(), profile.auth.clone(), profile.engine.clone())
        .with_context(|| format!("failed to provision {}", profile.machine.name))?;

    info!("{} is ready", profile.machine.name);
    Ok(())
}

pub fn run_validate(opts: &cli::CommonArgs) -> Result<()> {
    let profile = config::load_profile(&opts.file)?;
    profile.validate().context("profile validation failed")?;
    info!("validation successful:\n{:#?}", profile);
    Ok(())
}

/// Renders the daemon options for a profile without contacting the host.
pub fn run_render(opts: &cli::CommonArgs) -> Result<DockerOptions> {
    let profile = config::load_profile(&opts.file)?;
    profile.validate().context("profile validation failed")?;
    if profile.os.is_none() {
        anyhow::bail!("render requires `os` in the profile");
    }

    let executor: Arc<dyn CommandExecutor> = Arc::new(SshExecutor {
        target: profile.ssh_target(),
        dry_run: true,
    });
    let mut provisioner = build_provisioner(&profile, executor)?;
    let mut options = ProvisionerOptions {
        auth: profile.auth.clone(),
        engine: profile.engine.clone(),
        cluster: profile.cluster.clone(),
    };
    provisioner.set_options(options.clone());
    options.auth = provisioner.set_remote_auth_options();
    provisioner.set_options(options);
    provisioner.generate_docker_options()
}

/// Registered backend identifiers.
pub fn run_backends() -> Vec<&'static str> {
    registry().ids().collect()
}
