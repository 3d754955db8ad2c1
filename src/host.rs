//! The remote host a provisioning run targets.
//!
//! [`RemoteHost`] bundles the machine identity (logical name, driver name,
//! driver-supplied daemon arguments) with the injected command channel.
//! Backends share it through an `Arc` for the duration of a run.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::error::ProvisionError;
use crate::executor::{CommandExecutor, CommandSpec, ExecutionResult};
use crate::privilege::PrivilegeMethod;

/// A remote machine reachable through a [`CommandExecutor`].
pub struct RemoteHost {
    machine_name: String,
    driver_name: String,
    engine_args: String,
    privilege: Option<PrivilegeMethod>,
    executor: Arc<dyn CommandExecutor>,
}

impl std::fmt::Debug for RemoteHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteHost")
            .field("machine_name", &self.machine_name)
            .field("driver_name", &self.driver_name)
            .field("engine_args", &self.engine_args)
            .field("privilege", &self.privilege)
            .finish_non_exhaustive()
    }
}

impl RemoteHost {
    /// Creates a host that runs privileged commands through `sudo`.
    pub fn new(
        machine_name: impl Into<String>,
        driver_name: impl Into<String>,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        Self {
            machine_name: machine_name.into(),
            driver_name: driver_name.into(),
            engine_args: String::new(),
            privilege: Some(PrivilegeMethod::Sudo),
            executor,
        }
    }

    /// Sets extra raw daemon arguments supplied by the host's driver.
    #[must_use]
    pub fn with_engine_args(mut self, engine_args: impl Into<String>) -> Self {
        self.engine_args = engine_args.into();
        self
    }

    /// Sets the privilege escalation method (`None` when logged in as root).
    #[must_use]
    pub fn with_privilege(mut self, privilege: Option<PrivilegeMethod>) -> Self {
        self.privilege = privilege;
        self
    }

    /// Logical machine name, used as the remote hostname.
    pub fn machine_name(&self) -> &str {
        &self.machine_name
    }

    /// Name of the driver that created the host (e.g. `aliyun`).
    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    /// Driver-supplied extra daemon arguments.
    pub fn engine_args(&self) -> &str {
        &self.engine_args
    }

    /// Runs a command as the login user and returns its output.
    pub fn run(&self, command: impl Into<String>) -> Result<String> {
        self.run_spec(CommandSpec::new(command))
    }

    /// Runs a command with the configured privilege escalation.
    pub fn run_privileged(&self, command: impl Into<String>) -> Result<String> {
        self.run_spec(CommandSpec::new(command).with_privilege(self.privilege))
    }

    /// Runs a privileged command that reads `input` from standard input.
    ///
    /// The input stays out of logs and of [`ProvisionError::CommandFailed`].
    pub fn run_privileged_with_input(
        &self,
        command: impl Into<String>,
        input: impl Into<String>,
    ) -> Result<String> {
        self.run_spec(
            CommandSpec::new(command)
                .with_privilege(self.privilege)
                .with_stdin(input),
        )
    }

    fn run_spec(&self, spec: CommandSpec) -> Result<String> {
        debug!("running on {}: {}", self.machine_name, spec.command);
        let result = self.executor.execute(&spec)?;
        if !result.success() {
            return Err(ProvisionError::CommandFailed {
                status: describe_status(&result),
                command: spec.command,
            }
            .into());
        }
        Ok(result.output)
    }
}

fn describe_status(result: &ExecutionResult) -> String {
    match (result.status, result.code()) {
        (_, Some(code)) => format!("exit status: {}", code),
        (Some(status), None) => status.to_string(),
        (None, None) => "unknown status".to_string(),
    }
}
