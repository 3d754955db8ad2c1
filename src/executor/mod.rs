//! Remote command execution abstraction for rsprovision.
//!
//! This module provides:
//! - [`CommandSpec`]: Specification for a command to run on the remote host
//! - [`ExecutionResult`]: Result of command execution
//! - [`CommandExecutor`]: Trait for command transports (the command channel)
//! - [`SshExecutor`]: Production implementation shelling out to `ssh`

mod ssh;

use std::process::ExitStatus;

use anyhow::Result;

use crate::privilege::PrivilegeMethod;

pub use ssh::{SshExecutor, SshTarget};

/// Specification for a command to be executed on the remote host.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Shell command line, already composed and escaped by the caller
    pub command: String,
    /// Privilege escalation method to wrap the command
    pub privilege: Option<PrivilegeMethod>,
    /// Data fed to the command's standard input.
    ///
    /// Never logged or copied into errors; it may hold key material.
    pub stdin: Option<String>,
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("command", &self.command)
            .field("privilege", &self.privilege)
            .field("stdin_bytes", &self.stdin.as_ref().map(String::len))
            .finish()
    }
}

impl CommandSpec {
    /// Creates a new unprivileged CommandSpec
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            privilege: None,
            stdin: None,
        }
    }

    /// Sets the data written to the command's standard input
    #[must_use]
    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    /// Sets the privilege escalation method
    #[must_use]
    pub fn with_privilege(mut self, privilege: Option<PrivilegeMethod>) -> Self {
        self.privilege = privilege;
        self
    }

    /// Returns the command line as it is sent over the channel.
    pub fn rendered(&self) -> String {
        match self.privilege {
            Some(method) => method.wrap(&self.command),
            None => self.command.clone(),
        }
    }
}

/// Result of command execution
#[derive(Debug, Default)]
pub struct ExecutionResult {
    /// Exit status of the command (None in dry-run mode)
    pub status: Option<ExitStatus>,
    /// Captured standard output
    pub output: String,
}

impl ExecutionResult {
    /// Returns true if the command executed successfully.
    ///
    /// In dry-run mode (status is None), this always returns true.
    pub fn success(&self) -> bool {
        self.status.is_none_or(|s| s.success())
    }

    /// Returns the exit code if available
    pub fn code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }
}

/// Trait for remote command execution.
///
/// Implementations must be `Send + Sync` so that independent provisioning
/// runs can share an executor across threads.
pub trait CommandExecutor: Send + Sync {
    /// Executes a command on the remote host.
    ///
    /// Transport failures are returned as `Err`; a command that ran and
    /// exited non-zero is reported through [`ExecutionResult::status`].
    fn execute(&self, spec: &CommandSpec) -> Result<ExecutionResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    #[test]
    fn rendered_without_privilege_is_verbatim() {
        let spec = CommandSpec::new("docker version");
        assert_eq!(spec.rendered(), "docker version");
    }

    #[test]
    fn rendered_with_privilege_wraps_command() {
        let spec = CommandSpec::new("docker version").with_privilege(Some(PrivilegeMethod::Sudo));
        assert_eq!(spec.rendered(), "sudo sh -c 'docker version'");
    }

    #[test]
    fn debug_output_omits_stdin_content() {
        let spec = CommandSpec::new("cat > /etc/docker/server-key.pem").with_stdin("PRIVATE KEY");
        let shown = format!("{:?}", spec);
        assert!(!shown.contains("PRIVATE KEY"), "{}", shown);
        assert!(shown.contains("stdin_bytes: Some(11)"), "{}", shown);
        assert_eq!(spec.rendered(), "cat > /etc/docker/server-key.pem");
    }

    #[test]
    fn dry_run_result_is_success() {
        let result = ExecutionResult::default();
        assert!(result.success());
        assert_eq!(result.code(), None);
    }

    #[test]
    fn non_zero_exit_is_failure() {
        let result = ExecutionResult {
            status: Some(ExitStatus::from_raw(1 << 8)),
            output: String::new(),
        };
        assert!(!result.success());
        assert_eq!(result.code(), Some(1));
    }
}
