//! SSH command executor implementation.
//!
//! This module provides [`SshExecutor`], which runs commands on the remote
//! host by spawning the system `ssh` client with batch-mode options and
//! capturing its standard output.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use which::which;

use super::{CommandExecutor, CommandSpec, ExecutionResult};

/// Connection parameters for a remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    /// Host name or IP address
    pub address: String,
    /// Remote login user
    pub user: String,
    /// SSH port
    pub port: u16,
    /// Private key used for authentication (defaults to the ssh agent)
    pub identity_file: Option<Utf8PathBuf>,
}

impl SshTarget {
    /// Builds the `ssh` argument list for a remote command.
    pub fn args(&self, remote_command: &str) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            "LogLevel=quiet".to_string(),
            "-p".to_string(),
            self.port.to_string(),
        ];
        if let Some(ref identity) = self.identity_file {
            args.push("-i".to_string());
            args.push(identity.to_string());
        }
        args.push(format!("{}@{}", self.user, self.address));
        args.push("--".to_string());
        args.push(remote_command.to_string());
        args
    }
}

/// Command executor that runs commands over `ssh`.
///
/// When `dry_run` is true, commands are logged but not executed,
/// and `execute()` returns an empty successful result.
pub struct SshExecutor {
    pub target: SshTarget,
    pub dry_run: bool,
}

impl CommandExecutor for SshExecutor {
    fn execute(&self, spec: &CommandSpec) -> Result<ExecutionResult> {
        let remote_command = spec.rendered();

        if self.dry_run {
            match spec.stdin {
                Some(ref input) => tracing::info!(
                    "dry run: {}@{}: {} (with {} bytes on stdin)",
                    self.target.user,
                    self.target.address,
                    remote_command,
                    input.len()
                ),
                None => tracing::info!(
                    "dry run: {}@{}: {}",
                    self.target.user,
                    self.target.address,
                    remote_command
                ),
            }
            return Ok(ExecutionResult::default());
        }

        let ssh = which("ssh").context("command not found: ssh")?;
        tracing::trace!("command found: ssh: {}", ssh.to_string_lossy());

        let mut child = Command::new(ssh)
            .args(self.target.args(&remote_command))
            .stdin(if spec.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to run ssh to {}", self.target.address))?;

        if let (Some(input), Some(mut pipe)) = (spec.stdin.as_ref(), child.stdin.take()) {
            pipe.write_all(input.as_bytes())
                .with_context(|| format!("failed to send input to {}", self.target.address))?;
        }

        let output = child
            .wait_with_output()
            .with_context(|| format!("failed to wait for ssh to {}", self.target.address))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            tracing::debug!(stream = "stderr", "{}", line);
        }

        tracing::trace!(
            "executed remote command: {}: success={}",
            remote_command,
            output.status.success()
        );

        Ok(ExecutionResult {
            status: Some(output.status),
            output: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}
