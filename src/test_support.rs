//! Recording executor shared by unit tests.

use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::executor::{CommandExecutor, CommandSpec, ExecutionResult};
use crate::host::RemoteHost;

/// Records every command and fails those containing a configured substring.
#[derive(Default)]
pub(crate) struct RecordingExecutor {
    calls: Mutex<Vec<CommandSpec>>,
    fail_on: Vec<String>,
    responses: Vec<(String, String)>,
}

impl RecordingExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Commands containing `needle` exit with status 1.
    pub(crate) fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on.push(needle.to_string());
        self
    }

    /// Commands containing `needle` print `output`.
    pub(crate) fn responding(mut self, needle: &str, output: &str) -> Self {
        self.responses.push((needle.to_string(), output.to_string()));
        self
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|c| c.command.clone()).collect()
    }

    pub(crate) fn specs(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandExecutor for RecordingExecutor {
    fn execute(&self, spec: &CommandSpec) -> Result<ExecutionResult> {
        self.calls.lock().unwrap().push(spec.clone());
        let failed = self.fail_on.iter().any(|n| spec.command.contains(n.as_str()));
        let output = self
            .responses
            .iter()
            .find(|(n, _)| spec.command.contains(n.as_str()))
            .map(|(_, o)| o.clone())
            .unwrap_or_default();
        Ok(ExecutionResult {
            status: Some(ExitStatus::from_raw(if failed { 1 << 8 } else { 0 })),
            output,
        })
    }
}

/// Builds a host named `node-1` created by the `aliyun` driver.
pub(crate) fn host(executor: &Arc<RecordingExecutor>) -> Arc<RemoteHost> {
    Arc::new(RemoteHost::new("node-1", "aliyun", executor.clone()))
}

/// Index of the first recorded command containing `needle`.
pub(crate) fn position(commands: &[String], needle: &str) -> Option<usize> {
    commands.iter().position(|c| c.contains(needle))
}
