use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::sync::{Arc, Mutex};

use camino::Utf8PathBuf;
use rsprovision::executor::{CommandExecutor, CommandSpec, ExecutionResult};
use rsprovision::host::RemoteHost;
use tempfile::TempDir;

/// Executor that records commands and fails those containing a needle.
#[derive(Default)]
#[allow(dead_code)]
pub struct MockExecutor {
    calls: Mutex<Vec<CommandSpec>>,
    fail_on: Vec<String>,
    responses: Vec<(String, String)>,
}

#[allow(dead_code)]
impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on.push(needle.to_string());
        self
    }

    pub fn responding(mut self, needle: &str, output: &str) -> Self {
        self.responses.push((needle.to_string(), output.to_string()));
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|c| c.command.clone()).collect()
    }

    pub fn specs(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandExecutor for MockExecutor {
    fn execute(&self, spec: &CommandSpec) -> anyhow::Result<ExecutionResult> {
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

/// Host `node-1` created by the `aliyun` driver.
#[allow(dead_code)]
pub fn host(executor: &Arc<MockExecutor>) -> Arc<RemoteHost> {
    Arc::new(RemoteHost::new("node-1", "aliyun", executor.clone()))
}

/// Index of the first command containing `needle`.
#[allow(dead_code)]
pub fn position(commands: &[String], needle: &str) -> Option<usize> {
    commands.iter().position(|c| c.contains(needle))
}

/// Writes `yaml` to `profile.yaml` inside a fresh temporary directory.
///
/// The directory must outlive the returned path.
#[allow(dead_code)]
pub fn write_profile(yaml: &str) -> (TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("profile.yaml"))
        .expect("non-UTF-8 temp path");
    std::fs::write(&path, yaml).expect("failed to write profile");
    (dir, path)
}
