//! Privilege escalation for remote commands.
//!
//! Most provisioning commands need root on the target host. When the
//! profile selects a method, privileged commands are wrapped as
//! `<method> sh -c '<command>'` so that compound commands (`a && b`, pipes,
//! redirections) run entirely under the escalated shell.

use serde::{Deserialize, Serialize};

use crate::shell;

/// Privilege escalation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivilegeMethod {
    /// Use `sudo` for privilege escalation.
    Sudo,
    /// Use `doas` for privilege escalation.
    Doas,
}

impl PrivilegeMethod {
    /// Returns the command name for this privilege method.
    pub fn command_name(&self) -> &'static str {
        match self {
            Self::Sudo => "sudo",
            Self::Doas => "doas",
        }
    }

    /// Wraps a shell command so that it runs with escalated privileges.
    pub fn wrap(&self, command: &str) -> String {
        format!("{} sh -c {}", self.command_name(), shell::quote(command))
    }
}

impl std::fmt::Display for PrivilegeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.command_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privilege_method_command_name() {
        assert_eq!(PrivilegeMethod::Sudo.command_name(), "sudo");
        assert_eq!(PrivilegeMethod::Doas.command_name(), "doas");
    }

    #[test]
    fn privilege_method_display() {
        assert_eq!(PrivilegeMethod::Sudo.to_string(), "sudo");
        assert_eq!(PrivilegeMethod::Doas.to_string(), "doas");
    }

    #[test]
    fn privilege_method_deserialize() {
        let sudo: PrivilegeMethod = serde_yaml::from_str("sudo").unwrap();
        assert_eq!(sudo, PrivilegeMethod::Sudo);

        let doas: PrivilegeMethod = serde_yaml::from_str("doas").unwrap();
        assert_eq!(doas, PrivilegeMethod::Doas);
    }

    #[test]
    fn privilege_method_rejects_invalid_value() {
        let result: Result<PrivilegeMethod, _> = serde_yaml::from_str("pkexec");
        assert!(result.is_err(), "pkexec should not be a valid PrivilegeMethod");
    }

    #[test]
    fn wrap_runs_compound_command_in_shell() {
        assert_eq!(
            PrivilegeMethod::Sudo.wrap("yum -y makecache && yum -y install curl"),
            "sudo sh -c 'yum -y makecache && yum -y install curl'"
        );
    }

    #[test]
    fn wrap_escapes_single_quotes() {
        assert_eq!(PrivilegeMethod::Doas.wrap("echo 'hi'"), r#"doas sh -c 'echo '\''hi'\'''"#);
    }
}
