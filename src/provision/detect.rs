//! Remote OS detection.
//!
//! Reads `/etc/os-release` and falls back to `/etc/redhat-release` for
//! releases that predate it (CentOS 6). The result maps onto a registry
//! identifier via [`OsRelease::provisioner_id`].

use anyhow::Result;
use tracing::{debug, info};

use crate::error::ProvisionError;
use crate::host::RemoteHost;

/// Identity of the remote operating system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    /// Lowercase distribution id (`centos`, `ubuntu`, ...)
    pub id: String,
    /// Version string (`7`, `6.7`, `14.04`, ...)
    pub version_id: String,
}

impl OsRelease {
    /// Registry identifier for this release.
    ///
    /// Red Hat family releases are keyed by major version (`centos6`,
    /// `centos7`); other distributions by id alone.
    ///
    /// The `ubuntu` backend drives Upstart, so it covers releases up to
    /// 14.10. Ubuntu 15.04 and later boot with systemd and map to
    /// `ubuntu-systemd`, which has no registered backend.
    pub fn provisioner_id(&self) -> String {
        match self.id.as_str() {
            "centos" | "rhel" => {
                let major = self.version_id.split('.').next().unwrap_or_default();
                format!("centos{}", major)
            }
            "ubuntu" if self.ubuntu_uses_systemd() => "ubuntu-systemd".to_string(),
            other => other.to_string(),
        }
    }

    fn ubuntu_uses_systemd(&self) -> bool {
        let mut parts = self.version_id.split('.').map(str::parse::<u32>);
        match (parts.next(), parts.next()) {
            (Some(Ok(major)), Some(Ok(minor))) => (major, minor) >= UBUNTU_FIRST_SYSTEMD,
            (Some(Ok(major)), None) => major > UBUNTU_FIRST_SYSTEMD.0,
            _ => false,
        }
    }
}

const UBUNTU_FIRST_SYSTEMD: (u32, u32) = (15, 4);

/// Parses `/etc/os-release` content.
pub fn parse_os_release(content: &str) -> OsRelease {
    let mut release = OsRelease::default();
    for line in content.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');
        match key.trim() {
            "ID" => release.id = value.to_ascii_lowercase(),
            "VERSION_ID" => release.version_id = value.to_string(),
            _ => {}
        }
    }
    release
}

/// Parses `/etc/redhat-release` content such as `CentOS release 6.7 (Final)`.
pub fn parse_redhat_release(content: &str) -> Option<OsRelease> {
    let line = content.lines().next()?.trim();
    let id = if line.starts_with("CentOS") {
        "centos"
    } else if line.starts_with("Red Hat Enterprise Linux") {
        "rhel"
    } else {
        return None;
    };
    let version_id = line
        .split_whitespace()
        .find(|word| word.starts_with(|c: char| c.is_ascii_digit()))?
        .to_string();
    Some(OsRelease {
        id: id.to_string(),
        version_id,
    })
}

/// Detects the OS running on `host`.
pub fn detect_os(host: &RemoteHost) -> Result<OsRelease> {
    match host.run("cat /etc/os-release") {
        Ok(content) if !content.trim().is_empty() => {
            let release = parse_os_release(&content);
            if !release.id.is_empty() {
                info!("detected {} {}", release.id, release.version_id);
                return Ok(release);
            }
        }
        Ok(_) => debug!("/etc/os-release is empty"),
        Err(e) => debug!("cannot read /etc/os-release: {:#}", e),
    }

    let content = host.run("cat /etc/redhat-release")?;
    let release = parse_redhat_release(&content).ok_or_else(|| ProvisionError::UnsupportedOs {
        id: content.lines().next().unwrap_or_default().trim().to_string(),
    })?;
    info!("detected {} {}", release.id, release.version_id);
    Ok(release)
}
