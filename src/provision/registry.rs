//! Lookup table from OS identifiers to backend constructors.
//!
//! The table is built once by [`register_all_backends`] and is read-only
//! afterwards; [`registry`] exposes a process-wide instance.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use super::backend::OsBackend;
use super::{centos6, centos7, ubuntu};
use crate::error::ProvisionError;
use crate::host::RemoteHost;

/// Builds a backend for one provisioning run.
pub type Constructor = fn(Arc<RemoteHost>) -> Box<dyn OsBackend>;

/// OS identifier → backend constructor.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    constructors: BTreeMap<String, Constructor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `constructor` under `os_id`, replacing any previous entry.
    pub fn register(&mut self, os_id: impl Into<String>, constructor: Constructor) {
        let os_id = os_id.into();
        if self.constructors.insert(os_id.clone(), constructor).is_some() {
            tracing::warn!("backend {} registered twice; keeping the latest", os_id);
        }
    }

    /// Constructs the backend registered under `os_id`.
    pub fn get(
        &self,
        os_id: &str,
        host: Arc<RemoteHost>,
    ) -> Result<Box<dyn OsBackend>, ProvisionError> {
        let constructor = self
            .constructors
            .get(os_id)
            .ok_or_else(|| ProvisionError::UnsupportedOs {
                id: os_id.to_string(),
            })?;
        Ok(constructor(host))
    }

    pub fn contains(&self, os_id: &str) -> bool {
        self.constructors.contains_key(os_id)
    }

    /// Registered identifiers in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

/// Builds a registry containing every built-in backend.
pub fn register_all_backends() -> Registry {
    let mut registry = Registry::new();
    registry.register(centos6::OS_ID, centos6::new);
    registry.register(centos7::OS_ID, centos7::new);
    registry.register(ubuntu::OS_ID, ubuntu::new);
    registry
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Process-wide registry, populated on first access.
pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(register_all_backends)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingExecutor, host};

    #[test]
    fn builtin_ids_are_sorted() {
        let registry = register_all_backends();
        let ids: Vec<&str> = registry.ids().collect();
        assert_eq!(ids, vec!["centos6", "centos7", "ubuntu"]);
    }

    #[test]
    fn get_unknown_id_is_unsupported_os() {
        let exec = Arc::new(RecordingExecutor::new());
        let err = register_all_backends().get("plan9", host(&exec)).err().unwrap();
        assert!(matches!(err, ProvisionError::UnsupportedOs { ref id } if id == "plan9"));
    }

    #[test]
    fn every_backend_reports_its_registration() {
        let exec = Arc::new(RecordingExecutor::new());
        let registry = register_all_backends();
        for id in registry.ids() {
            let backend = registry.get(id, host(&exec)).unwrap();
            assert_eq!(backend.os_release_id(), id);
        }
    }

    #[test]
    fn register_custom_constructor() {
        let mut registry = Registry::new();
        registry.register("my-centos", centos6::new);
        assert!(registry.contains("my-centos"));
        assert!(!registry.contains("centos6"));
    }

    #[test]
    fn global_registry_is_shared() {
        assert!(std::ptr::eq(registry(), registry()));
        assert!(registry().contains("ubuntu"));
    }
}
