//! Daemon configuration rendering.
//!
//! Each backend ships its daemon options file as a Tera template. Templates
//! are parsed once with [`EngineTemplate::parse`]; rendering is a pure
//! function of an [`EngineConfigContext`] and never touches the host.
//! Autoescaping is disabled: the output is shell/unit-file text, not HTML.

use serde::Serialize;
use tera::{Context, Tera};

use crate::error::ProvisionError;
use crate::options::{AuthOptions, EngineOptions};

/// Values available to an engine configuration template.
///
/// Templates refer to `docker_port`, `other_args`, `storage_driver`,
/// `auth.*` and `engine.*`.
#[derive(Debug, Clone, Serialize)]
pub struct EngineConfigContext {
    pub docker_port: u16,
    pub other_args: String,
    pub storage_driver: String,
    pub auth: AuthOptions,
    pub engine: EngineOptions,
}

/// A parsed daemon configuration template.
pub struct EngineTemplate {
    name: String,
    tera: Tera,
}

impl std::fmt::Debug for EngineTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineTemplate").field("name", &self.name).finish_non_exhaustive()
    }
}

impl EngineTemplate {
    /// Parses a template definition.
    ///
    /// Fails with [`ProvisionError::Template`] if the definition is malformed.
    pub fn parse(name: &str, definition: &str) -> Result<Self, ProvisionError> {
        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        tera.add_raw_template(name, definition)
            .map_err(|e| {
                ProvisionError::Template(format!("failed to parse {}: {}", name, error_chain(&e)))
            })?;
        tracing::trace!("parsed engine template {}", name);
        Ok(Self {
            name: name.to_string(),
            tera,
        })
    }

    /// Template name, used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renders the template against `ctx`.
    pub fn render(&self, ctx: &EngineConfigContext) -> Result<String, ProvisionError> {
        let context = Context::from_serialize(ctx)
            .map_err(|e| {
                ProvisionError::Template(format!("invalid context: {}", error_chain(&e)))
            })?;
        let rendered = self.tera.render(&self.name, &context).map_err(|e| {
            ProvisionError::Template(format!("failed to render {}: {}", self.name, error_chain(&e)))
        })?;
        tracing::debug!("rendered engine template {} ({} bytes)", self.name, rendered.len());
        Ok(rendered)
    }
}

/// Parses and renders a template definition in one step.
pub fn render(
    name: &str,
    definition: &str,
    ctx: &EngineConfigContext,
) -> Result<String, ProvisionError> {
    EngineTemplate::parse(name, definition)?.render(ctx)
}

fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
