//! Model registry.
//!
//! The registry is the collaborator that knows which models exist. Schema
//! construction asks it for every model of one application namespace and
//! never enumerates models any other way.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::RegistryError;
use crate::model::ModelDescriptor;

/// Enumerates the models registered under an application namespace.
///
/// Implementations must return models in a stable order. The schema layer
/// preserves that order when declaring query fields.
pub trait ModelRegistry: Send + Sync {
    /// Returns every model registered under `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownNamespace`] if no application has this
    /// label, or an error describing the first invalid model.
    fn list_models(&self, namespace: &str) -> Result<Vec<ModelDescriptor>, RegistryError>;
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    apps: Vec<String>,
    #[serde(default)]
    models: Vec<ModelDescriptor>,
}

/// A registry over a fixed set of model descriptors.
///
/// Built either programmatically or from a TOML manifest:
///
/// ```toml
/// apps = ["api"]
///
/// [[models]]
/// app = "api"
/// name = "Widget"
/// fields = [
///     { name = "id", type = "auto" },
///     { name = "name", type = "text" },
///     { name = "tags", type = "array", item = { type = "text" } },
/// ]
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    apps: Vec<String>,
    models: Vec<ModelDescriptor>,
}

impl StaticRegistry {
    /// Creates a registry from model descriptors. Every label used by a model
    /// is installed as an application.
    #[must_use]
    pub fn new(models: Vec<ModelDescriptor>) -> Self {
        let mut registry = Self::default();
        for model in models {
            registry.register(model);
        }
        registry
    }

    /// Installs an application namespace, which may hold no models.
    #[must_use]
    pub fn with_app(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        if !self.apps.contains(&label) {
            self.apps.push(label);
        }
        self
    }

    /// Registers a model, installing its application if needed.
    pub fn register(&mut self, model: ModelDescriptor) {
        if !self.apps.contains(&model.app_label) {
            self.apps.push(model.app_label.clone());
        }
        self.models.push(model);
    }

    /// Parses a TOML manifest.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Manifest`] if the document is malformed.
    pub fn from_manifest_str(manifest: &str) -> Result<Self, RegistryError> {
        let manifest: Manifest =
            toml::from_str(manifest).map_err(|e| RegistryError::manifest(e.to_string()))?;

        let mut registry = Self::default();
        for app in manifest.apps {
            registry = registry.with_app(app);
        }
        for model in manifest.models {
            registry.register(model);
        }
        Ok(registry)
    }

    /// Reads and parses a TOML manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_manifest_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_manifest_str(&contents)
    }

    /// Returns the installed application labels.
    #[must_use]
    pub fn apps(&self) -> &[String] {
        &self.apps
    }
}

impl ModelRegistry for StaticRegistry {
    fn list_models(&self, namespace: &str) -> Result<Vec<ModelDescriptor>, RegistryError> {
        if !self.apps.iter().any(|app| app == namespace) {
            return Err(RegistryError::UnknownNamespace {
                namespace: namespace.to_string(),
            });
        }

        let mut names = HashSet::new();
        let mut models = Vec::new();
        for model in self.models.iter().filter(|m| m.app_label == namespace) {
            model.validate()?;
            if !names.insert(model.name.as_str()) {
                return Err(RegistryError::DuplicateModel {
                    namespace: namespace.to_string(),
                    name: model.name.clone(),
                });
            }
            models.push(model.clone());
        }

        debug!(namespace, count = models.len(), "Listed registered models");
        Ok(models)
    }
}
