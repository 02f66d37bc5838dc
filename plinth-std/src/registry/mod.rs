//! Plugin registry.
//!
//! Maps plugin names to plugin instances. The registry is an ordinary value:
//! build it at startup, hand it to dispatcher construction, and share it
//! read-only afterwards. Mutation needs `&mut`, which keeps registration out
//! of the request path.

#[cfg(feature = "inventory")]
mod collected;

#[cfg(feature = "inventory")]
pub use collected::CollectedPlugin;

use crate::json::JsonPlugin;
use plinth_core::{Plugin, RegistryError};
use std::{collections::HashMap, fmt, sync::Arc};
use tracing::{debug, warn};

const REGISTRY_TARGET: &str = "plinth::registry";

/// A name-to-plugin map.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = PluginRegistry::new();
/// registry.register("jsonapi", JsonPlugin);
///
/// let plugin = registry.resolve("jsonapi")?;
/// ```
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl PluginRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the bundled plugins ([`JsonPlugin`] as
    /// `"jsonapi"`).
    pub fn with_defaults() -> Self {
        Self::new().with(JsonPlugin::NAME, JsonPlugin)
    }

    /// Register `plugin` under `name`.
    ///
    /// # Panics
    ///
    /// Registering a name twice is a programming error and panics.
    pub fn register(&mut self, name: impl Into<String>, plugin: impl Plugin) {
        self.register_arc(name, Arc::new(plugin));
    }

    /// Register an already shared plugin under `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered.
    pub fn register_arc(&mut self, name: impl Into<String>, plugin: Arc<dyn Plugin>) {
        let name = name.into();
        if self.plugins.contains_key(&name) {
            panic!("plinth: plugin {name:?} registered twice");
        }
        debug!(target: REGISTRY_TARGET, plugin = %name, "plugin registered");
        self.plugins.insert(name, plugin);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, name: impl Into<String>, plugin: impl Plugin) -> Self {
        self.register(name, plugin);
        self
    }

    /// Remove the plugin registered under `name`.
    ///
    /// Removing a name that is not registered only logs a warning.
    pub fn deregister(&mut self, name: &str) {
        if self.plugins.remove(name).is_none() {
            warn!(
                target: REGISTRY_TARGET,
                plugin = %name,
                "plugin is not registered, nothing to deregister"
            );
            return;
        }
        debug!(target: REGISTRY_TARGET, plugin = %name, "plugin deregistered");
    }

    /// Look up the plugin registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Plugin>, RegistryError> {
        self.plugins
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownPlugin(name.to_owned()))
    }

    /// Whether a plugin is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// The registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get the number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}
