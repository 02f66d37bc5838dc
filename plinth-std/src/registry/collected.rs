//! Link-time plugin collection via `inventory`.
//!
//! Plugin crates submit a [`CollectedPlugin`] next to their type, and the
//! application gathers every submission into a [`PluginRegistry`] once at
//! startup. The collected set is fixed at link time, so there is no mutable
//! global behind it.

use super::PluginRegistry;
use plinth_core::Plugin;
use std::sync::Arc;

/// A plugin submitted for collection.
///
/// # Example
///
/// ```rust,ignore
/// fn make_plain() -> Arc<dyn Plugin> {
///     Arc::new(PlainText)
/// }
///
/// inventory::submit! {
///     CollectedPlugin::new("plain", make_plain)
/// }
/// ```
pub struct CollectedPlugin {
    name: &'static str,
    factory: fn() -> Arc<dyn Plugin>,
}

impl CollectedPlugin {
    /// Create a submission entry.
    pub const fn new(name: &'static str, factory: fn() -> Arc<dyn Plugin>) -> Self {
        Self { name, factory }
    }

    /// The name the plugin registers under.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

inventory::collect!(CollectedPlugin);

fn make_json() -> Arc<dyn Plugin> {
    Arc::new(crate::json::JsonPlugin)
}

inventory::submit! {
    CollectedPlugin::new(crate::json::JsonPlugin::NAME, make_json)
}

impl PluginRegistry {
    /// Build a registry from every plugin submitted through `inventory`.
    ///
    /// # Panics
    ///
    /// Panics if two submissions share a name.
    pub fn collected() -> Self {
        let mut registry = Self::new();
        for entry in inventory::iter::<CollectedPlugin> {
            registry.register_arc(entry.name, (entry.factory)());
        }
        registry
    }
}
