//! Procedural macros for the Plinth dispatch layer.
//!
//! - `#[plugin("name")]` - Submit a plugin type for link-time registration

use proc_macro::TokenStream;

mod plugin;

/// Register a plugin type under a name at link time.
///
/// The type must implement `plinth::Plugin` and `Default`. Every annotated
/// type is picked up by `PluginRegistry::collected()`.
///
/// # Example
///
/// ```rust,ignore
/// #[plinth::plugin("plain")]
/// #[derive(Default)]
/// struct PlainText;
///
/// impl Plugin for PlainText { ... }
///
/// let registry = PluginRegistry::collected();
/// assert!(registry.contains("plain"));
/// ```
#[proc_macro_attribute]
pub fn plugin(attr: TokenStream, item: TokenStream) -> TokenStream {
    plugin::plugin_impl(attr, item)
}
