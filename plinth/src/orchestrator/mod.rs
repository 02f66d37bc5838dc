//! The dispatcher.
//!
//! A [`Dispatcher`] binds one plugin, taken from a [`PluginRegistry`] at
//! construction, to one handler. It runs every request through the fixed
//! pipeline (see [`Dispatcher::dispatch`]), offers response helpers that
//! encode through the plugin and owns the server lifecycle.
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = PluginRegistry::with_defaults();
//!
//! let dispatcher = Dispatcher::builder(&registry, "jsonapi")?
//!     .handler(router)
//!     .after_dispatch(|plugin, w, req| {
//!         plugin.after_dispatch(w, req);
//!         metrics::record(req);
//!     })
//!     .build();
//! ```

mod hooks;
mod pipeline;
mod respond;

pub use hooks::{DispatchHook, RecoverHook};
pub use respond::Responder;

use crate::server::ServerConfig;
use hooks::Hooks;
use plinth_core::{BoxWriter, Handler, Plugin, RegistryError, Request, ResponseWriter};
use plinth_std::PluginRegistry;
use std::{fmt, sync::Arc};
use tokio::sync::watch;

/// Runs requests through a plugin's lifecycle and a handler.
///
/// All request-time state is read-only, so a dispatcher can be shared
/// behind an `Arc` by any number of connections.
pub struct Dispatcher {
    pub(crate) config: ServerConfig,
    pub(crate) plugin: Arc<dyn Plugin>,
    pub(crate) hooks: Hooks,
    pub(crate) handler: Option<Arc<dyn Handler>>,
    pub(crate) stop: watch::Sender<bool>,
}

impl Dispatcher {
    /// Create a dispatcher for the plugin registered under `name`, with the
    /// plugin's own hooks and the default [`ServerConfig`].
    pub fn new(registry: &PluginRegistry, name: &str) -> Result<Self, RegistryError> {
        Ok(Self::builder(registry, name)?.build())
    }

    /// Start configuring a dispatcher for the plugin registered under `name`.
    pub fn builder(registry: &PluginRegistry, name: &str) -> Result<DispatcherBuilder, RegistryError> {
        let plugin = registry.resolve(name)?;
        Ok(DispatcherBuilder {
            config: ServerConfig::default(),
            plugin,
            hooks: Hooks::default(),
            handler: None,
        })
    }

    /// The plugin this dispatcher was built with.
    pub fn plugin(&self) -> &Arc<dyn Plugin> {
        &self.plugin
    }

    /// The server settings.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Mutable access to the server settings.
    pub fn config_mut(&mut self) -> &mut ServerConfig {
        &mut self.config
    }

    /// Set the handler requests are dispatched to.
    pub fn set_handler(&mut self, handler: impl Handler) {
        self.handler = Some(Arc::new(handler));
    }

    /// Builder-style [`set_handler`](Self::set_handler).
    pub fn with_handler(mut self, handler: impl Handler) -> Self {
        self.set_handler(handler);
        self
    }

    /// Whether a handler is set.
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("hooks", &self.hooks)
            .field("has_handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Dispatcher`]. Created by [`Dispatcher::builder`].
///
/// Hook overrides are fixed once [`build`](Self::build) is called.
pub struct DispatcherBuilder {
    config: ServerConfig,
    plugin: Arc<dyn Plugin>,
    hooks: Hooks,
    handler: Option<Arc<dyn Handler>>,
}

impl DispatcherBuilder {
    /// Use `config` instead of the default server settings.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Dispatch requests to `handler`.
    pub fn handler(mut self, handler: impl Handler) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Replace the plugin's `before_dispatch`.
    pub fn before_dispatch<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn Plugin, &mut BoxWriter<'_>, &mut Request) + Send + Sync + 'static,
    {
        self.hooks.before = Some(Arc::new(hook));
        self
    }

    /// Replace the plugin's `after_dispatch`.
    pub fn after_dispatch<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn Plugin, &mut BoxWriter<'_>, &mut Request) + Send + Sync + 'static,
    {
        self.hooks.after = Some(Arc::new(hook));
        self
    }

    /// Replace the plugin's `recover`.
    pub fn recover<F>(mut self, hook: F) -> Self
    where
        F: Fn(&dyn Plugin, &mut dyn ResponseWriter, &Request) + Send + Sync + 'static,
    {
        self.hooks.recover = Some(Arc::new(hook));
        self
    }

    /// Finish the dispatcher.
    pub fn build(self) -> Dispatcher {
        let (stop, _) = watch::channel(false);
        Dispatcher {
            config: self.config,
            plugin: self.plugin,
            hooks: self.hooks,
            handler: self.handler,
            stop,
        }
    }
}

impl fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("config", &self.config)
            .field("hooks", &self.hooks)
            .field("has_handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}
