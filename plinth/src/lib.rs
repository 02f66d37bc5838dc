//! # plinth - A Thin Dispatch Layer for HTTP APIs
//!
//! `plinth` wraps a request handler with a pluggable lifecycle. A plugin,
//! chosen by name from a registry, decides how payloads are encoded, what
//! every response starts with and what a client sees when a request
//! crashes. The dispatcher only sequences the calls:
//!
//! 1. `before_dispatch`, then the handler (guarded together)
//! 2. `recover`, only if step 1 crashed
//! 3. `after_dispatch`, always
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use plinth::prelude::*;
//!
//! let registry = PluginRegistry::with_defaults();
//! let dispatcher = Dispatcher::new(&registry, "jsonapi")?.with_handler(handler_fn(|w, req| {
//!     Box::pin(async move {
//!         if let Some(api) = Responder::of(req) {
//!             api.ok(w, &serde_json::json!({"hello": "world"}), 200);
//!         }
//!     })
//! }));
//!
//! let dispatcher = Arc::new(dispatcher);
//! let listener = TcpListener::bind("127.0.0.1:8080").await?;
//! dispatcher.run(listener).await?;
//! ```
//!
//! ## Features
//!
//! - `tower`: [`DispatchService`](tower::DispatchService), a
//!   `tower::Service` over the pipeline
//! - `inventory`: `PluginRegistry::collected()`, link-time plugin registration
//! - `macros`: the `#[plugin("name")]` attribute (implies `inventory`)

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod orchestrator;
mod server;

#[cfg(feature = "tower")]
pub mod tower;

pub use orchestrator::{DispatchHook, Dispatcher, DispatcherBuilder, RecoverHook, Responder};
pub use server::ServerConfig;

pub use plinth_core::{
    // Errors
    BoxError,
    // Sinks
    BoxWriter,
    CodecError,
    Discard,
    Document,
    // Faults
    Fault,
    FaultReport,
    // Handler
    Handler,
    HandlerFn,
    OutputGuard,
    PlinthError,
    // Plugin
    Plugin,
    RegistryError,
    Request,
    ResponseBuffer,
    ResponseWriter,
    ServeError,
    WriteTracker,
    describe,
    handler_fn,
    raise,
    wrap_writer,
};

pub use plinth_std::{
    AccessLog, AccessRecord, ApiError, ApiErrors, JsonPlugin, LoggingWriter, PluginRegistry,
    STATUS_HEADER,
};

#[cfg(feature = "inventory")]
pub use plinth_std::CollectedPlugin;

/// The bundled JSON plugin and its error bodies.
pub mod json {
    pub use plinth_std::json::{ApiError, ApiErrors, JsonPlugin, STATUS_HEADER};
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use plinth_std::testing::*;
}

/// Prelude module - common imports for Plinth.
///
/// # Usage
///
/// ```rust,ignore
/// use plinth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BoxError, BoxWriter, Dispatcher, Handler, JsonPlugin, Plugin, PluginRegistry, Request,
        ResponseWriter, Responder, ServerConfig, handler_fn,
    };
}

#[cfg(feature = "macros")]
pub use plinth_macros::plugin;

#[cfg(feature = "inventory")]
pub use inventory;
