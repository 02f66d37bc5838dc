//! # plinth-std
//!
//! Standard implementations for the Plinth dispatch layer.
//!
//! This crate provides:
//! - **Registry**: [`PluginRegistry`], optionally filled at link time
//! - **JSON plugin**: [`JsonPlugin`] and its error bodies
//! - **Decorators**: [`AccessLog`]
//! - **Testing**: doubles in [`testing`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core contracts
pub use plinth_core;

// Modules
pub mod hooks;
pub mod json;
pub mod registry;
pub mod testing;

pub use hooks::{AccessLog, AccessRecord, LoggingWriter};
pub use json::{ApiError, ApiErrors, JsonPlugin, STATUS_HEADER};
pub use registry::PluginRegistry;

#[cfg(feature = "inventory")]
pub use inventory;
#[cfg(feature = "inventory")]
pub use registry::CollectedPlugin;
