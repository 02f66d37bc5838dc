//! # plinth-core
//!
//! Core contracts for the Plinth dispatch layer.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! plugins and handlers that don't need the dispatcher or the server.
//!
//! # Layers
//!
//! ## Sink ([`ResponseWriter`])
//!
//! What a handler writes into. Small enough to decorate; [`ResponseBuffer`]
//! is the in-memory implementation the server and tests use.
//!
//! ## Guard ([`OutputGuard`])
//!
//! Sits on the caller's sink for one request and records whether the body
//! has started, so crash recovery never corrupts a partial response.
//!
//! ## Strategy ([`Plugin`])
//!
//! Format and domain policy: codec, lifecycle hooks, crash response and the
//! application status tag.
//!
//! ## Endpoint ([`Handler`])
//!
//! The caller's code. Terminal point of the pipeline.
//!
//! # Error Types
//!
//! - [`PlinthError`] - Top-level error type
//! - [`RegistryError`] - Plugin lookup errors
//! - [`CodecError`] - Payload codec errors
//! - [`ServeError`] - Server errors
//! - [`Fault`] - Unrecoverable failures, raised by unwinding

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod buffer;
mod error;
mod fault;
mod guard;
mod handler;
mod plugin;
mod request;
mod writer;

// Re-exports
pub use buffer::ResponseBuffer;
pub use error::{BoxError, CodecError, PlinthError, RegistryError, ServeError};
pub use fault::{Fault, FaultReport, describe, raise};
pub use guard::{OutputGuard, WriteTracker};
pub use handler::{Handler, HandlerFn, handler_fn};
pub use plugin::Plugin;
pub use request::{Document, Request};
pub use writer::{BoxWriter, Discard, ResponseWriter, wrap_writer};

pub use futures::future::BoxFuture;
