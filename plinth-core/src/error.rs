//! Error types for Plinth.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`PlinthError`] - Top-level error type for all Plinth operations
//! - [`RegistryError`] - Plugin lookup failures
//! - [`CodecError`] - Payload encoding and decoding failures
//! - [`ServeError`] - Server lifecycle failures
//!
//! Crashes inside a request are not errors; see [`Fault`](crate::Fault).

use std::{io, time::Duration};
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Plinth operations.
#[derive(Error, Debug)]
pub enum PlinthError {
    /// A plugin could not be resolved.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A payload could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The server failed.
    #[error("serve error: {0}")]
    Serve(#[from] ServeError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// Errors raised when looking up plugins.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No plugin is registered under this name.
    #[error("unknown plugin {0:?} (is it registered?)")]
    UnknownPlugin(String),
}

/// Errors raised by payload codecs.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The value could not be converted to or from a document.
    #[error("document conversion failed")]
    Document(#[source] serde_json::Error),

    /// The plugin failed to encode a document.
    #[error("marshal failed")]
    Marshal(#[source] BoxError),

    /// The plugin failed to decode bytes.
    #[error("unmarshal failed")]
    Unmarshal(#[source] BoxError),
}

/// Errors that end or interrupt serving.
#[derive(Error, Debug)]
pub enum ServeError {
    /// The listener failed in a way that is not tied to one connection.
    #[error("accept failed")]
    Accept(#[source] io::Error),

    /// A request body could not be read.
    #[error("failed to read request body")]
    Body(#[source] BoxError),

    /// Producing a response took longer than the write timeout.
    #[error("response not produced within {0:?}")]
    WriteTimeout(Duration),

    /// The task running the pipeline was cancelled before it finished.
    #[error("request pipeline was cancelled")]
    Cancelled(#[source] BoxError),
}

// Convenience conversions
impl From<BoxError> for PlinthError {
    fn from(err: BoxError) -> Self {
        PlinthError::Custom(err)
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::Document(err)
    }
}
