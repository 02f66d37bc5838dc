//! Decorator plugins.
//!
//! A decorator wraps another plugin, delegates every call to it and adds
//! behavior around the dispatch hooks.

mod access_log;

pub use access_log::{AccessLog, AccessRecord, LoggingWriter};
