//! Testing utilities for Plinth.
//!
//! This module provides doubles that make it easy to observe what the
//! dispatch pipeline does.
//!
//! # Features
//!
//! - [`PluginProbe`]: Shared record of which lifecycle hooks ran, in order
//! - [`StubPlugin`]: A plugin with programmable codec and crash behavior
//! - [`FailingWriter`]: A sink whose body writes always fail

use plinth_core::{BoxError, BoxWriter, Document, Plugin, Request, ResponseWriter};
use http::{HeaderMap, StatusCode};
use std::{
    io,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

// ============================================================================
// Plugin Probe
// ============================================================================

/// Shared record of the hooks a [`StubPlugin`] has seen.
///
/// Handlers under test can add their own steps with [`record`](Self::record)
/// to check ordering against the hooks.
#[derive(Debug, Default)]
pub struct PluginProbe {
    before: AtomicUsize,
    after: AtomicUsize,
    recover: AtomicUsize,
    status_tags: Mutex<Vec<i64>>,
    steps: Mutex<Vec<&'static str>>,
}

impl PluginProbe {
    /// Create a new probe.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of `before_dispatch` calls.
    pub fn before_count(&self) -> usize {
        self.before.load(Ordering::SeqCst)
    }

    /// Number of `after_dispatch` calls.
    pub fn after_count(&self) -> usize {
        self.after.load(Ordering::SeqCst)
    }

    /// Number of `recover` calls.
    pub fn recover_count(&self) -> usize {
        self.recover.load(Ordering::SeqCst)
    }

    /// Status tags written through the plugin.
    pub fn status_tags(&self) -> Vec<i64> {
        self.status_tags.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Append a step to the ordered log.
    pub fn record(&self, step: &'static str) {
        self.steps.lock().unwrap_or_else(PoisonError::into_inner).push(step);
    }

    /// The ordered log of steps.
    pub fn steps(&self) -> Vec<&'static str> {
        self.steps.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

// ============================================================================
// Stub Plugin
// ============================================================================

type MarshalFn = dyn Fn(&Document) -> Result<Vec<u8>, BoxError> + Send + Sync;

/// A plugin whose behavior is set up by the test.
///
/// By default it encodes with `serde_json`, leaves the response alone on
/// recovery and reports every hook to its [`PluginProbe`].
///
/// # Example
///
/// ```rust,ignore
/// let probe = PluginProbe::new();
/// let plugin = StubPlugin::new(probe.clone()).marshal_to(b"foo");
///
/// let mut registry = PluginRegistry::new();
/// registry.register("stub", plugin);
/// // ... dispatch ...
/// assert_eq!(probe.after_count(), 1);
/// ```
pub struct StubPlugin {
    probe: Arc<PluginProbe>,
    marshal: Arc<MarshalFn>,
    panic_before: bool,
    panic_after: bool,
    panic_recover: bool,
}

impl StubPlugin {
    /// Create a stub reporting to `probe`.
    pub fn new(probe: Arc<PluginProbe>) -> Self {
        Self {
            probe,
            marshal: Arc::new(|value| Ok(serde_json::to_vec(value)?)),
            panic_before: false,
            panic_after: false,
            panic_recover: false,
        }
    }

    /// Replace the encoder.
    pub fn with_marshal<F>(mut self, marshal: F) -> Self
    where
        F: Fn(&Document) -> Result<Vec<u8>, BoxError> + Send + Sync + 'static,
    {
        self.marshal = Arc::new(marshal);
        self
    }

    /// Encode every payload as the given bytes.
    pub fn marshal_to(self, bytes: &'static [u8]) -> Self {
        self.with_marshal(move |_| Ok(bytes.to_vec()))
    }

    /// Fail every encode.
    pub fn failing_marshal(self) -> Self {
        self.with_marshal(|_| Err("stub marshal failure".into()))
    }

    /// Panic inside `before_dispatch`.
    pub fn panic_before(mut self) -> Self {
        self.panic_before = true;
        self
    }

    /// Panic inside `after_dispatch`.
    pub fn panic_after(mut self) -> Self {
        self.panic_after = true;
        self
    }

    /// Panic inside `recover`.
    pub fn panic_recover(mut self) -> Self {
        self.panic_recover = true;
        self
    }
}

impl Plugin for StubPlugin {
    fn before_dispatch(&self, _w: &mut BoxWriter<'_>, _req: &mut Request) {
        self.probe.before.fetch_add(1, Ordering::SeqCst);
        self.probe.record("before");
        if self.panic_before {
            panic!("stub before_dispatch panic");
        }
    }

    fn after_dispatch(&self, _w: &mut BoxWriter<'_>, _req: &mut Request) {
        self.probe.after.fetch_add(1, Ordering::SeqCst);
        self.probe.record("after");
        if self.panic_after {
            panic!("stub after_dispatch panic");
        }
    }

    fn recover(&self, _w: &mut dyn ResponseWriter, _req: &Request) {
        self.probe.recover.fetch_add(1, Ordering::SeqCst);
        self.probe.record("recover");
        if self.panic_recover {
            panic!("stub recover panic");
        }
    }

    fn marshal(&self, value: &Document) -> Result<Vec<u8>, BoxError> {
        (self.marshal)(value)
    }

    fn unmarshal(&self, data: &[u8]) -> Result<Document, BoxError> {
        Ok(serde_json::from_slice(data)?)
    }

    fn write_status_tag(&self, _w: &mut dyn ResponseWriter, code: i64) {
        self.probe.status_tags.lock().unwrap_or_else(PoisonError::into_inner).push(code);
    }
}

// ============================================================================
// Failing Writer
// ============================================================================

/// A sink that accepts headers and a status but fails every body write.
#[derive(Debug, Default)]
pub struct FailingWriter {
    headers: HeaderMap,
    status: Option<StatusCode>,
    attempts: usize,
}

impl FailingWriter {
    /// Create a new failing writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The status line written, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// How many body writes were attempted.
    pub fn attempts(&self) -> usize {
        self.attempts
    }
}

impl ResponseWriter for FailingWriter {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_head(&mut self, status: StatusCode) {
        self.status.get_or_insert(status);
    }

    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        self.attempts += 1;
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "connection reset by peer"))
    }
}
