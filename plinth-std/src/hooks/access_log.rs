//! Access logging decorator.

use http::{HeaderMap, StatusCode};
use plinth_core::{
    BoxError, BoxWriter, Document, Plugin, Request, ResponseWriter, wrap_writer,
};
use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicU16, AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};
use tracing::info;

const ACCESS_TARGET: &str = "plinth::access";

/// Status and size of one response, shared between the [`LoggingWriter`]
/// that fills it in and the request that carries it.
#[derive(Debug, Clone)]
pub struct AccessRecord(Arc<RecordInner>);

#[derive(Debug)]
struct RecordInner {
    status: AtomicU16,
    bytes: AtomicU64,
    started: Instant,
}

impl AccessRecord {
    fn start() -> Self {
        Self(Arc::new(RecordInner {
            status: AtomicU16::new(0),
            bytes: AtomicU64::new(0),
            started: Instant::now(),
        }))
    }

    /// The record [`AccessLog`] attached to `req`, if any.
    pub fn of(req: &Request) -> Option<&AccessRecord> {
        req.extensions().get::<AccessRecord>()
    }

    /// The status line written, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self.0.status.load(Ordering::Acquire) {
            0 => None,
            code => StatusCode::from_u16(code).ok(),
        }
    }

    /// Body bytes accepted by the sink.
    pub fn bytes(&self) -> u64 {
        self.0.bytes.load(Ordering::Acquire)
    }

    /// Time since pre-dispatch.
    pub fn elapsed(&self) -> Duration {
        self.0.started.elapsed()
    }

    fn set_status(&self, status: StatusCode) {
        let _ = self.0.status.compare_exchange(
            0,
            status.as_u16(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    fn add_bytes(&self, n: usize) {
        self.0.bytes.fetch_add(n as u64, Ordering::AcqRel);
    }
}

/// A sink decorator that fills in an [`AccessRecord`].
pub struct LoggingWriter<'a> {
    inner: BoxWriter<'a>,
    record: AccessRecord,
}

impl<'a> LoggingWriter<'a> {
    /// Wrap `inner`, reporting into `record`.
    pub fn new(inner: BoxWriter<'a>, record: AccessRecord) -> Self {
        Self { inner, record }
    }
}

impl ResponseWriter for LoggingWriter<'_> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_head(&mut self, status: StatusCode) {
        self.record.set_status(status);
        self.inner.write_head(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.record.set_status(StatusCode::OK);
        let written = self.inner.write(buf)?;
        self.record.add_bytes(written);
        Ok(written)
    }
}

/// Wraps a plugin and logs one line per request on the `plinth::access`
/// target.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = PluginRegistry::new();
/// registry.register("jsonapi", AccessLog::new(JsonPlugin));
/// ```
#[derive(Debug, Default, Clone)]
pub struct AccessLog<P> {
    inner: P,
}

impl<P: Plugin> AccessLog<P> {
    /// Decorate `inner`.
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    /// The decorated plugin.
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: Plugin> Plugin for AccessLog<P> {
    fn before_dispatch(&self, w: &mut BoxWriter<'_>, req: &mut Request) {
        self.inner.before_dispatch(w, req);

        let record = AccessRecord::start();
        req.extensions_mut().insert(record.clone());
        wrap_writer(w, |inner| LoggingWriter::new(inner, record));
    }

    fn after_dispatch(&self, w: &mut BoxWriter<'_>, req: &mut Request) {
        self.inner.after_dispatch(w, req);

        let Some(record) = AccessRecord::of(req) else {
            return;
        };
        // No status line means recovery left the response untouched.
        let status = record.status().map_or(0, |status| status.as_u16());
        info!(
            target: ACCESS_TARGET,
            method = %req.method(),
            path = %req.uri().path(),
            status,
            bytes = record.bytes(),
            elapsed_ms = record.elapsed().as_millis() as u64,
            "request served"
        );
    }

    fn recover(&self, w: &mut dyn ResponseWriter, req: &Request) {
        self.inner.recover(w, req);
    }

    fn marshal(&self, value: &Document) -> Result<Vec<u8>, BoxError> {
        self.inner.marshal(value)
    }

    fn unmarshal(&self, data: &[u8]) -> Result<Document, BoxError> {
        self.inner.unmarshal(data)
    }

    fn write_status_tag(&self, w: &mut dyn ResponseWriter, code: i64) {
        self.inner.write_status_tag(w, code);
    }
}
