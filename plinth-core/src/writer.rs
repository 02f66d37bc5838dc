//! # Response Sink Layer (ResponseWriter)
//!
//! The sink a handler writes its response into. The contract mirrors what an
//! HTTP server hands a request handler: a mutable header map, a status line
//! that can be written once, and a body that is written in chunks.
//!
//! Sinks are deliberately small so they can be decorated. A plugin may wrap
//! the sink during pre-dispatch (see [`wrap_writer`]) and every decorator
//! forwards to the sink it wraps.

use http::{HeaderMap, StatusCode};
use std::io;

/// A response sink.
///
/// Semantics follow the usual HTTP server contract:
///
/// - Headers may be changed until the status line is written.
/// - The first [`write_head`](ResponseWriter::write_head) wins; later calls
///   are ignored by well-behaved sinks.
/// - [`write`](ResponseWriter::write) without a prior `write_head` implies
///   `200 OK`.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a response sink",
    label = "missing `ResponseWriter` implementation",
    note = "Response sinks must expose headers, a status line and a body writer."
)]
pub trait ResponseWriter: Send {
    /// The headers that will be sent with the response.
    fn headers(&self) -> &HeaderMap;

    /// Mutable access to the headers that will be sent with the response.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Writes the status line.
    fn write_head(&mut self, status: StatusCode);

    /// Writes body bytes, returning how many were accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
}

/// A boxed, possibly decorated response sink.
///
/// This is the type the lifecycle hooks see: the dispatcher boxes the guarded
/// sink, and a plugin may replace the box with a decorator around it.
pub type BoxWriter<'a> = Box<dyn ResponseWriter + 'a>;

impl<W: ResponseWriter + ?Sized> ResponseWriter for &mut W {
    fn headers(&self) -> &HeaderMap {
        (**self).headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    fn write_head(&mut self, status: StatusCode) {
        (**self).write_head(status)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }
}

impl<W: ResponseWriter + ?Sized> ResponseWriter for Box<W> {
    fn headers(&self) -> &HeaderMap {
        (**self).headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        (**self).headers_mut()
    }

    fn write_head(&mut self, status: StatusCode) {
        (**self).write_head(status)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }
}

/// Replaces the sink in `slot` with a decorator built around it.
///
/// # Example
///
/// ```rust,ignore
/// fn before_dispatch(&self, w: &mut BoxWriter<'_>, req: &mut Request) {
///     wrap_writer(w, |inner| CountingWriter::new(inner));
/// }
/// ```
pub fn wrap_writer<'a, F, W>(slot: &mut BoxWriter<'a>, wrap: F)
where
    F: FnOnce(BoxWriter<'a>) -> W,
    W: ResponseWriter + 'a,
{
    let inner = std::mem::replace(slot, Box::new(Discard::default()));
    *slot = Box::new(wrap(inner));
}

/// A sink that accepts and drops everything.
///
/// Used as a placeholder while a sink is being re-wrapped.
#[derive(Debug, Default)]
pub struct Discard {
    headers: HeaderMap,
}

impl ResponseWriter for Discard {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_head(&mut self, _status: StatusCode) {}

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }
}
