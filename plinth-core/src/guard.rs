//! Write-tracking output guard.
//!
//! The guard sits directly on top of the caller's sink for the lifetime of a
//! single request and remembers whether any body bytes were written. Crash
//! recovery consults it so a fallback response is never appended to a body
//! that has already started.

use crate::{request::Request, writer::ResponseWriter};
use http::{HeaderMap, StatusCode};
use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

/// Shared view of an [`OutputGuard`]'s `wrote` flag.
///
/// The dispatcher stores a tracker in the request extensions, so any hook
/// holding the request can ask whether the response body has begun.
#[derive(Debug, Clone, Default)]
pub struct WriteTracker(Arc<AtomicBool>);

impl WriteTracker {
    /// Whether a write has gone through the guard.
    pub fn wrote(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// The tracker the dispatcher attached to `req`, if any.
    pub fn of(req: &Request) -> Option<&WriteTracker> {
        req.extensions().get::<WriteTracker>()
    }

    fn mark(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// A sink wrapper that records whether a write occurred.
///
/// Writes are forwarded unmodified, including the returned count or error.
/// The flag is set before forwarding and never cleared.
#[derive(Debug)]
pub struct OutputGuard<W> {
    inner: W,
    tracker: WriteTracker,
}

impl<W: ResponseWriter> OutputGuard<W> {
    /// Wrap `inner`. The flag starts out false.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            tracker: WriteTracker::default(),
        }
    }

    /// Whether any write went through this guard.
    pub fn wrote(&self) -> bool {
        self.tracker.wrote()
    }

    /// A handle on this guard's flag.
    pub fn tracker(&self) -> WriteTracker {
        self.tracker.clone()
    }

    /// The wrapped sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap the guard, returning the sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: ResponseWriter> ResponseWriter for OutputGuard<W> {
    fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    fn write_head(&mut self, status: StatusCode) {
        self.inner.write_head(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tracker.mark();
        self.inner.write(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ResponseBuffer;

    struct BrokenSink(HeaderMap);

    impl ResponseWriter for BrokenSink {
        fn headers(&self) -> &HeaderMap {
            &self.0
        }

        fn headers_mut(&mut self) -> &mut HeaderMap {
            &mut self.0
        }

        fn write_head(&mut self, _status: StatusCode) {}

        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away"))
        }
    }

    #[test]
    fn test_new_guard_has_not_written() {
        let guard = OutputGuard::new(ResponseBuffer::new());
        assert!(!guard.wrote());
        assert!(guard.get_ref().body().is_empty());
    }

    #[test]
    fn test_write_sets_flag_and_forwards() {
        let mut guard = OutputGuard::new(ResponseBuffer::new());
        let tracker = guard.tracker();

        let written = guard.write(b"hello").unwrap();

        assert_eq!(written, 5);
        assert!(guard.wrote());
        assert!(tracker.wrote());
        assert_eq!(guard.into_inner().body(), b"hello");
    }

    #[test]
    fn test_write_head_does_not_set_flag() {
        let mut guard = OutputGuard::new(ResponseBuffer::new());
        guard.write_head(StatusCode::ACCEPTED);

        assert!(!guard.wrote());
        assert_eq!(guard.get_ref().status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn test_failed_write_still_counts() {
        let mut guard = OutputGuard::new(BrokenSink(HeaderMap::new()));

        let err = guard.write(b"x").unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(guard.wrote());
    }

    #[test]
    fn test_tracker_from_request_extensions() {
        let guard = OutputGuard::new(ResponseBuffer::new());
        let mut req = Request::default();
        assert!(WriteTracker::of(&req).is_none());

        req.extensions_mut().insert(guard.tracker());
        assert_eq!(WriteTracker::of(&req).map(WriteTracker::wrote), Some(false));
    }
}
