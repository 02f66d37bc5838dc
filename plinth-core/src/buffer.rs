//! In-memory response sink.

use crate::writer::ResponseWriter;
use bytes::{Bytes, BytesMut};
use http::{HeaderMap, StatusCode};
use std::io;

/// A response sink that buffers the whole response in memory.
///
/// The server dispatches every request into a `ResponseBuffer` and converts
/// it into an `http::Response` afterwards. Tests use it the same way to
/// inspect what a pipeline produced.
///
/// Headers are snapshotted when the status line is written, so changes made
/// after that point do not reach the response, just as they would not on a
/// live connection.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    headers: HeaderMap,
    sent_headers: Option<HeaderMap>,
    status: Option<StatusCode>,
    body: BytesMut,
}

impl ResponseBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The response status. `200 OK` until a status line is written.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    /// Whether a status line has been written.
    pub fn head_written(&self) -> bool {
        self.status.is_some()
    }

    /// The headers that will go out with the response.
    pub fn sent_headers(&self) -> &HeaderMap {
        self.sent_headers.as_ref().unwrap_or(&self.headers)
    }

    /// The body written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Split the buffer into status, headers and body.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        let status = self.status();
        let headers = self.sent_headers.unwrap_or(self.headers);
        (status, headers, self.body.freeze())
    }

    /// Convert the buffer into an `http::Response`.
    pub fn into_response(self) -> http::Response<Bytes> {
        let (status, headers, body) = self.into_parts();
        let mut response = http::Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

impl ResponseWriter for ResponseBuffer {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_head(&mut self, status: StatusCode) {
        if self.status.is_some() {
            return;
        }
        self.status = Some(status);
        self.sent_headers = Some(self.headers.clone());
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.status.is_none() {
            self.write_head(StatusCode::OK);
        }
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;
    use http::HeaderValue;

    #[test]
    fn test_write_implies_ok() {
        let mut buffer = ResponseBuffer::new();
        buffer.write(b"hi").unwrap();

        assert_eq!(buffer.status(), StatusCode::OK);
        assert_eq!(buffer.body(), b"hi");
    }

    #[test]
    fn test_first_status_wins() {
        let mut buffer = ResponseBuffer::new();
        buffer.write_head(StatusCode::CREATED);
        buffer.write_head(StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(buffer.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_headers_frozen_after_head() {
        let mut buffer = ResponseBuffer::new();
        buffer
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        buffer.write_head(StatusCode::OK);
        buffer
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));

        let response = buffer.into_response();
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn test_headers_live_before_head() {
        let mut buffer = ResponseBuffer::new();
        buffer
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        assert_eq!(buffer.sent_headers()[CONTENT_TYPE], "text/plain");
        assert!(!buffer.head_written());
    }
}
