//! Request and payload types shared across the pipeline.

use bytes::Bytes;

/// An HTTP request with its body already collected.
///
/// The dispatcher may attach per-request state to the extensions (for
/// example the [`WriteTracker`](crate::WriteTracker) of the output guard).
pub type Request = http::Request<Bytes>;

/// Format-neutral intermediate value exchanged with plugin codecs.
///
/// Resources are converted to a `Document` before a plugin encodes them, and
/// decoded bytes come back as a `Document` before being converted to the
/// caller's type. This keeps [`Plugin`](crate::Plugin) object safe while the
/// dispatcher helpers stay generic.
pub type Document = serde_json::Value;
