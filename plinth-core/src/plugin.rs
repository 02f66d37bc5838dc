//! # Strategy Layer (Plugin)
//!
//! A plugin supplies everything format- or domain-specific about an API:
//! how payloads are encoded, what headers every response starts with, how an
//! application-level status is surfaced, and what a client sees when a
//! request crashes. The dispatcher stays format-agnostic and only sequences
//! the calls.
//!
//! # Lifecycle
//!
//! For every request the dispatcher calls, in order:
//!
//! 1. [`Plugin::before_dispatch`], then the handler (guarded together)
//! 2. [`Plugin::recover`], only if step 1 crashed
//! 3. [`Plugin::after_dispatch`], always
//!
//! # Object Safety
//!
//! Plugins are stored as `Arc<dyn Plugin>` in a registry, so the codec works
//! on [`Document`] values rather than generic types. The dispatcher converts
//! to and from the caller's types on either side.

use crate::{
    error::BoxError,
    request::{Document, Request},
    writer::{BoxWriter, ResponseWriter},
};

/// A pluggable strategy for the dispatch pipeline.
///
/// Only the codec, the crash response and the status tag are required; the
/// two dispatch hooks default to doing nothing.
///
/// # Example
///
/// ```rust,ignore
/// struct PlainText;
///
/// impl Plugin for PlainText {
///     fn recover(&self, w: &mut dyn ResponseWriter, _req: &Request) {
///         w.write_head(StatusCode::INTERNAL_SERVER_ERROR);
///         let _ = w.write(b"oops");
///     }
///     fn marshal(&self, value: &Document) -> Result<Vec<u8>, BoxError> {
///         Ok(value.to_string().into_bytes())
///     }
///     fn unmarshal(&self, data: &[u8]) -> Result<Document, BoxError> {
///         Ok(Document::String(String::from_utf8(data.to_vec())?))
///     }
///     fn write_status_tag(&self, _w: &mut dyn ResponseWriter, _code: i64) {}
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a dispatch `Plugin`",
    label = "missing `Plugin` implementation",
    note = "Plugins must provide `recover`, `marshal`, `unmarshal` and `write_status_tag`."
)]
pub trait Plugin: Send + Sync + 'static {
    /// Runs before the handler. May replace `w` with a decorator (see
    /// [`wrap_writer`](crate::wrap_writer)) or adjust the request.
    fn before_dispatch(&self, w: &mut BoxWriter<'_>, req: &mut Request) {
        let _ = (w, req);
    }

    /// Runs after the handler, whether or not it crashed.
    fn after_dispatch(&self, w: &mut BoxWriter<'_>, req: &mut Request) {
        let _ = (w, req);
    }

    /// Produces the fallback response after a crash in pre-dispatch or the
    /// handler. Called at most once per request.
    ///
    /// Implementations should check [`WriteTracker::of`](crate::WriteTracker::of)
    /// and leave the response alone if the body has already started.
    fn recover(&self, w: &mut dyn ResponseWriter, req: &Request);

    /// Encode a payload.
    fn marshal(&self, value: &Document) -> Result<Vec<u8>, BoxError>;

    /// Decode a payload.
    fn unmarshal(&self, data: &[u8]) -> Result<Document, BoxError>;

    /// Surface an application-level status, independent of the HTTP status.
    fn write_status_tag(&self, w: &mut dyn ResponseWriter, code: i64);
}
