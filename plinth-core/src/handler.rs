//! # Endpoint Layer (Handler)
//!
//! The caller-supplied code that actually answers a request. The dispatcher
//! wraps exactly one handler; routing between several endpoints is the job
//! of whatever handler the caller plugs in (a router is just another
//! handler).
//!
//! # Usage Patterns
//!
//! 1. **Closure**: `handler_fn(|w, req| Box::pin(async move { ... }))`
//! 2. **Struct implementation**: `impl Handler for MyRouter`

use crate::{request::Request, writer::ResponseWriter};
use futures::future::BoxFuture;

/// The terminal endpoint of the dispatch pipeline.
///
/// A handler writes its response into `w`. It has no return value: ordinary
/// errors are turned into responses by the handler itself, and anything it
/// cannot handle is a crash that the dispatcher contains.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle requests",
    label = "missing `Handler` implementation",
    note = "Wrap closures with `handler_fn` or implement `Handler::serve` directly."
)]
pub trait Handler: Send + Sync + 'static {
    /// Serve one request.
    fn serve<'a>(&'a self, w: &'a mut dyn ResponseWriter, req: &'a Request) -> BoxFuture<'a, ()>;
}

/// A [`Handler`] backed by a closure. Built with [`handler_fn`].
#[derive(Clone, Copy)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> std::fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

/// Turn a closure into a [`Handler`].
///
/// # Example
///
/// ```rust,ignore
/// let hello = handler_fn(|w, _req| {
///     Box::pin(async move {
///         let _ = w.write(b"hello");
///     })
/// });
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: for<'a> Fn(&'a mut dyn ResponseWriter, &'a Request) -> BoxFuture<'a, ()>
        + Send
        + Sync
        + 'static,
{
    HandlerFn { f }
}

impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(&'a mut dyn ResponseWriter, &'a Request) -> BoxFuture<'a, ()>
        + Send
        + Sync
        + 'static,
{
    fn serve<'a>(&'a self, w: &'a mut dyn ResponseWriter, req: &'a Request) -> BoxFuture<'a, ()> {
        (self.f)(w, req)
    }
}

impl<H: Handler + ?Sized> Handler for std::sync::Arc<H> {
    fn serve<'a>(&'a self, w: &'a mut dyn ResponseWriter, req: &'a Request) -> BoxFuture<'a, ()> {
        (**self).serve(w, req)
    }
}
