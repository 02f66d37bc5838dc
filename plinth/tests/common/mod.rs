#![allow(dead_code)]

use plinth::{
    Dispatcher, Handler, PluginRegistry, Request, ResponseBuffer,
    handler_fn,
    testing::{PluginProbe, StubPlugin},
};
use std::{
    io,
    sync::{Arc, Mutex},
};
use tracing::subscriber::DefaultGuard;

// ============================================================================
// Dispatchers
// ============================================================================

/// A dispatcher over a stub plugin registered as `"stub"`.
pub fn stub_dispatcher(plugin: StubPlugin, handler: impl Handler) -> Dispatcher {
    let registry = PluginRegistry::new().with("stub", plugin);
    Dispatcher::new(&registry, "stub").unwrap().with_handler(handler)
}

/// A dispatcher over the bundled JSON plugin.
pub fn json_dispatcher(handler: impl Handler) -> Dispatcher {
    Dispatcher::new(&PluginRegistry::with_defaults(), "jsonapi")
        .unwrap()
        .with_handler(handler)
}

/// Dispatch `req` into a fresh buffer and return it.
pub async fn dispatch(dispatcher: &Dispatcher, req: Request) -> ResponseBuffer {
    let mut buffer = ResponseBuffer::new();
    dispatcher.dispatch(&mut buffer, req).await;
    buffer
}

pub fn get(uri: &str) -> Request {
    http::Request::builder()
        .uri(uri)
        .body(bytes::Bytes::new())
        .unwrap()
}

// ============================================================================
// Log Capture
// ============================================================================

/// Formatted log output collected by [`capture_logs`].
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Capture every event on the current thread until the guard drops.
pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    (logs, tracing::subscriber::set_default(subscriber))
}

// ============================================================================
// Test Handlers
// ============================================================================

/// Writes `body` and returns.
pub fn respond_with(body: &'static [u8]) -> impl Handler {
    handler_fn(move |w, _req| {
        Box::pin(async move {
            w.write(body).unwrap();
        })
    })
}

/// Panics without writing anything.
pub fn exploding() -> impl Handler {
    handler_fn(|_w, _req| {
        Box::pin(async move {
            panic!("handler exploded");
        })
    })
}

/// Writes `body`, then panics.
pub fn write_then_explode(body: &'static [u8]) -> impl Handler {
    handler_fn(move |w, _req| {
        Box::pin(async move {
            w.write(body).unwrap();
            panic!("handler exploded after writing");
        })
    })
}

/// Records a `"handler"` step on `probe` and writes `ok`.
pub fn recording(probe: Arc<PluginProbe>) -> impl Handler {
    handler_fn(move |w, _req| {
        let probe = Arc::clone(&probe);
        Box::pin(async move {
            probe.record("handler");
            w.write(b"ok").unwrap();
        })
    })
}
