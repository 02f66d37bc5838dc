//! Ordering and crash containment of the request pipeline.

use futures::FutureExt;
use http::{HeaderValue, StatusCode, header::CONTENT_TYPE};
use plinth::{
    Discard, Dispatcher, PluginRegistry, ResponseBuffer, ServerConfig, WriteTracker, handler_fn,
    testing::{PluginProbe, StubPlugin},
    wrap_writer,
};
use std::{
    panic::AssertUnwindSafe,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

mod common;
use common::{
    capture_logs, dispatch, exploding, get, json_dispatcher, recording, respond_with,
    stub_dispatcher, write_then_explode,
};

#[tokio::test]
async fn test_hooks_run_around_handler() {
    let probe = PluginProbe::new();
    let dispatcher = stub_dispatcher(StubPlugin::new(probe.clone()), recording(probe.clone()));

    let buffer = dispatch(&dispatcher, get("/")).await;

    assert_eq!(probe.steps(), vec!["before", "handler", "after"]);
    assert_eq!(probe.recover_count(), 0);
    assert_eq!(buffer.body(), b"ok");
}

#[tokio::test]
async fn test_handler_panic_recovers_once() {
    let probe = PluginProbe::new();
    let dispatcher = stub_dispatcher(StubPlugin::new(probe.clone()), exploding());

    dispatch(&dispatcher, get("/")).await;

    assert_eq!(probe.steps(), vec!["before", "recover", "after"]);
    assert_eq!(probe.recover_count(), 1);
    assert_eq!(probe.after_count(), 1);
}

#[tokio::test]
async fn test_before_dispatch_panic_skips_handler() {
    let probe = PluginProbe::new();
    let plugin = StubPlugin::new(probe.clone()).panic_before();
    let dispatcher = stub_dispatcher(plugin, recording(probe.clone()));

    dispatch(&dispatcher, get("/")).await;

    assert_eq!(probe.steps(), vec!["before", "recover", "after"]);
}

#[tokio::test]
async fn test_panicking_writer_decorator_still_recovers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let dispatcher = Dispatcher::builder(&PluginRegistry::with_defaults(), "jsonapi")
        .unwrap()
        .before_dispatch(|plugin, w, req| {
            plugin.before_dispatch(w, req);
            wrap_writer(w, |_inner| -> Discard { panic!("decorator exploded") });
        })
        .after_dispatch(move |plugin, w, req| {
            plugin.after_dispatch(w, req);
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .handler(respond_with(b"{}"))
        .build();

    let buffer = dispatch(&dispatcher, get("/")).await;

    assert_eq!(buffer.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(buffer.body(), br#"{"message":"Internal Server Error"}"#);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_after_dispatch_panic_is_contained() {
    let probe = PluginProbe::new();
    let plugin = StubPlugin::new(probe.clone()).panic_after();
    let dispatcher = stub_dispatcher(plugin, respond_with(b"done"));

    let buffer = dispatch(&dispatcher, get("/")).await;

    assert_eq!(probe.after_count(), 1);
    assert_eq!(probe.recover_count(), 0);
    assert_eq!(buffer.body(), b"done");
}

#[tokio::test]
async fn test_after_dispatch_runs_once_per_request() {
    let probe = PluginProbe::new();
    let dispatcher = stub_dispatcher(StubPlugin::new(probe.clone()), exploding());

    for _ in 0..3 {
        dispatch(&dispatcher, get("/")).await;
    }

    assert_eq!(probe.before_count(), 3);
    assert_eq!(probe.recover_count(), 3);
    assert_eq!(probe.after_count(), 3);
}

#[tokio::test]
async fn test_recover_panic_propagates() {
    let probe = PluginProbe::new();
    let plugin = StubPlugin::new(probe.clone()).panic_recover();
    let dispatcher = stub_dispatcher(plugin, exploding());

    let mut buffer = ResponseBuffer::new();
    let outcome = AssertUnwindSafe(dispatcher.dispatch(&mut buffer, get("/")))
        .catch_unwind()
        .await;

    assert!(outcome.is_err());
    assert_eq!(probe.recover_count(), 1);
    assert_eq!(probe.after_count(), 0);
}

#[tokio::test]
async fn test_missing_handler_goes_to_recover() {
    let dispatcher = Dispatcher::new(&PluginRegistry::with_defaults(), "jsonapi").unwrap();
    assert!(!dispatcher.has_handler());

    let buffer = dispatch(&dispatcher, get("/")).await;

    assert_eq!(buffer.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(buffer.body(), br#"{"message":"Internal Server Error"}"#);
}

#[tokio::test]
async fn test_panic_without_write_gives_json_500() {
    let dispatcher = json_dispatcher(exploding());

    let buffer = dispatch(&dispatcher, get("/")).await;

    assert_eq!(buffer.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(buffer.body(), br#"{"message":"Internal Server Error"}"#);
    assert_eq!(
        buffer.sent_headers()[CONTENT_TYPE],
        "application/json; charset=utf-8"
    );
}

#[tokio::test]
async fn test_panic_after_write_keeps_body() {
    let dispatcher = json_dispatcher(write_then_explode(b"hello"));

    let buffer = dispatch(&dispatcher, get("/")).await;

    assert_eq!(buffer.status(), StatusCode::OK);
    assert_eq!(buffer.body(), b"hello");
}

#[tokio::test]
async fn test_handler_sees_write_tracker() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let handler = handler_fn(move |w, req| {
        let log = Arc::clone(&log);
        Box::pin(async move {
            let tracker = WriteTracker::of(req).unwrap();
            log.lock().unwrap().push(tracker.wrote());
            w.write(b"x").unwrap();
            log.lock().unwrap().push(tracker.wrote());
        })
    });
    let dispatcher = json_dispatcher(handler);

    dispatch(&dispatcher, get("/")).await;

    assert_eq!(*seen.lock().unwrap(), vec![false, true]);
}

#[tokio::test]
async fn test_hook_overrides_can_call_defaults() {
    let probe = PluginProbe::new();
    let registry = PluginRegistry::new().with("stub", StubPlugin::new(probe.clone()));
    let dispatcher = Dispatcher::builder(&registry, "stub")
        .unwrap()
        .before_dispatch(|plugin, w, req| {
            plugin.before_dispatch(w, req);
            w.headers_mut()
                .insert("x-request-path", HeaderValue::from_str(req.uri().path()).unwrap());
        })
        .recover(|_plugin, w, _req| {
            w.write_head(StatusCode::SERVICE_UNAVAILABLE);
            let _ = w.write(b"try again later");
        })
        .handler(exploding())
        .build();

    let buffer = dispatch(&dispatcher, get("/users")).await;

    assert_eq!(probe.before_count(), 1);
    // The plugin's own recover was replaced.
    assert_eq!(probe.recover_count(), 0);
    assert_eq!(probe.after_count(), 1);
    assert_eq!(buffer.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(buffer.sent_headers()["x-request-path"], "/users");
    assert_eq!(buffer.body(), b"try again later");
}

#[tokio::test]
async fn test_after_override_replaces_plugin_hook() {
    let probe = PluginProbe::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let registry = PluginRegistry::new().with("stub", StubPlugin::new(probe.clone()));
    let dispatcher = Dispatcher::builder(&registry, "stub")
        .unwrap()
        .after_dispatch(move |_plugin, _w, _req| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .handler(respond_with(b"ok"))
        .build();

    dispatch(&dispatcher, get("/")).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(probe.after_count(), 0);
}

#[tokio::test]
async fn test_dispatchers_nest() {
    let outer_probe = PluginProbe::new();
    let inner = json_dispatcher(exploding());
    let outer = stub_dispatcher(StubPlugin::new(outer_probe.clone()), inner);

    let buffer = dispatch(&outer, get("/")).await;

    // The inner dispatcher contained the crash itself.
    assert_eq!(outer_probe.recover_count(), 0);
    assert_eq!(outer_probe.after_count(), 1);
    assert_eq!(buffer.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(buffer.body(), br#"{"message":"Internal Server Error"}"#);
}

#[tokio::test]
async fn test_requests_are_independent() {
    let dispatcher = Arc::new(json_dispatcher(handler_fn(|w, req| {
        Box::pin(async move {
            if req.uri().path() == "/boom" {
                panic!("boom");
            }
            w.write(b"fine").unwrap();
        })
    })));

    let crashed = dispatch(&dispatcher, get("/boom")).await;
    let served = dispatch(&dispatcher, get("/")).await;

    assert_eq!(crashed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(served.body(), b"fine");
}

#[tokio::test]
async fn test_crash_logs_backtrace_by_default() {
    let (logs, _guard) = capture_logs();
    let dispatcher = Dispatcher::new(&PluginRegistry::with_defaults(), "jsonapi").unwrap();

    dispatch(&dispatcher, get("/")).await;

    let out = logs.contents();
    assert!(out.contains("ERROR"), "{out}");
    assert!(out.contains("plinth::dispatch"), "{out}");
    assert!(out.contains("backtrace="), "{out}");
}

#[tokio::test]
async fn test_crash_logged_at_debug_without_stack_traces() {
    let (logs, _guard) = capture_logs();
    let dispatcher = Dispatcher::builder(&PluginRegistry::with_defaults(), "jsonapi")
        .unwrap()
        .config(ServerConfig::default().with_log_stack_trace(false))
        .build();

    let buffer = dispatch(&dispatcher, get("/")).await;

    let out = logs.contents();
    assert_eq!(buffer.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(out.contains("DEBUG"), "{out}");
    assert!(out.contains("request crashed"), "{out}");
    assert!(!out.contains("ERROR"), "{out}");
    assert!(!out.contains("backtrace="), "{out}");
}
