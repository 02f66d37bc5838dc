//! The per-request pipeline.

use super::Dispatcher;
use futures::{FutureExt, future::BoxFuture};
use plinth_core::{
    BoxWriter, Fault, FaultReport, Handler, OutputGuard, Request, ResponseWriter, describe, raise,
};
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
};
use tracing::{debug, error};

pub(crate) const DISPATCH_TARGET: &str = "plinth::dispatch";

impl Dispatcher {
    /// Run one request through the pipeline, writing the response to `sink`.
    ///
    /// 1. `before_dispatch` and the handler run together in a guarded scope.
    /// 2. If that scope panics, the crash is logged and `recover` runs once.
    ///    A crash in the handler recovers through the writer as
    ///    `before_dispatch` left it. A crash in `before_dispatch` recovers
    ///    straight into the guard, since the writer slot may be half replaced.
    /// 3. `after_dispatch` runs in its own guarded scope, whatever happened
    ///    before. A panic there is logged and dropped.
    ///
    /// A panic inside `recover` is not contained and propagates to the caller.
    ///
    /// The request carries the guard's [`WriteTracker`](plinth_core::WriteTracker)
    /// and this dispatcher's [`Responder`](super::Responder) in its
    /// extensions for the whole pipeline.
    pub async fn dispatch(&self, sink: &mut dyn ResponseWriter, mut req: Request) {
        let mut guard = OutputGuard::new(sink);
        req.extensions_mut().insert(guard.tracker());
        req.extensions_mut().insert(self.responder());

        let plugin = &*self.plugin;
        let mut w: BoxWriter<'_> = Box::new(&mut guard);
        let mut prepared = false;

        let handled = AssertUnwindSafe(async {
            self.hooks.before(plugin, &mut w, &mut req);
            prepared = true;
            match &self.handler {
                Some(handler) => handler.serve(&mut *w, &req).await,
                None => raise(Fault::MissingHandler),
            }
        })
        .catch_unwind()
        .await;

        if let Err(payload) = handled {
            self.report_crash(&*payload);
            if !prepared {
                drop(w);
                w = Box::new(&mut guard);
            }
            self.hooks.recover(plugin, &mut *w, &req);
        }

        let finished = panic::catch_unwind(AssertUnwindSafe(|| {
            self.hooks.after(plugin, &mut w, &mut req);
        }));
        if let Err(payload) = finished {
            error!(
                target: DISPATCH_TARGET,
                panic = %describe(&*payload),
                method = %req.method(),
                uri = %req.uri(),
                "after_dispatch panicked"
            );
        }
    }

    fn report_crash(&self, payload: &(dyn Any + Send)) {
        let message = describe(payload);
        if !self.config.log_stack_trace {
            debug!(target: DISPATCH_TARGET, panic = %message, "request crashed, recovering");
            return;
        }
        match payload.downcast_ref::<FaultReport>() {
            Some(report) => error!(
                target: DISPATCH_TARGET,
                panic = %message,
                backtrace = %report.backtrace(),
                "request crashed, recovering"
            ),
            None => error!(target: DISPATCH_TARGET, panic = %message, "request crashed, recovering"),
        }
    }
}

/// A dispatcher is itself a handler, so dispatchers can be nested.
impl Handler for Dispatcher {
    fn serve<'a>(&'a self, w: &'a mut dyn ResponseWriter, req: &'a Request) -> BoxFuture<'a, ()> {
        Box::pin(self.dispatch(w, req.clone()))
    }
}
