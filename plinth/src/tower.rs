//! Tower integration for plinth.
//!
//! [`DispatchService`] exposes a [`Dispatcher`] as a
//! `tower::Service<http::Request<Bytes>>`, so the pipeline can sit behind
//! tower middleware or be driven directly in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use plinth::tower::DispatchService;
//! use tower::ServiceExt;
//!
//! let service = DispatchService::new(Arc::new(dispatcher));
//! let response = service.oneshot(request).await?;
//! ```

use crate::Dispatcher;
use bytes::Bytes;
use futures::future::BoxFuture;
use plinth_core::ResponseBuffer;
use std::{
    convert::Infallible,
    sync::Arc,
    task::{Context, Poll},
};
use ::tower::Service;

/// Wraps a [`Dispatcher`] as a tower `Service`.
///
/// The response is buffered in full. Crashes are handled by the pipeline,
/// so the service itself never fails.
#[derive(Debug, Clone)]
pub struct DispatchService {
    dispatcher: Arc<Dispatcher>,
}

impl DispatchService {
    /// Create a service dispatching to `dispatcher`.
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Get a reference to the inner dispatcher.
    pub fn inner(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl Service<http::Request<Bytes>> for DispatchService {
    type Response = http::Response<Bytes>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Dispatchers are always ready
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: http::Request<Bytes>) -> Self::Future {
        let dispatcher = Arc::clone(&self.dispatcher);
        Box::pin(async move {
            let mut buffer = ResponseBuffer::new();
            dispatcher.dispatch(&mut buffer, request).await;
            Ok(buffer.into_response())
        })
    }
}
