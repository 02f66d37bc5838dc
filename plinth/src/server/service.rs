//! Bridges hyper requests into the dispatch pipeline.

use super::SERVER_TARGET;
use crate::Dispatcher;
use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use plinth_core::{Request, ResponseBuffer, ServeError};
use std::{panic, sync::Arc};
use tracing::{debug, warn};

/// Collects the body, dispatches into a buffer and converts the buffer into
/// a response. Returning an error makes hyper close the connection.
///
/// The pipeline runs on its own task. The write timeout bounds how long the
/// connection waits for the response; a pipeline that outlives it still runs
/// to completion, `after_dispatch` included, and its response is dropped.
pub(crate) async fn serve_http(
    dispatcher: Arc<Dispatcher>,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, ServeError> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            let err = ServeError::Body(Box::new(err));
            debug!(target: SERVER_TARGET, error = ?err, "answering 400");
            return Ok(bad_request());
        }
    };
    let request = Request::from_parts(parts, body);
    let limit = dispatcher.config().write_timeout();

    let mut pipeline = tokio::spawn(async move {
        let mut buffer = ResponseBuffer::new();
        dispatcher.dispatch(&mut buffer, request).await;
        buffer
    });

    let finished = match limit {
        Some(limit) => match tokio::time::timeout(limit, &mut pipeline).await {
            Ok(finished) => finished,
            Err(_) => {
                warn!(target: SERVER_TARGET, ?limit, "response not produced in time, closing connection");
                return Err(ServeError::WriteTimeout(limit));
            }
        },
        None => pipeline.await,
    };

    match finished {
        Ok(buffer) => Ok(buffer.into_response().map(Full::new)),
        // `recover` itself panicked; the connection goes down with it.
        Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
        Err(err) => Err(ServeError::Cancelled(Box::new(err))),
    }
}

fn bad_request() -> http::Response<Full<Bytes>> {
    let mut response = http::Response::new(Full::new(Bytes::from_static(b"Bad Request")));
    *response.status_mut() = StatusCode::BAD_REQUEST;
    response
}
