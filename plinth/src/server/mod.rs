//! Server lifecycle.
//!
//! [`Dispatcher::run`] accepts HTTP/1.1 connections on a listener and serves
//! each one on its own task; [`Dispatcher::stop`] ends the accept loop.
//! Connections already accepted are served to completion.

mod config;
mod service;

pub use config::ServerConfig;

use crate::Dispatcher;
use hyper::{server::conn::http1, service::service_fn};
use hyper_util::rt::{TokioIo, TokioTimer};
use plinth_core::ServeError;
use std::{io, net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

pub(crate) const SERVER_TARGET: &str = "plinth::server";

const MIN_BUF_SIZE: usize = 8 * 1024;
const INITIAL_BACKOFF: Duration = Duration::from_millis(5);
const MAX_BACKOFF: Duration = Duration::from_secs(1);

impl Dispatcher {
    /// Serve connections from `listener` until [`stop`](Self::stop) is
    /// called.
    ///
    /// Returns `Ok(())` once stopped. Accept failures tied to a single
    /// connection are retried with a backoff; any other accept failure is
    /// returned as [`ServeError::Accept`].
    ///
    /// # Panics
    ///
    /// Panics if no handler is set.
    pub async fn run(self: Arc<Self>, listener: TcpListener) -> Result<(), ServeError> {
        if self.handler.is_none() {
            panic!("plinth: cannot run a dispatcher without a handler");
        }

        let mut stop = self.stop.subscribe();
        let mut backoff = INITIAL_BACKOFF;
        if let Ok(addr) = listener.local_addr() {
            info!(target: SERVER_TARGET, %addr, "listening");
        }

        loop {
            let stopped = *stop.borrow_and_update();
            if stopped {
                break;
            }

            let accepted = tokio::select! {
                _ = stop.changed() => continue,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => {
                    backoff = INITIAL_BACKOFF;
                    Arc::clone(&self).spawn_connection(stream, peer);
                }
                Err(err) if is_connection_error(&err) => {
                    warn!(target: SERVER_TARGET, error = %err, ?backoff, "accept failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
                Err(err) => return Err(ServeError::Accept(err)),
            }
        }

        info!(target: SERVER_TARGET, "stopped accepting connections");
        Ok(())
    }

    /// Stop the accept loop of [`run`](Self::run).
    ///
    /// This only signals the loop. `run` wakes up, drops the listener on its
    /// way out and returns `Ok(())`. A dispatcher that has been stopped cannot
    /// be run again.
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    fn spawn_connection(self: Arc<Self>, stream: TcpStream, peer: SocketAddr) {
        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .max_buf_size(self.config.max_header_bytes.max(MIN_BUF_SIZE));
        if let Some(timeout) = self.config.read_timeout() {
            builder.header_read_timeout(timeout);
        }

        tokio::spawn(async move {
            let dispatcher = self;
            let service = service_fn(move |req| service::serve_http(Arc::clone(&dispatcher), req));
            if let Err(err) = builder.serve_connection(TokioIo::new(stream), service).await {
                debug!(target: SERVER_TARGET, %peer, error = %err, "connection closed with error");
            }
        });
    }
}

fn is_connection_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}
