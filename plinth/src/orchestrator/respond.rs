//! Response helpers and the plugin codec.

use super::{Dispatcher, pipeline::DISPATCH_TARGET};
use http::StatusCode;
use plinth_core::{CodecError, Fault, Plugin, Request, ResponseWriter, raise};
use serde::{Serialize, de::DeserializeOwned};
use std::{fmt, sync::Arc};
use tracing::warn;

/// The response helpers of one dispatcher, detached from it.
///
/// [`Dispatcher::dispatch`] puts the dispatcher's responder into the request
/// extensions, so a handler reaches the helpers of the dispatcher that wraps
/// it through [`Responder::of`]. Cloning is cheap.
#[derive(Clone)]
pub struct Responder {
    plugin: Arc<dyn Plugin>,
}

impl Responder {
    /// A responder encoding through `plugin`.
    pub fn new(plugin: Arc<dyn Plugin>) -> Self {
        Self { plugin }
    }

    /// The responder the innermost dispatcher attached to `req`, if any.
    pub fn of(req: &Request) -> Option<&Responder> {
        req.extensions().get::<Responder>()
    }

    /// The plugin the helpers encode through.
    pub fn plugin(&self) -> &Arc<dyn Plugin> {
        &self.plugin
    }

    /// Write a success response.
    ///
    /// `resource` is encoded with the plugin. A `status` of `0` means
    /// `200 OK`.
    ///
    /// # Panics
    ///
    /// Raises [`Fault::Marshal`] if the resource cannot be encoded, and
    /// [`Fault::InvalidStatus`] for a status outside `100..=999`. Inside
    /// [`Dispatcher::dispatch`] both end in the plugin's `recover`.
    pub fn ok<T>(&self, w: &mut dyn ResponseWriter, resource: &T, status: u16)
    where
        T: Serialize + ?Sized,
    {
        let body = self.encode(resource);
        w.write_head(resolve_status(status, StatusCode::OK));
        write_body(w, &body);
    }

    /// Write an error response.
    ///
    /// Same as [`ok`](Self::ok), except that `0` means
    /// `500 Internal Server Error` and the body is followed by a newline.
    ///
    /// # Panics
    ///
    /// Under the same conditions as [`ok`](Self::ok).
    pub fn error<T>(&self, w: &mut dyn ResponseWriter, resource: &T, status: u16)
    where
        T: Serialize + ?Sized,
    {
        let mut body = self.encode(resource);
        body.push(b'\n');
        w.write_head(resolve_status(status, StatusCode::INTERNAL_SERVER_ERROR));
        write_body(w, &body);
    }

    /// Surface an application status through the plugin.
    pub fn write_status_tag(&self, w: &mut dyn ResponseWriter, code: i64) {
        self.plugin.write_status_tag(w, code);
    }

    /// Encode `value` with the plugin.
    pub fn marshal<T>(&self, value: &T) -> Result<Vec<u8>, CodecError>
    where
        T: Serialize + ?Sized,
    {
        let document = serde_json::to_value(value)?;
        self.plugin
            .marshal(&document)
            .map_err(CodecError::Marshal)
    }

    /// Decode `data` with the plugin.
    pub fn unmarshal<T>(&self, data: &[u8]) -> Result<T, CodecError>
    where
        T: DeserializeOwned,
    {
        let document = self
            .plugin
            .unmarshal(data)
            .map_err(CodecError::Unmarshal)?;
        Ok(serde_json::from_value(document)?)
    }

    fn encode<T>(&self, resource: &T) -> Vec<u8>
    where
        T: Serialize + ?Sized,
    {
        let document = match serde_json::to_value(resource) {
            Ok(document) => document,
            Err(err) => raise(Fault::Marshal(Box::new(err))),
        };
        match self.plugin.marshal(&document) {
            Ok(body) => body,
            Err(err) => raise(Fault::Marshal(err)),
        }
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder").finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// A detached handle on this dispatcher's response helpers.
    pub fn responder(&self) -> Responder {
        Responder::new(Arc::clone(&self.plugin))
    }

    /// See [`Responder::ok`].
    pub fn ok<T>(&self, w: &mut dyn ResponseWriter, resource: &T, status: u16)
    where
        T: Serialize + ?Sized,
    {
        self.responder().ok(w, resource, status);
    }

    /// See [`Responder::error`].
    pub fn error<T>(&self, w: &mut dyn ResponseWriter, resource: &T, status: u16)
    where
        T: Serialize + ?Sized,
    {
        self.responder().error(w, resource, status);
    }

    /// Surface an application status through the plugin.
    pub fn write_status_tag(&self, w: &mut dyn ResponseWriter, code: i64) {
        self.plugin.write_status_tag(w, code);
    }

    /// See [`Responder::marshal`].
    pub fn marshal<T>(&self, value: &T) -> Result<Vec<u8>, CodecError>
    where
        T: Serialize + ?Sized,
    {
        self.responder().marshal(value)
    }

    /// See [`Responder::unmarshal`].
    pub fn unmarshal<T>(&self, data: &[u8]) -> Result<T, CodecError>
    where
        T: DeserializeOwned,
    {
        self.responder().unmarshal(data)
    }
}

fn resolve_status(status: u16, fallback: StatusCode) -> StatusCode {
    if status == 0 {
        return fallback;
    }
    match StatusCode::from_u16(status) {
        Ok(status) => status,
        Err(_) => raise(Fault::InvalidStatus(status)),
    }
}

fn write_body(w: &mut dyn ResponseWriter, body: &[u8]) {
    match w.write(body) {
        Ok(written) if written < body.len() => warn!(
            target: DISPATCH_TARGET,
            written,
            expected = body.len(),
            "short write on response body"
        ),
        Ok(_) => {}
        Err(err) => warn!(
            target: DISPATCH_TARGET,
            error = %err,
            "failed to write response body"
        ),
    }
}
