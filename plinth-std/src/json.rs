//! JSON API plugin.
//!
//! [`JsonPlugin`] is the bundled plugin for JSON APIs:
//!
//! - every response starts out as `application/json; charset=utf-8`
//! - payloads are encoded with `serde_json`
//! - the application status goes into the `X-API-Status` header
//! - a crash before the body started produces a JSON `500`
//!
//! [`ApiError`] and [`ApiErrors`] are the error bodies JSON handlers
//! usually send through the dispatcher's `error` helper.

use http::{HeaderName, HeaderValue, StatusCode, header::CONTENT_TYPE};
use plinth_core::{
    BoxError, BoxWriter, Document, Plugin, Request, ResponseWriter, WriteTracker,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

const DISPATCH_TARGET: &str = "plinth::dispatch";

/// Header carrying the application-level status.
pub const STATUS_HEADER: HeaderName = HeaderName::from_static("x-api-status");

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// The bundled JSON plugin.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonPlugin;

impl JsonPlugin {
    /// The name the plugin is registered under by default.
    pub const NAME: &'static str = "jsonapi";
}

impl Plugin for JsonPlugin {
    fn before_dispatch(&self, w: &mut BoxWriter<'_>, _req: &mut Request) {
        w.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    }

    fn recover(&self, w: &mut dyn ResponseWriter, req: &Request) {
        // Appending to a body that already started would corrupt it.
        if WriteTracker::of(req).is_some_and(WriteTracker::wrote) {
            return;
        }

        let body = match serde_json::to_vec(&ApiError::new(INTERNAL_SERVER_ERROR)) {
            Ok(body) => body,
            Err(err) => {
                warn!(target: DISPATCH_TARGET, error = %err, "failed to encode crash response");
                w.headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_CONTENT_TYPE));
                INTERNAL_SERVER_ERROR.as_bytes().to_vec()
            }
        };

        w.write_head(StatusCode::INTERNAL_SERVER_ERROR);
        if let Err(err) = w.write(&body) {
            warn!(target: DISPATCH_TARGET, error = %err, "failed to write crash response");
        }
    }

    fn marshal(&self, value: &Document) -> Result<Vec<u8>, BoxError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn unmarshal(&self, data: &[u8]) -> Result<Document, BoxError> {
        Ok(serde_json::from_slice(data)?)
    }

    fn write_status_tag(&self, w: &mut dyn ResponseWriter, code: i64) {
        w.headers_mut().insert(STATUS_HEADER, HeaderValue::from(code));
    }
}

/// A single error body: `{"message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human readable description.
    pub message: String,

    /// Application status, omitted when not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_status: Option<i32>,
}

impl ApiError {
    /// An error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            api_status: None,
        }
    }

    /// Attach an application status.
    pub fn with_status(mut self, api_status: i32) -> Self {
        self.api_status = Some(api_status);
        self
    }
}

impl<E: std::error::Error> From<&E> for ApiError {
    fn from(err: &E) -> Self {
        Self::new(err.to_string())
    }
}

/// A batch error body: `{"errors": [...], "api_status": n}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrors {
    /// The individual errors.
    pub errors: Vec<ApiError>,

    /// Application status for the batch.
    #[serde(default)]
    pub api_status: i32,
}

impl ApiErrors {
    /// Collect errors into a batch with the given status.
    pub fn new<I>(errors: I, api_status: i32) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ApiError>,
    {
        Self {
            errors: errors.into_iter().map(Into::into).collect(),
            api_status,
        }
    }
}
