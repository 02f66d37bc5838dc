//! Unrecoverable failures.
//!
//! A fault is not an error return: it unwinds out of the handler and is
//! caught by the dispatcher's guarded scope, which then runs the plugin's
//! crash recovery. Any panic is treated the same way; [`raise`] is how the
//! crate itself signals one, with a typed payload and a captured backtrace.

use crate::error::BoxError;
use std::{any::Any, backtrace::Backtrace, fmt};
use thiserror::Error;

/// The faults the dispatch layer raises on its own.
#[derive(Error, Debug)]
pub enum Fault {
    /// A response payload could not be encoded.
    #[error("failed to marshal response payload: {0}")]
    Marshal(#[source] BoxError),

    /// A response helper was given a status outside `100..=999`.
    #[error("invalid response status {0}")]
    InvalidStatus(u16),

    /// The dispatcher was asked to serve a request without a handler.
    #[error("no handler configured")]
    MissingHandler,
}

/// A fault in flight, as carried by the unwind.
pub struct FaultReport {
    fault: Fault,
    backtrace: Backtrace,
}

impl FaultReport {
    /// The fault that was raised.
    pub fn fault(&self) -> &Fault {
        &self.fault
    }

    /// Where it was raised. Empty unless backtraces are enabled through
    /// `RUST_BACKTRACE` or `RUST_LIB_BACKTRACE`.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Debug for FaultReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultReport")
            .field("fault", &self.fault)
            .finish_non_exhaustive()
    }
}

/// Abort the current request with `fault`.
///
/// Unwinds without invoking the panic hook; the dispatcher that catches the
/// unwind is responsible for reporting it.
pub fn raise(fault: Fault) -> ! {
    std::panic::resume_unwind(Box::new(FaultReport {
        fault,
        backtrace: Backtrace::capture(),
    }))
}

/// Render a caught unwind payload as text.
pub fn describe(payload: &(dyn Any + Send)) -> String {
    if let Some(report) = payload.downcast_ref::<FaultReport>() {
        report.fault.to_string()
    } else if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
