//! Server configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings applied by [`Dispatcher::run`](crate::Dispatcher::run) and the
/// request pipeline.
///
/// Timeouts are in milliseconds, with `0` meaning no timeout, so the struct
/// can be embedded in an application's own config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Time allowed for reading request headers.
    #[serde(default)]
    pub read_timeout_ms: u64,

    /// Time allowed for producing each response. The connection is closed
    /// when it elapses.
    #[serde(default)]
    pub write_timeout_ms: u64,

    /// Cap on the connection read buffer, which bounds the header size.
    #[serde(default = "default_max_header_bytes")]
    pub max_header_bytes: usize,

    /// Log crashes at error level with their backtrace. When off, crashes
    /// are logged at debug level only.
    #[serde(default = "default_log_stack_trace")]
    pub log_stack_trace: bool,
}

fn default_max_header_bytes() -> usize {
    1 << 20
}

fn default_log_stack_trace() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            max_header_bytes: default_max_header_bytes(),
            log_stack_trace: default_log_stack_trace(),
        }
    }
}

impl ServerConfig {
    /// The header read timeout, if any.
    pub fn read_timeout(&self) -> Option<Duration> {
        non_zero(self.read_timeout_ms)
    }

    /// The response timeout, if any.
    pub fn write_timeout(&self) -> Option<Duration> {
        non_zero(self.write_timeout_ms)
    }

    /// Set the header read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout_ms = millis(timeout);
        self
    }

    /// Set the response timeout.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout_ms = millis(timeout);
        self
    }

    /// Set the header size cap.
    pub fn with_max_header_bytes(mut self, bytes: usize) -> Self {
        self.max_header_bytes = bytes;
        self
    }

    /// Turn crash backtraces on or off.
    pub fn with_log_stack_trace(mut self, enabled: bool) -> Self {
        self.log_stack_trace = enabled;
        self
    }
}

fn non_zero(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

fn millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}
