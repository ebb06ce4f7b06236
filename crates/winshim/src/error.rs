//! Error kinds, the internal error type and the bounded error trace
//!
//! Failures never unwind through the facade. Internal code propagates
//! [`ShimError`] with `?`; the facade turns every error into one entry of the
//! [`ErrorTrace`] and hands the caller a sentinel (`None`, `false`, ...).
//! The trace is what [`crate::Shim::error`] returns.

use std::fmt;

use thiserror::Error;

use crate::alloc::AllocError;

/// Default capacity of the error trace in bytes
pub const DEFAULT_TRACE_CAPACITY: usize = 256;

/// Prefix written in front of every trace entry
const TRACE_PREFIX: &str = "[winshim]";

/// Error classification, also used as the numeric code in trace entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ErrorKind {
    /// No error
    #[default]
    None = 0x00,
    /// Generic failure (allocation, invalid arguments)
    Generic = 0x01,
    /// Subsystem initialization failure or misuse of the init lifecycle
    Init = 0x02,
    /// Window creation or window handle failure
    Window = 0x03,
    /// Graphics context or native display failure
    GlContext = 0x04,
}

impl ErrorKind {
    /// Numeric code written into the trace
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Generic => "generic",
            Self::Init => "init",
            Self::Window => "window",
            Self::GlContext => "gl",
        };
        f.write_str(name)
    }
}

/// Errors raised inside the shim
#[derive(Error, Debug)]
pub enum ShimError {
    /// Generic failure
    #[error("{0}")]
    Generic(String),

    /// Initialization failure
    #[error("{0}")]
    Init(String),

    /// Window failure
    #[error("{0}")]
    Window(String),

    /// Graphics context or display failure
    #[error("{0}")]
    GlContext(String),

    /// Allocation failure
    #[error("Allocation failed: {0}")]
    Alloc(#[from] AllocError),
}

impl ShimError {
    /// Kind used when this error is written to the trace
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Generic(_) | Self::Alloc(_) => ErrorKind::Generic,
            Self::Init(_) => ErrorKind::Init,
            Self::Window(_) => ErrorKind::Window,
            Self::GlContext(_) => ErrorKind::GlContext,
        }
    }

    /// Shorthand for the "not initialized" init error
    pub(crate) fn not_initialized() -> Self {
        Self::Init("Not initialized".to_string())
    }

    /// Shorthand for an invalid (null or stale) window handle
    pub(crate) fn invalid_window(action: &str) -> Self {
        Self::Window(format!("Attempt to {action} invalid (null) window handle"))
    }
}

/// Result of appending to the error trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The whole entry was stored
    Complete,
    /// Only a prefix of the entry fit into the remaining capacity
    Truncated,
    /// The trace was already full; nothing was stored
    Dropped,
}

/// Bounded, append-only error log
///
/// Entries are formatted as `"[winshim] Error(<code>): <message>\n"`. The
/// trace is never cleared automatically; once capacity is reached new
/// entries are cut short or dropped and [`append`](Self::append) says so.
#[derive(Debug, Clone)]
pub struct ErrorTrace {
    text: String,
    capacity: usize,
}

impl ErrorTrace {
    /// Create an empty trace with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TRACE_CAPACITY)
    }

    /// Create an empty trace holding at most `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
            capacity,
        }
    }

    /// Append one entry for `kind`
    pub fn append(&mut self, kind: ErrorKind, message: &str) -> AppendOutcome {
        log::error!("{kind} error: {message}");

        let entry = format!("{TRACE_PREFIX} Error({}): {message}\n", kind.code());
        let remaining = self.capacity.saturating_sub(self.text.len());
        if entry.len() <= remaining {
            self.text.push_str(&entry);
            return AppendOutcome::Complete;
        }

        let mut end = remaining;
        while end > 0 && !entry.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            return AppendOutcome::Dropped;
        }
        self.text.push_str(&entry[..end]);
        AppendOutcome::Truncated
    }

    /// Append `error` using its own kind
    pub fn record(&mut self, error: &ShimError) -> AppendOutcome {
        self.append(error.kind(), &error.to_string())
    }

    /// The accumulated trace
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of entries of `kind` that made it into the trace
    pub fn count(&self, kind: ErrorKind) -> usize {
        let marker = format!("{TRACE_PREFIX} Error({}):", kind.code());
        self.text.matches(&marker).count()
    }

    /// Bytes currently stored
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether nothing has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Maximum number of bytes the trace holds
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ErrorTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ErrorTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
