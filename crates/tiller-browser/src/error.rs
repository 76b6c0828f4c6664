//! Error types for browser navigation and control.
//!
//! The taxonomy separates what the retry loop absorbs from what escalates to
//! the caller. Transport-level load failures and readiness misses never
//! surface as errors at all - they are folded into the navigation outcome.
//! What remains here is either infrastructure failure (launch, CDP
//! connection, script execution) or a programmer/caller signal
//! (`InvalidRequest`, `Cancelled`) that must not be retried.

use std::time::Duration;
use thiserror::Error;

/// The main error type for browser navigation operations.
#[derive(Debug, Error)]
pub enum NavError {
    /// Failed to launch the browser process.
    ///
    /// Typically Chrome/Chromium is not installed or not executable.
    #[error("failed to launch browser: {reason}")]
    LaunchFailed {
        /// Human-readable reason for the launch failure
        reason: String,
        /// Optional underlying error that caused the failure
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Failed to establish or keep the Chrome DevTools Protocol connection.
    #[error("CDP connection failed: {0}")]
    ConnectionFailed(String),

    /// A single page load did not complete (network error, abort, timeout).
    ///
    /// The retry loop treats this as a failed attempt, not a terminal error.
    #[error("load of '{url}' failed: {reason}")]
    LoadFailed {
        /// The URL that failed to load
        url: String,
        /// Reason for the load failure
        reason: String,
    },

    /// A bounded wait expired before its condition held.
    #[error("wait for {condition} timed out after {timeout:?}")]
    WaitTimeout {
        /// Description of the condition that timed out
        condition: String,
        /// How long we waited before timing out
        timeout: Duration,
    },

    /// JavaScript execution in the page context failed.
    #[error("script execution failed: {0}")]
    ScriptFailed(String),

    /// The navigation request itself is malformed.
    ///
    /// This is a programmer error: it is raised before any load attempt and
    /// is never retried.
    #[error("invalid navigation request: {0}")]
    InvalidRequest(String),

    /// The caller aborted the navigation mid-flight.
    ///
    /// Propagated immediately; a cancelled call never reports a plain
    /// failure outcome.
    #[error("navigation cancelled by caller")]
    Cancelled,

    /// An operation was attempted on a closed browser instance.
    #[error("browser instance is already closed")]
    AlreadyClosed,

    /// Wraps errors from the chromiumoxide library.
    #[error("chromiumoxide error: {0}")]
    ChromiumOxide(#[from] chromiumoxide::error::CdpError),

    /// Generic I/O errors (screenshot files, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for browser navigation operations.
pub type Result<T> = std::result::Result<T, NavError>;
