//! The page-handle abstraction consumed by the navigation layer.
//!
//! The navigation controller never talks to a browser directly; it drives
//! anything that can load a location, look for a visible element, and invoke
//! it. The real implementation is [`crate::page::Page`]; tests substitute
//! scripted in-memory drivers.
//!
//! # Design Philosophy
//!
//! The trait is intentionally minimal and object-safe. It carries no
//! assertion or querying surface - page objects build those on top of the
//! concrete page type. Everything the retry loop needs fits in three
//! operations.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// An element located by a driver, usable for a single invocation.
///
/// The handle records how the element was found rather than pinning a live
/// DOM node: the element may vanish between detection and invocation, and
/// drivers report that as an invocation failure instead of a stale pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    matcher: String,
}

impl ElementHandle {
    /// Creates a handle for an element found via `matcher`.
    #[must_use]
    pub fn new(matcher: impl Into<String>) -> Self {
        Self {
            matcher: matcher.into(),
        }
    }

    /// The matcher that located this element.
    #[must_use]
    pub fn matcher(&self) -> &str {
        &self.matcher
    }
}

/// A caller-owned browser page, as seen by the navigation layer.
///
/// Matchers are either CSS selectors (`#cookie-accept`,
/// `.cookie-consent button`) or `text=Label` forms matching the trimmed
/// text content of interactive elements.
///
/// Concurrent use of one driver from multiple navigation calls is not
/// supported; callers serialize access for the lifetime of the test.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Drives the page to `url`, resolving once the document is interactable
    /// or failing within `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::NavError::LoadFailed`] or
    /// [`crate::error::NavError::WaitTimeout`] when the load does not
    /// complete. The retry loop treats any error here as a failed attempt.
    async fn load(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Looks for a visible element matching `matcher` within `timeout`.
    ///
    /// Absence is an ordinary answer: `Ok(None)`. A zero timeout performs a
    /// single immediate check.
    ///
    /// # Errors
    ///
    /// Returns an error only when the check itself cannot run (script
    /// failure, lost connection).
    async fn find_visible(&self, matcher: &str, timeout: Duration) -> Result<Option<ElementHandle>>;

    /// Invokes (clicks) a previously located element once.
    ///
    /// # Errors
    ///
    /// Returns an error if the element is no longer present or the
    /// invocation cannot be delivered.
    async fn invoke(&self, element: &ElementHandle) -> Result<()>;
}
