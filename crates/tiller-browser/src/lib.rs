//! # tiller-browser
//!
//! Resilient navigation for browser end-to-end test suites, built on
//! chromiumoxide.
//!
//! Public demo applications fail in two distinct ways: the load itself dies
//! (slow host, dropped connection), or the transport succeeds and the served
//! page is unusable anyway - half-rendered, degraded, or buried under a
//! consent banner. This crate treats both identically: a navigation is only
//! done when a caller-supplied readiness probe confirms the page is usable,
//! and everything short of that is retried from a fixed budget.
//!
//! ## Architecture
//!
//! - **Navigator**: the retry loop - load, dismiss transient overlays, probe
//! - **PageDriver**: the minimal page-handle trait the navigator drives
//! - **TestBrowser / Page**: chromiumoxide-backed browser lifecycle and the
//!   real `PageDriver`
//! - **DialogCapture / DialogProbe**: scoped one-shot observation of
//!   `window.alert`-style modals
//! - **DismissPolicy**: which consent elements to look for, and for how long
//!
//! ## Example Usage
//!
//! ```ignore
//! use tiller_browser::{
//!     NavigationRequest, Navigator, TestBrowser, TestBrowserConfig,
//! };
//! use tiller_config::EnvironmentConfig;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::test]
//! async fn reaches_the_login_page() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EnvironmentConfig::load()?;
//!     let browser = TestBrowser::launch(TestBrowserConfig::default()).await?;
//!     let page = browser.new_page().await?;
//!     page.apply_profile(&config).await?;
//!
//!     let request = NavigationRequest::from_config(&config, "/login");
//!     let page_ref = &page;
//!     let outcome = Navigator::new()
//!         .goto(
//!             &page,
//!             &request,
//!             move || async move {
//!                 page_ref
//!                     .find_visible("text=Customer Login", std::time::Duration::ZERO)
//!                     .await
//!                     .ok()
//!                     .flatten()
//!                     .is_some()
//!             },
//!             &CancellationToken::new(),
//!         )
//!         .await?;
//!
//!     if !outcome.is_ready() {
//!         page.save_screenshot("login-failure.png").await?;
//!         panic!("login page never became ready: {outcome:?}");
//!     }
//!
//!     browser.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Semantics
//!
//! `Navigator::goto` resolves exhausted budgets to
//! `Ok(NavigationOutcome::Failed { .. })`. Only two conditions escalate as
//! errors: a malformed request (`NavError::InvalidRequest`) and caller
//! cancellation (`NavError::Cancelled`). Tests treat `Failed` as a hard test
//! failure and should capture a screenshot before raising it.
//!
//! ## Concurrency
//!
//! One navigation at a time per page. The navigator suspends cooperatively
//! during loads, probes, and retry delays; all suspension points honour the
//! call's `CancellationToken` as a unit.
//!
//! ## Testing Strategy
//!
//! 1. **Unit tests**: scripted in-memory drivers for the retry loop,
//!    dismissal, dialog capture, and wait primitives
//! 2. **Integration tests**: real browser tests (require Chrome installed),
//!    `#[ignore]`d by default - run with `cargo test -- --ignored`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod browser;
pub mod data;
pub mod dialog;
pub mod dismiss;
pub mod driver;
pub mod error;
pub mod navigate;
pub mod page;
pub mod wait;

// Re-export main types for convenience
pub use browser::{TestBrowser, TestBrowserConfig};
pub use dialog::{CapturedDialog, DialogCapture, DialogKind, DialogProbe};
pub use dismiss::{DismissPolicy, DEFAULT_CONSENT_MATCHERS};
pub use driver::{ElementHandle, PageDriver};
pub use error::{NavError, Result};
pub use navigate::{FailureKind, NavigationOutcome, NavigationRequest, Navigator};
pub use page::Page;
pub use wait::{WaitConfig, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};

// Cancellation is part of the public goto signature; spare callers the
// direct tokio-util dependency.
pub use tokio_util::sync::CancellationToken;
