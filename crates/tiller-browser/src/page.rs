//! Page-level browser operations.
//!
//! [`Page`] wraps `chromiumoxide::page::Page` and is the real
//! [`PageDriver`]: loads bounded by a deadline, visibility checks for
//! matchers, single-shot invocation. On top of the driver surface it offers
//! what page objects need directly - script evaluation, URL/title accessors,
//! screenshots for failure diagnostics - and feeds every JavaScript dialog
//! into its [`DialogCapture`], accepting it so the page never wedges on a
//! modal.

use crate::dialog::{CapturedDialog, DialogCapture, DialogKind};
use crate::driver::{ElementHandle, PageDriver};
use crate::error::{NavError, Result};
use crate::wait::{self, WaitConfig};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams};
use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::page::{Page as ChromePage, ScreenshotParams};
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A browser page (tab) owned by the calling test.
///
/// Created by [`crate::browser::TestBrowser::new_page`]. The page is handed
/// to the navigation layer by reference and never retained by it.
#[derive(Debug)]
pub struct Page {
    inner: Arc<ChromePage>,
    dialogs: DialogCapture,
    _dialog_task: JoinHandle<()>,
}

impl Page {
    /// Wraps a chromiumoxide page and starts the dialog listener.
    pub(crate) fn new(page: ChromePage) -> Self {
        let dialogs = DialogCapture::new();
        let capture = dialogs.clone();
        let page_arc = Arc::new(page);

        // One task per page: record each dialog, then accept it so the
        // application can continue.
        let page_for_task = page_arc.clone();
        let dialog_task = tokio::spawn(async move {
            if let Ok(mut events) = page_for_task
                .event_listener::<EventJavascriptDialogOpening>()
                .await
            {
                while let Some(event) = events.next().await {
                    debug!(text = %event.message, "javascript dialog opened");
                    capture.push(CapturedDialog::new(
                        DialogKind::from(event.r#type.clone()),
                        event.message.clone(),
                    ));

                    if let Err(error) = page_for_task
                        .execute(HandleJavaScriptDialogParams::new(true))
                        .await
                    {
                        warn!(%error, "failed to accept javascript dialog");
                    }
                }
            }
        });

        Self {
            inner: page_arc,
            dialogs,
            _dialog_task: dialog_task,
        }
    }

    /// The dialog capture for this page.
    ///
    /// Arm a probe here immediately before any action that pops a modal.
    #[must_use]
    pub fn dialogs(&self) -> &DialogCapture {
        &self.dialogs
    }

    /// Applies an environment profile to the page.
    ///
    /// A no-op unless the profile hardens pages; hardened profiles get their
    /// user agent and extra HTTP headers installed before first navigation.
    ///
    /// # Errors
    ///
    /// Returns an error if the CDP calls fail.
    pub async fn apply_profile(&self, config: &tiller_config::EnvironmentConfig) -> Result<()> {
        if !config.harden_page {
            return Ok(());
        }

        if let Some(user_agent) = &config.user_agent {
            self.inner.set_user_agent(user_agent.as_str()).await?;
        }

        if !config.extra_headers.is_empty() {
            let headers: serde_json::Map<String, serde_json::Value> = config
                .extra_headers
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            self.inner
                .execute(SetExtraHttpHeadersParams::new(Headers::new(
                    serde_json::Value::Object(headers),
                )))
                .await?;
        }

        debug!("applied hardened page profile");
        Ok(())
    }

    /// Executes JavaScript in the page context and returns the result.
    ///
    /// Do not interpolate untrusted input into `script`; matchers passed to
    /// the driver surface are escaped, raw scripts are not.
    ///
    /// # Errors
    ///
    /// Returns an error if execution fails or the result cannot be
    /// deserialized.
    pub async fn evaluate<T>(&self, script: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let result = self
            .inner
            .evaluate(script)
            .await
            .map_err(|e| NavError::ScriptFailed(e.to_string()))?;

        result
            .into_value()
            .map_err(|e| NavError::ScriptFailed(e.to_string()))
    }

    /// Returns the current page URL.
    ///
    /// # Errors
    ///
    /// Returns an error if script execution fails.
    pub async fn url(&self) -> Result<String> {
        self.evaluate("window.location.href").await
    }

    /// Returns the page title.
    ///
    /// # Errors
    ///
    /// Returns an error if script execution fails.
    pub async fn title(&self) -> Result<String> {
        self.evaluate("document.title").await
    }

    /// Takes a full-page screenshot and returns PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if capture fails.
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        self.inner
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .map_err(NavError::ChromiumOxide)
    }

    /// Takes a full-page screenshot and writes it to `path`.
    ///
    /// This is the diagnostic capture tests perform before failing on a
    /// `Failed` navigation outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if capture or the file write fails.
    pub async fn save_screenshot(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.screenshot().await?;
        tokio::fs::write(path.as_ref(), bytes).await?;
        Ok(())
    }

    /// Single visibility check for a matcher.
    async fn matcher_visible(&self, matcher: &str) -> Result<bool> {
        let script = build_matcher_script(matcher, MatcherAction::Probe)?;
        let result = self
            .inner
            .evaluate(script.as_str())
            .await
            .map_err(|e| NavError::ScriptFailed(e.to_string()))?;

        Ok(result
            .value()
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false))
    }

    /// Closes the page.
    ///
    /// The dialog listener task is aborted first so it releases its handle;
    /// if anything else still holds one, closing falls back to the browser's
    /// own teardown.
    ///
    /// # Errors
    ///
    /// Returns an error if closing the page fails.
    pub async fn close(self) -> Result<()> {
        self._dialog_task.abort();

        match Arc::try_unwrap(self.inner) {
            Ok(page) => page.close().await.map_err(NavError::ChromiumOxide),
            Err(_still_shared) => {
                warn!("page close deferred - outstanding handle references remain");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl PageDriver for Page {
    async fn load(&self, url: &str, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;

        match tokio::time::timeout(timeout, self.inner.goto(url)).await {
            Err(_elapsed) => {
                return Err(NavError::LoadFailed {
                    url: url.to_string(),
                    reason: format!("load did not complete within {timeout:?}"),
                });
            }
            Ok(Err(e)) => {
                return Err(NavError::LoadFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
            }
            Ok(Ok(_page)) => {}
        }

        // Transport finished; spend whatever budget remains waiting for the
        // document to become interactable.
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        wait::wait_for_result(
            || {
                let page = self.inner.clone();
                async move {
                    let result = page
                        .evaluate("document.readyState")
                        .await
                        .map_err(|e| NavError::ScriptFailed(e.to_string()))?;

                    Ok(result
                        .value()
                        .and_then(|v| v.as_str())
                        .is_some_and(|s| s == "interactive" || s == "complete"))
                }
            },
            WaitConfig::with_timeout(remaining),
            "document interactable",
        )
        .await
    }

    async fn find_visible(&self, matcher: &str, timeout: Duration) -> Result<Option<ElementHandle>> {
        // Validate the matcher up front so a malformed one surfaces as an
        // error instead of being absorbed by the poll loop.
        build_matcher_script(matcher, MatcherAction::Probe)?;

        let page = self;
        Ok(wait::wait_for_some(
            move || async move {
                Ok(page
                    .matcher_visible(matcher)
                    .await?
                    .then(|| ElementHandle::new(matcher)))
            },
            WaitConfig::with_timeout(timeout),
        )
        .await)
    }

    async fn invoke(&self, element: &ElementHandle) -> Result<()> {
        let script = build_matcher_script(element.matcher(), MatcherAction::Click)?;
        let result = self
            .inner
            .evaluate(script.as_str())
            .await
            .map_err(|e| NavError::ScriptFailed(e.to_string()))?;

        let clicked = result
            .value()
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);

        if clicked {
            Ok(())
        } else {
            Err(NavError::ScriptFailed(format!(
                "element '{}' is no longer present",
                element.matcher()
            )))
        }
    }
}

/// What the generated matcher script should do with the element it finds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatcherAction {
    /// Report whether a visible match exists.
    Probe,
    /// Click the first visible match.
    Click,
}

/// Builds the in-page script for a matcher.
///
/// Matchers are either `text=Label` (trimmed text content of interactive
/// elements) or a CSS selector. Both forms are JSON-escaped before
/// interpolation, which closes off injection through backticks, quotes and
/// newlines.
fn build_matcher_script(matcher: &str, action: MatcherAction) -> Result<String> {
    if matcher.is_empty() {
        return Err(NavError::ScriptFailed("empty matcher".to_string()));
    }

    let act = match action {
        MatcherAction::Probe => "return true;",
        MatcherAction::Click => "el.click(); return true;",
    };

    let script = if let Some(label) = matcher.strip_prefix("text=") {
        let escaped = serde_json::to_string(label)
            .map_err(|e| NavError::ScriptFailed(e.to_string()))?;
        format!(
            r#"(function() {{
    const label = {escaped};
    const candidates = document.querySelectorAll('button, a, [role="button"]');
    for (const el of candidates) {{
        if (el.textContent.trim() !== label) continue;
        const rect = el.getBoundingClientRect();
        const style = window.getComputedStyle(el);
        if (rect.width > 0 && rect.height > 0 && style.visibility !== 'hidden' && style.display !== 'none') {{
            {act}
        }}
    }}
    return false;
}})()"#
        )
    } else {
        let escaped = serde_json::to_string(matcher)
            .map_err(|e| NavError::ScriptFailed(e.to_string()))?;
        format!(
            r#"(function() {{
    const el = document.querySelector({escaped});
    if (!el) return false;
    const rect = el.getBoundingClientRect();
    const style = window.getComputedStyle(el);
    if (rect.width > 0 && rect.height > 0 && style.visibility !== 'hidden' && style.display !== 'none') {{
        {act}
    }}
    return false;
}})()"#
        )
    };

    Ok(script)
}
