//! Browser lifecycle management.
//!
//! `TestBrowser` owns the Chrome process for one suite run: launch with a
//! unique profile directory, hand out pages, and make sure the process dies
//! with the test - explicitly through `close()`, or through Drop when a test
//! panics first.

use crate::error::{NavError, Result};
use crate::page::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Configuration for launching a test browser.
#[derive(Debug, Clone)]
pub struct TestBrowserConfig {
    /// Run in headless mode (default: true).
    pub headless: bool,

    /// Browser window size (default: 1280x900).
    pub window_size: (u32, u32),

    /// Additional Chrome arguments.
    pub args: Vec<String>,

    /// Chrome executable path (None = auto-detect).
    pub chrome_path: Option<String>,
}

impl TestBrowserConfig {
    /// Creates a config with defaults for headless testing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables visible mode for local debugging.
    #[must_use]
    pub fn visible(mut self) -> Self {
        self.headless = false;
        self
    }

    /// Sets a custom window size.
    #[must_use]
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    /// Adds additional Chrome arguments.
    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args.extend(args);
        self
    }

    /// Converts to a chromiumoxide `BrowserConfig`.
    #[allow(clippy::result_large_err)]
    fn to_browser_config(&self) -> Result<BrowserConfig> {
        let mut config = BrowserConfig::builder();

        if self.headless {
            config = config.arg("--headless");
        }

        config = config.arg(format!(
            "--window-size={},{}",
            self.window_size.0, self.window_size.1
        ));

        // Unique user data directory per instance; parallel suites would
        // otherwise trip Chrome's ProcessSingleton lock.
        let user_data_dir = std::env::temp_dir().join(format!("tiller-{}", uuid::Uuid::new_v4()));
        config = config.arg(format!("--user-data-dir={}", user_data_dir.display()));

        for arg in &self.args {
            config = config.arg(arg.clone());
        }

        if let Some(path) = &self.chrome_path {
            config = config.chrome_executable(path.clone());
        }

        config.build().map_err(|e| NavError::LaunchFailed {
            reason: format!("invalid browser configuration: {e}"),
            source: None,
        })
    }
}

impl Default for TestBrowserConfig {
    fn default() -> Self {
        Self {
            headless: !cfg!(feature = "visible"),
            window_size: (1280, 900),
            args: vec![
                // Sandboxing is unavailable inside most CI containers; these
                // flags are for isolated test environments only.
                "--no-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
            ],
            chrome_path: None,
        }
    }
}

/// A managed browser instance for one test suite.
///
/// # Example
///
/// ```ignore
/// let browser = TestBrowser::launch(TestBrowserConfig::default()).await?;
/// let page = browser.new_page().await?;
/// // drive the page through a Navigator...
/// browser.close().await?;
/// ```
///
/// Prefer explicit `close()` at the end of a test; Drop kills the process
/// but cannot await a graceful shutdown.
pub struct TestBrowser {
    inner: Arc<Mutex<Option<Browser>>>,
}

impl TestBrowser {
    /// Launches a browser with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::LaunchFailed`] if Chrome is missing, not
    /// executable, or refuses to start.
    pub async fn launch(config: TestBrowserConfig) -> Result<Self> {
        debug!(?config, "launching browser");

        let browser_config = config.to_browser_config()?;

        let (browser, mut handler) =
            Browser::launch(browser_config)
                .await
                .map_err(|e| NavError::LaunchFailed {
                    reason: "failed to launch Chrome process".to_string(),
                    source: Some(Box::new(e)),
                })?;

        // chromiumoxide requires its handler stream to be driven for any
        // CDP traffic to flow.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("browser handler error: {e}");
                }
            }
        });

        debug!("browser launched");

        Ok(Self {
            inner: Arc::new(Mutex::new(Some(browser))),
        })
    }

    /// Creates a new page (tab) with its dialog listener attached.
    ///
    /// # Errors
    ///
    /// Returns [`NavError::AlreadyClosed`] if the browser has been closed.
    pub async fn new_page(&self) -> Result<Page> {
        let browser = self.inner.lock().await;
        let browser = browser.as_ref().ok_or(NavError::AlreadyClosed)?;

        let chrome_page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| NavError::ConnectionFailed(e.to_string()))?;

        Ok(Page::new(chrome_page))
    }

    /// Closes the browser and kills the Chrome process.
    ///
    /// # Errors
    ///
    /// Returns an error if graceful shutdown fails.
    pub async fn close(self) -> Result<()> {
        let mut guard = self.inner.lock().await;

        if let Some(mut browser) = guard.take() {
            debug!("closing browser");
            browser
                .close()
                .await
                .map_err(|e| NavError::ConnectionFailed(e.to_string()))?;
        }

        Ok(())
    }

    /// Returns true if the browser has been closed.
    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.is_none()
    }
}

impl Drop for TestBrowser {
    fn drop(&mut self) {
        // Drop cannot await; chromiumoxide's own Drop kills the Chrome
        // process when the inner Browser goes away un-closed.
        if let Ok(guard) = self.inner.try_lock() {
            if guard.is_some() {
                warn!("TestBrowser dropped without explicit close() - forcing shutdown via Drop");
            }
        }
    }
}
