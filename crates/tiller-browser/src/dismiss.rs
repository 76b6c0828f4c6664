//! Opportunistic dismissal of transient overlay elements.
//!
//! Public demo sites wrap themselves in consent banners that overlay the
//! content a readiness probe needs to see, so dismissal runs after every
//! successful load and before the probe. It is strictly best-effort: a page
//! without a banner is the happy path, and a banner that vanishes between
//! detection and the click is logged and forgotten, never escalated.

use crate::driver::{ElementHandle, PageDriver};
use crate::wait::{self, WaitConfig};
use std::time::Duration;
use tracing::debug;

/// Default bounded wait for a banner to show itself.
pub const DEFAULT_DETECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Matchers for the consent/acknowledgement elements seen in the wild:
/// common button labels first, then the selectors specific cookie widgets
/// use.
pub const DEFAULT_CONSENT_MATCHERS: [&str; 6] = [
    "text=Accept",
    "text=Accept All",
    "text=OK",
    ".cookie-consent button",
    "#cookie-accept",
    "#accept-cookies",
];

/// What to look for and how long to look for it.
#[derive(Debug, Clone)]
pub struct DismissPolicy {
    /// Candidate matchers, checked in order each poll round.
    pub matchers: Vec<String>,

    /// How long to wait for any candidate to become visible.
    pub detect_timeout: Duration,
}

impl DismissPolicy {
    /// A policy with custom matchers and the default detection window.
    #[must_use]
    pub fn new(matchers: Vec<String>) -> Self {
        Self {
            matchers,
            detect_timeout: DEFAULT_DETECT_TIMEOUT,
        }
    }

    /// Shrinks (or stretches) the detection window.
    #[must_use]
    pub fn with_detect_timeout(mut self, timeout: Duration) -> Self {
        self.detect_timeout = timeout;
        self
    }

    /// A policy that never looks for anything.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            matchers: Vec::new(),
            detect_timeout: Duration::ZERO,
        }
    }
}

impl Default for DismissPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_CONSENT_MATCHERS
                .iter()
                .map(|m| (*m).to_string())
                .collect(),
        )
    }
}

/// Looks for a transient element per `policy` and invokes it at most once.
///
/// Each poll round scans the matcher list in order; the first visible
/// candidate is invoked and the scan stops, whether or not the invocation
/// landed. Nothing visible within the detection window means there was
/// nothing to dismiss.
pub async fn dismiss_transient<D>(driver: &D, policy: &DismissPolicy)
where
    D: PageDriver + ?Sized,
{
    if policy.matchers.is_empty() {
        return;
    }

    let found: Option<ElementHandle> = wait::wait_for_some(
        move || async move {
            for matcher in &policy.matchers {
                if let Some(element) = driver.find_visible(matcher, Duration::ZERO).await? {
                    return Ok(Some(element));
                }
            }
            Ok(None)
        },
        WaitConfig::with_timeout(policy.detect_timeout),
    )
    .await;

    let Some(element) = found else {
        return;
    };

    match driver.invoke(&element).await {
        Ok(()) => debug!(matcher = element.matcher(), "dismissed transient element"),
        Err(error) => debug!(
            matcher = element.matcher(),
            %error,
            "transient element found but could not be invoked"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NavError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Driver whose visible elements are a fixed matcher set.
    struct BannerDriver {
        visible: Mutex<Vec<&'static str>>,
        invoke_count: AtomicU32,
        invoke_fails: bool,
    }

    impl BannerDriver {
        fn with_visible(visible: Vec<&'static str>) -> Self {
            Self {
                visible: Mutex::new(visible),
                invoke_count: AtomicU32::new(0),
                invoke_fails: false,
            }
        }

        fn invokes(&self) -> u32 {
            self.invoke_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageDriver for BannerDriver {
        async fn load(&self, _url: &str, _timeout: Duration) -> Result<()> {
            Ok(())
        }

        async fn find_visible(
            &self,
            matcher: &str,
            _timeout: Duration,
        ) -> Result<Option<ElementHandle>> {
            let visible = self.visible.lock().unwrap();
            Ok(visible
                .iter()
                .find(|m| **m == matcher)
                .map(|m| ElementHandle::new(*m)))
        }

        async fn invoke(&self, element: &ElementHandle) -> Result<()> {
            self.invoke_count.fetch_add(1, Ordering::SeqCst);
            if self.invoke_fails {
                return Err(NavError::ScriptFailed(format!(
                    "element '{}' disappeared",
                    element.matcher()
                )));
            }
            Ok(())
        }
    }

    fn fast_policy() -> DismissPolicy {
        DismissPolicy::default().with_detect_timeout(Duration::from_millis(50))
    }

    #[tokio::test]
    async fn absent_banner_is_not_an_error() {
        let driver = BannerDriver::with_visible(vec![]);
        dismiss_transient(&driver, &fast_policy()).await;
        assert_eq!(driver.invokes(), 0);
    }

    #[tokio::test]
    async fn visible_banner_is_invoked_once() {
        let driver = BannerDriver::with_visible(vec!["text=Accept"]);
        dismiss_transient(&driver, &fast_policy()).await;
        assert_eq!(driver.invokes(), 1);
    }

    #[tokio::test]
    async fn first_matching_candidate_wins() {
        // Both a label and a selector match; only one invocation happens.
        let driver = BannerDriver::with_visible(vec!["text=Accept", "#cookie-accept"]);
        dismiss_transient(&driver, &fast_policy()).await;
        assert_eq!(driver.invokes(), 1);
    }

    #[tokio::test]
    async fn failed_invocation_is_swallowed() {
        let driver = BannerDriver {
            visible: Mutex::new(vec!["#accept-cookies"]),
            invoke_count: AtomicU32::new(0),
            invoke_fails: true,
        };
        // Must not panic or error; the failure is logged and absorbed.
        dismiss_transient(&driver, &fast_policy()).await;
        assert_eq!(driver.invokes(), 1);
    }

    #[tokio::test]
    async fn disabled_policy_skips_the_scan() {
        let driver = BannerDriver::with_visible(vec!["text=Accept"]);
        dismiss_transient(&driver, &DismissPolicy::disabled()).await;
        assert_eq!(driver.invokes(), 0);
    }

    #[tokio::test]
    async fn banner_appearing_late_is_still_caught() {
        let driver = BannerDriver::with_visible(vec![]);
        let policy = DismissPolicy::default().with_detect_timeout(Duration::from_secs(1));

        let insert = async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            driver.visible.lock().unwrap().push("text=OK");
        };

        tokio::join!(dismiss_transient(&driver, &policy), insert);
        assert_eq!(driver.invokes(), 1);
    }
}
