//! Retrying navigation with readiness detection.
//!
//! Public demo applications fail to load in more ways than a transport error:
//! the request can succeed while the served page is degraded, half-rendered,
//! or hidden behind an overlay. A single navigation here is therefore
//! load-then-probe: drive the page to the target, opportunistically dismiss
//! transient overlays, then ask a caller-supplied readiness probe whether the
//! page is actually usable. Either failure mode consumes one attempt from a
//! fixed budget, with a constant delay between attempts.
//!
//! The delay is deliberately constant rather than exponential; the flakiness
//! being absorbed is a slow third-party host, not contention.

use crate::dismiss::{self, DismissPolicy};
use crate::driver::PageDriver;
use crate::error::{NavError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Default attempt budget for one navigation call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default upper bound for a single load-plus-probe attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default constant delay between failed attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// One navigation order: where to go and how hard to try.
///
/// Immutable once built. Defaults come either from the hard-coded constants
/// ([`NavigationRequest::to`]) or from an environment profile
/// ([`NavigationRequest::from_config`]); individual fields can then be
/// overridden builder-style.
#[derive(Debug, Clone)]
pub struct NavigationRequest {
    /// Absolute URL to drive the page to.
    pub target: String,

    /// Total attempt budget. Must be at least 1.
    pub max_attempts: u32,

    /// Upper bound for a single load attempt.
    pub per_attempt_timeout: Duration,

    /// Constant delay between failed attempts.
    pub retry_delay: Duration,

    /// Optional pause after the page is ready, before returning.
    pub settle_delay: Option<Duration>,
}

impl NavigationRequest {
    /// A request for an absolute target with hard-coded defaults.
    #[must_use]
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            per_attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            retry_delay: DEFAULT_RETRY_DELAY,
            settle_delay: None,
        }
    }

    /// A request seeded from an environment profile.
    ///
    /// `path` is appended verbatim to the profile's base URL unless it is
    /// itself absolute. Verbatim appending is load-bearing: fragment-routed
    /// applications use bases ending in `#`, which URL-join semantics would
    /// destroy.
    #[must_use]
    pub fn from_config(config: &tiller_config::EnvironmentConfig, path: &str) -> Self {
        let target = if path.contains("://") {
            path.to_string()
        } else {
            format!("{}{}", config.base_url, path)
        };

        Self {
            target,
            max_attempts: config.max_attempts,
            per_attempt_timeout: config.attempt_timeout(),
            retry_delay: config.retry_delay(),
            settle_delay: config.settle_delay(),
        }
    }

    /// Overrides the attempt budget.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Overrides the per-attempt timeout.
    #[must_use]
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.per_attempt_timeout = timeout;
        self
    }

    /// Overrides the inter-attempt delay.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Overrides (or disables, with `None`) the post-success settle pause.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Option<Duration>) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Rejects requests the retry loop must not even start on.
    fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(NavError::InvalidRequest(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        Url::parse(&self.target).map_err(|e| {
            NavError::InvalidRequest(format!(
                "target '{}' is not an absolute URL: {e}",
                self.target
            ))
        })?;

        Ok(())
    }
}

/// Why the final attempt of a failed navigation did not produce a usable page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The load itself did not complete (network error, abort, timeout).
    Transport(String),

    /// The load completed but the readiness probe reported an unusable page.
    NotReady,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(reason) => write!(f, "transport failure: {reason}"),
            Self::NotReady => f.write_str("page loaded but never became ready"),
        }
    }
}

/// The result of one navigation call.
///
/// Ordinary navigation failure is a value, not an error: tests decide what a
/// `Failed` page is worth (usually a hard failure plus a screenshot), the
/// controller only reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Some attempt loaded the page and the readiness probe confirmed it.
    Ready {
        /// 1-based index of the attempt that succeeded.
        attempts: u32,
    },

    /// Every attempt in the budget failed.
    Failed {
        /// Number of attempts performed (always the full budget).
        attempts: u32,
        /// The failure mode of the final attempt.
        last_failure: FailureKind,
    },
}

impl NavigationOutcome {
    /// True when the navigation produced a usable page.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// How many attempts were performed.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Ready { attempts } | Self::Failed { attempts, .. } => *attempts,
        }
    }
}

/// Drives a page to a target location until a readiness probe is satisfied.
///
/// The navigator holds only its dismissal policy; every [`Navigator::goto`]
/// call is independent, carries its own request, and releases the driver when
/// it returns. Concurrent calls against the same driver are not supported.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    dismiss: DismissPolicy,
}

impl Navigator {
    /// A navigator with the default consent-dismissal policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A navigator with a custom dismissal policy.
    ///
    /// Use [`DismissPolicy::disabled`] for pages known to be overlay-free;
    /// it removes the banner-detection window from every attempt.
    #[must_use]
    pub fn with_dismiss_policy(dismiss: DismissPolicy) -> Self {
        Self { dismiss }
    }

    /// Drives `driver` to the request's target until `probe` reports a usable
    /// page or the attempt budget runs out.
    ///
    /// Per attempt: load (bounded by the per-attempt timeout), best-effort
    /// transient-UI dismissal, then the probe. A transport failure or a
    /// `false` probe burns the attempt; remaining budget triggers a constant
    /// delay and a full retry. The probe must not panic; probes are expected
    /// to swallow their own errors and answer `false`.
    ///
    /// # Errors
    ///
    /// Only two conditions escalate: [`NavError::InvalidRequest`] (checked
    /// before any load) and [`NavError::Cancelled`] when `cancel` fires
    /// during any suspension point. Exhausting the budget is the
    /// `Ok(NavigationOutcome::Failed { .. })` value, never an `Err`.
    pub async fn goto<D, P, Fut>(
        &self,
        driver: &D,
        request: &NavigationRequest,
        probe: P,
        cancel: &CancellationToken,
    ) -> Result<NavigationOutcome>
    where
        D: PageDriver + ?Sized,
        P: Fn() -> Fut,
        Fut: Future<Output = bool>,
    {
        request.validate()?;

        let mut last_failure = FailureKind::NotReady;

        for attempt in 1..=request.max_attempts {
            if cancel.is_cancelled() {
                return Err(NavError::Cancelled);
            }

            debug!(
                url = %request.target,
                attempt,
                budget = request.max_attempts,
                "starting navigation attempt"
            );

            let load = tokio::select! {
                () = cancel.cancelled() => return Err(NavError::Cancelled),
                result = driver.load(&request.target, request.per_attempt_timeout) => result,
            };

            match load {
                Err(NavError::Cancelled) => return Err(NavError::Cancelled),
                Err(error) => {
                    warn!(attempt, %error, "navigation transport failure");
                    last_failure = FailureKind::Transport(error.to_string());
                }
                Ok(()) => {
                    tokio::select! {
                        () = cancel.cancelled() => return Err(NavError::Cancelled),
                        () = dismiss::dismiss_transient(driver, &self.dismiss) => {}
                    }

                    let ready = tokio::select! {
                        () = cancel.cancelled() => return Err(NavError::Cancelled),
                        ready = probe() => ready,
                    };

                    if ready {
                        if let Some(settle) = request.settle_delay {
                            tokio::select! {
                                () = cancel.cancelled() => return Err(NavError::Cancelled),
                                () = sleep(settle) => {}
                            }
                        }
                        debug!(attempt, url = %request.target, "navigation ready");
                        return Ok(NavigationOutcome::Ready { attempts: attempt });
                    }

                    warn!(attempt, "page loaded but readiness probe reported not ready");
                    last_failure = FailureKind::NotReady;
                }
            }

            if attempt < request.max_attempts {
                debug!(
                    remaining = request.max_attempts - attempt,
                    delay = ?request.retry_delay,
                    "waiting before retry"
                );
                tokio::select! {
                    () = cancel.cancelled() => return Err(NavError::Cancelled),
                    () = sleep(request.retry_delay) => {}
                }
            }
        }

        Ok(NavigationOutcome::Failed {
            attempts: request.max_attempts,
            last_failure,
        })
    }
}
