//! Environment configuration profiles and layered loading.
//!
//! Two profiles are built in. `local` is tuned for a developer machine:
//! shorter per-attempt timeout, a small settle pause after successful
//! navigation (the demo sites these suites target repaint late), no page
//! hardening. `ci` assumes a slower network and a bare runner image: longer
//! timeout, no settle pause (CI waits are already explicit), and hardened
//! page settings so the remote application sees a normal desktop browser.
//!
//! Values can be overridden per profile from a `tiller.toml` file and
//! globally from `TILLER_`-prefixed environment variables.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::environment::Environment;
use crate::error::{ConfigError, Result};

/// Conventional name of the override file, resolved against the working
/// directory of the test process.
pub const DEFAULT_CONFIG_FILE: &str = "tiller.toml";

/// Prefix for environment variable overrides (`TILLER_BASE_URL`, ...).
const ENV_PREFIX: &str = "TILLER_";

/// The application under test. Suites navigate relative to this URL; the
/// trailing `#` keeps fragment routing intact when paths are appended.
const DEFAULT_BASE_URL: &str = "https://www.globalsqa.com/angularJs-protractor/BankingProject/#";

/// Desktop Chrome user agent applied when a profile hardens its pages.
const HARDENED_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Resolved configuration for one execution environment.
///
/// The navigation layer consumes these values only as *defaults* for fields
/// the caller leaves unset on a navigation request; nothing in this struct is
/// read back at attempt time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Base URL that relative navigation targets are appended to.
    pub base_url: String,

    /// Upper bound for a single load-plus-readiness attempt, in milliseconds.
    pub attempt_timeout_ms: u64,

    /// Total attempt budget for one navigation call. Must be at least 1.
    pub max_attempts: u32,

    /// Constant delay between failed attempts, in milliseconds.
    pub retry_delay_ms: u64,

    /// Pause after a successful attempt before handing the page back, in
    /// milliseconds. Zero disables the pause.
    pub settle_delay_ms: u64,

    /// Whether pages should be hardened (user agent + extra headers) before
    /// first navigation.
    pub harden_page: bool,

    /// Extra HTTP headers applied when `harden_page` is set.
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,

    /// User agent override applied when `harden_page` is set.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl EnvironmentConfig {
    /// Built-in profile for a developer machine.
    #[must_use]
    pub fn local() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            attempt_timeout_ms: 30_000,
            max_attempts: 3,
            retry_delay_ms: 1_000,
            settle_delay_ms: 500,
            harden_page: false,
            extra_headers: BTreeMap::new(),
            user_agent: None,
        }
    }

    /// Built-in profile for CI runners.
    #[must_use]
    pub fn ci() -> Self {
        let mut extra_headers = BTreeMap::new();
        extra_headers.insert("Accept-Language".to_string(), "en-US,en;q=0.9".to_string());

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            attempt_timeout_ms: 45_000,
            max_attempts: 3,
            retry_delay_ms: 1_000,
            settle_delay_ms: 0,
            harden_page: true,
            extra_headers,
            user_agent: Some(HARDENED_USER_AGENT.to_string()),
        }
    }

    /// The built-in profile for an environment, with no file or env overrides.
    #[must_use]
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Local => Self::local(),
            Environment::Ci => Self::ci(),
        }
    }

    /// Loads the configuration for the detected environment.
    ///
    /// Layering: built-in profile defaults, then the matching profile table
    /// of `tiller.toml` (if present), then `TILLER_`-prefixed environment
    /// variables, which win over everything.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Extraction`] for unparseable overrides and
    /// [`ConfigError::InvalidValue`] for values the navigation layer would
    /// reject.
    pub fn load() -> Result<Self> {
        Self::load_for(Environment::detect(), Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Loads the configuration for an explicit environment and override file.
    pub fn load_for(environment: Environment, file: &Path) -> Result<Self> {
        let config: Self = Self::figment(environment, file).extract()?;
        config.validate()?;
        debug!(
            profile = environment.profile_name(),
            attempt_timeout_ms = config.attempt_timeout_ms,
            max_attempts = config.max_attempts,
            "resolved environment configuration"
        );
        Ok(config)
    }

    fn figment(environment: Environment, file: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::for_environment(environment)))
            .merge(Toml::file(file).nested())
            .merge(Env::prefixed(ENV_PREFIX).global())
            .select(environment.profile_name())
    }

    /// Checks the invariants the navigation layer depends on.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "base_url".to_string(),
                hint: "a non-empty absolute URL".to_string(),
            });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_attempts".to_string(),
                hint: "an attempt budget of at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Per-attempt timeout as a [`Duration`].
    #[must_use]
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    /// Inter-attempt delay as a [`Duration`].
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Post-success settle pause, or `None` when disabled.
    #[must_use]
    pub fn settle_delay(&self) -> Option<Duration> {
        (self.settle_delay_ms > 0).then(|| Duration::from_millis(self.settle_delay_ms))
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self::local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_profile_values() {
        let config = EnvironmentConfig::local();
        assert_eq!(config.attempt_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_delay(), Duration::from_secs(1));
        assert_eq!(config.settle_delay(), Some(Duration::from_millis(500)));
        assert!(!config.harden_page);
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn ci_profile_values() {
        let config = EnvironmentConfig::ci();
        assert_eq!(config.attempt_timeout(), Duration::from_secs(45));
        assert_eq!(config.settle_delay(), None);
        assert!(config.harden_page);
        assert_eq!(
            config.extra_headers.get("Accept-Language").map(String::as_str),
            Some("en-US,en;q=0.9")
        );
        assert!(
            config
                .user_agent
                .as_deref()
                .is_some_and(|ua| ua.contains("Chrome"))
        );
    }

    #[test]
    fn validation_rejects_zero_attempts() {
        let config = EnvironmentConfig {
            max_attempts: 0,
            ..EnvironmentConfig::local()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "max_attempts"
        ));
    }

    #[test]
    fn validation_rejects_empty_base_url() {
        let config = EnvironmentConfig {
            base_url: String::new(),
            ..EnvironmentConfig::local()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_file_overrides_profile_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                [local]
                base_url = "http://localhost:4200/#"
                retry_delay_ms = 250

                [ci]
                attempt_timeout_ms = 90000
                "#,
            )?;

            let local =
                EnvironmentConfig::load_for(Environment::Local, Path::new(DEFAULT_CONFIG_FILE))
                    .expect("local profile should load");
            assert_eq!(local.base_url, "http://localhost:4200/#");
            assert_eq!(local.retry_delay(), Duration::from_millis(250));
            // untouched fields keep their profile defaults
            assert_eq!(local.attempt_timeout_ms, 30_000);

            let ci = EnvironmentConfig::load_for(Environment::Ci, Path::new(DEFAULT_CONFIG_FILE))
                .expect("ci profile should load");
            assert_eq!(ci.attempt_timeout_ms, 90_000);
            assert!(ci.harden_page);
            Ok(())
        });
    }

    #[test]
    fn env_vars_win_over_file_and_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_FILE, "[local]\nmax_attempts = 5\n")?;
            jail.set_env("TILLER_MAX_ATTEMPTS", "7");

            let config =
                EnvironmentConfig::load_for(Environment::Local, Path::new(DEFAULT_CONFIG_FILE))
                    .expect("config should load");
            assert_eq!(config.max_attempts, 7);
            Ok(())
        });
    }

    #[test]
    fn missing_file_falls_back_to_profile() {
        figment::Jail::expect_with(|jail| {
            // No override file and no TILLER_ vars set in this jail.
            let _ = jail;
            let config =
                EnvironmentConfig::load_for(Environment::Local, Path::new("absent.toml"))
                    .expect("missing override file is not an error");
            assert_eq!(config, EnvironmentConfig::local());
            Ok(())
        });
    }

    #[test]
    fn invalid_override_is_rejected() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_FILE, "[local]\nmax_attempts = 0\n")?;
            let result =
                EnvironmentConfig::load_for(Environment::Local, Path::new(DEFAULT_CONFIG_FILE));
            assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
            Ok(())
        });
    }
}
