//! Execution environment detection.
//!
//! Mirrors the CI detection most test runners perform internally: a small
//! fixed set of well-known environment variables, any of which (set and
//! non-empty) marks the run as automated.

/// Environment variables that mark a run as CI.
///
/// The set matches what mainstream runners export: generic `CI` plus the
/// provider-specific markers for GitHub Actions, GitLab CI, Buildkite and
/// CircleCI.
pub const CI_MARKERS: [&str; 5] = [
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "BUILDKITE",
    "CIRCLECI",
];

/// Where the test run is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    /// A developer machine.
    Local,
    /// An automated CI runner.
    Ci,
}

impl Environment {
    /// Detects the current environment from the process environment.
    #[must_use]
    pub fn detect() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Detection against an arbitrary variable lookup.
    ///
    /// Split out from [`Environment::detect`] so tests can exercise the
    /// marker logic without mutating process state.
    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let automated = CI_MARKERS
            .iter()
            .any(|marker| lookup(marker).is_some_and(|value| !value.is_empty()));

        if automated { Self::Ci } else { Self::Local }
    }

    /// Returns true when running under CI.
    #[must_use]
    pub fn is_ci(self) -> bool {
        matches!(self, Self::Ci)
    }

    /// The configuration profile name for this environment.
    #[must_use]
    pub fn profile_name(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Ci => "ci",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.profile_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |key| map.get(key).map(|v| (*v).to_string())
    }

    #[test]
    fn no_markers_means_local() {
        let env = Environment::from_lookup(lookup_from(&[("PATH", "/usr/bin")]));
        assert_eq!(env, Environment::Local);
        assert!(!env.is_ci());
    }

    #[test]
    fn any_marker_means_ci() {
        for marker in CI_MARKERS {
            let vars = [(marker, "true")];
            let env = Environment::from_lookup(lookup_from(&vars));
            assert_eq!(env, Environment::Ci, "marker {marker} should flag CI");
        }
    }

    #[test]
    fn empty_marker_is_ignored() {
        let env = Environment::from_lookup(lookup_from(&[("CI", "")]));
        assert_eq!(env, Environment::Local);
    }

    #[test]
    fn profile_names() {
        assert_eq!(Environment::Local.profile_name(), "local");
        assert_eq!(Environment::Ci.profile_name(), "ci");
        assert_eq!(Environment::Ci.to_string(), "ci");
    }
}
