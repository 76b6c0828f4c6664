//! # tiller-config
//!
//! Per-environment configuration for browser test suites.
//!
//! Test suites that drive a remote web application need different tuning
//! depending on where they run: a developer laptop tolerates short timeouts
//! and benefits from small stabilisation pauses, while CI runners sit behind
//! slower networks and want hardened page settings (explicit user agent,
//! `Accept-Language`). This crate owns that decision so the rest of the
//! workspace never touches `std::env` directly.
//!
//! ## Layering
//!
//! Configuration is resolved in three layers, later layers winning:
//!
//! 1. Built-in profile defaults (`local` or `ci`, picked by CI detection)
//! 2. An optional `tiller.toml` file with profile-nested tables
//! 3. `TILLER_`-prefixed environment variables
//!
//! ## Example
//!
//! ```no_run
//! use tiller_config::EnvironmentConfig;
//!
//! let config = EnvironmentConfig::load().unwrap();
//! println!("navigating against {}", config.base_url);
//! ```

pub mod config;
pub mod environment;
pub mod error;

// Re-export main types
pub use config::{EnvironmentConfig, DEFAULT_CONFIG_FILE};
pub use environment::{Environment, CI_MARKERS};
pub use error::{ConfigError, Result};
