//! Bootstrap library for `BundleKit` hosts
//!
//! ## Modules
//!
//! - [`config`]: layered application configuration (defaults, YAML, environment, CLI)
//! - [`logging`]: `tracing-subscriber` setup driven by [`LoggingConfig`]
//! - [`host`]: building a [`bundlekit::BundleHost`], the run loop and signal handling

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod host;
pub mod logging;

pub use config::{AppConfig, CliArgs, ENV_PREFIX, LogFormat, LoggingConfig};
pub use host::{build_host, run_once, run_until_cancelled, shutdown_token, wait_for_shutdown};
pub use logging::init_logging;
