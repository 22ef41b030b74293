//! Consumer Bundle
//!
//! On start, looks up the addition service, adds the configured operands and logs the
//! result. A missing service is logged as a warning; the bundle still starts.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod activator;
mod config;

pub use activator::{BUNDLE_NAME, ConsumerBundleActivator};
pub use config::ConsumerConfig;
