//! Addition Bundle
//!
//! A provider bundle: on start it registers [`AdditionServiceImpl`] under
//! [`addition_sdk::SERVICE_NAME`] as `dyn AdditionService`, on stop it unregisters it.
//! Consumers depend on `addition-sdk` only.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod activator;
mod service;

pub use activator::{BUNDLE_NAME, ServiceBundleActivator};
pub use service::AdditionServiceImpl;
