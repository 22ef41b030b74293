//! Passive bundle: logs on start and stop, never touches the registry.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use bundlekit::{BundleActivator, BundleContext};

pub const BUNDLE_NAME: &str = "simple";

#[derive(Debug, Default)]
pub struct SimpleBundleActivator;

bundlekit::bundle!(
    name = BUNDLE_NAME,
    run_level = 30,
    activator = SimpleBundleActivator::default,
);

impl BundleActivator for SimpleBundleActivator {
    fn start(&self, ctx: &BundleContext) -> anyhow::Result<()> {
        ctx.logger().info("This is going well!");
        Ok(())
    }

    fn stop(&self, ctx: &BundleContext) -> anyhow::Result<()> {
        ctx.logger().info("Goodbye!");
        Ok(())
    }
}
