use std::sync::Arc;

use addition_sdk::{AdditionService, SERVICE_NAME};
use bundlekit::{BundleActivator, BundleContext, Properties, ServiceRegistration};
use parking_lot::Mutex;

use crate::service::AdditionServiceImpl;

pub const BUNDLE_NAME: &str = "addition";

/// Registers the addition service while the bundle is active.
#[derive(Debug, Default)]
pub struct ServiceBundleActivator {
    registration: Mutex<Option<ServiceRegistration>>,
}

bundlekit::bundle!(
    name = BUNDLE_NAME,
    run_level = 10,
    activator = ServiceBundleActivator::default,
);

impl BundleActivator for ServiceBundleActivator {
    fn start(&self, ctx: &BundleContext) -> anyhow::Result<()> {
        let properties = Properties::new()
            .with("vendor", "example")
            .with("operation", "add");

        let registration = ctx.registry().register::<dyn AdditionService>(
            SERVICE_NAME,
            Arc::new(AdditionServiceImpl),
            properties,
        )?;

        ctx.logger()
            .info(&format!("registered {SERVICE_NAME} (id {})", registration.id()));
        *self.registration.lock() = Some(registration);
        Ok(())
    }

    fn stop(&self, ctx: &BundleContext) -> anyhow::Result<()> {
        let Some(registration) = self.registration.lock().take() else {
            return Ok(());
        };
        registration.unregister()?;
        ctx.logger().info(&format!("unregistered {SERVICE_NAME}"));
        Ok(())
    }
}
