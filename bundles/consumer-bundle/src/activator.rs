use addition_sdk::{AdditionService, SERVICE_NAME};
use anyhow::Context;
use bundlekit::{BundleActivator, BundleContext};
use tracing::debug;

use crate::config::ConsumerConfig;

pub const BUNDLE_NAME: &str = "consumer";

#[derive(Debug, Default)]
pub struct ConsumerBundleActivator;

bundlekit::bundle!(
    name = BUNDLE_NAME,
    run_level = 20,
    activator = ConsumerBundleActivator::default,
);

impl BundleActivator for ConsumerBundleActivator {
    fn start(&self, ctx: &BundleContext) -> anyhow::Result<()> {
        let ConsumerConfig { a, b } = ctx.config()?;

        let Some(service) = ctx.registry().find_by_name(SERVICE_NAME) else {
            ctx.logger()
                .warn(&format!("{SERVICE_NAME} is not available, skipping addition"));
            return Ok(());
        };

        let adder = service.casted_instance::<dyn AdditionService>()?;
        debug!(a, b, service = %service.id(), "calling addition service");
        let sum = adder
            .add(a, b)
            .with_context(|| format!("{SERVICE_NAME} failed"))?;

        ctx.logger().info(&format!("{a} + {b} = {sum}"));
        Ok(())
    }

    fn stop(&self, ctx: &BundleContext) -> anyhow::Result<()> {
        ctx.logger().debug("stopped");
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use bundlekit::testing::RecordingLogSink;
    use bundlekit::{ConfigProvider, EmptyConfigProvider, LogLevel, Properties, ServiceRegistry};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn context(
        registry: &Arc<ServiceRegistry>,
        sink: &Arc<RecordingLogSink>,
        config: Arc<dyn ConfigProvider>,
    ) -> BundleContext {
        BundleContext::new(BUNDLE_NAME, registry.clone(), sink.clone(), config)
    }

    struct Doubling;

    impl AdditionService for Doubling {
        fn add(&self, a: i64, b: i64) -> Result<i64, addition_sdk::AdditionError> {
            Ok(2 * (a + b))
        }
    }

    #[test]
    fn missing_service_logs_warning_and_starts() {
        let registry = Arc::new(ServiceRegistry::new());
        let sink = Arc::new(RecordingLogSink::new());
        let ctx = context(&registry, &sink, Arc::new(EmptyConfigProvider));

        ConsumerBundleActivator.start(&ctx).unwrap();

        assert!(sink.contains(BUNDLE_NAME, LogLevel::Warn, "not available"));
        assert!(sink.messages(BUNDLE_NAME, LogLevel::Info).is_empty());
    }

    #[test]
    fn uses_whatever_implementation_is_registered() {
        let registry = Arc::new(ServiceRegistry::new());
        let sink = Arc::new(RecordingLogSink::new());
        registry
            .register::<dyn AdditionService>(SERVICE_NAME, Arc::new(Doubling), Properties::new())
            .unwrap();

        ConsumerBundleActivator
            .start(&context(&registry, &sink, Arc::new(EmptyConfigProvider)))
            .unwrap();

        assert_eq!(sink.messages(BUNDLE_NAME, LogLevel::Info), vec!["3 + 4 = 14"]);
    }

    #[test]
    fn operands_come_from_config() {
        let registry = Arc::new(ServiceRegistry::new());
        let sink = Arc::new(RecordingLogSink::new());
        registry
            .register::<dyn AdditionService>(SERVICE_NAME, Arc::new(Doubling), Properties::new())
            .unwrap();
        let mut bundles = HashMap::new();
        bundles.insert(
            BUNDLE_NAME.to_owned(),
            serde_json::json!({ "config": { "a": 10, "b": 5 } }),
        );

        ConsumerBundleActivator
            .start(&context(&registry, &sink, Arc::new(bundles)))
            .unwrap();

        assert_eq!(sink.messages(BUNDLE_NAME, LogLevel::Info), vec!["10 + 5 = 30"]);
    }

    #[test]
    fn wrong_registered_type_fails_start() {
        let registry = Arc::new(ServiceRegistry::new());
        let sink = Arc::new(RecordingLogSink::new());
        registry
            .register::<String>(
                SERVICE_NAME,
                Arc::new("not an adder".to_owned()),
                Properties::new(),
            )
            .unwrap();

        let err = ConsumerBundleActivator
            .start(&context(&registry, &sink, Arc::new(EmptyConfigProvider)))
            .unwrap_err();
        assert!(err.to_string().contains("is registered as"));
    }
}
