use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::config::{ConfigError, ConfigProvider, bundle_config_or_default, bundle_config_required};
use crate::logging::{BundleLogger, LogSink};
use crate::registry::ServiceRegistry;

/// Bundle execution context - what a bundle sees of its host.
///
/// Passed to [`crate::BundleActivator::start`] and [`crate::BundleActivator::stop`].
/// It gives access to:
/// - **Service registry**: the one registry shared by every bundle of the host
/// - **Logger**: leveled messages tagged with this bundle's name
/// - **Configuration**: the `config` part of `bundles.<name>`
///
/// The host owns the context; bundles should not keep it beyond `stop`.
///
/// ```ignore
/// fn start(&self, ctx: &BundleContext) -> anyhow::Result<()> {
///     let cfg: MyConfig = ctx.config()?;
///     let service = Arc::new(MyService::new(cfg));
///     ctx.registry()
///         .register::<dyn MyApi>("com.example.my", service, Properties::new())?;
///     ctx.logger().info("registered");
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct BundleContext {
    bundle_name: Arc<str>,
    registry: Arc<ServiceRegistry>,
    logger: BundleLogger,
    config_provider: Arc<dyn ConfigProvider>,
}

impl BundleContext {
    pub fn new(
        bundle_name: impl Into<Arc<str>>,
        registry: Arc<ServiceRegistry>,
        log_sink: Arc<dyn LogSink>,
        config_provider: Arc<dyn ConfigProvider>,
    ) -> Self {
        let bundle_name = bundle_name.into();
        Self {
            logger: BundleLogger::new(bundle_name.clone(), log_sink),
            bundle_name,
            registry,
            config_provider,
        }
    }

    #[inline]
    #[must_use]
    pub fn bundle_name(&self) -> &str {
        &self.bundle_name
    }

    /// The registry shared by all bundles of this host.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Owned handle to the registry, for services that need to look things up later.
    #[must_use]
    pub fn registry_arc(&self) -> Arc<ServiceRegistry> {
        Arc::clone(&self.registry)
    }

    #[inline]
    #[must_use]
    pub fn logger(&self) -> &BundleLogger {
        &self.logger
    }

    /// Deserialize the bundle's config section into `T`, or use defaults if missing.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidConfig` if a config section exists but does not match `T`.
    pub fn config<T: DeserializeOwned + Default>(&self) -> Result<T, ConfigError> {
        bundle_config_or_default(self.config_provider.as_ref(), &self.bundle_name)
    }

    /// Like [`BundleContext::config`], but a missing section is an error.
    ///
    /// # Errors
    /// Returns `ConfigError` if the section is missing, malformed, or does not match `T`.
    pub fn config_required<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        bundle_config_required(self.config_provider.as_ref(), &self.bundle_name)
    }
}

impl std::fmt::Debug for BundleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleContext")
            .field("bundle_name", &self.bundle_name)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
