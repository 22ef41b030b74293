use crate::context::BundleContext;

/// Entry points a host calls on a bundle.
///
/// The host invokes `start` and `stop` sequentially for a given bundle, but different
/// bundles may be started or stopped concurrently from different threads.
///
/// - `start` is the only place a bundle registers or looks up services.
/// - `stop` is the only place a provider unregisters what it owns.
///
/// Returning an error marks only this bundle as failed; the host logs it and moves on.
pub trait BundleActivator: Send + Sync + 'static {
    /// # Errors
    /// Any error aborts activation of this bundle; it stays inactive.
    fn start(&self, ctx: &BundleContext) -> anyhow::Result<()>;

    /// # Errors
    /// The host logs the error; the bundle still ends up inactive.
    fn stop(&self, ctx: &BundleContext) -> anyhow::Result<()>;
}
