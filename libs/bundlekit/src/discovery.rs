//! Link-time bundle discovery.
//!
//! Bundle crates announce themselves with [`bundle!`](crate::bundle); the host binary only
//! has to link them (`use my_bundle as _;`) and call [`discovered_bundles`].

use crate::contracts::BundleActivator;

/// Static description of a bundle collected through `inventory`.
pub struct BundleDescriptor {
    pub name: &'static str,
    /// Lower levels start first and stop last.
    pub run_level: u32,
    pub factory: fn() -> Box<dyn BundleActivator>,
}

impl BundleDescriptor {
    #[must_use]
    pub const fn new(
        name: &'static str,
        run_level: u32,
        factory: fn() -> Box<dyn BundleActivator>,
    ) -> Self {
        Self {
            name,
            run_level,
            factory,
        }
    }

    #[must_use]
    pub fn create(&self) -> Box<dyn BundleActivator> {
        (self.factory)()
    }
}

impl std::fmt::Debug for BundleDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleDescriptor")
            .field("name", &self.name)
            .field("run_level", &self.run_level)
            .finish_non_exhaustive()
    }
}

inventory::collect!(BundleDescriptor);

/// Every bundle linked into the binary, ordered by `(run_level, name)`.
#[must_use]
pub fn discovered_bundles() -> Vec<&'static BundleDescriptor> {
    let mut all: Vec<&'static BundleDescriptor> =
        inventory::iter::<BundleDescriptor>.into_iter().collect();
    all.sort_by(|a, b| (a.run_level, a.name).cmp(&(b.run_level, b.name)));
    all
}

/// Announce a bundle for link-time discovery.
///
/// ```ignore
/// bundlekit::bundle!(
///     name = "simple-bundle",
///     run_level = 30,
///     activator = SimpleBundleActivator::default,
/// );
/// ```
#[macro_export]
macro_rules! bundle {
    (name = $name:expr, run_level = $level:expr, activator = $ctor:expr $(,)?) => {
        $crate::inventory::submit! {
            $crate::discovery::BundleDescriptor::new($name, $level, || {
                ::std::boxed::Box::new(($ctor)())
            })
        }
    };
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::context::BundleContext;

    struct Noop;

    impl BundleActivator for Noop {
        fn start(&self, _ctx: &BundleContext) -> anyhow::Result<()> {
            Ok(())
        }

        fn stop(&self, _ctx: &BundleContext) -> anyhow::Result<()> {
            Ok(())
        }
    }

    crate::bundle!(name = "zz-discovery-test", run_level = 7, activator = || Noop);
    crate::bundle!(name = "aa-discovery-test", run_level = 7, activator = || Noop);
    crate::bundle!(name = "early-discovery-test", run_level = 1, activator = || Noop);

    #[test]
    fn discovered_bundles_are_ordered_by_level_then_name() {
        let names: Vec<&str> = discovered_bundles()
            .into_iter()
            .map(|d| d.name)
            .filter(|n| n.ends_with("-discovery-test"))
            .collect();

        assert_eq!(
            names,
            vec![
                "early-discovery-test",
                "aa-discovery-test",
                "zz-discovery-test"
            ]
        );
    }

    #[test]
    fn descriptor_creates_fresh_activators() {
        let descriptor = discovered_bundles()
            .into_iter()
            .find(|d| d.name == "early-discovery-test")
            .expect("registered above");
        let _first = descriptor.create();
        let _second = descriptor.create();
        assert_eq!(descriptor.run_level, 1);
    }
}
