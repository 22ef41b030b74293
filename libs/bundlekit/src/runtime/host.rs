//! Bundle host - owns installed bundles and drives their lifecycle.
//!
//! Per bundle: `Inactive -> Starting -> Active -> Stopping -> Inactive`.
//! A failed `start` puts the bundle back to `Inactive`; a failed `stop` still ends
//! there. Failures are contained to the bundle that produced them.
//!
//! Locks are never held while an activator runs, so bundles are free to call back
//! into the registry (or even into the host) from `start` and `stop`.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{ConfigProvider, bundle_settings};
use crate::context::BundleContext;
use crate::contracts::BundleActivator;
use crate::discovery::discovered_bundles;
use crate::error::HostError;
use crate::lifecycle::BundleState;
use crate::logging::LogSink;
use crate::registry::ServiceRegistry;

struct BundleEntry {
    name: Arc<str>,
    run_level: u32,
    activator: Box<dyn BundleActivator>,
    state: Mutex<BundleState>,
    ctx: BundleContext,
}

impl BundleEntry {
    fn state(&self) -> BundleState {
        *self.state.lock()
    }

    /// Move to `next`, but only from `expected`.
    fn begin(
        &self,
        expected: BundleState,
        next: BundleState,
        action: &'static str,
    ) -> Result<(), HostError> {
        let mut state = self.state.lock();
        if *state != expected || !state.can_transition_to(next) {
            return Err(HostError::InvalidState {
                bundle: self.name.to_string(),
                action,
                state: *state,
            });
        }
        *state = next;
        Ok(())
    }

    fn finish(&self, next: BundleState) {
        *self.state.lock() = next;
    }
}

/// Snapshot of one installed bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleStatus {
    pub name: String,
    pub run_level: u32,
    pub state: BundleState,
}

/// Outcome of [`BundleHost::start_all`].
#[derive(Debug, Default)]
pub struct StartReport {
    pub started: Vec<String>,
    pub failed: Vec<(String, HostError)>,
}

impl StartReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// `BundleHost` owns the bundles of one process and the registry they share.
pub struct BundleHost {
    instance_id: Uuid,
    registry: Arc<ServiceRegistry>,
    config: Arc<dyn ConfigProvider>,
    sink: Arc<dyn LogSink>,
    bundles: RwLock<Vec<Arc<BundleEntry>>>,
}

impl BundleHost {
    #[must_use]
    pub fn new(
        registry: Arc<ServiceRegistry>,
        config: Arc<dyn ConfigProvider>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        let instance_id = Uuid::new_v4();
        tracing::info!(instance_id = %instance_id, "bundle host created");
        Self {
            instance_id,
            registry,
            config,
            sink,
            bundles: RwLock::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Install a bundle at run level 0. It starts after everything installed before it.
    ///
    /// # Errors
    /// Returns `HostError::DuplicateBundle` if `name` is already installed.
    pub fn install(
        &self,
        name: &str,
        activator: Box<dyn BundleActivator>,
    ) -> Result<(), HostError> {
        self.install_at_level(name, 0, activator)
    }

    /// Install a bundle with an explicit run level (informational once installed;
    /// start order is install order).
    ///
    /// # Errors
    /// Returns `HostError::DuplicateBundle` if `name` is already installed.
    pub fn install_at_level(
        &self,
        name: &str,
        run_level: u32,
        activator: Box<dyn BundleActivator>,
    ) -> Result<(), HostError> {
        let name: Arc<str> = Arc::from(name);
        let entry = Arc::new(BundleEntry {
            ctx: BundleContext::new(
                name.clone(),
                Arc::clone(&self.registry),
                Arc::clone(&self.sink),
                Arc::clone(&self.config),
            ),
            name: name.clone(),
            run_level,
            activator,
            state: Mutex::new(BundleState::Inactive),
        });

        {
            let mut bundles = self.bundles.write();
            if bundles.iter().any(|b| b.name == name) {
                return Err(HostError::DuplicateBundle {
                    bundle: name.to_string(),
                });
            }
            bundles.push(entry);
        }

        tracing::debug!(bundle = %name, run_level, "bundle installed");
        Ok(())
    }

    /// Install every bundle linked into the binary.
    ///
    /// Bundles with `enabled: false` in their config section are skipped; a configured
    /// `run_level` overrides the one the bundle declared. Installation order is
    /// `(run_level, name)`. Returns the installed names in that order.
    ///
    /// # Errors
    /// Returns `HostError::DuplicateBundle` if a discovered name is already installed.
    pub fn install_discovered(&self) -> Result<Vec<String>, HostError> {
        let mut selected = Vec::new();
        for descriptor in discovered_bundles() {
            let settings = bundle_settings(self.config.as_ref(), descriptor.name);
            if !settings.enabled {
                tracing::info!(bundle = descriptor.name, "bundle disabled by configuration");
                continue;
            }
            let run_level = settings.run_level.unwrap_or(descriptor.run_level);
            selected.push((run_level, descriptor));
        }
        selected.sort_by(|(la, a), (lb, b)| (*la, a.name).cmp(&(*lb, b.name)));

        let mut installed = Vec::with_capacity(selected.len());
        for (run_level, descriptor) in selected {
            self.install_at_level(descriptor.name, run_level, descriptor.create())?;
            installed.push(descriptor.name.to_owned());
        }
        Ok(installed)
    }

    fn entry(&self, name: &str) -> Result<Arc<BundleEntry>, HostError> {
        self.bundles
            .read()
            .iter()
            .find(|b| &*b.name == name)
            .cloned()
            .ok_or_else(|| HostError::UnknownBundle {
                bundle: name.to_owned(),
            })
    }

    fn snapshot(&self) -> Vec<Arc<BundleEntry>> {
        self.bundles.read().clone()
    }

    /// Start one bundle.
    ///
    /// # Errors
    /// - `UnknownBundle` if `name` is not installed
    /// - `InvalidState` unless the bundle is `Inactive`
    /// - `Start` if the activator failed; the bundle is `Inactive` again
    pub fn start(&self, name: &str) -> Result<(), HostError> {
        let entry = self.entry(name)?;
        Self::start_entry(&entry)
    }

    fn start_entry(entry: &BundleEntry) -> Result<(), HostError> {
        entry.begin(BundleState::Inactive, BundleState::Starting, "start")?;
        tracing::debug!(bundle = %entry.name, "starting bundle");

        match entry.activator.start(&entry.ctx) {
            Ok(()) => {
                entry.finish(BundleState::Active);
                tracing::info!(bundle = %entry.name, "bundle started");
                Ok(())
            }
            Err(source) => {
                entry.finish(BundleState::Inactive);
                entry
                    .ctx
                    .logger()
                    .error(&format!("failed to start: {source:#}"));
                tracing::error!(
                    bundle = %entry.name,
                    error = %format!("{source:#}"),
                    "bundle start failed"
                );
                Err(HostError::Start {
                    bundle: entry.name.to_string(),
                    source,
                })
            }
        }
    }

    /// Stop one bundle.
    ///
    /// # Errors
    /// - `UnknownBundle` if `name` is not installed
    /// - `InvalidState` unless the bundle is `Active`
    /// - `Stop` if the activator failed; the bundle is `Inactive` regardless
    pub fn stop(&self, name: &str) -> Result<(), HostError> {
        let entry = self.entry(name)?;
        Self::stop_entry(&entry)
    }

    fn stop_entry(entry: &BundleEntry) -> Result<(), HostError> {
        entry.begin(BundleState::Active, BundleState::Stopping, "stop")?;
        tracing::debug!(bundle = %entry.name, "stopping bundle");

        let result = entry.activator.stop(&entry.ctx);
        entry.finish(BundleState::Inactive);

        match result {
            Ok(()) => {
                tracing::info!(bundle = %entry.name, "bundle stopped");
                Ok(())
            }
            Err(source) => {
                entry
                    .ctx
                    .logger()
                    .error(&format!("failed to stop: {source:#}"));
                tracing::error!(
                    bundle = %entry.name,
                    error = %format!("{source:#}"),
                    "bundle stop failed"
                );
                Err(HostError::Stop {
                    bundle: entry.name.to_string(),
                    source,
                })
            }
        }
    }

    /// Start every inactive bundle in install order. Never stops at the first failure.
    pub fn start_all(&self) -> StartReport {
        let mut report = StartReport::default();
        for entry in self.snapshot() {
            if entry.state() != BundleState::Inactive {
                continue;
            }
            match Self::start_entry(&entry) {
                Ok(()) => report.started.push(entry.name.to_string()),
                Err(err) => report.failed.push((entry.name.to_string(), err)),
            }
        }

        tracing::info!(
            started = report.started.len(),
            failed = report.failed.len(),
            "bundles started"
        );
        report
    }

    /// Stop every active bundle in reverse install order. Returns the stop failures.
    pub fn stop_all(&self) -> Vec<HostError> {
        let mut failures = Vec::new();
        for entry in self.snapshot().into_iter().rev() {
            if entry.state() != BundleState::Active {
                continue;
            }
            if let Err(err) = Self::stop_entry(&entry) {
                failures.push(err);
            }
        }
        failures
    }

    /// Stop everything, then drop whatever is still registered.
    pub fn shutdown(&self) -> Vec<HostError> {
        tracing::info!(instance_id = %self.instance_id, "bundle host shutting down");
        let failures = self.stop_all();
        let leftover = self.registry.len();
        if leftover > 0 {
            tracing::debug!(services = leftover, "clearing services left after stop");
        }
        self.registry.clear();
        failures
    }

    #[must_use]
    pub fn state(&self, name: &str) -> Option<BundleState> {
        self.entry(name).ok().map(|e| e.state())
    }

    /// Installed bundles in install order.
    #[must_use]
    pub fn bundles(&self) -> Vec<BundleStatus> {
        self.bundles
            .read()
            .iter()
            .map(|b| BundleStatus {
                name: b.name.to_string(),
                run_level: b.run_level,
                state: b.state(),
            })
            .collect()
    }
}

impl std::fmt::Debug for BundleHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleHost")
            .field("instance_id", &self.instance_id)
            .field("registry", &self.registry)
            .field("bundles", &self.bundles())
            .finish_non_exhaustive()
    }
}
