//! `BundleKit` - in-process bundles sharing a named service registry.
//!
//! A host owns one [`ServiceRegistry`] and a set of installed bundles. Each bundle
//! implements [`BundleActivator`]; the host calls `start`/`stop` with a
//! [`BundleContext`] that exposes the shared registry, a logger tagged with the
//! bundle name, and the bundle's configuration section.
//!
//! ```ignore
//! let registry = Arc::new(ServiceRegistry::new());
//! let host = BundleHost::new(registry, config, Arc::new(TracingLogSink));
//! host.install("simple", Box::new(SimpleBundleActivator))?;
//! let report = host.start_all();
//! // ...
//! host.shutdown();
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod config;
pub mod context;
pub mod contracts;
pub mod discovery;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod properties;
pub mod registry;
pub mod runtime;
pub mod testing;

pub use config::{ConfigError, ConfigProvider, EmptyConfigProvider};
pub use context::BundleContext;
pub use contracts::BundleActivator;
pub use discovery::{BundleDescriptor, discovered_bundles};
pub use error::{HostError, RegistryError};
pub use lifecycle::BundleState;
pub use logging::{BundleLogger, LogLevel, LogSink, TracingLogSink};
pub use properties::Properties;
pub use registry::{ServiceEvent, ServiceId, ServiceRef, ServiceRegistration, ServiceRegistry};
pub use runtime::{BundleHost, BundleStatus, StartReport};

// Re-exported for the `bundle!` macro.
#[doc(hidden)]
pub use inventory;
