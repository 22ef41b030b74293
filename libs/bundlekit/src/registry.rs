//! Named, type-checked service registry shared by all bundles of a host.
//!
//! - Providers register an `Arc<T>` under a unique name, usually with `T = dyn SomeApi`.
//! - Consumers look a service up by name and narrow it back to `T` with
//!   [`ServiceRef::casted_instance`]; a wrong `T` is a `TypeMismatch`, never a panic.
//! - Unregistering only removes discoverability. `Arc`s already handed out stay valid.
//!
//! Implementation details:
//! - Value = `Arc<T>` stored as `Arc<dyn Any + Send + Sync>` plus `type_name::<T>()` as tag.
//! - One `RwLock` over the map. It is held for the map access only: entries are built
//!   before the write lock is taken, events are published after it is released, and no
//!   service code ever runs under it.

use parking_lot::RwLock;
use std::{
    any::Any,
    collections::{HashMap, hash_map::Entry},
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::broadcast;

use crate::error::RegistryError;
use crate::properties::Properties;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Identifier assigned to each successful registration. Never reused within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceId(u64);

impl ServiceId {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable type tag for the registered capability, `T` may be a trait object.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
struct TypeKey(&'static str);

impl TypeKey {
    #[inline]
    fn of<T: ?Sized + 'static>() -> Self {
        TypeKey(std::any::type_name::<T>())
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Change notification for registry listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEvent {
    Registered { id: ServiceId, name: Arc<str> },
    Unregistered { id: ServiceId, name: Arc<str> },
}

impl ServiceEvent {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            ServiceEvent::Registered { name, .. } | ServiceEvent::Unregistered { name, .. } => name,
        }
    }
}

/// A registered service as seen by a consumer.
///
/// Cloning is cheap; the instance and properties are shared with the registry entry.
#[derive(Clone)]
pub struct ServiceRef {
    id: ServiceId,
    name: Arc<str>,
    type_key: TypeKey,
    instance: Arc<dyn Any + Send + Sync>,
    properties: Arc<Properties>,
}

impl ServiceRef {
    #[must_use]
    pub fn id(&self) -> ServiceId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Fully-qualified name of the type the service was registered as.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_key.0
    }

    /// Narrow the service to the capability `T` it was registered as.
    ///
    /// # Errors
    /// Returns `RegistryError::TypeMismatch` if the service was registered under a
    /// different type.
    pub fn casted_instance<T>(&self) -> Result<Arc<T>, RegistryError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        // Stored value is exactly `Arc<T>` for the registered `T`.
        self.instance
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| RegistryError::TypeMismatch {
                name: self.name.to_string(),
                expected: std::any::type_name::<T>(),
                actual: self.type_key.0,
            })
    }
}

impl fmt::Debug for ServiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRef")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type", &self.type_key)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

struct Inner {
    map: RwLock<HashMap<Arc<str>, ServiceRef>>,
    next_id: AtomicU64,
    events: broadcast::Sender<ServiceEvent>,
}

impl Inner {
    fn publish(&self, event: ServiceEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    fn remove_where(
        &self,
        name: &str,
        matches: impl FnOnce(&ServiceRef) -> bool,
    ) -> Result<(), RegistryError> {
        let removed = {
            let mut w = self.map.write();
            if w.get(name).is_some_and(matches) {
                w.remove(name)
            } else {
                None
            }
        };

        let Some(entry) = removed else {
            return Err(RegistryError::NotFound {
                name: name.to_owned(),
            });
        };

        tracing::debug!(service = %entry.name, id = %entry.id, "service unregistered");
        self.publish(ServiceEvent::Unregistered {
            id: entry.id,
            name: entry.name,
        });
        Ok(())
    }
}

/// Process-wide directory of named services.
///
/// Build it once at host startup and pass it around as `Arc<ServiceRegistry>`.
pub struct ServiceRegistry {
    inner: Arc<Inner>,
}

impl ServiceRegistry {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                map: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                events,
            }),
        }
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.len())
            .finish()
    }
}

impl ServiceRegistry {
    /// Register `instance` under `name` as capability `T`.
    ///
    /// `T` is the type consumers narrow to, typically a trait object:
    /// `registry.register::<dyn AdditionService>(name, Arc::new(Impl), props)`.
    /// The entry is visible to lookups as soon as this returns.
    ///
    /// # Errors
    /// Returns `RegistryError::DuplicateName` if `name` is already registered; the
    /// existing registration is left untouched.
    pub fn register<T>(
        &self,
        name: impl Into<Arc<str>>,
        instance: Arc<T>,
        properties: Properties,
    ) -> Result<ServiceRegistration, RegistryError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let name: Arc<str> = name.into();
        let id = ServiceId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = ServiceRef {
            id,
            name: name.clone(),
            type_key: TypeKey::of::<T>(),
            instance: Arc::new(instance),
            properties: Arc::new(properties),
        };

        {
            let mut w = self.inner.map.write();
            match w.entry(name.clone()) {
                Entry::Occupied(_) => {
                    return Err(RegistryError::DuplicateName {
                        name: name.to_string(),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
            }
        }

        tracing::debug!(
            service = %name,
            id = %id,
            capability = std::any::type_name::<T>(),
            "service registered"
        );
        self.inner.publish(ServiceEvent::Registered {
            id,
            name: name.clone(),
        });

        Ok(ServiceRegistration {
            id,
            name,
            registry: Arc::downgrade(&self.inner),
        })
    }

    /// Remove the service registered under `name`.
    ///
    /// # Errors
    /// Returns `RegistryError::NotFound` if nothing is registered under `name`.
    /// Other entries are never affected.
    pub fn unregister(&self, name: &str) -> Result<(), RegistryError> {
        self.inner.remove_where(name, |_| true)
    }

    /// Look up a service by name. Absence is an expected outcome, not an error.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<ServiceRef> {
        self.inner.map.read().get(name).cloned()
    }

    /// Look up a service by name and narrow it to `T`.
    ///
    /// # Errors
    /// Returns `RegistryError::TypeMismatch` if a service exists under `name` but was
    /// registered as a different type.
    pub fn find_instance<T>(&self, name: &str) -> Result<Option<Arc<T>>, RegistryError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.find_by_name(name)
            .map(|service| service.casted_instance::<T>())
            .transpose()
    }

    /// All services whose property `key` equals `value`, in registration order.
    #[must_use]
    pub fn find_by_property(&self, key: &str, value: &serde_json::Value) -> Vec<ServiceRef> {
        let mut found: Vec<ServiceRef> = self
            .inner
            .map
            .read()
            .values()
            .filter(|s| s.properties.get(key) == Some(value))
            .cloned()
            .collect();
        found.sort_by_key(ServiceRef::id);
        found
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .map
            .read()
            .keys()
            .map(|k| k.to_string())
            .collect();
        names.sort();
        names
    }

    /// Subscribe to registration changes made after this call.
    ///
    /// Events are sent after the map lock is released. For mutations racing on
    /// the same name from different threads, delivery order may differ from the
    /// order in which the map changed; use [`ServiceRegistry::find_by_name`] for the
    /// current state.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ServiceEvent> {
        self.inner.events.subscribe()
    }

    /// Drop every registration (host shutdown).
    pub fn clear(&self) {
        let mut drained: Vec<ServiceRef> = {
            let mut w = self.inner.map.write();
            w.drain().map(|(_, entry)| entry).collect()
        };

        drained.sort_by_key(ServiceRef::id);
        for entry in drained {
            self.inner.publish(ServiceEvent::Unregistered {
                id: entry.id,
                name: entry.name,
            });
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.map.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.map.read().is_empty()
    }
}

/// Handle returned by [`ServiceRegistry::register`].
///
/// Dropping the handle does not unregister the service.
#[derive(Debug)]
pub struct ServiceRegistration {
    id: ServiceId,
    name: Arc<str>,
    registry: Weak<Inner>,
}

impl ServiceRegistration {
    #[must_use]
    pub fn id(&self) -> ServiceId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remove exactly the registration this handle was issued for.
    ///
    /// A newer registration that reuses the same name is left alone.
    ///
    /// # Errors
    /// Returns `RegistryError::NotFound` if the registration is already gone or the
    /// registry has been dropped.
    pub fn unregister(self) -> Result<(), RegistryError> {
        let Some(inner) = self.registry.upgrade() else {
            return Err(RegistryError::NotFound {
                name: self.name.to_string(),
            });
        };
        inner.remove_where(&self.name, |entry| entry.id == self.id)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    trait TestApi: Send + Sync {
        fn id(&self) -> usize;
    }

    struct ImplA(usize);
    impl TestApi for ImplA {
        fn id(&self) -> usize {
            self.0
        }
    }

    trait OtherApi: Send + Sync {
        fn label(&self) -> &str;
    }

    struct ImplB(&'static str);
    impl OtherApi for ImplB {
        fn label(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn register_and_find_dyn_trait() {
        let registry = ServiceRegistry::new();
        let api: Arc<dyn TestApi> = Arc::new(ImplA(7));
        registry
            .register::<dyn TestApi>("svc.test", api.clone(), Properties::new())
            .unwrap();

        let found = registry.find_by_name("svc.test").unwrap();
        let got = found.casted_instance::<dyn TestApi>().unwrap();
        assert_eq!(got.id(), 7);
        assert!(Arc::ptr_eq(&api, &got));
        assert_eq!(found.name(), "svc.test");
        assert!(found.type_name().contains("TestApi"));
    }

    #[test]
    fn find_by_name_returns_none_for_missing_service() {
        let registry = ServiceRegistry::new();
        assert!(registry.find_by_name("nope").is_none());
    }

    #[test]
    fn duplicate_name_is_rejected_and_original_kept() {
        let registry = ServiceRegistry::new();
        registry
            .register::<dyn TestApi>("svc", Arc::new(ImplA(1)), Properties::new())
            .unwrap();

        let err = registry
            .register::<dyn TestApi>("svc", Arc::new(ImplA(2)), Properties::new())
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateName {
                name: "svc".to_owned()
            }
        );

        let still = registry
            .find_instance::<dyn TestApi>("svc")
            .unwrap()
            .unwrap();
        assert_eq!(still.id(), 1, "first registration must survive");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unregister_removes_discoverability_but_keeps_held_arcs() {
        let registry = ServiceRegistry::new();
        registry
            .register::<dyn TestApi>("svc", Arc::new(ImplA(42)), Properties::new())
            .unwrap();

        let held = registry
            .find_instance::<dyn TestApi>("svc")
            .unwrap()
            .unwrap();
        registry.unregister("svc").unwrap();

        assert!(registry.find_by_name("svc").is_none());
        assert_eq!(held.id(), 42, "consumer reference remains usable");
    }

    #[test]
    fn unregister_unknown_name_is_not_found_and_harmless() {
        let registry = ServiceRegistry::new();
        registry
            .register::<dyn TestApi>("keep", Arc::new(ImplA(1)), Properties::new())
            .unwrap();

        let err = registry.unregister("never-registered").unwrap_err();
        assert_eq!(
            err,
            RegistryError::NotFound {
                name: "never-registered".to_owned()
            }
        );
        assert!(registry.find_by_name("keep").is_some());
        assert_eq!(registry.names(), vec!["keep".to_owned()]);
    }

    #[test]
    fn casted_instance_to_wrong_capability_is_type_mismatch() {
        let registry = ServiceRegistry::new();
        registry
            .register::<dyn TestApi>("svc", Arc::new(ImplA(1)), Properties::new())
            .unwrap();

        let found = registry.find_by_name("svc").unwrap();
        match found.casted_instance::<dyn OtherApi>() {
            Err(RegistryError::TypeMismatch {
                name,
                expected,
                actual,
            }) => {
                assert_eq!(name, "svc");
                assert!(expected.contains("OtherApi"));
                assert!(actual.contains("TestApi"));
            }
            Err(other) => panic!("expected TypeMismatch, got {other:?}"),
            Ok(_) => panic!("expected TypeMismatch, got Ok"),
        }
    }

    #[test]
    fn concrete_type_registration_does_not_narrow_to_trait_object() {
        let registry = ServiceRegistry::new();
        registry
            .register::<ImplA>("svc", Arc::new(ImplA(3)), Properties::new())
            .unwrap();

        let found = registry.find_by_name("svc").unwrap();
        assert_eq!(found.casted_instance::<ImplA>().unwrap().id(), 3);
        assert!(found.casted_instance::<dyn TestApi>().is_err());
    }

    #[test]
    fn find_instance_distinguishes_absent_and_mismatch() {
        let registry = ServiceRegistry::new();
        assert!(
            registry
                .find_instance::<dyn TestApi>("svc")
                .unwrap()
                .is_none()
        );

        registry
            .register::<dyn OtherApi>("svc", Arc::new(ImplB("x")), Properties::new())
            .unwrap();
        assert!(matches!(
            registry.find_instance::<dyn TestApi>("svc"),
            Err(RegistryError::TypeMismatch { .. })
        ));
        assert_eq!(
            registry
                .find_instance::<dyn OtherApi>("svc")
                .unwrap()
                .unwrap()
                .label(),
            "x"
        );
    }

    #[test]
    fn properties_travel_with_the_service() {
        let registry = ServiceRegistry::new();
        let props = Properties::new().with("vendor", "example").with("rank", 5);
        registry
            .register::<dyn TestApi>("svc", Arc::new(ImplA(1)), props.clone())
            .unwrap();

        let found = registry.find_by_name("svc").unwrap();
        assert_eq!(found.properties(), &props);
    }

    #[test]
    fn find_by_property_matches_in_registration_order() {
        let registry = ServiceRegistry::new();
        registry
            .register::<dyn TestApi>(
                "b",
                Arc::new(ImplA(1)),
                Properties::new().with("vendor", "acme"),
            )
            .unwrap();
        registry
            .register::<dyn TestApi>(
                "a",
                Arc::new(ImplA(2)),
                Properties::new().with("vendor", "other"),
            )
            .unwrap();
        registry
            .register::<dyn TestApi>(
                "c",
                Arc::new(ImplA(3)),
                Properties::new().with("vendor", "acme"),
            )
            .unwrap();

        let found: Vec<String> = registry
            .find_by_property("vendor", &json!("acme"))
            .iter()
            .map(|s| s.name().to_owned())
            .collect();
        assert_eq!(found, vec!["b".to_owned(), "c".to_owned()]);
        assert!(registry.find_by_property("vendor", &json!(1)).is_empty());
    }

    #[test]
    fn registration_handle_unregisters_its_own_entry() {
        let registry = ServiceRegistry::new();
        let handle = registry
            .register::<dyn TestApi>("svc", Arc::new(ImplA(1)), Properties::new())
            .unwrap();
        assert_eq!(handle.name(), "svc");

        handle.unregister().unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn stale_handle_does_not_remove_newer_registration() {
        let registry = ServiceRegistry::new();
        let stale = registry
            .register::<dyn TestApi>("svc", Arc::new(ImplA(1)), Properties::new())
            .unwrap();
        registry.unregister("svc").unwrap();
        let fresh = registry
            .register::<dyn TestApi>("svc", Arc::new(ImplA(2)), Properties::new())
            .unwrap();
        assert!(fresh.id() > stale.id());

        assert!(matches!(
            stale.unregister(),
            Err(RegistryError::NotFound { .. })
        ));
        let current = registry
            .find_instance::<dyn TestApi>("svc")
            .unwrap()
            .unwrap();
        assert_eq!(current.id(), 2);
    }

    #[test]
    fn handle_outliving_registry_reports_not_found() {
        let registry = ServiceRegistry::new();
        let handle = registry
            .register::<dyn TestApi>("svc", Arc::new(ImplA(1)), Properties::new())
            .unwrap();
        drop(registry);

        assert!(matches!(
            handle.unregister(),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn subscribers_see_register_then_unregister() {
        let registry = ServiceRegistry::new();
        let mut events = registry.subscribe();

        let handle = registry
            .register::<dyn TestApi>("svc", Arc::new(ImplA(1)), Properties::new())
            .unwrap();
        let id = handle.id();
        handle.unregister().unwrap();

        assert_eq!(
            events.try_recv().unwrap(),
            ServiceEvent::Registered {
                id,
                name: Arc::from("svc")
            }
        );
        let second = events.try_recv().unwrap();
        assert!(matches!(second, ServiceEvent::Unregistered { .. }));
        assert_eq!(second.name(), "svc");
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn failed_registration_publishes_nothing() {
        let registry = ServiceRegistry::new();
        registry
            .register::<dyn TestApi>("svc", Arc::new(ImplA(1)), Properties::new())
            .unwrap();
        let mut events = registry.subscribe();

        assert!(
            registry
                .register::<dyn TestApi>("svc", Arc::new(ImplA(2)), Properties::new())
                .is_err()
        );
        assert!(registry.unregister("other").is_err());
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn clear_removes_everything_and_notifies() {
        let registry = ServiceRegistry::new();
        registry
            .register::<dyn TestApi>("a", Arc::new(ImplA(1)), Properties::new())
            .unwrap();
        registry
            .register::<dyn OtherApi>("b", Arc::new(ImplB("b")), Properties::new())
            .unwrap();
        let mut events = registry.subscribe();

        assert_eq!(registry.len(), 2);
        registry.clear();

        assert!(registry.is_empty());
        assert_eq!(events.try_recv().unwrap().name(), "a");
        assert_eq!(events.try_recv().unwrap().name(), "b");
    }

    #[test]
    fn names_are_sorted() {
        let registry = ServiceRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .register::<dyn TestApi>(name, Arc::new(ImplA(0)), Properties::new())
                .unwrap();
        }
        assert_eq!(
            registry.names(),
            vec!["alpha".to_owned(), "mid".to_owned(), "zeta".to_owned()]
        );
    }
}
