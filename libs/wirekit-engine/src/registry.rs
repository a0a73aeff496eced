use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use wirekit_api::error::WireError;
use wirekit_api::schema::MessageDescriptor;

use crate::builtin;

/// Map from fully-qualified message name to descriptor.
///
/// Registration is idempotent: registering a descriptor equal to the one
/// already stored under its name returns the stored `Arc`. A different
/// descriptor under a taken name fails with `SchemaConflict`. Once sealed,
/// new names are refused with `Sealed` while lookups stay lock-shared.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, Arc<MessageDescriptor>>>,
    sealed: AtomicBool,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<MessageDescriptor>>> {
        match self.schemas.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("schema registry read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<MessageDescriptor>>> {
        match self.schemas.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("schema registry write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    pub fn register(
        &self,
        descriptor: MessageDescriptor,
    ) -> Result<Arc<MessageDescriptor>, WireError> {
        let mut guard = self.write();
        let name = descriptor.full_name();

        if let Some(existing) = guard.get(name) {
            return if **existing == descriptor {
                Ok(Arc::clone(existing))
            } else {
                Err(WireError::schema_conflict(format!(
                    "'{name}' is already registered with a different definition"
                )))
            };
        }

        if self.is_sealed() {
            return Err(WireError::sealed(format!(
                "cannot register '{name}': registry is sealed"
            )));
        }

        tracing::debug!(schema = name, fields = descriptor.len(), "registered schema");
        let descriptor = Arc::new(descriptor);
        guard.insert(descriptor.full_name().to_owned(), Arc::clone(&descriptor));
        Ok(descriptor)
    }

    pub fn lookup(&self, full_name: &str) -> Result<Arc<MessageDescriptor>, WireError> {
        self.read()
            .get(full_name)
            .cloned()
            .ok_or_else(|| WireError::not_found(format!("no schema named '{full_name}'")))
    }

    pub fn contains(&self, full_name: &str) -> bool {
        self.read().contains_key(full_name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Refuse new names from now on. Cannot be undone.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }
}

static REGISTRY: OnceLock<SchemaRegistry> = OnceLock::new();

/// Build the process-wide registry from the built-in schemas plus `extra`,
/// then seal it.
///
/// Only the first successful call populates the registry; racing callers
/// all observe the same instance. Later calls re-register `extra` against
/// the sealed registry, which succeeds only when every descriptor is
/// already present and identical.
pub fn init_registry(
    extra: Vec<MessageDescriptor>,
) -> Result<&'static SchemaRegistry, WireError> {
    if let Some(registry) = REGISTRY.get() {
        for descriptor in extra {
            registry.register(descriptor)?;
        }
        return Ok(registry);
    }

    let built = SchemaRegistry::new();
    for descriptor in builtin::descriptors()? {
        built.register(descriptor)?;
    }
    for descriptor in extra.iter().cloned() {
        built.register(descriptor)?;
    }
    built.seal();

    let registry = REGISTRY.get_or_init(|| {
        tracing::info!(schemas = built.len(), "schema registry initialized");
        built
    });
    // Another thread may have won the race with a different set.
    for descriptor in extra {
        registry.register(descriptor)?;
    }
    Ok(registry)
}

/// The process-wide registry, `None` before `init_registry` succeeds.
pub fn global_registry() -> Option<&'static SchemaRegistry> {
    REGISTRY.get()
}
