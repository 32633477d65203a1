//! Runtime registry of named capabilities.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::schema::SchemaError;

use super::set::{CapabilityId, PermissionSet};

/// A registered capability together with its assigned id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capability {
    pub name: String,
    pub id: CapabilityId,
}

#[derive(Debug, Default)]
struct RegistryInner {
    by_name: HashMap<String, Capability>,
    next_index: u32,
}

/// Registry of every capability the process knows about.
///
/// Registration is serialized behind the write lock, so concurrent attempts
/// to register the same name leave exactly one winner; everyone else gets the
/// duplicate error. Lookups take the read lock and are O(1).
#[derive(Debug, Default)]
pub struct PermissionRegistry {
    inner: RwLock<RegistryInner>,
}

impl PermissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a capability under a unique name. The assigned id is stable
    /// for the lifetime of the registry.
    pub fn register(&self, name: &str) -> Result<Capability, SchemaError> {
        let mut inner = self
            .inner
            .write()
            .expect("permission registry lock poisoned");
        if inner.by_name.contains_key(name) {
            return Err(SchemaError::DuplicateCapability {
                name: name.to_string(),
            });
        }
        let capability = Capability {
            name: name.to_string(),
            id: CapabilityId::from_index(inner.next_index),
        };
        inner.next_index += 1;
        inner.by_name.insert(name.to_string(), capability.clone());
        Ok(capability)
    }

    pub fn lookup(&self, name: &str) -> Option<Capability> {
        self.inner
            .read()
            .expect("permission registry lock poisoned")
            .by_name
            .get(name)
            .cloned()
    }

    /// Whether `held` grants the named capability. A name the registry has
    /// never seen is not held by anyone.
    pub fn has_capability(&self, held: &PermissionSet, name: &str) -> bool {
        match self.lookup(name) {
            Some(capability) => held.contains(capability.id),
            None => false,
        }
    }

    /// First name out of `required` that `held` does not grant.
    pub fn missing_capability<'a, I>(&self, held: &PermissionSet, required: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a String>,
    {
        required
            .into_iter()
            .map(String::as_str)
            .find(|name| !self.has_capability(held, name))
    }

    /// Resolves names into a set, skipping any the registry does not know.
    pub fn resolve_set<'a, I>(&self, names: I) -> PermissionSet
    where
        I: IntoIterator<Item = &'a str>,
    {
        let inner = self
            .inner
            .read()
            .expect("permission registry lock poisoned");
        let mut set = PermissionSet::empty();
        for name in names {
            if let Some(capability) = inner.by_name.get(name) {
                set.insert(capability.id);
            }
        }
        set
    }

    /// Every capability registered so far.
    pub fn full_set(&self) -> PermissionSet {
        let inner = self
            .inner
            .read()
            .expect("permission registry lock poisoned");
        let mut set = PermissionSet::empty();
        for capability in inner.by_name.values() {
            set.insert(capability.id);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .expect("permission registry lock poisoned")
            .by_name
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn duplicate_capability_registration_is_rejected() {
        let registry = PermissionRegistry::new();
        registry.register("edit_posts").unwrap();
        let err = registry.register("edit_posts").unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateCapability { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registered_capabilities_get_distinct_stable_ids() {
        let registry = PermissionRegistry::new();
        let first = registry.register("read").unwrap();
        let second = registry.register("write").unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(registry.lookup("read").unwrap().id, first.id);
        assert_eq!(registry.lookup("write").unwrap().id, second.id);
    }

    #[test]
    fn unknown_capability_is_never_held() {
        let registry = PermissionRegistry::new();
        registry.register("read").unwrap();
        let everything = registry.full_set();
        assert!(registry.has_capability(&everything, "read"));
        assert!(!registry.has_capability(&everything, "ghost"));
    }

    #[test]
    fn concurrent_registration_has_a_single_winner() {
        let registry = Arc::new(PermissionRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.register("contended").is_ok())
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(wins, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn resolve_set_skips_unknown_names() {
        let registry = PermissionRegistry::new();
        let read = registry.register("read").unwrap();
        let set = registry.resolve_set(["read", "ghost"]);
        assert!(set.contains(read.id));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn missing_capability_reports_first_gap() {
        let registry = PermissionRegistry::new();
        registry.register("read").unwrap();
        registry.register("write").unwrap();
        let required = vec!["read".to_string(), "write".to_string()];

        let mut held = PermissionSet::empty();
        held.insert(registry.lookup("read").unwrap().id);

        assert_eq!(
            registry.missing_capability(&held, &required),
            Some("write")
        );
        assert_eq!(registry.missing_capability(&registry.full_set(), &required), None);
    }
}
