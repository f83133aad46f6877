//! Fact store.
//!
//! Holds every object added to the engine, in registration order, and
//! answers assignability queries against declared requirement types. Facts
//! are never deduplicated and never removed; matching is evaluated at query
//! time so a fact added before the handler that requires its type is still
//! found later.

use crate::object::Value;
use groundwork_core::{MetadataProvider, TypeKey};

/// Ordered store of added facts.
pub struct FactStore {
    values: Vec<Value>,
}

impl FactStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Retain a fact. Re-adding a logically equal object stores it again.
    pub fn add(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Number of retained facts.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Fetch a fact by its stable index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Whether any fact is assignable to `declared`.
    pub fn has_match(&self, provider: &dyn MetadataProvider, declared: TypeKey) -> bool {
        self.first_match(provider, declared).is_some()
    }

    /// The first-added fact assignable to `declared`.
    pub fn first_match(&self, provider: &dyn MetadataProvider, declared: TypeKey) -> Option<&Value> {
        self.values
            .iter()
            .find(|v| provider.closure(v.key()).contains(&declared))
    }

    /// Indices of every fact assignable to `declared`, in addition order.
    pub fn matches(&self, provider: &dyn MetadataProvider, declared: TypeKey) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| provider.closure(v.key()).contains(&declared))
            .map(|(i, _)| i)
            .collect()
    }
}

impl Default for FactStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::EngineObject;
    use groundwork_core::MetadataRegistry;
    use std::any::Any;
    use std::sync::Arc;

    struct Tagged {
        key: TypeKey,
        label: &'static str,
    }

    impl EngineObject for Tagged {
        fn type_key(&self) -> TypeKey {
            self.key
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn value(key: TypeKey, label: &'static str) -> Value {
        Value::new(Arc::new(Tagged { key, label }))
    }

    #[test]
    fn test_first_added_wins() {
        let mut metadata = MetadataRegistry::new();
        let config = metadata.declare("Config");
        let mut store = FactStore::new();
        store.add(value(config, "first"));
        store.add(value(config, "second"));

        let found = store.first_match(&metadata, config).unwrap();
        assert_eq!(found.downcast_ref::<Tagged>().unwrap().label, "first");
        assert_eq!(store.matches(&metadata, config), vec![0, 1]);
    }

    #[test]
    fn test_assignability_matches_supertypes() {
        let mut metadata = MetadataRegistry::new();
        let base = metadata.declare("BaseConfig");
        let derived = metadata.declare("DerivedConfig");
        metadata.set_base(derived, base);

        let mut store = FactStore::new();
        store.add(value(derived, "derived"));

        assert!(store.has_match(&metadata, base));
        assert!(store.has_match(&metadata, derived));
        let found = store.first_match(&metadata, base).unwrap();
        assert_eq!(found.key(), derived);
    }

    #[test]
    fn test_unrelated_types_do_not_match() {
        let mut metadata = MetadataRegistry::new();
        let config = metadata.declare("Config");
        let env = metadata.declare("Env");

        let mut store = FactStore::new();
        store.add(value(config, "config"));

        assert!(!store.has_match(&metadata, env));
        assert!(store.matches(&metadata, env).is_empty());
    }

    #[test]
    fn test_indices_are_stable() {
        let mut metadata = MetadataRegistry::new();
        let config = metadata.declare("Config");
        let env = metadata.declare("Env");

        let mut store = FactStore::new();
        store.add(value(env, "env"));
        store.add(value(config, "config"));
        store.add(value(env, "env2"));

        assert_eq!(store.matches(&metadata, env), vec![0, 2]);
        assert_eq!(store.get(1).unwrap().key(), config);
    }
}
