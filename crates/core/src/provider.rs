//! The type metadata provider seam.
//!
//! The engine consumes type information through [`MetadataProvider`]; hosts
//! with their own metadata pipelines implement the trait, and
//! [`MetadataRegistry`] is the in-memory reference implementation used by
//! tests and stand-alone setups.

use crate::descriptor::{IntrinsicRole, MethodDesc, TypeDesc, TypeShape};
use crate::key::TypeKey;
use std::collections::{HashMap, HashSet};

/// Source of type descriptors.
pub trait MetadataProvider: Send + Sync {
    /// Describe a type, or `None` if the key is unknown.
    fn describe(&self, key: TypeKey) -> Option<&TypeDesc>;

    /// Display name for a key, with a stable fallback for unknown keys.
    fn name_of(&self, key: TypeKey) -> String {
        match self.describe(key) {
            Some(desc) => desc.name.clone(),
            None => key.to_string(),
        }
    }

    /// The generalization closure of a type: the type itself plus every
    /// transitive base type and implemented abstraction.
    ///
    /// Order is deterministic (self first, then discovery order); malformed
    /// cyclic metadata is tolerated by visit tracking.
    fn closure(&self, key: TypeKey) -> Vec<TypeKey> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut queue = vec![key];
        while let Some(next) = queue.pop() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next);
            if let Some(desc) = self.describe(next) {
                if let Some(base) = desc.base {
                    queue.push(base);
                }
                queue.extend(desc.implements.iter().copied());
            }
        }
        out
    }
}

/// In-memory metadata registry.
///
/// Types are declared up front and refined with builder-style setters; the
/// registry then serves as the [`MetadataProvider`] for an engine.
pub struct MetadataRegistry {
    types: Vec<TypeDesc>,
    by_name: HashMap<String, TypeKey>,
}

impl MetadataRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            types: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Declare a regular type; returns the existing key if the name is
    /// already declared.
    pub fn declare(&mut self, name: &str) -> TypeKey {
        self.declare_shaped(name, TypeShape::Regular)
    }

    /// Declare a type with an explicit shape.
    pub fn declare_shaped(&mut self, name: &str, shape: TypeShape) -> TypeKey {
        if let Some(&key) = self.by_name.get(name) {
            return key;
        }
        let key = TypeKey::from_index(self.types.len());
        self.types.push(TypeDesc {
            key,
            name: name.to_string(),
            shape,
            base: None,
            implements: Vec::new(),
            intrinsic: None,
            loop_parent: None,
            loop_root: false,
            methods: Vec::new(),
        });
        self.by_name.insert(name.to_string(), key);
        key
    }

    /// Look up a declared type by name.
    pub fn key_of(&self, name: &str) -> Option<TypeKey> {
        self.by_name.get(name).copied()
    }

    /// Set the single base type of `ty`.
    pub fn set_base(&mut self, ty: TypeKey, base: TypeKey) {
        if let Some(desc) = self.types.get_mut(ty.index()) {
            desc.base = Some(base);
        }
    }

    /// Record that `ty` implements the abstraction `abs`.
    pub fn add_implements(&mut self, ty: TypeKey, abs: TypeKey) {
        if let Some(desc) = self.types.get_mut(ty.index()) {
            desc.implements.push(abs);
        }
    }

    /// Mark `ty` as an intrinsic parameter type.
    pub fn set_intrinsic(&mut self, ty: TypeKey, role: IntrinsicRole) {
        if let Some(desc) = self.types.get_mut(ty.index()) {
            desc.intrinsic = Some(role);
        }
    }

    /// Set the loop-hierarchy parent of `ty`.
    pub fn set_loop_parent(&mut self, ty: TypeKey, parent: TypeKey) {
        if let Some(desc) = self.types.get_mut(ty.index()) {
            desc.loop_parent = Some(parent);
        }
    }

    /// Declare `ty` a loop hierarchy root.
    pub fn mark_loop_root(&mut self, ty: TypeKey) {
        if let Some(desc) = self.types.get_mut(ty.index()) {
            desc.loop_root = true;
        }
    }

    /// Attach a marked method to `ty`, after any already attached.
    pub fn add_method(&mut self, ty: TypeKey, method: MethodDesc) {
        if let Some(desc) = self.types.get_mut(ty.index()) {
            desc.methods.push(method);
        }
    }
}

impl Default for MetadataRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataProvider for MetadataRegistry {
    fn describe(&self, key: TypeKey) -> Option<&TypeDesc> {
        self.types.get(key.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_is_idempotent() {
        let mut registry = MetadataRegistry::new();
        let a = registry.declare("Config");
        let b = registry.declare("Config");
        assert_eq!(a, b);
        assert_eq!(registry.key_of("Config"), Some(a));
        assert_eq!(registry.key_of("Missing"), None);
    }

    #[test]
    fn test_name_of_fallback() {
        let registry = MetadataRegistry::new();
        assert_eq!(registry.name_of(TypeKey::from_index(9)), "type#9");
    }

    #[test]
    fn test_closure_includes_bases_and_abstractions() {
        let mut registry = MetadataRegistry::new();
        let top = registry.declare_shaped("Object", TypeShape::Top);
        let readable = registry.declare("Readable");
        let base = registry.declare("BaseConfig");
        let derived = registry.declare("DerivedConfig");
        registry.set_base(base, top);
        registry.set_base(derived, base);
        registry.add_implements(derived, readable);

        let closure = registry.closure(derived);
        assert_eq!(closure[0], derived);
        for key in [base, top, readable] {
            assert!(closure.contains(&key));
        }
        assert_eq!(closure.len(), 4);
    }

    #[test]
    fn test_closure_survives_cycles() {
        let mut registry = MetadataRegistry::new();
        let a = registry.declare("A");
        let b = registry.declare("B");
        registry.set_base(a, b);
        registry.set_base(b, a);

        let closure = registry.closure(a);
        assert_eq!(closure.len(), 2);
    }
}
