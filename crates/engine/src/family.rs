//! Parameter family registry.
//!
//! A family is the canonical requirement a parameter slot resolves to. The
//! registry enforces global disjointness: the generalization closures of any
//! two families never intersect, so an added fact can satisfy at most one
//! family. Families are created lazily on first use and never removed.

use crate::error::RegistrationError;
use groundwork_core::{MetadataProvider, TypeKey};
use std::collections::{HashMap, HashSet};

/// Arena position of a registered family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FamilyId(u32);

impl FamilyId {
    fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// The arena position.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One registered parameter family.
#[derive(Debug, Clone)]
pub struct Family {
    declared: TypeKey,
    closure: Vec<TypeKey>,
    usages: Vec<String>,
}

impl Family {
    /// The declared type this family canonicalizes.
    pub fn declared(&self) -> TypeKey {
        self.declared
    }

    /// The generalization closure of the declared type, self included.
    pub fn closure(&self) -> &[TypeKey] {
        &self.closure
    }

    /// The site that first required this family.
    pub fn first_usage(&self) -> &str {
        &self.usages[0]
    }

    /// Every site that required this family, in registration order.
    pub fn usages(&self) -> &[String] {
        &self.usages
    }

    /// How many sites require this family.
    pub fn usage_count(&self) -> usize {
        self.usages.len()
    }
}

/// Registry of mutually disjoint parameter families.
///
/// Owned by one engine instance; an arena of family records plus an index
/// from declared type to arena position.
pub struct FamilyRegistry {
    families: Vec<Family>,
    by_type: HashMap<TypeKey, FamilyId>,
}

impl FamilyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            families: Vec::new(),
            by_type: HashMap::new(),
        }
    }

    /// Number of registered families.
    pub fn len(&self) -> usize {
        self.families.len()
    }

    /// Whether no family has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Fetch a family record.
    pub fn get(&self, id: FamilyId) -> Option<&Family> {
        self.families.get(id.index())
    }

    /// The family registered for exactly this declared type, if any.
    pub fn lookup(&self, ty: TypeKey) -> Option<FamilyId> {
        self.by_type.get(&ty).copied()
    }

    /// Start a transactional resolution pass.
    ///
    /// Everything one handler's discovery resolves is staged on the draft;
    /// committing makes it permanent, dropping the draft discards it, which
    /// keeps rejected registrations free of side effects.
    pub fn draft(&self) -> FamilyDraft {
        FamilyDraft {
            base_len: self.families.len(),
            staged: Vec::new(),
            staged_index: HashMap::new(),
            usage_notes: Vec::new(),
        }
    }

    /// Resolve a required type to a family, staging changes on `draft`.
    ///
    /// Returns the id the slot will have once the draft is committed; staged
    /// families are appended in staging order, so post-commit positions are
    /// known up front.
    pub fn resolve_draft(
        &self,
        provider: &dyn MetadataProvider,
        draft: &mut FamilyDraft,
        ty: TypeKey,
        site: &str,
        signature: &str,
    ) -> Result<FamilyId, RegistrationError> {
        let Some(desc) = provider.describe(ty) else {
            return Err(RegistrationError::UndescribedType {
                type_name: provider.name_of(ty),
            });
        };

        // Exact reuse of a committed or staged family.
        if let Some(id) = self.by_type.get(&ty) {
            draft.usage_notes.push((*id, site.to_string()));
            return Ok(*id);
        }
        if let Some(&pos) = draft.staged_index.get(&ty) {
            draft.staged[pos].usages.push(site.to_string());
            return Ok(FamilyId::from_index(draft.base_len + pos));
        }

        if !desc.shape.fact_eligible() {
            return Err(RegistrationError::InvalidParameterType {
                type_name: desc.name.clone(),
                signature: signature.to_string(),
                reason: desc.shape.describe(),
            });
        }

        let closure = provider.closure(ty);
        let closure_set: HashSet<TypeKey> = closure.iter().copied().collect();
        let committed = self.families.iter();
        let staged = draft.staged.iter();
        for family in committed.chain(staged) {
            let common: Vec<TypeKey> = family
                .closure
                .iter()
                .filter(|k| closure_set.contains(k))
                .copied()
                .collect();
            if !common.is_empty() {
                let mut names: Vec<String> =
                    common.iter().map(|&k| provider.name_of(k)).collect();
                names.sort();
                let quoted: Vec<String> = names.iter().map(|n| format!("'{n}'")).collect();
                return Err(RegistrationError::OverlappingFamilies {
                    type_name: desc.name.clone(),
                    signature: signature.to_string(),
                    existing: provider.name_of(family.declared),
                    first_usage: family.first_usage().to_string(),
                    common: quoted.join(", "),
                });
            }
        }

        let pos = draft.staged.len();
        draft.staged.push(Family {
            declared: ty,
            closure,
            usages: vec![site.to_string()],
        });
        draft.staged_index.insert(ty, pos);
        Ok(FamilyId::from_index(draft.base_len + pos))
    }

    /// Apply a successful draft.
    pub fn commit(&mut self, draft: FamilyDraft) {
        debug_assert_eq!(draft.base_len, self.families.len());
        for (id, site) in draft.usage_notes {
            if let Some(family) = self.families.get_mut(id.index()) {
                family.usages.push(site);
            }
        }
        for family in draft.staged {
            let id = FamilyId::from_index(self.families.len());
            self.by_type.insert(family.declared, id);
            self.families.push(family);
        }
    }
}

impl Default for FamilyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Families and usage notes staged during one handler's discovery.
#[derive(Debug)]
pub struct FamilyDraft {
    base_len: usize,
    staged: Vec<Family>,
    staged_index: HashMap<TypeKey, usize>,
    usage_notes: Vec<(FamilyId, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundwork_core::{MetadataRegistry, TypeShape};

    fn site(param: &str) -> String {
        format!("'{param}' of 'Setup.apply(..)'")
    }

    #[test]
    fn test_resolve_and_commit_registers_family() {
        let mut metadata = MetadataRegistry::new();
        let config = metadata.declare("Config");
        let mut registry = FamilyRegistry::new();

        let mut draft = registry.draft();
        let id = registry
            .resolve_draft(&metadata, &mut draft, config, &site("config"), "Setup.apply(..)")
            .unwrap();
        assert!(registry.is_empty(), "nothing committed yet");

        registry.commit(draft);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup(config), Some(id));
        let family = registry.get(id).unwrap();
        assert_eq!(family.declared(), config);
        assert_eq!(family.usage_count(), 1);
        assert_eq!(family.first_usage(), site("config"));
    }

    #[test]
    fn test_dropped_draft_leaves_no_trace() {
        let mut metadata = MetadataRegistry::new();
        let config = metadata.declare("Config");
        let registry = FamilyRegistry::new();

        let mut draft = registry.draft();
        registry
            .resolve_draft(&metadata, &mut draft, config, &site("config"), "sig")
            .unwrap();
        drop(draft);

        assert!(registry.is_empty());
        assert_eq!(registry.lookup(config), None);
    }

    #[test]
    fn test_reuse_records_additional_usage() {
        let mut metadata = MetadataRegistry::new();
        let config = metadata.declare("Config");
        let mut registry = FamilyRegistry::new();

        let mut draft = registry.draft();
        registry
            .resolve_draft(&metadata, &mut draft, config, &site("a"), "sig")
            .unwrap();
        registry.commit(draft);

        let mut draft = registry.draft();
        let id = registry
            .resolve_draft(&metadata, &mut draft, config, &site("b"), "sig")
            .unwrap();
        registry.commit(draft);

        let family = registry.get(id).unwrap();
        assert_eq!(family.usage_count(), 2);
        assert_eq!(family.first_usage(), site("a"));
    }

    #[test]
    fn test_staged_reuse_shares_one_family() {
        let mut metadata = MetadataRegistry::new();
        let config = metadata.declare("Config");
        let mut registry = FamilyRegistry::new();

        let mut draft = registry.draft();
        let a = registry
            .resolve_draft(&metadata, &mut draft, config, &site("a"), "sig")
            .unwrap();
        let b = registry
            .resolve_draft(&metadata, &mut draft, config, &site("b"), "sig")
            .unwrap();
        assert_eq!(a, b);
        registry.commit(draft);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(a).unwrap().usage_count(), 2);
    }

    #[test]
    fn test_overlapping_closures_rejected() {
        let mut metadata = MetadataRegistry::new();
        let base = metadata.declare("BaseConfig");
        let derived = metadata.declare("DerivedConfig");
        metadata.set_base(derived, base);
        let mut registry = FamilyRegistry::new();

        let mut draft = registry.draft();
        registry
            .resolve_draft(&metadata, &mut draft, base, &site("base"), "sig")
            .unwrap();
        registry.commit(draft);

        let mut draft = registry.draft();
        let err = registry
            .resolve_draft(&metadata, &mut draft, derived, &site("derived"), "sig")
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("'DerivedConfig'"));
        assert!(text.contains("'BaseConfig'"), "names the existing family: {text}");
        assert!(text.contains(&site("base")), "names the first usage site: {text}");
    }

    #[test]
    fn test_overlap_detected_within_one_draft() {
        let mut metadata = MetadataRegistry::new();
        let shared = metadata.declare("Shared");
        let a = metadata.declare("A");
        let b = metadata.declare("B");
        metadata.add_implements(a, shared);
        metadata.add_implements(b, shared);
        let registry = FamilyRegistry::new();

        let mut draft = registry.draft();
        registry
            .resolve_draft(&metadata, &mut draft, a, &site("a"), "sig")
            .unwrap();
        let err = registry
            .resolve_draft(&metadata, &mut draft, b, &site("b"), "sig")
            .unwrap_err();
        assert!(err.to_string().contains("'Shared'"));
    }

    #[test]
    fn test_ineligible_shapes_rejected() {
        let shapes = [
            TypeShape::Top,
            TypeShape::Value,
            TypeShape::ByRef,
            TypeShape::ByRefLike,
            TypeShape::Array,
            TypeShape::OpenGeneric,
        ];
        for shape in shapes {
            let mut metadata = MetadataRegistry::new();
            let ty = metadata.declare_shaped("Odd", shape);
            let registry = FamilyRegistry::new();
            let mut draft = registry.draft();
            let err = registry
                .resolve_draft(&metadata, &mut draft, ty, &site("odd"), "sig")
                .unwrap_err();
            assert!(
                matches!(err, RegistrationError::InvalidParameterType { .. }),
                "{shape:?} must be rejected, got {err}"
            );
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        let metadata = MetadataRegistry::new();
        let registry = FamilyRegistry::new();
        let mut draft = registry.draft();
        let err = registry
            .resolve_draft(
                &metadata,
                &mut draft,
                groundwork_core::TypeKey::from_index(42),
                &site("ghost"),
                "sig",
            )
            .unwrap_err();
        assert!(matches!(err, RegistrationError::UndescribedType { .. }));
    }
}
