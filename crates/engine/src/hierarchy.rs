//! Loop hierarchy resolution.
//!
//! A type may declare a parent link to another type in a loop hierarchy, or
//! be declared a hierarchy root itself. A loop-scoped parameter's ultimate
//! root decides which iteration scope the callable belongs to.

use crate::error::RegistrationError;
use groundwork_core::{MetadataProvider, TypeKey};
use std::collections::HashSet;

/// Resolves loop-scoped types to their hierarchy roots.
#[derive(Debug, Default)]
pub struct LoopResolver;

impl LoopResolver {
    /// Create a new resolver.
    pub fn new() -> Self {
        Self
    }

    /// Resolve the ultimate root of `ty` by following parent links.
    ///
    /// A type declared a root, or lacking both a parent link and a root
    /// marker, is its own root. The declaring metadata is cycle-free by
    /// construction; a cycle is still detected and reported instead of
    /// looping.
    pub fn resolve_root(
        &self,
        provider: &dyn MetadataProvider,
        ty: TypeKey,
    ) -> Result<TypeKey, RegistrationError> {
        let mut visited = HashSet::new();
        let mut current = ty;
        loop {
            if !visited.insert(current) {
                return Err(RegistrationError::HierarchyCycle {
                    type_name: provider.name_of(ty),
                });
            }
            let Some(desc) = provider.describe(current) else {
                return Err(RegistrationError::UndescribedType {
                    type_name: provider.name_of(current),
                });
            };
            if desc.loop_root {
                return Ok(current);
            }
            match desc.loop_parent {
                Some(parent) => current = parent,
                None => return Ok(current),
            }
        }
    }
}
