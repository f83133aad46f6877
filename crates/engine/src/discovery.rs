//! Handler and callable discovery.
//!
//! Given a handler object's concrete type, discovery enumerates its marked
//! methods in member-resolution order and binds each accepted method to an
//! ordered list of resolved parameter slots. Discovery is atomic per
//! handler: the first failing method rejects the whole handler and nothing
//! is retained.

use crate::error::RegistrationError;
use crate::family::{FamilyDraft, FamilyId, FamilyRegistry};
use crate::hierarchy::LoopResolver;
use groundwork_core::{IntrinsicRole, MetadataProvider, MethodDesc, TypeKey};
use std::collections::HashSet;

/// How one parameter slot is satisfied at invocation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotKind {
    /// Supplied by the engine itself; never matched against facts.
    Intrinsic(IntrinsicRole),
    /// Bound to the first matching fact of the family.
    Family(FamilyId),
    /// Bound within the iteration scope of the resolved hierarchy root.
    Loop {
        /// The family the slot's declared type resolved to.
        family: FamilyId,
        /// The resolved hierarchy root.
        root: TypeKey,
    },
}

/// One resolved parameter slot.
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) name: String,
    pub(crate) ty: TypeKey,
    pub(crate) kind: SlotKind,
}

/// One discovered marked method, bound to its resolved slots.
///
/// Immutable after discovery except for consumption bookkeeping.
#[derive(Debug)]
pub(crate) struct Callable {
    /// Index of the owning handler entry.
    pub(crate) handler: usize,
    /// Rendered signature, used in diagnostics and snapshots.
    pub(crate) signature: String,
    /// Method name, passed to the handler on invocation.
    pub(crate) method_name: String,
    /// Declaring type, disambiguates hidden members on invocation.
    pub(crate) declared_by: TypeKey,
    /// Resolved slots in parameter declaration order.
    pub(crate) slots: Vec<Slot>,
    /// Common hierarchy root of the loop slots, if any.
    pub(crate) loop_root: Option<TypeKey>,
    /// Whether a non-loop callable has executed.
    pub(crate) done: bool,
    /// Fact indices of the root instances a loop callable has executed for.
    pub(crate) completed_roots: HashSet<usize>,
}

/// Result of a successful discovery pass: the callables plus the family
/// draft that must be committed to make their slot resolutions permanent.
#[derive(Debug)]
pub(crate) struct DiscoveryOutcome {
    pub(crate) callables: Vec<Callable>,
    pub(crate) draft: FamilyDraft,
}

/// Discover the callables of a handler type.
pub(crate) fn discover_callables(
    provider: &dyn MetadataProvider,
    families: &FamilyRegistry,
    resolver: &LoopResolver,
    handler_ty: TypeKey,
    handler_index: usize,
) -> Result<DiscoveryOutcome, RegistrationError> {
    let methods = resolution_order(provider, handler_ty)?;
    let mut draft = families.draft();
    let mut callables = Vec::new();

    for method in &methods {
        if method.flags.special {
            continue;
        }
        let signature = method.signature(provider);
        if method.flags.open_generic {
            return Err(RegistrationError::OpenGenericMethod { signature });
        }
        if method.flags.asynchronous {
            return Err(RegistrationError::AsyncMethod { signature });
        }

        let mut slots: Vec<Slot> = Vec::with_capacity(method.params.len());
        let mut seen_roles: Vec<IntrinsicRole> = Vec::new();
        for param in &method.params {
            let Some(desc) = provider.describe(param.ty) else {
                return Err(RegistrationError::UndescribedType {
                    type_name: provider.name_of(param.ty),
                });
            };
            if let Some(role) = desc.intrinsic {
                if seen_roles.contains(&role) {
                    return Err(RegistrationError::RepeatedIntrinsic {
                        type_name: desc.name.clone(),
                        signature,
                    });
                }
                seen_roles.push(role);
                slots.push(Slot {
                    name: param.name.clone(),
                    ty: param.ty,
                    kind: SlotKind::Intrinsic(role),
                });
                continue;
            }

            let site = format!("'{}' of '{}'", param.name, signature);
            let family =
                families.resolve_draft(provider, &mut draft, param.ty, &site, &signature)?;
            if let Some(earlier) = slots.iter().find(|s| match s.kind {
                SlotKind::Family(f) | SlotKind::Loop { family: f, .. } => f == family,
                SlotKind::Intrinsic(_) => false,
            }) {
                return Err(RegistrationError::DuplicateParameterTypes {
                    signature,
                    first: earlier.name.clone(),
                    second: param.name.clone(),
                    type_name: provider.name_of(param.ty),
                });
            }

            let kind = if param.loop_scoped {
                let root = resolver.resolve_root(provider, param.ty)?;
                SlotKind::Loop { family, root }
            } else {
                SlotKind::Family(family)
            };
            slots.push(Slot {
                name: param.name.clone(),
                ty: param.ty,
                kind,
            });
        }

        let loop_slots: Vec<(&Slot, TypeKey)> = slots
            .iter()
            .filter_map(|s| match s.kind {
                SlotKind::Loop { root, .. } => Some((s, root)),
                _ => None,
            })
            .collect();
        if let Some(((first, first_root), rest)) = loop_slots.split_first() {
            for (other, other_root) in rest {
                if other_root != first_root {
                    return Err(RegistrationError::MismatchedLoopRoots {
                        signature,
                        first_param: first.name.clone(),
                        first_type: provider.name_of(first.ty),
                        first_root: provider.name_of(*first_root),
                        second_param: other.name.clone(),
                        second_type: provider.name_of(other.ty),
                        second_root: provider.name_of(*other_root),
                    });
                }
            }
        }
        let loop_root = loop_slots.first().map(|(_, root)| *root);

        callables.push(Callable {
            handler: handler_index,
            signature,
            method_name: method.name.clone(),
            declared_by: method.declared_by,
            slots,
            loop_root,
            done: false,
            completed_roots: HashSet::new(),
        });
    }

    tracing::debug!(
        "discovered {} callable(s) for {}",
        callables.len(),
        provider.name_of(handler_ty)
    );
    Ok(DiscoveryOutcome { callables, draft })
}

/// Marked methods of a type in member-resolution order: base members first,
/// with overridden base members replaced by the overriding declaration and
/// hidden (shadowed) base members kept alongside the hiding one.
fn resolution_order(
    provider: &dyn MetadataProvider,
    ty: TypeKey,
) -> Result<Vec<MethodDesc>, RegistrationError> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut current = Some(ty);
    while let Some(key) = current {
        if !seen.insert(key) {
            break;
        }
        let Some(desc) = provider.describe(key) else {
            return Err(RegistrationError::UndescribedType {
                type_name: provider.name_of(key),
            });
        };
        chain.push(desc);
        current = desc.base;
    }
    chain.reverse();

    let all: Vec<MethodDesc> = chain
        .iter()
        .flat_map(|desc| desc.methods.iter().cloned())
        .collect();
    let kept: Vec<MethodDesc> = all
        .iter()
        .enumerate()
        .filter(|(i, method)| {
            !all[i + 1..]
                .iter()
                .any(|later| later.same_slot(method) && !later.flags.shadows)
        })
        .map(|(_, method)| method.clone())
        .collect();
    Ok(kept)
}
