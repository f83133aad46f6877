//! Portable descriptors for types, methods, and parameters.
//!
//! The engine never inspects host types directly; it works from these
//! descriptors, produced by whatever metadata system the host uses.

use crate::key::TypeKey;
use crate::provider::MetadataProvider;
use serde::{Deserialize, Serialize};

/// Structural shape of a described type.
///
/// Only [`Regular`](TypeShape::Regular) types can key facts; every other
/// shape is rejected when it appears as a non-intrinsic parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeShape {
    /// An ordinary nominal type.
    Regular,
    /// The universal top type that every other type generalizes to.
    Top,
    /// A value type.
    Value,
    /// A by-reference parameter type.
    ByRef,
    /// A by-ref-like type that cannot escape to the heap.
    ByRefLike,
    /// An array type.
    Array,
    /// An open (unbound) generic type.
    OpenGeneric,
}

impl TypeShape {
    /// Whether a parameter of this shape can be satisfied by facts.
    pub fn fact_eligible(self) -> bool {
        matches!(self, TypeShape::Regular)
    }

    /// Short description used in rejection diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TypeShape::Regular => "a regular type",
            TypeShape::Top => "the universal top type",
            TypeShape::Value => "a value type",
            TypeShape::ByRef => "a by-ref type",
            TypeShape::ByRefLike => "a by-ref-like type",
            TypeShape::Array => "an array type",
            TypeShape::OpenGeneric => "an open generic type",
        }
    }
}

/// Parameter types the engine supplies itself instead of matching facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntrinsicRole {
    /// The diagnostic monitor passed into the running operation.
    Monitor,
    /// The engine instance itself, for reentrant additions.
    Engine,
}

/// Everything the engine needs to know about one type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDesc {
    /// The key the provider issued for this type.
    pub key: TypeKey,
    /// Display name used in diagnostics.
    pub name: String,
    /// Structural shape.
    pub shape: TypeShape,
    /// Single base type, if any.
    pub base: Option<TypeKey>,
    /// Implemented abstractions, in declaration order.
    pub implements: Vec<TypeKey>,
    /// Set when the type is supplied by the engine rather than by facts.
    pub intrinsic: Option<IntrinsicRole>,
    /// Parent link in the loop hierarchy, if the type participates in one.
    pub loop_parent: Option<TypeKey>,
    /// Whether this type is declared a loop hierarchy root.
    pub loop_root: bool,
    /// Marked methods declared by this type itself, in declaration order.
    ///
    /// Inherited members are not listed here; callable discovery walks the
    /// base chain and applies the host's member-resolution rules.
    pub methods: Vec<MethodDesc>,
}

/// One marked method, as described by the metadata provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDesc {
    /// Method name.
    pub name: String,
    /// The type that declares the method.
    pub declared_by: TypeKey,
    /// Ordered parameter descriptors.
    pub params: Vec<ParamDesc>,
    /// Member flags.
    pub flags: MethodFlags,
}

impl MethodDesc {
    /// Start describing a method declared by `declared_by`.
    pub fn new(name: impl Into<String>, declared_by: TypeKey) -> Self {
        Self {
            name: name.into(),
            declared_by,
            params: Vec::new(),
            flags: MethodFlags::default(),
        }
    }

    /// Append an ordinary parameter.
    pub fn param(mut self, name: impl Into<String>, ty: TypeKey) -> Self {
        self.params.push(ParamDesc {
            name: name.into(),
            ty,
            loop_scoped: false,
        });
        self
    }

    /// Append a loop-scoped parameter.
    pub fn loop_param(mut self, name: impl Into<String>, ty: TypeKey) -> Self {
        self.params.push(ParamDesc {
            name: name.into(),
            ty,
            loop_scoped: true,
        });
        self
    }

    /// Mark the method special-name (skipped by discovery).
    pub fn special(mut self) -> Self {
        self.flags.special = true;
        self
    }

    /// Mark the method an open generic method.
    pub fn open_generic(mut self) -> Self {
        self.flags.open_generic = true;
        self
    }

    /// Mark the method asynchronous.
    pub fn asynchronous(mut self) -> Self {
        self.flags.asynchronous = true;
        self
    }

    /// Mark the method as hiding a base member instead of overriding it.
    pub fn shadows(mut self) -> Self {
        self.flags.shadows = true;
        self
    }

    /// Render the method as `Owner.name(Type param, ...)` for diagnostics.
    pub fn signature(&self, provider: &dyn MetadataProvider) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| format!("{} {}", provider.name_of(p.ty), p.name))
            .collect();
        format!(
            "{}.{}({})",
            provider.name_of(self.declared_by),
            self.name,
            params.join(", ")
        )
    }

    /// Whether two descriptors describe the same member slot (name plus
    /// ordered parameter types).
    pub fn same_slot(&self, other: &MethodDesc) -> bool {
        self.name == other.name
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(other.params.iter())
                .all(|(a, b)| a.ty == b.ty)
    }
}

/// Member flags carried by a [`MethodDesc`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MethodFlags {
    /// Metadata-only/special-name member; discovery skips it silently.
    pub special: bool,
    /// Still-open generic method; rejects the handler.
    pub open_generic: bool,
    /// Asynchronous method; rejects the handler.
    pub asynchronous: bool,
    /// Hides the matching base member instead of overriding it.
    pub shadows: bool,
}

/// One parameter of a marked method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDesc {
    /// Parameter name.
    pub name: String,
    /// Declared parameter type.
    pub ty: TypeKey,
    /// Whether the parameter is loop-scoped.
    pub loop_scoped: bool,
}
