//! Objects registered with the engine, and the callable invocation surface.

use crate::engine::Engine;
use groundwork_core::{Monitor, TypeKey};
use std::any::Any;
use std::sync::Arc;

/// Anything that can be added to the engine.
///
/// Every added object names its concrete type via [`type_key`] so the engine
/// can look it up with the metadata provider. Objects whose type declares
/// marked methods additionally override [`invoke`] to dispatch them; objects
/// that only carry data leave the default in place.
///
/// [`type_key`]: EngineObject::type_key
/// [`invoke`]: EngineObject::invoke
pub trait EngineObject: Any + Send + Sync {
    /// The provider key of this object's concrete type.
    fn type_key(&self) -> TypeKey;

    /// The object as `Any`, for fact downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Run one of the object's callables.
    ///
    /// Called with the method name and declaring type from the discovered
    /// descriptor and the bound arguments in declaration order. A fault
    /// returned here is caught and logged by the engine; it never corrupts
    /// engine state.
    fn invoke(&self, call: Invocation<'_>) -> anyhow::Result<()> {
        let _ = &call;
        Err(anyhow::anyhow!(
            "object of {} does not implement any callable methods",
            self.type_key()
        ))
    }
}

/// Cheap-clone handle to a registered object.
#[derive(Clone)]
pub struct Value {
    object: Arc<dyn EngineObject>,
}

impl Value {
    /// Wrap an object.
    pub fn new(object: Arc<dyn EngineObject>) -> Self {
        Self { object }
    }

    /// The provider key of the wrapped object's concrete type.
    pub fn key(&self) -> TypeKey {
        self.object.type_key()
    }

    /// Borrow the wrapped object.
    pub fn object(&self) -> &dyn EngineObject {
        self.object.as_ref()
    }

    /// Downcast the wrapped object to a concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.object.as_any().downcast_ref::<T>()
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Value").field("key", &self.key()).finish()
    }
}

/// One bound argument of a callable, in parameter declaration order.
#[derive(Debug, Clone)]
pub enum Argument {
    /// The engine itself; reach it through [`Invocation::engine`].
    Engine,
    /// The diagnostic monitor; reach it through [`Invocation::monitor`].
    Monitor,
    /// A fact bound from the store.
    Fact(Value),
}

impl Argument {
    /// The bound fact, if this is a fact slot.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Argument::Fact(value) => Some(value),
            _ => None,
        }
    }

    /// Downcast the bound fact to a concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value().and_then(|v| v.downcast_ref::<T>())
    }
}

/// Everything a callable receives when it runs.
pub struct Invocation<'a> {
    /// Name of the method being invoked.
    pub method: &'a str,
    /// The type that declared the method; disambiguates hidden members.
    pub declared_by: TypeKey,
    /// Bound arguments, one per declared parameter.
    pub args: &'a [Argument],
    /// The engine, for reentrant additions while the callable runs.
    pub engine: &'a mut Engine,
    /// The monitor the running operation was called with.
    pub monitor: &'a dyn Monitor,
}
