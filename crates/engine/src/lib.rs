//! Groundwork engine: fact-driven execution.
//!
//! Independent handler objects expose callable procedures gated by the
//! availability of typed facts. The engine learns about handlers and facts
//! incrementally, validates parameter requirements against a globally
//! disjoint family registry, executes ready callables in discovery order,
//! and reports a structured completion state.

#![warn(missing_docs)]

mod discovery;
mod engine;
mod error;
mod facts;
mod family;
mod hierarchy;
mod object;
mod state;

pub use engine::Engine;
pub use error::RegistrationError;
pub use family::{Family, FamilyDraft, FamilyId, FamilyRegistry};
pub use hierarchy::LoopResolver;
pub use object::{Argument, EngineObject, Invocation, Value};
pub use state::{EngineState, EngineStatus, IncompletionReason, PendingCallable, Time};
