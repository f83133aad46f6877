//! The execution engine.
//!
//! Handlers and facts come in through one operation; the engine discovers
//! callables, evaluates which are ready (every non-intrinsic slot has a
//! matching fact), executes them in discovery order, and tracks completion
//! state. Strictly synchronous and single-threaded; a running callable may
//! reenter the engine to add further handlers and facts.

use crate::discovery::{discover_callables, Callable, SlotKind};
use crate::error::RegistrationError;
use crate::facts::FactStore;
use crate::family::FamilyRegistry;
use crate::hierarchy::LoopResolver;
use crate::object::{Argument, EngineObject, Invocation, Value};
use crate::state::{EngineState, EngineStatus, IncompletionReason, PendingCallable};
use groundwork_core::{IntrinsicRole, MetadataProvider, Monitor};
use std::sync::Arc;

struct HandlerEntry {
    object: Arc<dyn EngineObject>,
}

enum Readiness {
    /// Runnable now; for loop callables, the fact index of the root
    /// instance to execute for.
    Ready { root: Option<usize> },
    /// Blocked on the named requirement types.
    Waiting { missing: Vec<String> },
    /// Nothing left to run for the current facts.
    Done,
}

/// Fact-driven execution engine.
pub struct Engine {
    provider: Arc<dyn MetadataProvider>,
    families: FamilyRegistry,
    resolver: LoopResolver,
    facts: FactStore,
    handlers: Vec<HandlerEntry>,
    callables: Vec<Callable>,
    status: EngineStatus,
    failures: usize,
}

impl Engine {
    /// Create an engine over a metadata provider.
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self {
            provider,
            families: FamilyRegistry::new(),
            resolver: LoopResolver::new(),
            facts: FactStore::new(),
            handlers: Vec::new(),
            callables: Vec::new(),
            status: EngineStatus::Idle,
            failures: 0,
        }
    }

    /// Register an object as handler and/or fact.
    ///
    /// If the object's type declares marked methods, they are discovered and
    /// validated as callables; any validation failure is reported through
    /// `monitor`, rejects the object in full, and returns `false`. On
    /// success the object is also retained as a fact, so the same object can
    /// satisfy parameter slots and expose callables at once.
    pub fn add(&mut self, monitor: &dyn Monitor, object: Arc<dyn EngineObject>) -> bool {
        let provider = self.provider.clone();
        let key = object.type_key();
        if provider.describe(key).is_none() {
            let err = RegistrationError::UndescribedType {
                type_name: provider.name_of(key),
            };
            monitor.error(&err.to_string());
            return false;
        }

        let handler_index = self.handlers.len();
        let outcome = match discover_callables(
            provider.as_ref(),
            &self.families,
            &self.resolver,
            key,
            handler_index,
        ) {
            Ok(outcome) => outcome,
            Err(err) => {
                monitor.error(&err.to_string());
                tracing::debug!("rejected {}: {err}", provider.name_of(key));
                return false;
            }
        };

        self.families.commit(outcome.draft);
        if !outcome.callables.is_empty() {
            tracing::debug!(
                "registered handler {} with {} callable(s)",
                provider.name_of(key),
                outcome.callables.len()
            );
            self.handlers.push(HandlerEntry {
                object: object.clone(),
            });
            self.callables.extend(outcome.callables);
        }
        self.facts.add(Value::new(object));
        true
    }

    /// Whether at least one callable is ready to run right now.
    pub fn can_run(&self) -> bool {
        self.find_ready().is_some()
    }

    /// Run the earliest-discovered ready callable.
    ///
    /// Returns the outcome of the run: `true` on success, `false` when the
    /// callable faulted or nothing was ready. A fault is caught, reported
    /// through `monitor`, and leaves the engine consistent.
    pub fn run_one(&mut self, monitor: &dyn Monitor) -> bool {
        self.status = EngineStatus::Running;
        let Some((index, root)) = self.find_ready() else {
            monitor.info("No callable is ready to run.");
            self.refresh_status();
            return false;
        };

        let bound = {
            let callable = &self.callables[index];
            match self.bind_args(callable, root) {
                Some(args) => Some((
                    args,
                    self.handlers[callable.handler].object.clone(),
                    callable.method_name.clone(),
                    callable.declared_by,
                    callable.signature.clone(),
                )),
                None => None,
            }
        };
        let Some((args, handler, method_name, declared_by, signature)) = bound else {
            // Readiness said yes but binding failed; internal inconsistency.
            monitor.error("Failed to bind arguments for a ready callable.");
            self.failures += 1;
            self.refresh_status();
            return false;
        };

        // Consume the combination first so a fault cannot re-queue it.
        match root {
            Some(instance) => {
                self.callables[index].completed_roots.insert(instance);
            }
            None => self.callables[index].done = true,
        }

        monitor.info(&format!("Running '{signature}'."));
        tracing::debug!("running '{signature}'");
        let result = handler.invoke(Invocation {
            method: &method_name,
            declared_by,
            args: &args,
            engine: self,
            monitor,
        });

        let ok = match result {
            Ok(()) => true,
            Err(fault) => {
                self.failures += 1;
                monitor.error(&format!("Execution of '{signature}' failed: {fault}"));
                tracing::error!("'{signature}' failed: {fault}");
                false
            }
        };
        self.refresh_status();
        ok
    }

    /// Run ready callables to a fixpoint.
    ///
    /// Facts added reentrantly by a running callable are visible to later
    /// iterations of the same call. Returns the conjunction of all run
    /// outcomes but keeps draining ready work after an individual failure;
    /// vacuously `true` when nothing was ready.
    pub fn run_all(&mut self, monitor: &dyn Monitor) -> bool {
        self.status = EngineStatus::Running;
        let mut all_ok = true;
        while self.can_run() {
            all_ok &= self.run_one(monitor);
        }
        self.refresh_status();
        all_ok
    }

    /// Snapshot the engine's completion state.
    pub fn state(&self) -> EngineState {
        let mut pending = Vec::new();
        for callable in &self.callables {
            match self.readiness(callable) {
                Readiness::Done => {}
                Readiness::Ready { .. } => pending.push(PendingCallable {
                    signature: callable.signature.clone(),
                    ready: true,
                    waiting_on: Vec::new(),
                }),
                Readiness::Waiting { missing } => pending.push(PendingCallable {
                    signature: callable.signature.clone(),
                    ready: false,
                    waiting_on: missing,
                }),
            }
        }
        let reason = if pending.iter().any(|p| !p.ready) {
            IncompletionReason::HasWaitingMethods
        } else {
            IncompletionReason::None
        };
        EngineState {
            status: self.status,
            pending,
            reason,
            generated_at: chrono::Utc::now(),
        }
    }

    /// The metadata provider this engine consumes.
    pub fn provider(&self) -> &dyn MetadataProvider {
        self.provider.as_ref()
    }

    /// The engine-owned parameter family registry.
    pub fn families(&self) -> &FamilyRegistry {
        &self.families
    }

    /// Number of retained facts.
    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    /// Number of discovered callables.
    pub fn callable_count(&self) -> usize {
        self.callables.len()
    }

    fn find_ready(&self) -> Option<(usize, Option<usize>)> {
        self.callables
            .iter()
            .enumerate()
            .find_map(|(index, callable)| match self.readiness(callable) {
                Readiness::Ready { root } => Some((index, root)),
                _ => None,
            })
    }

    fn readiness(&self, callable: &Callable) -> Readiness {
        fn note(missing: &mut Vec<String>, name: String) {
            if !missing.contains(&name) {
                missing.push(name);
            }
        }

        let provider = self.provider.as_ref();
        let mut missing: Vec<String> = Vec::new();

        for slot in &callable.slots {
            let family = match slot.kind {
                SlotKind::Intrinsic(_) => continue,
                SlotKind::Family(family) | SlotKind::Loop { family, .. } => family,
            };
            let Some(declared) = self.families.get(family).map(|f| f.declared()) else {
                note(&mut missing, provider.name_of(slot.ty));
                continue;
            };
            if !self.facts.has_match(provider, declared) {
                note(&mut missing, provider.name_of(declared));
            }
        }

        let mut next_root = None;
        if let Some(root) = callable.loop_root {
            let instances = self.facts.matches(provider, root);
            if instances.is_empty() {
                note(&mut missing, provider.name_of(root));
            } else {
                next_root = instances
                    .into_iter()
                    .find(|i| !callable.completed_roots.contains(i));
            }
        }

        if !missing.is_empty() {
            return Readiness::Waiting { missing };
        }
        match callable.loop_root {
            None if callable.done => Readiness::Done,
            None => Readiness::Ready { root: None },
            Some(_) => match next_root {
                Some(instance) => Readiness::Ready {
                    root: Some(instance),
                },
                None => Readiness::Done,
            },
        }
    }

    fn bind_args(&self, callable: &Callable, root: Option<usize>) -> Option<Vec<Argument>> {
        let provider = self.provider.as_ref();
        let root_value = root.and_then(|i| self.facts.get(i));
        let mut args = Vec::with_capacity(callable.slots.len());
        for slot in &callable.slots {
            let arg = match slot.kind {
                SlotKind::Intrinsic(IntrinsicRole::Engine) => Argument::Engine,
                SlotKind::Intrinsic(IntrinsicRole::Monitor) => Argument::Monitor,
                SlotKind::Family(family) => {
                    let declared = self.families.get(family)?.declared();
                    Argument::Fact(self.facts.first_match(provider, declared)?.clone())
                }
                SlotKind::Loop { family, .. } => {
                    let declared = self.families.get(family)?.declared();
                    let bound = match root_value {
                        // The current root instance itself, when it fits the slot.
                        Some(instance) if provider.closure(instance.key()).contains(&slot.ty) => {
                            instance.clone()
                        }
                        _ => self.facts.first_match(provider, declared)?.clone(),
                    };
                    Argument::Fact(bound)
                }
            };
            args.push(arg);
        }
        Some(args)
    }

    fn refresh_status(&mut self) {
        let mut any_waiting = false;
        let mut any_ready = false;
        for callable in &self.callables {
            match self.readiness(callable) {
                Readiness::Waiting { .. } => any_waiting = true,
                Readiness::Ready { .. } => any_ready = true,
                Readiness::Done => {}
            }
        }
        self.status = if self.failures > 0 {
            EngineStatus::Failed
        } else if any_waiting {
            EngineStatus::UncompletedWithWaiting
        } else if any_ready {
            EngineStatus::Running
        } else {
            EngineStatus::SuccessfullyCompleted
        };
    }
}
