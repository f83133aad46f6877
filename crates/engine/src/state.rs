//! Engine completion state.
//!
//! [`EngineState`] is an immutable, on-demand snapshot of everything the
//! engine has discovered but not yet run, plus an overall incompletion
//! reason. Hosts can serialize it for reporting.

use serde::Serialize;

/// Timestamp type used by snapshots.
pub type Time = chrono::DateTime<chrono::Utc>;

/// Lifecycle state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineStatus {
    /// No run operation has been invoked yet.
    Idle,
    /// A run operation is in progress.
    Running,
    /// Every discovered callable has executed and none failed.
    SuccessfullyCompleted,
    /// Nothing failed, but callables remain waiting for facts.
    UncompletedWithWaiting,
    /// At least one executed callable failed.
    Failed,
}

/// Why the engine is not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IncompletionReason {
    /// Nothing remains to wait for.
    None,
    /// At least one callable still lacks required facts.
    HasWaitingMethods,
}

/// One discovered-but-unsatisfied callable in a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct PendingCallable {
    /// Rendered signature of the callable.
    pub signature: String,
    /// Whether the callable could run right now.
    pub ready: bool,
    /// Display names of the requirement types still lacking facts.
    pub waiting_on: Vec<String>,
}

/// Immutable snapshot of the engine's completion state.
#[derive(Debug, Clone, Serialize)]
pub struct EngineState {
    /// Lifecycle state at snapshot time.
    pub status: EngineStatus,
    /// Every discovered callable that has not yet run to completion.
    pub pending: Vec<PendingCallable>,
    /// Overall incompletion reason.
    pub reason: IncompletionReason,
    /// When the snapshot was taken.
    pub generated_at: Time,
}

impl EngineState {
    /// Whether no discovered callable remains unrun.
    pub fn is_completed(&self) -> bool {
        self.pending.is_empty()
    }

    /// Whether everything ran and nothing failed.
    pub fn is_successfully_completed(&self) -> bool {
        self.is_completed() && !self.has_error()
    }

    /// Whether any executed callable failed.
    pub fn has_error(&self) -> bool {
        self.status == EngineStatus::Failed
    }

    /// Serialize the snapshot to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
