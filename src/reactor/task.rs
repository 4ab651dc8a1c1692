//! Deferred resolution actions.
//!
//! The full-declaration phase runs as an explicit work queue: every uses,
//! top-level augment and deviation becomes a [`Task`]. A pass over the queue
//! runs each task once; a task either completes, reports itself blocked on a
//! prerequisite that another task may still satisfy, or fails the build.
//! Blocked tasks are re-queued until a pass makes no progress.

use super::arena::CtxId;
use crate::errors::InferenceError;

/// One deferred resolution action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
    ExpandUses(CtxId),
    ApplyAugment(CtxId),
    ApplyDeviation(CtxId),
}

impl Task {
    pub fn ctx(&self) -> CtxId {
        match self {
            Task::ExpandUses(id) | Task::ApplyAugment(id) | Task::ApplyDeviation(id) => *id,
        }
    }
}

/// Result of running one task once. Hard failures propagate as `Err`.
#[derive(Clone, Debug)]
pub enum TaskOutcome {
    Done,
    /// Prerequisite unmet; the cause is kept verbatim for the aggregate
    /// unresolved-modifiers error should the queue stall.
    Blocked(InferenceError),
}
