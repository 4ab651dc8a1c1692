//! Augmentation.
//!
//! An augment copies its body into the target node named by its
//! schema-node-identifier argument. Module-level augments carry absolute
//! targets and run as queued tasks; uses-level augments carry descendant
//! targets resolved against the freshly expanded copies. A target that
//! cannot be found yet blocks the task, since another pending expansion
//! may still create it; a target that was pruned turns the augment into
//! a no-op.

use tracing::debug;

use crate::errors::{InferenceError, ReactorError, SourceError};
use crate::reactor::{BuildState, CopyKind, CtxId, ModelPhase, PathTarget, TaskOutcome};
use crate::stmt::StatementKind;

const PHASE: ModelPhase = ModelPhase::FullDeclaration;

pub(crate) fn apply_augment(
    state: &mut BuildState,
    id: CtxId,
    relative_to: Option<CtxId>,
) -> Result<TaskOutcome, ReactorError> {
    let at = state.arena.get(id).at;
    let arg = state.arena.get(id).argument.clone().unwrap_or_default();
    let target = match state.resolve_schema_path(id, &arg, relative_to, PHASE)? {
        PathTarget::Found(target) => target,
        PathTarget::Pruned => return Ok(TaskOutcome::Done),
        PathTarget::Missing(detail) => {
            return Ok(TaskOutcome::Blocked(InferenceError::new(
                PHASE,
                at,
                format!("augment target \"{arg}\": {detail}"),
            )));
        }
    };

    let target_kind = state.arena.get(target).kind.clone();
    if !augmentable(&target_kind) {
        return Err(SourceError::new(
            at,
            format!("cannot augment \"{target_kind}\" node \"{arg}\""),
        )
        .into());
    }

    let members: Vec<CtxId> = state
        .arena
        .get(id)
        .children
        .iter()
        .copied()
        .filter(|&c| {
            let ctx = state.arena.get(c);
            !ctx.removed
                && !matches!(
                    ctx.kind,
                    StatementKind::When
                        | StatementKind::Description
                        | StatementKind::Reference
                        | StatementKind::Status
                        | StatementKind::IfFeature
                )
        })
        .collect();

    debug!(target = %arg, members = members.len(), "applying augment");
    let guarded = state
        .arena
        .first_child_of_kind(id, &StatementKind::When)
        .is_some();
    let cross_module = state.linker.namespace_owner(state.module_of(id))
        != state.linker.namespace_owner(state.module_of(target));

    for member in members {
        let member_kind = state.arena.get(member).kind.clone();
        let copy = state
            .arena
            .deep_copy(member, target, CopyKind::AddedByAugmentation);
        let attached = if target_kind == StatementKind::Choice
            && member_kind.is_data_definition()
            && member_kind != StatementKind::Case
        {
            // Shorthand alternative: wrap in a case of the same name,
            // carrying the augmenting module's namespace.
            state.wrap_in_case(copy)
        } else {
            copy
        };
        // A conditional augment may leave its mandatory nodes absent, so
        // instances of the target module alone stay valid. Unconditional
        // cross-module mandatory additions would break them.
        if cross_module && !guarded && member_kind.is_data_definition() && is_mandatory(state, copy)
        {
            let name = state
                .arena
                .local_name(copy)
                .unwrap_or_default()
                .to_string();
            state.arena.mark_removed(attached);
            state.sink.warn(
                at,
                format!(
                    "augment of \"{arg}\" adds mandatory node \"{name}\" from another module without a when condition; node skipped"
                ),
            );
            continue;
        }
        state.attach_copy(attached, target)?;
    }
    Ok(TaskOutcome::Done)
}

fn augmentable(kind: &StatementKind) -> bool {
    matches!(
        kind,
        StatementKind::Container
            | StatementKind::List
            | StatementKind::Choice
            | StatementKind::Case
            | StatementKind::Input
            | StatementKind::Output
            | StatementKind::Notification
            | StatementKind::Module
            | StatementKind::Submodule
    )
}

/// Whether instantiating the target without this node would be invalid:
/// mandatory true, a non-zero min-elements, or a non-presence container
/// holding such a node.
fn is_mandatory(state: &BuildState, id: CtxId) -> bool {
    let ctx = state.arena.get(id);
    match ctx.kind {
        StatementKind::Leaf
        | StatementKind::Choice
        | StatementKind::Anydata
        | StatementKind::Anyxml => state
            .arena
            .child_argument(id, &StatementKind::Mandatory)
            .is_some_and(|v| v == "true"),
        StatementKind::List | StatementKind::LeafList => state
            .arena
            .child_argument(id, &StatementKind::MinElements)
            .and_then(|v| v.parse::<u32>().ok())
            .is_some_and(|min| min > 0),
        StatementKind::Container => {
            state
                .arena
                .first_child_of_kind(id, &StatementKind::Presence)
                .is_none()
                && ctx.children.iter().any(|&c| {
                    let child = state.arena.get(c);
                    !child.removed
                        && child.kind.is_data_definition()
                        && is_mandatory(state, c)
                })
        }
        _ => false,
    }
}
