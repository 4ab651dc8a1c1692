//! Grouping expansion.
//!
//! A `uses` statement is replaced by a copy of the referenced grouping's
//! body, attached to the parent of the uses. Copied contexts keep their
//! original QName and module attribution and point back at the grouping
//! body through the provenance chain. Nested uses inside the copied body
//! are expanded inline; a grouping reaching itself through any chain of
//! uses fails the build.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::errors::{InferenceError, ReactorError, SourceError};
use crate::reactor::{BuildState, CopyKind, CtxId, ModelPhase, TaskOutcome};
use crate::registry::NamespaceKind;
use crate::resolve::augment;
use crate::stmt::StatementKind;

const PHASE: ModelPhase = ModelPhase::FullDeclaration;

/// Run one uses-expansion task.
pub(crate) fn expand_uses(state: &mut BuildState, id: CtxId) -> Result<TaskOutcome, ReactorError> {
    let mut stack = Vec::new();
    expand(state, id, &mut stack)
}

fn expand(
    state: &mut BuildState,
    id: CtxId,
    stack: &mut Vec<CtxId>,
) -> Result<TaskOutcome, ReactorError> {
    if state.arena.get(id).uses_expanded {
        return Ok(TaskOutcome::Done);
    }
    let at = state.arena.get(id).at;
    let name = state
        .arena
        .get(id)
        .argument
        .clone()
        .unwrap_or_default();
    let Some(grouping) = state.resolve_ns_ref(id, NamespaceKind::Grouping, &name, PHASE)? else {
        return Ok(TaskOutcome::Blocked(InferenceError::new(
            PHASE,
            at,
            format!("grouping \"{name}\" not found"),
        )));
    };
    let body = state.arena.root_original(grouping);
    if stack.contains(&body) {
        return Err(InferenceError::new(
            PHASE,
            at,
            format!("grouping \"{name}\" is used within its own definition"),
        )
        .into());
    }

    let Some(parent) = state.arena.get(id).parent else {
        return Err(InferenceError::new(PHASE, at, "uses statement has no parent".to_string())
            .into());
    };

    debug!(grouping = %name, "expanding uses");
    let members: Vec<CtxId> = state
        .arena
        .get(grouping)
        .children
        .iter()
        .copied()
        .filter(|&c| {
            let ctx = state.arena.get(c);
            !ctx.removed
                && !matches!(
                    ctx.kind,
                    StatementKind::Description
                        | StatementKind::Reference
                        | StatementKind::Status
                )
        })
        .collect();

    stack.push(body);
    let mut copies = Vec::with_capacity(members.len());
    for member in members {
        let copy = state.arena.deep_copy(member, parent, CopyKind::AddedByUses);
        state.attach_copy(copy, parent)?;
        copies.push(copy);
    }
    // Nested uses copied from an unexpanded grouping body expand here;
    // their originals inside the body have their own queued task.
    for &copy in &copies {
        expand_nested(state, copy, stack)?;
    }
    stack.pop();

    state.arena.get_mut(id).uses_expanded = true;

    let refines: Vec<CtxId> = state
        .arena
        .children_of_kind(id, &StatementKind::Refine)
        .collect();
    for refine in refines {
        apply_refine(state, refine, parent)?;
    }

    let augments: Vec<CtxId> = state
        .arena
        .children_of_kind(id, &StatementKind::Augment)
        .collect();
    for aug in augments {
        match augment::apply_augment(state, aug, Some(parent))? {
            TaskOutcome::Done => {}
            TaskOutcome::Blocked(cause) => return Err(cause.into()),
        }
    }

    Ok(TaskOutcome::Done)
}

fn expand_nested(
    state: &mut BuildState,
    id: CtxId,
    stack: &mut Vec<CtxId>,
) -> Result<(), ReactorError> {
    if state.arena.get(id).removed {
        return Ok(());
    }
    if state.arena.get(id).kind == StatementKind::Uses && !state.arena.get(id).uses_expanded {
        // Inside an expansion there is no later pass to wait for.
        match expand(state, id, stack)? {
            TaskOutcome::Done => {}
            TaskOutcome::Blocked(cause) => return Err(cause.into()),
        }
    }
    let children = state.arena.get(id).children.clone();
    for child in children {
        expand_nested(state, child, stack)?;
    }
    Ok(())
}

// ----------------------------------------------------------------------
// Refinement
// ----------------------------------------------------------------------

/// Apply one refine statement to the freshly copied nodes under `parent`.
fn apply_refine(
    state: &mut BuildState,
    refine: CtxId,
    parent: CtxId,
) -> Result<(), ReactorError> {
    let at = state.arena.get(refine).at;
    let arg = state
        .arena
        .get(refine)
        .argument
        .clone()
        .unwrap_or_default();
    let target = match state.resolve_schema_path(refine, &arg, Some(parent), PHASE)? {
        crate::reactor::PathTarget::Found(target) => target,
        crate::reactor::PathTarget::Pruned => return Ok(()),
        crate::reactor::PathTarget::Missing(detail) => {
            return Err(InferenceError::new(
                PHASE,
                at,
                format!("refine target \"{arg}\" not found: {detail}"),
            )
            .into());
        }
    };
    let target_kind = state.arena.get(target).kind.clone();

    let subs: Vec<CtxId> = state
        .arena
        .get(refine)
        .children
        .iter()
        .copied()
        .filter(|&c| !state.arena.get(c).removed)
        .collect();
    let mut cleared: FxHashSet<StatementKind> = FxHashSet::default();
    for sub in subs {
        let kind = state.arena.get(sub).kind.clone();
        if !refine_allowed(&kind, &target_kind) {
            return Err(SourceError::new(
                state.arena.get(sub).at,
                format!("cannot refine \"{target_kind}\" node \"{arg}\" with \"{kind}\""),
            )
            .into());
        }
        let replaces = !matches!(kind, StatementKind::Must | StatementKind::IfFeature);
        if replaces && cleared.insert(kind.clone()) {
            let existing: Vec<CtxId> =
                state.arena.children_of_kind(target, &kind).collect();
            for old in existing {
                state.arena.mark_removed(old);
            }
        }
        let copy_kind = state.arena.get(target).copy;
        let copy = state.arena.deep_copy(sub, target, copy_kind);
        state.arena.get_mut(target).children.push(copy);
    }
    Ok(())
}

/// Which refine substatements apply to which target kinds, following the
/// per-kind tables of the statement grammar.
fn refine_allowed(sub: &StatementKind, target: &StatementKind) -> bool {
    match sub {
        StatementKind::Description
        | StatementKind::Reference
        | StatementKind::Config
        | StatementKind::IfFeature => target.is_data_definition() || *target == StatementKind::Case,
        StatementKind::Must => matches!(
            target,
            StatementKind::Container
                | StatementKind::Leaf
                | StatementKind::LeafList
                | StatementKind::List
                | StatementKind::Anydata
                | StatementKind::Anyxml
        ),
        StatementKind::Presence => *target == StatementKind::Container,
        StatementKind::Default => matches!(
            target,
            StatementKind::Leaf | StatementKind::LeafList | StatementKind::Choice
        ),
        StatementKind::Mandatory => matches!(
            target,
            StatementKind::Leaf
                | StatementKind::Choice
                | StatementKind::Anydata
                | StatementKind::Anyxml
        ),
        StatementKind::MinElements | StatementKind::MaxElements => {
            matches!(target, StatementKind::LeafList | StatementKind::List)
        }
        _ => false,
    }
}
