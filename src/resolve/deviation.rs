//! Deviation.
//!
//! A deviation rewrites another module's node in place: removing it
//! entirely (`not-supported`), or adding, replacing and deleting individual
//! properties. Deviations are the one modification a module may never apply
//! to itself, and the build configuration can restrict which modules may
//! deviate which. Mismatched replace/delete arguments degrade to warnings
//! where the effective result is still well-formed.

use tracing::debug;

use crate::errors::{InferenceError, ReactorError, SourceError};
use crate::reactor::{BuildState, CtxId, ModelPhase, PathTarget, TaskOutcome};
use crate::stmt::StatementKind;

const PHASE: ModelPhase = ModelPhase::FullDeclaration;

pub(crate) fn apply_deviation(
    state: &mut BuildState,
    id: CtxId,
) -> Result<TaskOutcome, ReactorError> {
    let at = state.arena.get(id).at;
    let arg = state.arena.get(id).argument.clone().unwrap_or_default();
    let target = match state.resolve_schema_path(id, &arg, None, PHASE)? {
        PathTarget::Found(target) => target,
        PathTarget::Pruned => return Ok(TaskOutcome::Done),
        PathTarget::Missing(detail) => {
            return Ok(TaskOutcome::Blocked(InferenceError::new(
                PHASE,
                at,
                format!("deviation target \"{arg}\": {detail}"),
            )));
        }
    };

    let deviating_module = state.linker.namespace_owner(state.module_of(id));
    let deviated_module = state.linker.namespace_owner(state.module_of(target));
    if deviating_module == deviated_module {
        return Err(InferenceError::new(
            PHASE,
            at,
            format!(
                "module \"{}\" deviates its own node \"{arg}\"",
                state.linker.module(deviating_module).name
            ),
        )
        .into());
    }
    let deviated_name = state.linker.module(deviated_module).name.clone();
    let deviating_name = state.linker.module(deviating_module).name.clone();
    if !state
        .config
        .deviations
        .allows(&deviated_name, &deviating_name)
    {
        debug!(
            deviated = %deviated_name,
            deviating = %deviating_name,
            "deviation skipped by policy"
        );
        return Ok(TaskOutcome::Done);
    }

    let deviates: Vec<CtxId> = state
        .arena
        .children_of_kind(id, &StatementKind::Deviate)
        .collect();
    let not_supported = deviates.iter().any(|&d| {
        state.arena.get(d).argument.as_deref() == Some("not-supported")
    });
    if not_supported {
        if deviates.len() > 1 {
            return Err(SourceError::new(
                at,
                format!(
                    "deviation of \"{arg}\" combines not-supported with other deviates"
                ),
            )
            .into());
        }
        debug!(target = %arg, "deviate not-supported");
        state.arena.mark_removed(target);
        return Ok(TaskOutcome::Done);
    }

    for deviate in deviates {
        let deviate_at = state.arena.get(deviate).at;
        let deviate_kind = state.arena.get(deviate).argument.clone().unwrap_or_default();
        match deviate_kind.as_str() {
            "add" => deviate_add(state, deviate, target, &arg)?,
            "replace" => deviate_replace(state, deviate, target, &arg)?,
            "delete" => deviate_delete(state, deviate, target, &arg)?,
            other => {
                return Err(SourceError::new(
                    deviate_at,
                    format!("unknown deviate kind \"{other}\""),
                )
                .into());
            }
        }
    }
    Ok(TaskOutcome::Done)
}

fn property_subs(state: &BuildState, deviate: CtxId) -> Vec<CtxId> {
    state
        .arena
        .get(deviate)
        .children
        .iter()
        .copied()
        .filter(|&c| !state.arena.get(c).removed)
        .collect()
}

fn copy_in(state: &mut BuildState, sub: CtxId, target: CtxId) {
    let copy_kind = state.arena.get(target).copy;
    let copy = state.arena.deep_copy(sub, target, copy_kind);
    state.arena.get_mut(target).children.push(copy);
}

/// `deviate add`: the property must not already be present when its
/// cardinality under the target admits only one instance.
fn deviate_add(
    state: &mut BuildState,
    deviate: CtxId,
    target: CtxId,
    path: &str,
) -> Result<(), ReactorError> {
    let target_kind = state.arena.get(target).kind.clone();
    for sub in property_subs(state, deviate) {
        let kind = state.arena.get(sub).kind.clone();
        let single = state
            .registry
            .cardinality(&target_kind, &kind)
            .is_none_or(|c| c.is_single());
        if single && state.arena.first_child_of_kind(target, &kind).is_some() {
            return Err(SourceError::new(
                state.arena.get(sub).at,
                format!(
                    "deviate add of \"{kind}\" to \"{path}\": property already present"
                ),
            )
            .into());
        }
        copy_in(state, sub, target);
    }
    Ok(())
}

/// `deviate replace`: a missing original is a hard failure where the
/// property shapes validity (config, mandatory, a leaf's default, type),
/// a warning where the result is merely surprising.
fn deviate_replace(
    state: &mut BuildState,
    deviate: CtxId,
    target: CtxId,
    path: &str,
) -> Result<(), ReactorError> {
    let target_kind = state.arena.get(target).kind.clone();
    for sub in property_subs(state, deviate) {
        let kind = state.arena.get(sub).kind.clone();
        let at = state.arena.get(sub).at;
        let existing: Vec<CtxId> = state.arena.children_of_kind(target, &kind).collect();
        if existing.is_empty() {
            let soft = matches!(kind, StatementKind::Units)
                || (kind == StatementKind::Default && target_kind == StatementKind::LeafList);
            let message = format!(
                "deviate replace of \"{kind}\" on \"{path}\": no such property to replace"
            );
            if soft {
                state.sink.warn(at, message);
                copy_in(state, sub, target);
                continue;
            }
            return Err(SourceError::new(at, message).into());
        }
        for old in existing {
            state.arena.mark_removed(old);
        }
        copy_in(state, sub, target);
    }
    Ok(())
}

/// `deviate delete`: removes the property instance whose argument matches;
/// a mismatch leaves the target untouched and warns.
fn deviate_delete(
    state: &mut BuildState,
    deviate: CtxId,
    target: CtxId,
    path: &str,
) -> Result<(), ReactorError> {
    for sub in property_subs(state, deviate) {
        let kind = state.arena.get(sub).kind.clone();
        let argument = state.arena.get(sub).argument.clone();
        let at = state.arena.get(sub).at;
        let matched = state
            .arena
            .children_of_kind(target, &kind)
            .find(|&c| state.arena.get(c).argument == argument);
        match matched {
            Some(old) => state.arena.mark_removed(old),
            None => {
                state.sink.warn(
                    at,
                    format!(
                        "deviate delete of \"{kind}\" on \"{path}\": no matching property"
                    ),
                );
            }
        }
    }
    Ok(())
}
