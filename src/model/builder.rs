//! Freezing the context graph into effective nodes.
//!
//! Runs after the full-declaration fixpoint: every uses is expanded, every
//! augment and deviation folded in, every removal marked. The builder walks
//! the surviving contexts bottom-up and materializes immutable nodes,
//! computing config inheritance and validating list keys along the way.

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::base::{QName, Revision, SchemaPath};
use crate::errors::{InferenceError, ReactorError};
use crate::model::context::EffectiveSchemaContext;
use crate::model::node::{EffectiveKind, EffectiveNode, ModuleRevision, NodeMeta, NodeStatus};
use crate::reactor::{BuildState, CtxId, ModelPhase};
use crate::resolve::{IdentityGraph, ResolvedType, ResolvedTypes};
use crate::stmt::StatementKind;

const PHASE: ModelPhase = ModelPhase::EffectiveModel;

pub(crate) fn build_context(
    state: &BuildState,
    identities: &IdentityGraph,
    types: &ResolvedTypes,
) -> Result<EffectiveSchemaContext, ReactorError> {
    let mut modules = Vec::new();
    for (_, info) in state.linker.modules() {
        if info.is_submodule {
            continue;
        }
        let qname = info.qname_module().qname(info.name.clone());
        let root = info.root;
        let kind = EffectiveKind::Module {
            name: info.name.clone(),
            namespace: info.namespace.clone().unwrap_or_default(),
            prefix: info.prefix.clone(),
            yang_version: state
                .arena
                .child_argument(root, &StatementKind::YangVersion)
                .map(SmolStr::new),
            organization: state
                .arena
                .child_argument(root, &StatementKind::Organization)
                .map(SmolStr::new),
            contact: state
                .arena
                .child_argument(root, &StatementKind::Contact)
                .map(SmolStr::new),
            revisions: revision_history(state, root),
        };
        let mut node = EffectiveNode {
            qname,
            path: SchemaPath::root(),
            kind,
            origin: state.arena.get(root).copy,
            meta: meta_of(state, root),
            children: Vec::new(),
        };

        // Submodule top-level statements surface in the parent module.
        let mut roots = vec![root];
        for &include in &info.includes {
            roots.push(state.linker.module(include).root);
        }
        for r in roots {
            let children = state.arena.get(r).children.clone();
            for child in children {
                if let Some(built) = build_node(state, types, child, true)? {
                    node.children.push(built);
                }
            }
        }
        modules.push(node);
    }

    // Global aggregates, in arena (declaration) order. Copies allocate
    // after originals, so the first node seen per QName is the original.
    let mut groupings: IndexMap<QName, EffectiveNode> = IndexMap::new();
    let mut features: Vec<QName> = Vec::new();
    let mut extensions: IndexMap<QName, Option<SmolStr>> = IndexMap::new();
    for index in 0..state.arena.len() {
        let id = CtxId::from_raw(index as u32);
        let ctx = state.arena.get(id);
        if ctx.removed {
            continue;
        }
        match ctx.kind {
            StatementKind::Grouping => {
                let Some(qname) = ctx.qname.clone() else { continue };
                if !groupings.contains_key(&qname) {
                    if let Some(node) = build_grouping(state, types, id, qname.clone())? {
                        groupings.insert(qname, node);
                    }
                }
            }
            StatementKind::Feature => {
                if let Some(qname) = ctx.qname.clone() {
                    if !features.contains(&qname) {
                        features.push(qname);
                    }
                }
            }
            StatementKind::Extension => {
                let Some(qname) = ctx.qname.clone() else { continue };
                let argument = state
                    .arena
                    .first_child_of_kind(id, &StatementKind::Argument)
                    .and_then(|a| state.arena.get(a).argument.clone());
                extensions.entry(qname).or_insert(argument);
            }
            _ => {}
        }
    }

    debug!(
        modules = modules.len(),
        groupings = groupings.len(),
        "effective context materialized"
    );
    Ok(EffectiveSchemaContext {
        modules,
        groupings,
        types: types.clone(),
        identities: identities.clone(),
        features,
        extensions,
    })
}

fn build_grouping(
    state: &BuildState,
    types: &ResolvedTypes,
    id: CtxId,
    qname: QName,
) -> Result<Option<EffectiveNode>, ReactorError> {
    let mut node = EffectiveNode {
        qname,
        path: state
            .arena
            .get(id)
            .path
            .clone()
            .unwrap_or_else(SchemaPath::root),
        kind: EffectiveKind::Grouping,
        origin: state.arena.get(id).copy,
        meta: meta_of(state, id),
        children: Vec::new(),
    };
    let children = state.arena.get(id).children.clone();
    for child in children {
        if let Some(built) = build_node(state, types, child, true)? {
            node.children.push(built);
        }
    }
    Ok(Some(node))
}

/// Materialize one context. Returns `None` for removed contexts and for
/// statement kinds absorbed into their parent's payload.
fn build_node(
    state: &BuildState,
    types: &ResolvedTypes,
    id: CtxId,
    inherited_config: bool,
) -> Result<Option<EffectiveNode>, ReactorError> {
    let ctx = state.arena.get(id);
    if ctx.removed {
        return Ok(None);
    }
    let at = ctx.at;
    let name = state.arena.local_name(id).unwrap_or_default().to_string();
    // config false forces false on the whole subtree
    let config = inherited_config
        && state
            .arena
            .child_argument(id, &StatementKind::Config)
            .is_none_or(|v| v != "false");

    let kind = match &ctx.kind {
        StatementKind::Container => EffectiveKind::Container {
            presence: state
                .arena
                .child_argument(id, &StatementKind::Presence)
                .map(SmolStr::new),
            config,
        },
        StatementKind::List => EffectiveKind::List {
            keys: state
                .arena
                .child_argument(id, &StatementKind::Key)
                .map(|k| k.split_whitespace().map(SmolStr::new).collect())
                .unwrap_or_default(),
            config,
            min_elements: parse_min(state, id),
            max_elements: parse_max(state, id),
            ordered_by_user: ordered_by_user(state, id),
        },
        StatementKind::Leaf => {
            let ty = leaf_type(state, types, id, &name)?;
            EffectiveKind::Leaf {
                default: state
                    .arena
                    .child_argument(id, &StatementKind::Default)
                    .map(SmolStr::new)
                    .or_else(|| ty.default().map(SmolStr::new)),
                units: state
                    .arena
                    .child_argument(id, &StatementKind::Units)
                    .map(SmolStr::new)
                    .or_else(|| ty.units().map(SmolStr::new)),
                mandatory: is_true(state, id, &StatementKind::Mandatory),
                config,
                ty,
            }
        }
        StatementKind::LeafList => {
            let ty = leaf_type(state, types, id, &name)?;
            let mut defaults: Vec<SmolStr> = state
                .arena
                .children_of_kind(id, &StatementKind::Default)
                .filter_map(|d| state.arena.get(d).argument.clone())
                .collect();
            if defaults.is_empty() {
                defaults.extend(ty.default().map(SmolStr::new));
            }
            EffectiveKind::LeafList {
                defaults,
                units: state
                    .arena
                    .child_argument(id, &StatementKind::Units)
                    .map(SmolStr::new)
                    .or_else(|| ty.units().map(SmolStr::new)),
                config,
                min_elements: parse_min(state, id),
                max_elements: parse_max(state, id),
                ordered_by_user: ordered_by_user(state, id),
                ty,
            }
        }
        StatementKind::Choice => EffectiveKind::Choice {
            default_case: state
                .arena
                .child_argument(id, &StatementKind::Default)
                .map(SmolStr::new),
            mandatory: is_true(state, id, &StatementKind::Mandatory),
            config,
        },
        StatementKind::Case => EffectiveKind::Case,
        StatementKind::Anydata => EffectiveKind::Anydata {
            mandatory: is_true(state, id, &StatementKind::Mandatory),
            config,
        },
        StatementKind::Anyxml => EffectiveKind::Anyxml {
            mandatory: is_true(state, id, &StatementKind::Mandatory),
            config,
        },
        StatementKind::Rpc => EffectiveKind::Rpc,
        StatementKind::Action => EffectiveKind::Action,
        StatementKind::Input => EffectiveKind::Input,
        StatementKind::Output => EffectiveKind::Output,
        StatementKind::Notification => EffectiveKind::Notification,
        StatementKind::Unknown(keyword) => EffectiveKind::Unknown {
            keyword: keyword.clone(),
            argument: ctx.argument.clone(),
        },
        // Everything else is either a property absorbed into a payload or
        // a definition surfaced through an aggregated collection.
        _ => return Ok(None),
    };

    let qname = match ctx.qname.clone() {
        Some(qname) => qname,
        None => {
            let owner = state.linker.namespace_owner(state.module_of(id));
            let local = match &ctx.kind {
                StatementKind::Unknown(keyword) => keyword.clone(),
                _ => SmolStr::new(&name),
            };
            state.linker.module(owner).qname_module().qname(local)
        }
    };
    let mut node = EffectiveNode {
        qname,
        path: ctx.path.clone().unwrap_or_else(SchemaPath::root),
        kind,
        origin: ctx.copy,
        meta: meta_of(state, id),
        children: Vec::new(),
    };

    let children = state.arena.get(id).children.clone();
    for child in children {
        if let Some(built) = build_node(state, types, child, config)? {
            node.children.push(built);
        }
    }

    // A list key must be an actual leaf child.
    if let EffectiveKind::List { keys, .. } = &node.kind {
        for key in keys {
            let matched = node
                .children
                .iter()
                .any(|c| matches!(c.kind, EffectiveKind::Leaf { .. }) && c.local_name() == key.as_str());
            if !matched {
                return Err(InferenceError::new(
                    PHASE,
                    at,
                    format!("list \"{name}\": key \"{key}\" has no matching leaf"),
                )
                .into());
            }
        }
    }
    Ok(Some(node))
}

fn leaf_type(
    state: &BuildState,
    types: &ResolvedTypes,
    id: CtxId,
    name: &str,
) -> Result<ResolvedType, ReactorError> {
    let at = state.arena.get(id).at;
    let type_ctx = state
        .arena
        .first_child_of_kind(id, &StatementKind::Type)
        .ok_or_else(|| {
            InferenceError::new(PHASE, at, format!("leaf \"{name}\" lacks a type statement"))
        })?;
    types.of_ctx(type_ctx).cloned().ok_or_else(|| {
        InferenceError::new(PHASE, at, format!("leaf \"{name}\" has an unresolved type")).into()
    })
}

fn revision_history(state: &BuildState, root: CtxId) -> Vec<ModuleRevision> {
    state
        .arena
        .children_of_kind(root, &StatementKind::Revision)
        .filter_map(|rev| {
            let date = state
                .arena
                .get(rev)
                .argument
                .as_deref()
                .and_then(Revision::parse)?;
            Some(ModuleRevision {
                date,
                description: state
                    .arena
                    .child_argument(rev, &StatementKind::Description)
                    .map(SmolStr::new),
                reference: state
                    .arena
                    .child_argument(rev, &StatementKind::Reference)
                    .map(SmolStr::new),
            })
        })
        .collect()
}

fn meta_of(state: &BuildState, id: CtxId) -> NodeMeta {
    NodeMeta {
        description: state
            .arena
            .child_argument(id, &StatementKind::Description)
            .map(SmolStr::new),
        reference: state
            .arena
            .child_argument(id, &StatementKind::Reference)
            .map(SmolStr::new),
        status: state
            .arena
            .child_argument(id, &StatementKind::Status)
            .and_then(NodeStatus::parse)
            .unwrap_or_default(),
        when: state
            .arena
            .child_argument(id, &StatementKind::When)
            .map(SmolStr::new),
        musts: state
            .arena
            .children_of_kind(id, &StatementKind::Must)
            .filter_map(|m| state.arena.get(m).argument.clone())
            .collect(),
    }
}

fn is_true(state: &BuildState, id: CtxId, kind: &StatementKind) -> bool {
    state
        .arena
        .child_argument(id, kind)
        .is_some_and(|v| v == "true")
}

fn parse_min(state: &BuildState, id: CtxId) -> Option<u32> {
    state
        .arena
        .child_argument(id, &StatementKind::MinElements)
        .and_then(|v| v.parse().ok())
}

fn parse_max(state: &BuildState, id: CtxId) -> Option<u32> {
    state
        .arena
        .child_argument(id, &StatementKind::MaxElements)
        .filter(|v| *v != "unbounded")
        .and_then(|v| v.parse().ok())
}

fn ordered_by_user(state: &BuildState, id: CtxId) -> bool {
    state
        .arena
        .child_argument(id, &StatementKind::OrderedBy)
        .is_some_and(|v| v == "user")
}
