//! Identity derivation.
//!
//! Identities form a global directed acyclic graph across all modules of a
//! build: every `identity` names zero or more bases, possibly from other
//! modules. Resolution produces the transitive derived set of every
//! identity, the relation `identityref` values are validated against. Any
//! cycle through base references fails the build.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::base::QName;
use crate::errors::{InferenceError, ReactorError};
use crate::reactor::{BuildState, CtxId, ModelPhase};
use crate::registry::NamespaceKind;
use crate::stmt::StatementKind;

const PHASE: ModelPhase = ModelPhase::EffectiveModel;

/// One resolved identity.
#[derive(Clone, Debug)]
pub struct IdentityInfo {
    qname: QName,
    /// Directly named bases, in declaration order.
    bases: Vec<QName>,
    /// Every identity transitively derived from this one, in declaration
    /// order across the build.
    derived: Vec<QName>,
}

impl IdentityInfo {
    pub fn qname(&self) -> &QName {
        &self.qname
    }

    pub fn bases(&self) -> &[QName] {
        &self.bases
    }

    pub fn derived(&self) -> &[QName] {
        &self.derived
    }
}

/// The acyclic base/derived relation over every identity in the build.
#[derive(Clone, Debug, Default)]
pub struct IdentityGraph {
    identities: IndexMap<QName, IdentityInfo>,
}

impl IdentityGraph {
    pub fn identities(&self) -> impl Iterator<Item = &IdentityInfo> {
        self.identities.values()
    }

    pub fn get(&self, qname: &QName) -> Option<&IdentityInfo> {
        self.identities.get(qname)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Whether `identity` is transitively derived from `base`.
    pub fn is_derived_from(&self, identity: &QName, base: &QName) -> bool {
        self.identities
            .get(base)
            .is_some_and(|info| info.derived.iter().any(|d| d == identity))
    }
}

/// Resolve every identity statement into the global graph.
pub(crate) fn resolve_identities(state: &mut BuildState) -> Result<IdentityGraph, ReactorError> {
    // Declaration order over the arena keeps the graph deterministic.
    let mut ctxs: Vec<CtxId> = Vec::new();
    for index in 0..state.arena.len() {
        let id = CtxId::from_raw(index as u32);
        let ctx = state.arena.get(id);
        if !ctx.removed && ctx.kind == StatementKind::Identity {
            ctxs.push(id);
        }
    }

    let mut identities: IndexMap<QName, IdentityInfo> = IndexMap::new();
    let mut base_edges: IndexMap<QName, Vec<QName>> = IndexMap::new();
    for &id in &ctxs {
        let ctx = state.arena.get(id);
        let Some(qname) = ctx.qname.clone() else {
            continue;
        };
        let mut bases = Vec::new();
        let base_ctxs: Vec<CtxId> = state
            .arena
            .children_of_kind(id, &StatementKind::Base)
            .collect();
        for base_ctx in base_ctxs {
            let raw = state
                .arena
                .get(base_ctx)
                .argument
                .clone()
                .unwrap_or_default();
            let Some(base_id) =
                state.resolve_ns_ref(base_ctx, NamespaceKind::Identity, &raw, PHASE)?
            else {
                return Err(InferenceError::new(
                    PHASE,
                    state.arena.get(base_ctx).at,
                    format!("base identity \"{raw}\" not found"),
                )
                .into());
            };
            if let Some(base_qname) = state.arena.get(base_id).qname.clone() {
                bases.push(base_qname);
            }
        }
        base_edges.insert(qname.clone(), bases.clone());
        identities.insert(
            qname.clone(),
            IdentityInfo {
                qname,
                bases,
                derived: Vec::new(),
            },
        );
    }

    check_cycles(state, &ctxs, &base_edges)?;

    // Transitive closure: each identity contributes itself to every
    // ancestor's derived set, in declaration order.
    let order: Vec<QName> = identities.keys().cloned().collect();
    for qname in &order {
        let mut seen: FxHashSet<QName> = FxHashSet::default();
        let mut pending: Vec<QName> = base_edges.get(qname).cloned().unwrap_or_default();
        while let Some(ancestor) = pending.pop() {
            if !seen.insert(ancestor.clone()) {
                continue;
            }
            pending.extend(base_edges.get(&ancestor).cloned().unwrap_or_default());
            if let Some(info) = identities.get_mut(&ancestor) {
                info.derived.push(qname.clone());
            }
        }
    }

    debug!(identities = identities.len(), "identity graph resolved");
    Ok(IdentityGraph { identities })
}

fn check_cycles(
    state: &BuildState,
    ctxs: &[CtxId],
    base_edges: &IndexMap<QName, Vec<QName>>,
) -> Result<(), ReactorError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        White,
        Grey,
        Black,
    }
    let mut marks: IndexMap<QName, Mark> = base_edges
        .keys()
        .map(|q| (q.clone(), Mark::White))
        .collect();
    let at_of = |qname: &QName| {
        ctxs.iter()
            .find(|&&id| state.arena.get(id).qname.as_ref() == Some(qname))
            .map(|&id| state.arena.get(id).at)
    };
    for start in base_edges.keys() {
        if marks[start] != Mark::White {
            continue;
        }
        let mut stack: Vec<(&QName, usize)> = vec![(start, 0)];
        marks[start] = Mark::Grey;
        while let Some(&mut (qname, ref mut next)) = stack.last_mut() {
            let edges = &base_edges[qname];
            if *next >= edges.len() {
                marks[qname] = Mark::Black;
                stack.pop();
                continue;
            }
            let target = &edges[*next];
            *next += 1;
            match marks.get(target).copied() {
                Some(Mark::White) => {
                    marks[target] = Mark::Grey;
                    stack.push((target, 0));
                }
                Some(Mark::Grey) => {
                    let names: Vec<String> =
                        stack.iter().map(|(q, _)| q.local_name().to_string()).collect();
                    let at = at_of(target).unwrap_or_else(|| {
                        state.arena.get(ctxs[0]).at
                    });
                    return Err(InferenceError::new(
                        PHASE,
                        at,
                        format!(
                            "identity derivation cycle involving \"{}\" (path: {})",
                            target.local_name(),
                            names.join(" -> ")
                        ),
                    )
                    .into());
                }
                _ => {}
            }
        }
    }
    Ok(())
}
