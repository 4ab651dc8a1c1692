//! The immutable result of a build.

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::{QName, Revision, SchemaPath};
use crate::model::node::{EffectiveKind, EffectiveNode};
use crate::resolve::{IdentityGraph, ResolvedType, ResolvedTypes};

/// Fully resolved view of every module in one build.
///
/// All lookups are over already-materialized data; the context never
/// computes on demand, so sharing it across threads needs no locks.
#[derive(Debug)]
pub struct EffectiveSchemaContext {
    pub(crate) modules: Vec<EffectiveNode>,
    pub(crate) groupings: IndexMap<QName, EffectiveNode>,
    pub(crate) types: ResolvedTypes,
    pub(crate) identities: IdentityGraph,
    pub(crate) features: Vec<QName>,
    pub(crate) extensions: IndexMap<QName, Option<SmolStr>>,
}

impl EffectiveSchemaContext {
    /// Effective modules, in registration order. Submodule statements
    /// appear under the module they belong to.
    pub fn modules(&self) -> impl Iterator<Item = &EffectiveNode> {
        self.modules.iter()
    }

    /// Module by name, with an exact revision or, absent one, the highest
    /// revision in the build.
    pub fn find_module(&self, name: &str, revision: Option<&Revision>) -> Option<&EffectiveNode> {
        let mut best: Option<&EffectiveNode> = None;
        for module in &self.modules {
            let EffectiveKind::Module { name: module_name, .. } = &module.kind else {
                continue;
            };
            if module_name != name {
                continue;
            }
            match revision {
                Some(rev) => {
                    if module.qname.revision() == Some(rev) {
                        return Some(module);
                    }
                }
                None => {
                    let better = match best {
                        None => true,
                        Some(current) => module.qname.revision() > current.qname.revision(),
                    };
                    if better {
                        best = Some(module);
                    }
                }
            }
        }
        if revision.is_some() { None } else { best }
    }

    pub fn find_modules_by_namespace(&self, namespace: &str) -> Vec<&EffectiveNode> {
        self.modules
            .iter()
            .filter(|m| m.qname.namespace() == namespace)
            .collect()
    }

    /// Resolve an absolute schema path to its effective node, descending
    /// by full QName at every step.
    pub fn find_data_schema_node(&self, path: &SchemaPath) -> Option<&EffectiveNode> {
        let mut segments = path.segments().iter();
        let first = segments.next()?;
        let mut current = self
            .modules
            .iter()
            .filter(|m| m.qname.namespace() == first.namespace())
            .find_map(|m| m.child(first))?;
        for segment in segments {
            current = current.child(segment)?;
        }
        Some(current)
    }

    /// Expanded grouping definitions across all modules.
    pub fn groupings(&self) -> impl Iterator<Item = (&QName, &EffectiveNode)> {
        self.groupings.iter()
    }

    pub fn grouping(&self, qname: &QName) -> Option<&EffectiveNode> {
        self.groupings.get(qname)
    }

    /// Resolved typedefs across all modules.
    pub fn typedefs(&self) -> impl Iterator<Item = (&QName, &ResolvedType)> {
        self.types.typedefs()
    }

    pub fn typedef(&self, qname: &QName) -> Option<&ResolvedType> {
        self.types.typedef(qname)
    }

    pub fn identities(&self) -> &IdentityGraph {
        &self.identities
    }

    /// Features that survived gating, in declaration order.
    pub fn features(&self) -> &[QName] {
        &self.features
    }

    /// Declared extensions with the name of the argument their instances
    /// carry.
    pub fn extensions(&self) -> impl Iterator<Item = (&QName, Option<&str>)> {
        self.extensions.iter().map(|(q, a)| (q, a.as_deref()))
    }

    /// Every rpc of every module.
    pub fn rpcs(&self) -> impl Iterator<Item = &EffectiveNode> {
        self.modules.iter().flat_map(|m| {
            m.children
                .iter()
                .filter(|c| matches!(c.kind, EffectiveKind::Rpc))
        })
    }

    /// Every top-level notification of every module.
    pub fn notifications(&self) -> impl Iterator<Item = &EffectiveNode> {
        self.modules.iter().flat_map(|m| {
            m.children
                .iter()
                .filter(|c| matches!(c.kind, EffectiveKind::Notification))
        })
    }
}
