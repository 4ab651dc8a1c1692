//! Cross-source linker.
//!
//! During source pre-linkage every module/submodule is registered by
//! (name, revision) and by namespace URI. During source linkage each
//! import/include edge is resolved, prefix tables are built, submodules
//! inherit their parent module's namespace, and the import graph is
//! cycle-checked. All failures here are phase-tagged inference errors.

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::arena::{ContextArena, CtxId};
use super::phase::ModelPhase;
use crate::base::{QNameModule, Revision, SourceId, SourceRef};
use crate::errors::InferenceError;
use crate::stmt::StatementKind;

/// Handle of one registered module or submodule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(u32);

impl ModuleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Linker-level knowledge about one source.
#[derive(Clone, Debug)]
pub struct ModuleInfo {
    pub name: SmolStr,
    /// Latest revision statement, if any.
    pub revision: Option<Revision>,
    /// Declared namespace URI; submodules inherit it at linkage.
    pub namespace: Option<SmolStr>,
    pub prefix: Option<SmolStr>,
    pub is_submodule: bool,
    pub belongs_to: Option<SmolStr>,
    pub root: CtxId,
    pub source: SourceId,
    pub at: SourceRef,
    /// prefix -> module visible under that prefix (own prefix included).
    pub prefixes: IndexMap<SmolStr, ModuleId>,
    /// Modules imported by this source, in declaration order.
    pub imports: Vec<ModuleId>,
    /// Submodules included by this source, in declaration order.
    pub includes: Vec<ModuleId>,
}

impl ModuleInfo {
    /// The (namespace, revision) pair this module's QNames carry.
    pub fn qname_module(&self) -> QNameModule {
        QNameModule::new(
            self.namespace.clone().unwrap_or_default(),
            self.revision.clone(),
        )
    }
}

/// Registry of all sources in one build.
#[derive(Debug, Default)]
pub struct Linker {
    modules: Vec<ModuleInfo>,
    by_name: IndexMap<SmolStr, Vec<ModuleId>>,
    by_namespace: IndexMap<SmolStr, Vec<ModuleId>>,
}

impl Linker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &ModuleInfo)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (ModuleId(i as u32), m))
    }

    pub fn module(&self, id: ModuleId) -> &ModuleInfo {
        &self.modules[id.index()]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut ModuleInfo {
        &mut self.modules[id.index()]
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Pre-linkage registration. Rejects duplicate (name, revision) pairs.
    pub fn register(&mut self, info: ModuleInfo) -> Result<ModuleId, InferenceError> {
        if let Some(ids) = self.by_name.get(&info.name) {
            for id in ids {
                let existing = self.module(*id);
                if existing.is_submodule == info.is_submodule
                    && existing.revision == info.revision
                {
                    return Err(InferenceError::new(
                        ModelPhase::SourcePreLinkage,
                        info.at,
                        format!(
                            "duplicate source for \"{}\" revision {}",
                            info.name,
                            info.revision
                                .as_ref()
                                .map(|r| r.as_str())
                                .unwrap_or("(none)")
                        ),
                    ));
                }
            }
        }
        let id = ModuleId(self.modules.len() as u32);
        self.by_name
            .entry(info.name.clone())
            .or_default()
            .push(id);
        if let Some(namespace) = &info.namespace {
            self.by_namespace
                .entry(namespace.clone())
                .or_default()
                .push(id);
        }
        self.modules.push(info);
        Ok(id)
    }

    /// Find a module (not submodule) by name and optional exact revision.
    ///
    /// Without a revision the highest registered revision wins, comparing
    /// ISO dates; a module carrying no revision statement sorts lowest.
    /// Ties cannot arise because duplicates are rejected at registration.
    pub fn find_module(&self, name: &str, revision: Option<&Revision>) -> Option<ModuleId> {
        self.find(name, revision, false)
    }

    pub fn find_submodule(&self, name: &str, revision: Option<&Revision>) -> Option<ModuleId> {
        self.find(name, revision, true)
    }

    fn find(&self, name: &str, revision: Option<&Revision>, submodule: bool) -> Option<ModuleId> {
        let candidates = self.by_name.get(name)?;
        let mut best: Option<ModuleId> = None;
        for &id in candidates {
            let info = self.module(id);
            if info.is_submodule != submodule {
                continue;
            }
            match revision {
                Some(rev) => {
                    if info.revision.as_ref() == Some(rev) {
                        return Some(id);
                    }
                }
                None => {
                    let better = match best {
                        None => true,
                        Some(current) => info.revision > self.module(current).revision,
                    };
                    if better {
                        best = Some(id);
                    }
                }
            }
        }
        if revision.is_some() { None } else { best }
    }

    /// All modules declaring the given namespace URI.
    pub fn find_by_namespace(&self, namespace: &str) -> Vec<ModuleId> {
        self.by_namespace
            .get(namespace)
            .cloned()
            .unwrap_or_default()
    }

    /// Resolve every import/include edge. Called once at source linkage.
    pub fn resolve_links(&mut self, arena: &ContextArena) -> Result<(), InferenceError> {
        for index in 0..self.modules.len() {
            let id = ModuleId(index as u32);
            self.resolve_links_of(id, arena)?;
        }
        self.inherit_submodule_namespaces()?;
        self.check_import_cycles()?;
        Ok(())
    }

    fn resolve_links_of(
        &mut self,
        id: ModuleId,
        arena: &ContextArena,
    ) -> Result<(), InferenceError> {
        let root = self.module(id).root;
        let own_name = self.module(id).name.clone();

        // Own prefix (module) or belongs-to prefix (submodule).
        if let Some(prefix) = self.module(id).prefix.clone() {
            self.module_mut(id).prefixes.insert(prefix, id);
        }

        let import_ctxs: Vec<CtxId> = arena
            .children_of_kind(root, &StatementKind::Import)
            .collect();
        for import in import_ctxs {
            let ctx = arena.get(import);
            let at = ctx.at;
            let name = ctx.argument.clone().unwrap_or_default();
            if name == own_name {
                return Err(InferenceError::new(
                    ModelPhase::SourceLinkage,
                    at,
                    format!("module \"{own_name}\" imports itself"),
                ));
            }
            let revision = arena
                .child_argument(import, &StatementKind::RevisionDate)
                .and_then(Revision::parse);
            let Some(target) = self.find_module(&name, revision.as_ref()) else {
                return Err(InferenceError::new(
                    ModelPhase::SourceLinkage,
                    at,
                    match revision {
                        Some(rev) => {
                            format!("imported module \"{name}\" revision {rev} not found")
                        }
                        None => format!("imported module \"{name}\" not found"),
                    },
                ));
            };
            let prefix = arena
                .child_argument(import, &StatementKind::Prefix)
                .map(SmolStr::new)
                .unwrap_or_default();
            let info = self.module_mut(id);
            info.imports.push(target);
            info.prefixes.insert(prefix, target);
        }

        let include_ctxs: Vec<CtxId> = arena
            .children_of_kind(root, &StatementKind::Include)
            .collect();
        for include in include_ctxs {
            let ctx = arena.get(include);
            let at = ctx.at;
            let name = ctx.argument.clone().unwrap_or_default();
            let revision = arena
                .child_argument(include, &StatementKind::RevisionDate)
                .and_then(Revision::parse);
            let Some(target) = self.find_submodule(&name, revision.as_ref()) else {
                return Err(InferenceError::new(
                    ModelPhase::SourceLinkage,
                    at,
                    format!("included submodule \"{name}\" not found"),
                ));
            };
            if !self.module(id).is_submodule {
                let belongs_to = self.module(target).belongs_to.clone();
                if belongs_to.as_deref() != Some(own_name.as_str()) {
                    return Err(InferenceError::new(
                        ModelPhase::SourceLinkage,
                        at,
                        format!(
                            "submodule \"{name}\" belongs to \"{}\", not \"{own_name}\"",
                            belongs_to.as_deref().unwrap_or("(none)")
                        ),
                    ));
                }
            }
            self.module_mut(id).includes.push(target);
        }

        // Submodule belongs-to: bind its prefix to the parent module.
        if self.module(id).is_submodule {
            let Some(parent_name) = self.module(id).belongs_to.clone() else {
                return Err(InferenceError::new(
                    ModelPhase::SourceLinkage,
                    self.module(id).at,
                    format!("submodule \"{own_name}\" lacks a belongs-to statement"),
                ));
            };
            let Some(parent) = self.find_module(&parent_name, None) else {
                return Err(InferenceError::new(
                    ModelPhase::SourceLinkage,
                    self.module(id).at,
                    format!(
                        "submodule \"{own_name}\" belongs to unknown module \"{parent_name}\""
                    ),
                ));
            };
            if let Some(prefix) = self.module(id).prefix.clone() {
                self.module_mut(id).prefixes.insert(prefix, parent);
            }
        }
        Ok(())
    }

    /// Submodules take their parent module's namespace for their own
    /// top-level statements.
    fn inherit_submodule_namespaces(&mut self) -> Result<(), InferenceError> {
        for index in 0..self.modules.len() {
            let id = ModuleId(index as u32);
            if !self.module(id).is_submodule {
                continue;
            }
            let parent_name = self.module(id).belongs_to.clone().unwrap_or_default();
            if let Some(parent) = self.find_module(&parent_name, None) {
                let namespace = self.module(parent).namespace.clone();
                self.module_mut(id).namespace = namespace;
            }
        }
        Ok(())
    }

    /// Depth-first search over import edges; any back edge is a cycle.
    fn check_import_cycles(&self) -> Result<(), InferenceError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            White,
            Grey,
            Black,
        }
        let mut marks = vec![Mark::White; self.modules.len()];
        for start in 0..self.modules.len() {
            if marks[start] != Mark::White {
                continue;
            }
            // Iterative DFS keeping an explicit path for the error message.
            let mut stack = vec![(ModuleId(start as u32), 0usize)];
            marks[start] = Mark::Grey;
            while let Some(&mut (id, ref mut next)) = stack.last_mut() {
                let imports = &self.module(id).imports;
                if *next >= imports.len() {
                    marks[id.index()] = Mark::Black;
                    stack.pop();
                    continue;
                }
                let target = imports[*next];
                *next += 1;
                match marks[target.index()] {
                    Mark::White => {
                        marks[target.index()] = Mark::Grey;
                        stack.push((target, 0));
                    }
                    Mark::Grey => {
                        let names: Vec<&str> = stack
                            .iter()
                            .map(|(m, _)| self.module(*m).name.as_str())
                            .collect();
                        return Err(InferenceError::new(
                            ModelPhase::SourceLinkage,
                            self.module(target).at,
                            format!(
                                "import cycle involving \"{}\" (path: {})",
                                self.module(target).name,
                                names.join(" -> ")
                            ),
                        ));
                    }
                    Mark::Black => {}
                }
            }
        }
        Ok(())
    }

    /// Module visible under `prefix` from within `from`.
    pub fn resolve_prefix(&self, from: ModuleId, prefix: &str) -> Option<ModuleId> {
        self.module(from).prefixes.get(prefix).copied()
    }

    /// The module whose namespace the given source's definitions carry:
    /// the source itself, or its parent module for submodules.
    pub fn namespace_owner(&self, id: ModuleId) -> ModuleId {
        if self.module(id).is_submodule {
            if let Some(parent_name) = &self.module(id).belongs_to {
                if let Some(parent) = self.find_module(parent_name, None) {
                    return parent;
                }
            }
        }
        id
    }

    /// Roots to search when a name lookup reaches module level: the module
    /// itself plus every included submodule, or for a submodule its parent
    /// module and that module's other submodules.
    pub fn scope_roots(&self, id: ModuleId) -> Vec<ModuleId> {
        let owner = self.namespace_owner(id);
        let mut roots = vec![id];
        if owner != id {
            roots.push(owner);
        }
        for &sub in &self.module(owner).includes {
            if sub != id {
                roots.push(sub);
            }
        }
        roots
    }
}
