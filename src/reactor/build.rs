//! The build driver.
//!
//! A [`Reactor`] collects sources, then a single `build()` runs the phase
//! sequence: pre-linkage registration, link resolution, structural
//! validation and namespace population, the full-declaration task fixpoint,
//! and effective model construction.

use std::sync::Arc;

use smol_str::SmolStr;
use tracing::debug;

use super::arena::{ContextArena, CtxId, StmtContext};
use super::linker::{Linker, ModuleId, ModuleInfo};
use super::phase::ModelPhase;
use super::task::{Task, TaskOutcome};
use super::ReactorConfig;
use crate::base::{Revision, SchemaPath, SourceId, SourceRef};
use crate::errors::{Diagnostic, DiagnosticSink, InferenceError, ReactorError, SourceError};
use crate::model::EffectiveSchemaContext;
use crate::registry::{NamespaceKind, StatementRegistry};
use crate::resolve;
use crate::stmt::{DeclaredStatement, StatementKind, StatementStreamSource};

/// Result of a successful build: the immutable schema context plus every
/// soft diagnostic collected along the way.
#[derive(Debug)]
pub struct BuildOutcome {
    pub context: EffectiveSchemaContext,
    pub diagnostics: Vec<Diagnostic>,
}

struct SourceEntry {
    name: SmolStr,
    root: Arc<DeclaredStatement>,
}

/// The cross-source statement reactor. Single-use: sources are accepted
/// only before `build()`, which consumes the reactor.
pub struct Reactor {
    config: ReactorConfig,
    sources: Vec<SourceEntry>,
}

impl Default for Reactor {
    fn default() -> Self {
        Self::new()
    }
}

impl Reactor {
    pub fn new() -> Self {
        Self::with_config(ReactorConfig::default())
    }

    pub fn with_config(config: ReactorConfig) -> Self {
        Self {
            config,
            sources: Vec::new(),
        }
    }

    /// Add one statement-tree source. Sources replay into the build in the
    /// order they were added.
    pub fn add_source(&mut self, source: &dyn StatementStreamSource) {
        self.sources.push(SourceEntry {
            name: SmolStr::new(source.source_name()),
            root: source.root(),
        });
    }

    pub fn add_sources<'a>(
        &mut self,
        sources: impl IntoIterator<Item = &'a dyn StatementStreamSource>,
    ) {
        for source in sources {
            self.add_source(source);
        }
    }

    /// Run the build to completion, consuming the reactor.
    pub fn build(self) -> Result<BuildOutcome, ReactorError> {
        let mut state = BuildState {
            arena: ContextArena::new(),
            linker: Linker::new(),
            registry: StatementRegistry::rfc7950(),
            config: self.config,
            sink: DiagnosticSink::new(),
        };

        debug!(phase = %ModelPhase::SourcePreLinkage, sources = self.sources.len(), "starting build");
        state.source_pre_linkage(&self.sources)?;

        debug!(phase = %ModelPhase::SourceLinkage, "resolving import/include edges");
        state.linker.resolve_links(&state.arena)?;

        debug!(phase = %ModelPhase::StatementDefinition, "validating statements");
        state.statement_definition(&self.sources)?;

        debug!(phase = %ModelPhase::FullDeclaration, "running resolution fixpoint");
        state.full_declaration()?;

        debug!(phase = %ModelPhase::EffectiveModel, "building effective model");
        let identities = resolve::identity::resolve_identities(&mut state)?;
        let types = resolve::types::resolve_types(&mut state)?;
        let context = crate::model::build_context(&state, &identities, &types)?;

        Ok(BuildOutcome {
            context,
            diagnostics: state.sink.into_diagnostics(),
        })
    }
}

/// Result of resolving a schema-node-identifier against the context graph.
#[derive(Clone, Debug)]
pub(crate) enum PathTarget {
    Found(CtxId),
    /// First unresolvable step, described for blocked-task causes.
    Missing(String),
    /// The path leads into a subtree pruned by feature gating or deviation;
    /// the modification targeting it becomes a no-op.
    Pruned,
}

/// Mutable state of one build invocation, shared by every resolution
/// algorithm.
pub(crate) struct BuildState {
    pub arena: ContextArena,
    pub linker: Linker,
    pub registry: StatementRegistry,
    pub config: ReactorConfig,
    pub sink: DiagnosticSink,
}

impl BuildState {
    // ------------------------------------------------------------------
    // Phase: source pre-linkage
    // ------------------------------------------------------------------

    fn source_pre_linkage(&mut self, sources: &[SourceEntry]) -> Result<(), ReactorError> {
        for (index, entry) in sources.iter().enumerate() {
            let source = SourceId::from_raw(index as u32);
            let root = self.arena.import_tree(&entry.root, None, None);
            let ctx = self.arena.get(root);
            let at = ctx.at;
            let is_submodule = match &ctx.kind {
                StatementKind::Module => false,
                StatementKind::Submodule => true,
                other => {
                    return Err(SourceError::new(
                        at,
                        format!(
                            "source \"{}\": expected module or submodule, found \"{other}\"",
                            entry.name
                        ),
                    )
                    .into());
                }
            };
            let Some(name) = ctx.argument.clone() else {
                return Err(SourceError::new(
                    at,
                    format!("source \"{}\": module statement requires a name", entry.name),
                )
                .into());
            };

            let mut revision: Option<Revision> = None;
            for rev_ctx in self.arena.children_of_kind(root, &StatementKind::Revision) {
                let rev = self.arena.get(rev_ctx);
                let parsed = rev
                    .argument
                    .as_deref()
                    .and_then(Revision::parse)
                    .ok_or_else(|| {
                        SourceError::new(rev.at, "invalid revision date".to_string())
                    })?;
                if revision.as_ref().is_none_or(|current| parsed > *current) {
                    revision = Some(parsed);
                }
            }

            let namespace = self
                .arena
                .child_argument(root, &StatementKind::Namespace)
                .map(SmolStr::new);
            let (prefix, belongs_to) = if is_submodule {
                let belongs = self
                    .arena
                    .first_child_of_kind(root, &StatementKind::BelongsTo);
                let belongs_name = belongs
                    .and_then(|b| self.arena.get(b).argument.clone());
                let prefix = belongs
                    .and_then(|b| self.arena.child_argument(b, &StatementKind::Prefix))
                    .map(SmolStr::new);
                (prefix, belongs_name)
            } else {
                (
                    self.arena
                        .child_argument(root, &StatementKind::Prefix)
                        .map(SmolStr::new),
                    None,
                )
            };

            let id = self.linker.register(ModuleInfo {
                name,
                revision,
                namespace,
                prefix,
                is_submodule,
                belongs_to,
                root,
                source,
                at,
                prefixes: Default::default(),
                imports: Vec::new(),
                includes: Vec::new(),
            })?;
            self.assign_module(root, id);
        }
        Ok(())
    }

    fn assign_module(&mut self, id: CtxId, module: ModuleId) {
        self.arena.get_mut(id).module = Some(module);
        let children = self.arena.get(id).children.clone();
        for child in children {
            self.assign_module(child, module);
        }
    }

    // ------------------------------------------------------------------
    // Phase: statement definition
    // ------------------------------------------------------------------

    fn statement_definition(&mut self, sources: &[SourceEntry]) -> Result<(), ReactorError> {
        let strict = self.config.mode == super::ParserMode::Strict;
        for entry in sources {
            self.registry.validate_tree(&entry.root, strict)?;
        }

        let roots: Vec<(ModuleId, CtxId)> = self
            .linker
            .modules()
            .map(|(id, info)| (id, info.root))
            .collect();
        for (_, root) in &roots {
            self.synthesize(*root);
        }
        for (module, root) in roots {
            self.finalize_tree(root, &SchemaPath::root(), module)?;
        }
        Ok(())
    }

    /// Insert reactor-synthesized statements: shorthand cases under choice,
    /// implicit input/output under rpc and action.
    fn synthesize(&mut self, id: CtxId) {
        let kind = self.arena.get(id).kind.clone();
        match kind {
            StatementKind::Choice => {
                let children = self.arena.get(id).children.clone();
                for (position, child) in children.into_iter().enumerate() {
                    let child_ctx = self.arena.get(child);
                    if !child_ctx.kind.is_data_definition()
                        || child_ctx.kind == StatementKind::Uses
                    {
                        continue;
                    }
                    let case = self.wrap_in_case(child);
                    self.arena.get_mut(id).children[position] = case;
                }
            }
            StatementKind::Rpc | StatementKind::Action => {
                for io in [StatementKind::Input, StatementKind::Output] {
                    if self.arena.first_child_of_kind(id, &io).is_none() {
                        let at = SourceRef::synthetic(self.arena.get(id).at.source);
                        let mut ctx = StmtContext::synthetic(io, None, at);
                        ctx.parent = Some(id);
                        ctx.module = self.arena.get(id).module;
                        let io_id = self.arena.alloc(ctx);
                        self.arena.get_mut(id).children.push(io_id);
                    }
                }
            }
            _ => {}
        }
        let children = self.arena.get(id).children.clone();
        for child in children {
            self.synthesize(child);
        }
    }

    /// Wrap a shorthand choice alternative in a synthetic case of the same
    /// name, preserving provenance and module attribution.
    pub(crate) fn wrap_in_case(&mut self, child: CtxId) -> CtxId {
        let child_ctx = self.arena.get(child);
        let mut case = StmtContext::synthetic(
            StatementKind::Case,
            child_ctx.argument.clone(),
            child_ctx.at,
        );
        case.parent = child_ctx.parent;
        case.module = child_ctx.module;
        case.copy = child_ctx.copy;
        let case_id = self.arena.alloc(case);
        self.arena.get_mut(child).parent = Some(case_id);
        self.arena.get_mut(case_id).children.push(child);
        case_id
    }

    /// Assign QNames and schema paths and populate namespace maps for the
    /// subtree rooted at `id`, whose parent path is `parent_path`.
    pub(crate) fn finalize_tree(
        &mut self,
        id: CtxId,
        parent_path: &SchemaPath,
        module: ModuleId,
    ) -> Result<(), ReactorError> {
        let ctx = self.arena.get(id);
        if ctx.removed {
            return Ok(());
        }
        let kind = ctx.kind.clone();

        // QName: preserved across copies, otherwise derived from the
        // namespace-owning module.
        let path = if kind.is_schema_node() && !matches!(kind, StatementKind::Grouping) {
            let qname = match &self.arena.get(id).qname {
                Some(existing) => existing.clone(),
                None => {
                    let owner = self.linker.namespace_owner(module);
                    let qmod = self.linker.module(owner).qname_module();
                    let local = self
                        .arena
                        .local_name(id)
                        .map(SmolStr::new)
                        .unwrap_or_default();
                    qmod.qname(local)
                }
            };
            let path = parent_path.child(qname.clone());
            let ctx = self.arena.get_mut(id);
            ctx.qname = Some(qname);
            ctx.path = Some(path.clone());
            path
        } else if matches!(
            kind,
            StatementKind::Module | StatementKind::Submodule
        ) {
            SchemaPath::root()
        } else {
            // Non-schema statements (typedef, identity, grouping bodies
            // keep their own path scope rooted where they are declared).
            if matches!(
                kind,
                StatementKind::Typedef
                    | StatementKind::Identity
                    | StatementKind::Feature
                    | StatementKind::Extension
                    | StatementKind::Grouping
            ) && self.arena.get(id).qname.is_none()
            {
                let owner = self.linker.namespace_owner(module);
                let qmod = self.linker.module(owner).qname_module();
                let local = self
                    .arena
                    .local_name(id)
                    .map(SmolStr::new)
                    .unwrap_or_default();
                self.arena.get_mut(id).qname = Some(qmod.qname(local));
            }
            parent_path.clone()
        };

        // Register named children in this context's namespaces.
        let children = self.arena.get(id).children.clone();
        for child in children.iter().copied() {
            self.register_child(id, child)?;
        }
        for child in children {
            self.finalize_tree(child, &path, module)?;
        }
        Ok(())
    }

    /// Register one child in the namespace its kind populates, rejecting
    /// sibling name collisions.
    pub(crate) fn register_child(&mut self, scope: CtxId, child: CtxId) -> Result<(), ReactorError> {
        let child_ctx = self.arena.get(child);
        if child_ctx.removed {
            return Ok(());
        }
        let Some(support) = self.registry.support(&child_ctx.kind) else {
            return Ok(());
        };
        let Some(ns) = support.namespace else {
            return Ok(());
        };
        let Some(name) = self.arena.local_name(child).map(SmolStr::new) else {
            return Ok(());
        };
        let at = child_ctx.at;
        let kind = child_ctx.kind.clone();
        if let Err(existing) = self
            .arena
            .get_mut(scope)
            .namespaces
            .insert_unique(ns, name.clone(), child)
        {
            let prior = self.arena.get(existing).at;
            return Err(SourceError::new(
                at,
                format!("duplicate \"{kind}\" named \"{name}\" (first defined at {prior})"),
            )
            .into());
        }
        Ok(())
    }

    /// Attach an already-copied subtree under `parent`: append it, register
    /// it in the parent scope and recompute its paths and namespaces.
    pub(crate) fn attach_copy(&mut self, copy: CtxId, parent: CtxId) -> Result<(), ReactorError> {
        self.arena.get_mut(parent).children.push(copy);
        self.arena.get_mut(copy).parent = Some(parent);
        self.register_child(parent, copy)?;
        let parent_path = self
            .arena
            .get(parent)
            .path
            .clone()
            .unwrap_or_else(SchemaPath::root);
        let module = self
            .arena
            .get(copy)
            .module
            .expect("copied context always carries a module");
        self.finalize_tree(copy, &parent_path, module)
    }

    // ------------------------------------------------------------------
    // Phase: full declaration
    // ------------------------------------------------------------------

    fn full_declaration(&mut self) -> Result<(), ReactorError> {
        // Feature gating first: pruned uses/augments/deviations never run.
        resolve::features::gate_all(self)?;

        let mut tasks = self.collect_tasks();
        let mut pass = 0usize;
        while !tasks.is_empty() {
            pass += 1;
            let mut progressed = false;
            let mut blocked: Vec<(Task, InferenceError)> = Vec::new();
            for task in tasks.drain(..) {
                match self.run_task(task)? {
                    TaskOutcome::Done => progressed = true,
                    TaskOutcome::Blocked(cause) => blocked.push((task, cause)),
                }
            }
            debug!(pass, blocked = blocked.len(), "fixpoint pass complete");
            if !progressed && !blocked.is_empty() {
                return Err(ReactorError::UnresolvedModifiers {
                    phase: ModelPhase::FullDeclaration,
                    causes: blocked.into_iter().map(|(_, cause)| cause).collect(),
                });
            }
            tasks = blocked.into_iter().map(|(task, _)| task).collect();
        }

        // Copied subtrees carry their own if-feature statements.
        resolve::features::gate_all(self)?;
        Ok(())
    }

    /// Collect the initial work queue in deterministic arena order, uses
    /// before augments before deviations.
    fn collect_tasks(&self) -> Vec<Task> {
        let mut uses = Vec::new();
        let mut augments = Vec::new();
        let mut deviations = Vec::new();
        for index in 0..self.arena.len() {
            let id = CtxId::from_raw(index as u32);
            let ctx = self.arena.get(id);
            if ctx.removed {
                continue;
            }
            match ctx.kind {
                StatementKind::Uses => uses.push(Task::ExpandUses(id)),
                StatementKind::Augment => {
                    // Relative augments (inside uses) are applied during
                    // expansion of their uses statement.
                    let parent_is_root = ctx.parent.is_some_and(|p| {
                        matches!(
                            self.arena.get(p).kind,
                            StatementKind::Module | StatementKind::Submodule
                        )
                    });
                    if parent_is_root {
                        augments.push(Task::ApplyAugment(id));
                    }
                }
                StatementKind::Deviation => deviations.push(Task::ApplyDeviation(id)),
                _ => {}
            }
        }
        uses.into_iter()
            .chain(augments)
            .chain(deviations)
            .collect()
    }

    fn run_task(&mut self, task: Task) -> Result<TaskOutcome, ReactorError> {
        if self.arena.get(task.ctx()).removed {
            return Ok(TaskOutcome::Done);
        }
        match task {
            Task::ExpandUses(id) => resolve::uses::expand_uses(self, id),
            Task::ApplyAugment(id) => resolve::augment::apply_augment(self, id, None),
            Task::ApplyDeviation(id) => resolve::deviation::apply_deviation(self, id),
        }
    }

    // ------------------------------------------------------------------
    // Shared resolution helpers
    // ------------------------------------------------------------------

    pub(crate) fn module_of(&self, id: CtxId) -> ModuleId {
        self.arena
            .get(id)
            .module
            .expect("context is always attributed to a module after pre-linkage")
    }

    /// Resolve a possibly-prefixed reference in the given namespace: local
    /// scopes outward first, then module-level scope (module plus included
    /// submodules), or the prefixed module's scope.
    pub(crate) fn resolve_ns_ref(
        &self,
        from: CtxId,
        ns: NamespaceKind,
        raw: &str,
        phase: ModelPhase,
    ) -> Result<Option<CtxId>, InferenceError> {
        let at = self.arena.get(from).at;
        let module = self.module_of(from);
        match raw.split_once(':') {
            Some((prefix, local)) => {
                let target = self.linker.resolve_prefix(module, prefix).ok_or_else(|| {
                    InferenceError::new(
                        phase,
                        at,
                        format!("unknown prefix in reference \"{raw}\""),
                    )
                })?;
                if target == module || Some(target) == self.own_module(module) {
                    // Own prefix: fall through to lexical lookup.
                    return Ok(self.lookup_outward(from, ns, local, module));
                }
                Ok(self.lookup_in_module_scope(target, ns, local))
            }
            None => Ok(self.lookup_outward(from, ns, raw, module)),
        }
    }

    fn own_module(&self, module: ModuleId) -> Option<ModuleId> {
        Some(self.linker.namespace_owner(module))
    }

    fn lookup_outward(
        &self,
        from: CtxId,
        ns: NamespaceKind,
        name: &str,
        module: ModuleId,
    ) -> Option<CtxId> {
        let mut current = Some(from);
        while let Some(id) = current {
            if let Some(hit) = self.arena.get(id).namespaces.get(ns, name) {
                if !self.arena.get(hit).removed {
                    return Some(hit);
                }
            }
            current = self.arena.get(id).parent;
        }
        self.lookup_in_module_scope(module, ns, name)
    }

    pub(crate) fn lookup_in_module_scope(
        &self,
        module: ModuleId,
        ns: NamespaceKind,
        name: &str,
    ) -> Option<CtxId> {
        for scope in self.linker.scope_roots(module) {
            let root = self.linker.module(scope).root;
            if let Some(hit) = self.arena.get(root).namespaces.get(ns, name) {
                if !self.arena.get(hit).removed {
                    return Some(hit);
                }
            }
        }
        None
    }

    /// Resolve a schema-node-identifier argument.
    ///
    /// Absolute identifiers resolve from the root of the module each prefix
    /// names; descendant identifiers require `relative_to`. Segment prefixes
    /// select the module tree only for the first step; deeper steps match by
    /// local name, which sibling uniqueness keeps unambiguous.
    pub(crate) fn resolve_schema_path(
        &self,
        from: CtxId,
        arg: &str,
        relative_to: Option<CtxId>,
        phase: ModelPhase,
    ) -> Result<PathTarget, InferenceError> {
        let at = self.arena.get(from).at;
        let module = self.module_of(from);
        if arg.starts_with("//") {
            return Err(InferenceError::new(
                phase,
                at,
                format!("invalid schema node identifier \"{arg}\""),
            ));
        }

        let (mut current, remainder): (Option<CtxId>, &str) = match relative_to {
            Some(base) => {
                if arg.starts_with('/') {
                    return Err(InferenceError::new(
                        phase,
                        at,
                        format!(
                            "absolute schema node identifier \"{arg}\" is not allowed here"
                        ),
                    ));
                }
                (Some(base), arg)
            }
            None => {
                let Some(stripped) = arg.strip_prefix('/') else {
                    return Err(InferenceError::new(
                        phase,
                        at,
                        format!("schema node identifier \"{arg}\" must be absolute"),
                    ));
                };
                (None, stripped)
            }
        };

        for segment in remainder.split('/') {
            if segment.is_empty() {
                return Err(InferenceError::new(
                    phase,
                    at,
                    format!("invalid schema node identifier \"{arg}\""),
                ));
            }
            let (prefix, local) = match segment.split_once(':') {
                Some((p, l)) => (Some(p), l),
                None => (None, segment),
            };
            let seg_module = match prefix {
                Some(p) => self.linker.resolve_prefix(module, p).ok_or_else(|| {
                    InferenceError::new(
                        phase,
                        at,
                        format!("unknown prefix in schema node identifier \"{arg}\""),
                    )
                })?,
                None => module,
            };
            let next = match current {
                None => self.lookup_in_module_scope(seg_module, NamespaceKind::SchemaChild, local),
                Some(parent) => self.arena.schema_child_named(parent, local),
            };
            match next {
                Some(found) => {
                    current = Some(found);
                }
                None => {
                    // Distinguish "pruned away" from "never existed".
                    let pruned = match current {
                        None => self.pruned_in_module_scope(seg_module, local),
                        Some(parent) => self.pruned_child_named(parent, local),
                    };
                    if pruned {
                        return Ok(PathTarget::Pruned);
                    }
                    return Ok(PathTarget::Missing(format!(
                        "node \"{segment}\" of \"{arg}\" not found"
                    )));
                }
            }
        }
        Ok(PathTarget::Found(current.expect("path has at least one segment")))
    }

    fn pruned_in_module_scope(&self, module: ModuleId, name: &str) -> bool {
        self.linker.scope_roots(module).iter().any(|scope| {
            let root = self.linker.module(*scope).root;
            self.arena
                .get(root)
                .namespaces
                .get(NamespaceKind::SchemaChild, name)
                .is_some_and(|hit| self.arena.get(hit).removed)
        })
    }

    fn pruned_child_named(&self, parent: CtxId, name: &str) -> bool {
        self.arena.get(parent).children.iter().any(|&c| {
            let ctx = self.arena.get(c);
            ctx.removed && ctx.kind.is_schema_node() && self.arena.local_name(c) == Some(name)
        })
    }
}
