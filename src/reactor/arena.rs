//! The statement context graph.
//!
//! Every statement lives in a [`StmtContext`] during the build: a mutable
//! wrapper around the immutable declared statement, linked to its parent and
//! children by arena ids rather than owning pointers. Copies produced by
//! uses expansion and augmentation are fresh contexts with an `original`
//! back-reference; following that chain yields copy provenance.

use std::sync::Arc;

use smol_str::SmolStr;

use super::linker::ModuleId;
use super::namespace::NamespaceStore;
use crate::base::{QName, SchemaPath, SourceRef};
use crate::stmt::{DeclaredStatement, StatementKind};

/// Handle of one statement context in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CtxId(u32);

impl CtxId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a context came to exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyKind {
    /// Declared directly in its source.
    Original,
    /// Copied into place by uses expansion.
    AddedByUses,
    /// Copied into place by an augment.
    AddedByAugmentation,
}

/// Mutable working representation of one statement.
#[derive(Clone, Debug)]
pub struct StmtContext {
    pub kind: StatementKind,
    pub argument: Option<SmolStr>,
    pub at: SourceRef,
    /// The declared statement this context mirrors; `None` for statements
    /// synthesized by the reactor (implicit input/output, shorthand cases).
    pub decl: Option<Arc<DeclaredStatement>>,
    pub parent: Option<CtxId>,
    pub children: Vec<CtxId>,
    /// Module owning the declaration; copies keep their original's module.
    pub module: Option<ModuleId>,
    pub copy: CopyKind,
    pub original: Option<CtxId>,
    pub qname: Option<QName>,
    pub path: Option<SchemaPath>,
    /// Pruned from the effective tree (if-feature false, deviate
    /// not-supported, guarded mandatory augmentation).
    pub removed: bool,
    /// For `uses` statements: expansion already performed. Copies of an
    /// expanded uses must not expand again, their results were copied along.
    pub uses_expanded: bool,
    pub namespaces: NamespaceStore,
}

impl StmtContext {
    fn from_decl(decl: &Arc<DeclaredStatement>) -> Self {
        Self {
            kind: decl.kind().clone(),
            argument: decl.argument().map(SmolStr::new),
            at: decl.at(),
            decl: Some(Arc::clone(decl)),
            parent: None,
            children: Vec::new(),
            module: None,
            copy: CopyKind::Original,
            original: None,
            qname: None,
            path: None,
            removed: false,
            uses_expanded: false,
            namespaces: NamespaceStore::default(),
        }
    }

    /// Context for a reactor-synthesized statement.
    pub fn synthetic(kind: StatementKind, argument: Option<SmolStr>, at: SourceRef) -> Self {
        Self {
            kind,
            argument,
            at,
            decl: None,
            parent: None,
            children: Vec::new(),
            module: None,
            copy: CopyKind::Original,
            original: None,
            qname: None,
            path: None,
            removed: false,
            uses_expanded: false,
            namespaces: NamespaceStore::default(),
        }
    }
}

/// Arena of statement contexts; all links are [`CtxId`]s.
#[derive(Debug, Default)]
pub struct ContextArena {
    nodes: Vec<StmtContext>,
}

impl ContextArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, ctx: StmtContext) -> CtxId {
        let id = CtxId(self.nodes.len() as u32);
        self.nodes.push(ctx);
        id
    }

    pub fn get(&self, id: CtxId) -> &StmtContext {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: CtxId) -> &mut StmtContext {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Recursively import a declared tree, producing linked contexts.
    pub fn import_tree(
        &mut self,
        decl: &Arc<DeclaredStatement>,
        parent: Option<CtxId>,
        module: Option<ModuleId>,
    ) -> CtxId {
        let mut ctx = StmtContext::from_decl(decl);
        ctx.parent = parent;
        ctx.module = module;
        let id = self.alloc(ctx);
        let children: Vec<CtxId> = decl
            .children()
            .iter()
            .map(|child| self.import_tree(child, Some(id), module))
            .collect();
        self.get_mut(id).children = children;
        if let Some(parent) = parent {
            self.get_mut(parent).children_push_if_detached(id);
        }
        id
    }

    /// Deep-copy the subtree rooted at `src` under `new_parent`.
    ///
    /// The copy keeps its original QName and module; its `original` points
    /// at `src` so root provenance stays reachable through chained copies.
    /// The caller is responsible for appending the returned id to
    /// `new_parent`'s children, recomputing paths and repopulating
    /// namespaces.
    pub fn deep_copy(&mut self, src: CtxId, new_parent: CtxId, copy: CopyKind) -> CtxId {
        let template = self.get(src).clone();
        let ctx = StmtContext {
            children: Vec::new(),
            parent: Some(new_parent),
            copy,
            original: Some(src),
            path: None,
            namespaces: NamespaceStore::default(),
            ..template
        };
        let id = self.alloc(ctx);
        let src_children = self.get(src).children.clone();
        let children: Vec<CtxId> = src_children
            .iter()
            .map(|&child| self.deep_copy(child, id, copy))
            .collect();
        self.get_mut(id).children = children;
        id
    }

    /// Follow the `original` chain to the first non-copy ancestor.
    pub fn root_original(&self, id: CtxId) -> CtxId {
        let mut current = id;
        while let Some(original) = self.get(current).original {
            current = original;
        }
        current
    }

    /// Mark a subtree removed from the effective tree.
    pub fn mark_removed(&mut self, id: CtxId) {
        self.get_mut(id).removed = true;
        let children = self.get(id).children.clone();
        for child in children {
            self.mark_removed(child);
        }
    }

    /// Live (non-removed) children of the given kind.
    pub fn children_of_kind<'a>(
        &'a self,
        id: CtxId,
        kind: &'a StatementKind,
    ) -> impl Iterator<Item = CtxId> + 'a {
        self.get(id)
            .children
            .iter()
            .copied()
            .filter(move |&c| !self.get(c).removed && self.get(c).kind == *kind)
    }

    /// First live child of the given kind.
    pub fn first_child_of_kind(&self, id: CtxId, kind: &StatementKind) -> Option<CtxId> {
        self.children_of_kind(id, kind).next()
    }

    /// Argument of the first live child of the given kind.
    pub fn child_argument(&self, id: CtxId, kind: &StatementKind) -> Option<&str> {
        self.first_child_of_kind(id, kind)
            .and_then(|c| self.get(c).argument.as_deref())
    }

    /// Live schema-node child with the given local name, looking through
    /// synthetic cases is the caller's business.
    pub fn schema_child_named(&self, id: CtxId, local_name: &str) -> Option<CtxId> {
        self.get(id).children.iter().copied().find(|&c| {
            let ctx = self.get(c);
            !ctx.removed
                && ctx.kind.is_schema_node()
                && self.local_name(c) == Some(local_name)
        })
    }

    /// The local name a context answers to in the schema tree: its argument,
    /// or the keyword for the argument-less `input`/`output` statements.
    pub fn local_name(&self, id: CtxId) -> Option<&str> {
        let ctx = self.get(id);
        match &ctx.kind {
            StatementKind::Input => Some("input"),
            StatementKind::Output => Some("output"),
            _ => ctx.argument.as_deref(),
        }
    }

    /// Walk a subtree depth-first, pre-order, visiting live contexts.
    pub fn walk(&self, root: CtxId, visit: &mut impl FnMut(CtxId)) {
        if self.get(root).removed {
            return;
        }
        visit(root);
        for &child in &self.get(root).children {
            self.walk(child, visit);
        }
    }
}

impl StmtContext {
    fn children_push_if_detached(&mut self, id: CtxId) {
        if !self.children.contains(&id) {
            self.children.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::SourceId;
    use crate::stmt::build::{kw, stmt};

    fn sample(arena: &mut ContextArena) -> CtxId {
        let tree = stmt(StatementKind::Container)
            .arg("top")
            .child(kw("leaf").arg("x").child(kw("type").arg("string")))
            .build(SourceId::from_raw(0));
        arena.import_tree(&tree, None, None)
    }

    #[test]
    fn test_import_links_parents_and_children() {
        let mut arena = ContextArena::new();
        let root = sample(&mut arena);
        let leaf = arena.first_child_of_kind(root, &StatementKind::Leaf).unwrap();
        assert_eq!(arena.get(leaf).parent, Some(root));
        assert_eq!(arena.get(leaf).argument.as_deref(), Some("x"));
        assert_eq!(arena.child_argument(leaf, &StatementKind::Type), Some("string"));
    }

    #[test]
    fn test_deep_copy_sets_provenance_chain() {
        let mut arena = ContextArena::new();
        let root = sample(&mut arena);
        let first = arena.deep_copy(root, root, CopyKind::AddedByUses);
        let second = arena.deep_copy(first, root, CopyKind::AddedByUses);
        assert_eq!(arena.get(second).original, Some(first));
        assert_eq!(arena.root_original(second), root);
        assert_eq!(arena.get(second).copy, CopyKind::AddedByUses);
        // Children are copied recursively with the same marking.
        let copied_leaf = arena.first_child_of_kind(second, &StatementKind::Leaf).unwrap();
        assert_eq!(arena.get(copied_leaf).copy, CopyKind::AddedByUses);
        assert_eq!(arena.root_original(copied_leaf), {
            let orig_leaf = arena.first_child_of_kind(root, &StatementKind::Leaf).unwrap();
            orig_leaf
        });
    }

    #[test]
    fn test_mark_removed_is_recursive() {
        let mut arena = ContextArena::new();
        let root = sample(&mut arena);
        arena.mark_removed(root);
        let mut visited = 0;
        arena.walk(root, &mut |_| visited += 1);
        assert_eq!(visited, 0);
    }
}
