//! Programmatic construction of declared statement trees.
//!
//! External grammar parsers emit [`DeclaredStatement`] trees directly; this
//! builder exists for collaborators that synthesize statements (and for the
//! test suites, which express modules as builder chains instead of text).

use std::sync::Arc;

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use super::{DeclaredStatement, StatementKind};
use crate::base::{SourceId, SourceRef};

/// Fluent builder for one statement and its subtree.
#[derive(Clone, Debug)]
pub struct StatementBuilder {
    kind: StatementKind,
    argument: Option<SmolStr>,
    children: Vec<StatementBuilder>,
}

/// Start building a statement of the given kind.
pub fn stmt(kind: StatementKind) -> StatementBuilder {
    StatementBuilder {
        kind,
        argument: None,
        children: Vec::new(),
    }
}

/// Shorthand for a statement identified by keyword.
pub fn kw(keyword: &str) -> StatementBuilder {
    stmt(StatementKind::from_keyword(keyword))
}

impl StatementBuilder {
    pub fn arg(mut self, argument: impl Into<SmolStr>) -> Self {
        self.argument = Some(argument.into());
        self
    }

    pub fn child(mut self, child: StatementBuilder) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = StatementBuilder>) -> Self {
        self.children.extend(children);
        self
    }

    /// Finish the tree, assigning each statement a distinct range in the
    /// given source so diagnostics stay distinguishable.
    pub fn build(self, source: SourceId) -> Arc<DeclaredStatement> {
        let mut offset = 0u32;
        self.build_at(source, &mut offset)
    }

    fn build_at(self, source: SourceId, offset: &mut u32) -> Arc<DeclaredStatement> {
        let start = *offset;
        *offset += 1;
        let children = self
            .children
            .into_iter()
            .map(|c| c.build_at(source, offset))
            .collect();
        let at = SourceRef::new(
            source,
            TextRange::new(TextSize::new(start), TextSize::new(start + 1)),
        );
        Arc::new(DeclaredStatement::new(self.kind, self.argument, children, at))
    }
}
