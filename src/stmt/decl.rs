//! Declared statement trees.
//!
//! A [`DeclaredStatement`] is the immutable, as-parsed form of one statement:
//! kind, raw argument, ordered substatements, source range. Trees are built
//! by an external grammar parser (or [`crate::stmt::build`] in tests) and are
//! never mutated by the reactor; uses/augment copies share subtrees by `Arc`.

use std::sync::Arc;

use smol_str::SmolStr;

use super::StatementKind;
use crate::base::SourceRef;

/// One immutable declared statement.
#[derive(Clone, Debug)]
pub struct DeclaredStatement {
    kind: StatementKind,
    argument: Option<SmolStr>,
    children: Vec<Arc<DeclaredStatement>>,
    at: SourceRef,
}

impl DeclaredStatement {
    pub fn new(
        kind: StatementKind,
        argument: Option<SmolStr>,
        children: Vec<Arc<DeclaredStatement>>,
        at: SourceRef,
    ) -> Self {
        Self {
            kind,
            argument,
            children,
            at,
        }
    }

    pub fn kind(&self) -> &StatementKind {
        &self.kind
    }

    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    pub fn children(&self) -> &[Arc<DeclaredStatement>] {
        &self.children
    }

    pub fn at(&self) -> SourceRef {
        self.at
    }

    /// First substatement of the given kind.
    pub fn find_first(&self, kind: &StatementKind) -> Option<&Arc<DeclaredStatement>> {
        self.children.iter().find(|c| c.kind() == kind)
    }

    /// All substatements of the given kind, in declaration order.
    pub fn find_all<'a>(
        &'a self,
        kind: &'a StatementKind,
    ) -> impl Iterator<Item = &'a Arc<DeclaredStatement>> {
        self.children.iter().filter(move |c| c.kind() == kind)
    }

    /// Argument of the first substatement of the given kind.
    pub fn argument_of(&self, kind: &StatementKind) -> Option<&str> {
        self.find_first(kind).and_then(|c| c.argument())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::SourceId;

    fn detached(kind: StatementKind, arg: Option<&str>) -> Arc<DeclaredStatement> {
        Arc::new(DeclaredStatement::new(
            kind,
            arg.map(SmolStr::new),
            Vec::new(),
            SourceRef::synthetic(SourceId::from_raw(0)),
        ))
    }

    #[test]
    fn test_find_helpers() {
        let stmt = DeclaredStatement::new(
            StatementKind::Leaf,
            Some(SmolStr::new("name")),
            vec![
                detached(StatementKind::Type, Some("string")),
                detached(StatementKind::Description, Some("a name")),
            ],
            SourceRef::synthetic(SourceId::from_raw(0)),
        );
        assert_eq!(stmt.argument(), Some("name"));
        assert_eq!(stmt.argument_of(&StatementKind::Type), Some("string"));
        assert!(stmt.find_first(&StatementKind::Units).is_none());
        assert_eq!(stmt.find_all(&StatementKind::Type).count(), 1);
    }
}
