//! Model processing phases.

use std::fmt;

/// The strictly increasing phases every statement context moves through.
///
/// A phase is never revisited: the scheduler drives each phase to a fixed
/// point before advancing, and a context frozen in `EffectiveModel` is
/// converted to its effective form and dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModelPhase {
    /// Source trees are imported and modules registered by name/namespace.
    SourcePreLinkage,
    /// Import/include edges are resolved and cycle-checked.
    SourceLinkage,
    /// Statement structure is validated, namespaces populated, QNames and
    /// schema paths assigned.
    StatementDefinition,
    /// Uses expansion, augmentation, deviation, feature gating.
    FullDeclaration,
    /// Identity/type hierarchies resolved, effective statements built.
    EffectiveModel,
}

impl ModelPhase {
    pub fn next(self) -> Option<ModelPhase> {
        use ModelPhase::*;
        match self {
            SourcePreLinkage => Some(SourceLinkage),
            SourceLinkage => Some(StatementDefinition),
            StatementDefinition => Some(FullDeclaration),
            FullDeclaration => Some(EffectiveModel),
            EffectiveModel => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelPhase::SourcePreLinkage => "source-pre-linkage",
            ModelPhase::SourceLinkage => "source-linkage",
            ModelPhase::StatementDefinition => "statement-definition",
            ModelPhase::FullDeclaration => "full-declaration",
            ModelPhase::EffectiveModel => "effective-model",
        }
    }
}

impl fmt::Display for ModelPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
