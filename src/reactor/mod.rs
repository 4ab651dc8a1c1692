//! The cross-source statement inference reactor.
//!
//! [`Reactor`] accepts statement-tree sources, then a single [`Reactor::build`]
//! drives every statement context through the [`ModelPhase`] sequence to a
//! fixed point, producing an effective schema context or a phase-located
//! error.

mod arena;
mod build;
mod linker;
mod namespace;
mod phase;
mod task;

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::base::QName;

pub use arena::{ContextArena, CopyKind, CtxId, StmtContext};
pub use build::{BuildOutcome, Reactor};
pub(crate) use build::{BuildState, PathTarget};
pub use linker::{Linker, ModuleId, ModuleInfo};
pub use namespace::NamespaceStore;
pub use phase::ModelPhase;
pub(crate) use task::{Task, TaskOutcome};

/// Parser compatibility mode.
///
/// `Strict` additionally enforces lexical argument grammars (identifier
/// syntax, dates, integer ranges); both modes enforce substatement structure
/// identically.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParserMode {
    #[default]
    Default,
    Strict,
}

/// Predicate over feature QNames driving if-feature gating.
#[derive(Clone, Debug, Default)]
pub enum FeatureSet {
    /// Every feature is supported.
    #[default]
    All,
    /// Exactly these features are supported.
    Explicit(FxHashSet<QName>),
}

impl FeatureSet {
    /// No features supported at all.
    pub fn none() -> Self {
        FeatureSet::Explicit(FxHashSet::default())
    }

    pub fn of(features: impl IntoIterator<Item = QName>) -> Self {
        FeatureSet::Explicit(features.into_iter().collect())
    }

    pub fn is_supported(&self, feature: &QName) -> bool {
        match self {
            FeatureSet::All => true,
            FeatureSet::Explicit(set) => set.contains(feature),
        }
    }
}

/// Which modules may deviate which.
#[derive(Clone, Debug, Default)]
pub enum DeviationPolicy {
    /// Any module may deviate any other.
    #[default]
    AllowAll,
    /// Deviated module name -> names of modules permitted to deviate it.
    /// Deviations from non-permitted modules are skipped without error.
    PerModule(FxHashMap<SmolStr, FxHashSet<SmolStr>>),
}

impl DeviationPolicy {
    pub fn allows(&self, deviated: &str, deviating: &str) -> bool {
        match self {
            DeviationPolicy::AllowAll => true,
            DeviationPolicy::PerModule(map) => map
                .get(deviated)
                .is_some_and(|allowed| allowed.contains(deviating)),
        }
    }
}

/// Build configuration, fixed before the first source is added.
#[derive(Clone, Debug, Default)]
pub struct ReactorConfig {
    pub mode: ParserMode,
    pub features: FeatureSet,
    pub deviations: DeviationPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::QNameModule;

    #[test]
    fn test_feature_set_predicates() {
        let m = QNameModule::new("urn:m", None);
        let f = m.qname("fast-path");
        assert!(FeatureSet::All.is_supported(&f));
        assert!(!FeatureSet::none().is_supported(&f));
        assert!(FeatureSet::of([f.clone()]).is_supported(&f));
        assert!(!FeatureSet::of([f]).is_supported(&m.qname("other")));
    }

    #[test]
    fn test_deviation_policy() {
        let policy = DeviationPolicy::AllowAll;
        assert!(policy.allows("a", "b"));

        let mut map = FxHashMap::default();
        map.insert(
            SmolStr::new("a"),
            [SmolStr::new("b")].into_iter().collect::<FxHashSet<_>>(),
        );
        let policy = DeviationPolicy::PerModule(map);
        assert!(policy.allows("a", "b"));
        assert!(!policy.allows("a", "c"));
        assert!(!policy.allows("x", "b"));
    }
}
