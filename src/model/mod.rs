//! The effective model.
//!
//! Once every modification has been applied, the mutable context graph is
//! frozen into an [`EffectiveSchemaContext`]: an immutable, fully resolved
//! view of every module in the build, with groupings expanded, augments and
//! deviations folded in, unsupported subtrees absent, and every type and
//! identity reference resolved.

mod builder;
mod context;
mod node;

pub(crate) use builder::build_context;
pub use context::EffectiveSchemaContext;
pub use node::{EffectiveKind, EffectiveNode, ModuleRevision, NodeMeta, NodeStatus};
