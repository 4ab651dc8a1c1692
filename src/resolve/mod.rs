//! Resolution algorithms of the full-declaration and effective-model phases.
//!
//! Each submodule implements one statement family: feature gating, grouping
//! expansion, augmentation, deviation, identity derivation and type
//! derivation. All of them operate on the shared build state and report
//! blockage through task outcomes where another pending task may still
//! unblock them.

pub(crate) mod augment;
pub(crate) mod deviation;
pub(crate) mod features;
pub(crate) mod identity;
pub(crate) mod types;
pub(crate) mod uses;

pub use identity::IdentityGraph;
pub use types::{BuiltinType, LengthRange, ResolvedType, ResolvedTypes, ValueRange};
