//! # yangr
//!
//! Core library for linking YANG statement trees into an effective schema
//! context: grouping expansion, augmentation, deviation, feature gating,
//! identity and type derivation.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! model     → Effective schema context, immutable effective nodes
//!   ↓
//! resolve   → Uses/augment/deviation/feature/identity/type resolution
//!   ↓
//! reactor   → Build driver, context arena, linker, phase fixpoint
//!   ↓
//! registry  → Statement grammar: substatement tables, cardinality
//!   ↓
//! stmt      → Declared statements, statement kinds, stream sources
//!   ↓
//! errors    → Source/inference errors, soft diagnostics
//!   ↓
//! base      → Primitives (QName, SchemaPath, Revision, SourceRef)
//! ```

// ============================================================================
// MODULES (dependency order: base → stmt → registry → reactor → resolve → model)
// ============================================================================

/// Foundation types: QName, SchemaPath, Revision, SourceId/SourceRef
pub mod base;

/// Error types: source errors, phase-tagged inference errors, diagnostics
pub mod errors;

/// Declared statements: kinds, trees, builders, stream sources
pub mod stmt;

/// Statement grammar: substatement tables, cardinality, argument shapes
pub mod registry;

/// The reactor: build driver, context arena, linker, phases, task queue
pub mod reactor;

/// Resolution algorithms: uses, augment, deviation, features, identities, types
pub mod resolve;

/// The effective model: immutable context and nodes
pub mod model;

// Re-export the build surface
pub use reactor::{
    BuildOutcome, DeviationPolicy, FeatureSet, ModelPhase, ParserMode, Reactor, ReactorConfig,
};

// Re-export foundation types
pub use base::{QName, QNameModule, Revision, SchemaPath, SourceId, SourceRef};
pub use errors::{Diagnostic, InferenceError, ReactorError, Severity, SourceError};
pub use model::{EffectiveKind, EffectiveNode, EffectiveSchemaContext};
