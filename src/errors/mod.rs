//! Build failure types.
//!
//! Three fatal shapes, mirroring where in the pipeline a problem surfaces:
//! - [`SourceError`]: malformed argument or structurally invalid
//!   substatement in one declared tree.
//! - [`InferenceError`]: a cross-source semantic resolution failure, tagged
//!   with the phase that detected it.
//! - [`ReactorError::UnresolvedModifiers`]: the fixpoint scheduler stalled;
//!   carries every blocked action's cause.
//!
//! Non-fatal findings travel through [`DiagnosticSink`] instead.

mod diagnostics;

use std::fmt;

use thiserror::Error;

use crate::base::SourceRef;
use crate::reactor::ModelPhase;

pub use diagnostics::{Diagnostic, DiagnosticSink, Severity};

/// Malformed statement argument or invalid substatement structure.
#[derive(Clone, Debug, Error)]
#[error("{message} (at {at})")]
pub struct SourceError {
    pub message: String,
    pub at: SourceRef,
}

impl SourceError {
    pub fn new(at: SourceRef, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            at,
        }
    }
}

/// Semantic resolution failure, tagged with the phase that detected it.
#[derive(Clone, Debug, Error)]
#[error("{message} [phase {phase}] (at {at})")]
pub struct InferenceError {
    pub message: String,
    pub phase: ModelPhase,
    pub at: SourceRef,
}

impl InferenceError {
    pub fn new(phase: ModelPhase, at: SourceRef, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            phase,
            at,
        }
    }
}

/// Top-level build failure.
#[derive(Clone, Debug, Error)]
pub enum ReactorError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// The scheduler reached a pass in which no blocked action made
    /// progress; each individual cause is preserved for diagnosis.
    #[error("{}", format_unresolved(.phase, .causes))]
    UnresolvedModifiers {
        phase: ModelPhase,
        causes: Vec<InferenceError>,
    },
}

impl ReactorError {
    /// The phase at which the build failed.
    pub fn phase(&self) -> Option<ModelPhase> {
        match self {
            ReactorError::Source(_) => None,
            ReactorError::Inference(e) => Some(e.phase),
            ReactorError::UnresolvedModifiers { phase, .. } => Some(*phase),
        }
    }
}

fn format_unresolved(phase: &ModelPhase, causes: &[InferenceError]) -> String {
    use fmt::Write;
    let mut out = format!(
        "{} modifier(s) left unresolved at phase {phase}",
        causes.len()
    );
    for cause in causes {
        let _ = write!(out, "\n  - {cause}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::SourceId;

    fn at() -> SourceRef {
        SourceRef::synthetic(SourceId::from_raw(0))
    }

    #[test]
    fn test_unresolved_modifiers_lists_every_cause() {
        let err = ReactorError::UnresolvedModifiers {
            phase: ModelPhase::FullDeclaration,
            causes: vec![
                InferenceError::new(ModelPhase::FullDeclaration, at(), "grouping g not found"),
                InferenceError::new(ModelPhase::FullDeclaration, at(), "augment target missing"),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("2 modifier(s)"));
        assert!(text.contains("grouping g not found"));
        assert!(text.contains("augment target missing"));
        assert_eq!(err.phase(), Some(ModelPhase::FullDeclaration));
    }

    #[test]
    fn test_inference_error_is_phase_tagged() {
        let err: ReactorError =
            InferenceError::new(ModelPhase::SourceLinkage, at(), "imported module not found")
                .into();
        assert_eq!(err.phase(), Some(ModelPhase::SourceLinkage));
        assert!(err.to_string().contains("source-linkage"));
    }
}
