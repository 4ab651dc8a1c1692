//! Soft diagnostics.
//!
//! Certain augment/deviation edge cases are intentionally non-fatal: they
//! are reported through this channel and the build proceeds. Fatal failures
//! never pass through here; they abort via [`crate::errors::ReactorError`].

use std::sync::Arc;

use crate::base::SourceRef;

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// A non-fatal finding with its source location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: Arc<str>,
    pub at: SourceRef,
}

impl Diagnostic {
    pub fn warning(at: SourceRef, message: impl Into<Arc<str>>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            at,
        }
    }

    pub fn info(at: SourceRef, message: impl Into<Arc<str>>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            at,
        }
    }
}

/// Collects soft diagnostics during a build and mirrors them to `tracing`.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    collected: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => {
                tracing::warn!(at = %diagnostic.at, "{}", diagnostic.message)
            }
            Severity::Info => {
                tracing::info!(at = %diagnostic.at, "{}", diagnostic.message)
            }
        }
        self.collected.push(diagnostic);
    }

    pub fn warn(&mut self, at: SourceRef, message: impl Into<Arc<str>>) {
        self.report(Diagnostic::warning(at, message));
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.collected
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.collected
    }
}
