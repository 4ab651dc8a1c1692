//! Statement stream sources.
//!
//! The reactor consumes already-parsed statement trees; how a tree was
//! produced (text parser, YIN reader, programmatic builder) is irrelevant.
//! A source must be replayable: `root()` may be called more than once and
//! must yield the same tree.

use std::sync::Arc;

use smol_str::SmolStr;

use super::DeclaredStatement;

/// A replayable supplier of one module's or submodule's declared tree.
pub trait StatementStreamSource {
    /// Human-readable source name used in diagnostics (e.g. a file name).
    fn source_name(&self) -> &str;

    /// The root `module`/`submodule` statement of this source.
    fn root(&self) -> Arc<DeclaredStatement>;
}

/// The trivial source: a name plus an already-built tree.
#[derive(Clone, Debug)]
pub struct DeclaredStatementSource {
    name: SmolStr,
    root: Arc<DeclaredStatement>,
}

impl DeclaredStatementSource {
    pub fn new(name: impl Into<SmolStr>, root: Arc<DeclaredStatement>) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }
}

impl StatementStreamSource for DeclaredStatementSource {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn root(&self) -> Arc<DeclaredStatement> {
        Arc::clone(&self.root)
    }
}
