//! Source attribution.
//!
//! The reactor never reads source text itself; statement trees arrive
//! pre-parsed. Each tree is tagged with a [`SourceId`] so every statement can
//! carry a cheap [`SourceRef`] back to the byte range it was parsed from,
//! which is what diagnostics report.

use std::fmt;

use text_size::TextRange;

/// Identifier of one statement-tree source within a build.
///
/// Ids are assigned in the order sources are added to the reactor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(u32);

impl SourceId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

/// A byte range within one source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceRef {
    pub source: SourceId,
    pub range: TextRange,
}

impl SourceRef {
    pub fn new(source: SourceId, range: TextRange) -> Self {
        Self { source, range }
    }

    /// A reference for statements synthesized by the reactor itself
    /// (implicit input/output, shorthand cases). Points at the start of the
    /// source that triggered the synthesis.
    pub fn synthetic(source: SourceId) -> Self {
        Self {
            source,
            range: TextRange::empty(0.into()),
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}..{}",
            self.source,
            u32::from(self.range.start()),
            u32::from(self.range.end())
        )
    }
}
