//! Foundation types for the yangr reactor.
//!
//! This module provides the value types used throughout the build:
//! - [`QName`], [`QNameModule`] - namespace-qualified names
//! - [`Revision`] - module revision dates
//! - [`SchemaPath`] - positions in the effective schema tree
//! - [`SourceId`], [`SourceRef`] - source attribution for diagnostics
//!
//! This module has NO dependencies on other yangr modules.

mod path;
mod qname;
mod source;

pub use path::SchemaPath;
pub use qname::{QName, QNameModule, Revision};
pub use source::{SourceId, SourceRef};

// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};
