//! Declared statement trees - the reactor's input representation.

pub mod build;
mod decl;
mod kind;
mod source;

pub use decl::DeclaredStatement;
pub use kind::StatementKind;
pub use source::{DeclaredStatementSource, StatementStreamSource};
