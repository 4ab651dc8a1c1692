//! Common fixtures for the reactor test suites.
//!
//! Modules are expressed as builder chains instead of text; the reactor
//! consumes declared trees, so no grammar parser is needed here.

#![allow(dead_code)]

use std::sync::Arc;

use yangr::stmt::build::{kw, StatementBuilder};
use yangr::stmt::{DeclaredStatement, DeclaredStatementSource};
use yangr::{QNameModule, Reactor, ReactorConfig, ReactorError, Revision, SchemaPath, SourceId};
use yangr::reactor::BuildOutcome;

/// Module skeleton: name, namespace, prefix.
pub fn module(name: &str, namespace: &str, prefix: &str) -> StatementBuilder {
    kw("module")
        .arg(name)
        .child(kw("namespace").arg(namespace))
        .child(kw("prefix").arg(prefix))
}

/// Submodule skeleton: name plus belongs-to with prefix.
pub fn submodule(name: &str, belongs_to: &str, prefix: &str) -> StatementBuilder {
    kw("submodule")
        .arg(name)
        .child(kw("belongs-to").arg(belongs_to).child(kw("prefix").arg(prefix)))
}

pub fn import(name: &str, prefix: &str) -> StatementBuilder {
    kw("import").arg(name).child(kw("prefix").arg(prefix))
}

pub fn leaf(name: &str, type_name: &str) -> StatementBuilder {
    kw("leaf").arg(name).child(kw("type").arg(type_name))
}

/// Run a build over the given (source name, tree builder) pairs.
pub fn build(
    sources: Vec<(&str, StatementBuilder)>,
) -> Result<BuildOutcome, ReactorError> {
    build_with(ReactorConfig::default(), sources)
}

pub fn build_with(
    config: ReactorConfig,
    sources: Vec<(&str, StatementBuilder)>,
) -> Result<BuildOutcome, ReactorError> {
    let mut reactor = Reactor::with_config(config);
    for (index, (name, tree)) in sources.into_iter().enumerate() {
        let root: Arc<DeclaredStatement> = tree.build(SourceId::from_raw(index as u32));
        let source = DeclaredStatementSource::new(name, root);
        reactor.add_source(&source);
    }
    reactor.build()
}

/// Absolute schema path within one namespace.
pub fn path(namespace: &str, revision: Option<&str>, locals: &[&str]) -> SchemaPath {
    let module = QNameModule::new(
        namespace,
        revision.and_then(Revision::parse),
    );
    let mut path = SchemaPath::root();
    for local in locals {
        path = path.child(module.qname(*local));
    }
    path
}
