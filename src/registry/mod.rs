//! Statement behavior registry.
//!
//! One [`StatementSupport`] per statement kind: argument grammar, allowed
//! substatements with cardinality, and the namespace the statement populates
//! in its enclosing scope. The registry drives structural validation during
//! the statement-definition phase; effective-statement construction
//! dispatches over the same closed kind set in [`crate::model`].

mod rules;

use rustc_hash::FxHashMap;

use crate::errors::SourceError;
use crate::stmt::{DeclaredStatement, StatementKind};

pub use rules::{ArgumentGrammar, ArgumentSpec, Cardinality};

/// The namespaces a statement may populate in its parent scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NamespaceKind {
    /// Child schema nodes (data nodes, cases, rpcs, actions, notifications).
    SchemaChild,
    Grouping,
    Typedef,
    Identity,
    Feature,
    Extension,
}

/// Declaration-side behavior of one statement kind.
#[derive(Clone, Debug)]
pub struct StatementSupport {
    pub arg: ArgumentSpec,
    pub substatements: Vec<(StatementKind, Cardinality)>,
    pub namespace: Option<NamespaceKind>,
}

impl StatementSupport {
    pub fn cardinality_of(&self, kind: &StatementKind) -> Option<Cardinality> {
        self.substatements
            .iter()
            .find(|(k, _)| k == kind)
            .map(|(_, c)| *c)
    }
}

/// Registry of statement behaviors for the RFC 7950 statement set.
#[derive(Debug)]
pub struct StatementRegistry {
    supports: FxHashMap<StatementKind, StatementSupport>,
}

struct Def {
    kind: StatementKind,
    support: StatementSupport,
}

fn def(kind: StatementKind, arg: ArgumentSpec) -> Def {
    Def {
        kind,
        support: StatementSupport {
            arg,
            substatements: Vec::new(),
            namespace: None,
        },
    }
}

impl Def {
    fn sub(mut self, kind: StatementKind, cardinality: Cardinality) -> Self {
        self.support.substatements.push((kind, cardinality));
        self
    }

    fn subs(mut self, kinds: &[StatementKind], cardinality: Cardinality) -> Self {
        for kind in kinds {
            self.support.substatements.push((kind.clone(), cardinality));
        }
        self
    }

    fn ns(mut self, namespace: NamespaceKind) -> Self {
        self.support.namespace = Some(namespace);
        self
    }
}

use ArgumentGrammar as G;
use ArgumentSpec::{None as NoArg, Optional, Required};
use Cardinality as C;
use StatementKind as K;

/// description / reference / status, each at most once.
const META: &[K] = &[K::Description, K::Reference, K::Status];

/// The data-definition statement kinds.
const DATA_DEF: &[K] = &[
    K::Container,
    K::Leaf,
    K::LeafList,
    K::List,
    K::Choice,
    K::Anydata,
    K::Anyxml,
    K::Uses,
];

impl StatementRegistry {
    /// The RFC 7950 statement set.
    pub fn rfc7950() -> Self {
        let body = |d: Def| {
            d.subs(DATA_DEF, C::ANY)
                .sub(K::Grouping, C::ANY)
                .sub(K::Typedef, C::ANY)
        };

        let defs = vec![
            // ---- module structure -------------------------------------
            body(def(K::Module, Required(G::Identifier)))
                .sub(K::Namespace, C::ONE)
                .sub(K::Prefix, C::ONE)
                .sub(K::YangVersion, C::ZERO_OR_ONE)
                .sub(K::Import, C::ANY)
                .sub(K::Include, C::ANY)
                .sub(K::Organization, C::ZERO_OR_ONE)
                .sub(K::Contact, C::ZERO_OR_ONE)
                .sub(K::Revision, C::ANY)
                .sub(K::Augment, C::ANY)
                .sub(K::Deviation, C::ANY)
                .sub(K::Extension, C::ANY)
                .sub(K::Feature, C::ANY)
                .sub(K::Identity, C::ANY)
                .sub(K::Rpc, C::ANY)
                .sub(K::Notification, C::ANY)
                .sub(K::Description, C::ZERO_OR_ONE)
                .sub(K::Reference, C::ZERO_OR_ONE),
            body(def(K::Submodule, Required(G::Identifier)))
                .sub(K::BelongsTo, C::ONE)
                .sub(K::YangVersion, C::ZERO_OR_ONE)
                .sub(K::Import, C::ANY)
                .sub(K::Include, C::ANY)
                .sub(K::Organization, C::ZERO_OR_ONE)
                .sub(K::Contact, C::ZERO_OR_ONE)
                .sub(K::Revision, C::ANY)
                .sub(K::Augment, C::ANY)
                .sub(K::Deviation, C::ANY)
                .sub(K::Extension, C::ANY)
                .sub(K::Feature, C::ANY)
                .sub(K::Identity, C::ANY)
                .sub(K::Rpc, C::ANY)
                .sub(K::Notification, C::ANY)
                .sub(K::Description, C::ZERO_OR_ONE)
                .sub(K::Reference, C::ZERO_OR_ONE),
            def(K::Import, Required(G::Identifier))
                .sub(K::Prefix, C::ONE)
                .sub(K::RevisionDate, C::ZERO_OR_ONE)
                .sub(K::Description, C::ZERO_OR_ONE)
                .sub(K::Reference, C::ZERO_OR_ONE),
            def(K::Include, Required(G::Identifier))
                .sub(K::RevisionDate, C::ZERO_OR_ONE)
                .sub(K::Description, C::ZERO_OR_ONE)
                .sub(K::Reference, C::ZERO_OR_ONE),
            def(K::BelongsTo, Required(G::Identifier)).sub(K::Prefix, C::ONE),
            def(K::Revision, Required(G::Date))
                .sub(K::Description, C::ZERO_OR_ONE)
                .sub(K::Reference, C::ZERO_OR_ONE),
            // ---- extensions, features, identities ----------------------
            def(K::Extension, Required(G::Identifier))
                .ns(NamespaceKind::Extension)
                .sub(K::Argument, C::ZERO_OR_ONE)
                .subs(META, C::ZERO_OR_ONE),
            def(K::Argument, Required(G::Identifier)).sub(K::YinElement, C::ZERO_OR_ONE),
            def(K::Feature, Required(G::Identifier))
                .ns(NamespaceKind::Feature)
                .sub(K::IfFeature, C::ANY)
                .subs(META, C::ZERO_OR_ONE),
            def(K::Identity, Required(G::Identifier))
                .ns(NamespaceKind::Identity)
                .sub(K::Base, C::ANY)
                .sub(K::IfFeature, C::ANY)
                .subs(META, C::ZERO_OR_ONE),
            // ---- types -------------------------------------------------
            def(K::Typedef, Required(G::Identifier))
                .ns(NamespaceKind::Typedef)
                .sub(K::Type, C::ONE)
                .sub(K::Units, C::ZERO_OR_ONE)
                .sub(K::Default, C::ZERO_OR_ONE)
                .subs(META, C::ZERO_OR_ONE),
            def(K::Type, Required(G::PrefixedIdentifier))
                .sub(K::Range, C::ZERO_OR_ONE)
                .sub(K::Length, C::ZERO_OR_ONE)
                .sub(K::Pattern, C::ANY)
                .sub(K::Enum, C::ANY)
                .sub(K::Bit, C::ANY)
                .sub(K::FractionDigits, C::ZERO_OR_ONE)
                .sub(K::Path, C::ZERO_OR_ONE)
                .sub(K::RequireInstance, C::ZERO_OR_ONE)
                .sub(K::Base, C::ANY)
                .sub(K::Type, C::ANY),
            def(K::Enum, Required(G::Text))
                .sub(K::Value, C::ZERO_OR_ONE)
                .sub(K::IfFeature, C::ANY)
                .subs(META, C::ZERO_OR_ONE),
            def(K::Bit, Required(G::Identifier))
                .sub(K::Position, C::ZERO_OR_ONE)
                .sub(K::IfFeature, C::ANY)
                .subs(META, C::ZERO_OR_ONE),
            def(K::Range, Required(G::Text))
                .sub(K::ErrorMessage, C::ZERO_OR_ONE)
                .sub(K::ErrorAppTag, C::ZERO_OR_ONE)
                .sub(K::Description, C::ZERO_OR_ONE)
                .sub(K::Reference, C::ZERO_OR_ONE),
            def(K::Length, Required(G::Text))
                .sub(K::ErrorMessage, C::ZERO_OR_ONE)
                .sub(K::ErrorAppTag, C::ZERO_OR_ONE)
                .sub(K::Description, C::ZERO_OR_ONE)
                .sub(K::Reference, C::ZERO_OR_ONE),
            def(K::Pattern, Required(G::Text))
                .sub(K::Modifier, C::ZERO_OR_ONE)
                .sub(K::ErrorMessage, C::ZERO_OR_ONE)
                .sub(K::ErrorAppTag, C::ZERO_OR_ONE)
                .sub(K::Description, C::ZERO_OR_ONE)
                .sub(K::Reference, C::ZERO_OR_ONE),
            // ---- data definitions -------------------------------------
            body(def(K::Container, Required(G::Identifier)))
                .ns(NamespaceKind::SchemaChild)
                .sub(K::Action, C::ANY)
                .sub(K::Notification, C::ANY)
                .sub(K::Must, C::ANY)
                .sub(K::Presence, C::ZERO_OR_ONE)
                .sub(K::Config, C::ZERO_OR_ONE)
                .sub(K::IfFeature, C::ANY)
                .sub(K::When, C::ZERO_OR_ONE)
                .subs(META, C::ZERO_OR_ONE),
            def(K::Leaf, Required(G::Identifier))
                .ns(NamespaceKind::SchemaChild)
                .sub(K::Type, C::ONE)
                .sub(K::Units, C::ZERO_OR_ONE)
                .sub(K::Default, C::ZERO_OR_ONE)
                .sub(K::Config, C::ZERO_OR_ONE)
                .sub(K::Mandatory, C::ZERO_OR_ONE)
                .sub(K::Must, C::ANY)
                .sub(K::IfFeature, C::ANY)
                .sub(K::When, C::ZERO_OR_ONE)
                .subs(META, C::ZERO_OR_ONE),
            def(K::LeafList, Required(G::Identifier))
                .ns(NamespaceKind::SchemaChild)
                .sub(K::Type, C::ONE)
                .sub(K::Units, C::ZERO_OR_ONE)
                .sub(K::Default, C::ANY)
                .sub(K::Config, C::ZERO_OR_ONE)
                .sub(K::MinElements, C::ZERO_OR_ONE)
                .sub(K::MaxElements, C::ZERO_OR_ONE)
                .sub(K::OrderedBy, C::ZERO_OR_ONE)
                .sub(K::Must, C::ANY)
                .sub(K::IfFeature, C::ANY)
                .sub(K::When, C::ZERO_OR_ONE)
                .subs(META, C::ZERO_OR_ONE),
            body(def(K::List, Required(G::Identifier)))
                .ns(NamespaceKind::SchemaChild)
                .sub(K::Key, C::ZERO_OR_ONE)
                .sub(K::Unique, C::ANY)
                .sub(K::Config, C::ZERO_OR_ONE)
                .sub(K::MinElements, C::ZERO_OR_ONE)
                .sub(K::MaxElements, C::ZERO_OR_ONE)
                .sub(K::OrderedBy, C::ZERO_OR_ONE)
                .sub(K::Action, C::ANY)
                .sub(K::Notification, C::ANY)
                .sub(K::Must, C::ANY)
                .sub(K::IfFeature, C::ANY)
                .sub(K::When, C::ZERO_OR_ONE)
                .subs(META, C::ZERO_OR_ONE),
            def(K::Choice, Required(G::Identifier))
                .ns(NamespaceKind::SchemaChild)
                .sub(K::Case, C::ANY)
                .subs(
                    &[
                        K::Container,
                        K::Leaf,
                        K::LeafList,
                        K::List,
                        K::Choice,
                        K::Anydata,
                        K::Anyxml,
                    ],
                    C::ANY,
                )
                .sub(K::Default, C::ZERO_OR_ONE)
                .sub(K::Mandatory, C::ZERO_OR_ONE)
                .sub(K::Config, C::ZERO_OR_ONE)
                .sub(K::IfFeature, C::ANY)
                .sub(K::When, C::ZERO_OR_ONE)
                .subs(META, C::ZERO_OR_ONE),
            def(K::Case, Required(G::Identifier))
                .ns(NamespaceKind::SchemaChild)
                .subs(DATA_DEF, C::ANY)
                .sub(K::IfFeature, C::ANY)
                .sub(K::When, C::ZERO_OR_ONE)
                .subs(META, C::ZERO_OR_ONE),
            def(K::Anydata, Required(G::Identifier))
                .ns(NamespaceKind::SchemaChild)
                .sub(K::Config, C::ZERO_OR_ONE)
                .sub(K::Mandatory, C::ZERO_OR_ONE)
                .sub(K::Must, C::ANY)
                .sub(K::IfFeature, C::ANY)
                .sub(K::When, C::ZERO_OR_ONE)
                .subs(META, C::ZERO_OR_ONE),
            def(K::Anyxml, Required(G::Identifier))
                .ns(NamespaceKind::SchemaChild)
                .sub(K::Config, C::ZERO_OR_ONE)
                .sub(K::Mandatory, C::ZERO_OR_ONE)
                .sub(K::Must, C::ANY)
                .sub(K::IfFeature, C::ANY)
                .sub(K::When, C::ZERO_OR_ONE)
                .subs(META, C::ZERO_OR_ONE),
            // ---- reuse -------------------------------------------------
            body(def(K::Grouping, Required(G::Identifier)))
                .ns(NamespaceKind::Grouping)
                .sub(K::Action, C::ANY)
                .sub(K::Notification, C::ANY)
                .subs(META, C::ZERO_OR_ONE),
            def(K::Uses, Required(G::PrefixedIdentifier))
                .sub(K::Refine, C::ANY)
                .sub(K::Augment, C::ANY)
                .sub(K::IfFeature, C::ANY)
                .sub(K::When, C::ZERO_OR_ONE)
                .subs(META, C::ZERO_OR_ONE),
            def(K::Refine, Required(G::SchemaNodeId))
                .sub(K::Config, C::ZERO_OR_ONE)
                .sub(K::Default, C::ANY)
                .sub(K::Mandatory, C::ZERO_OR_ONE)
                .sub(K::MinElements, C::ZERO_OR_ONE)
                .sub(K::MaxElements, C::ZERO_OR_ONE)
                .sub(K::Presence, C::ZERO_OR_ONE)
                .sub(K::Must, C::ANY)
                .sub(K::IfFeature, C::ANY)
                .sub(K::Description, C::ZERO_OR_ONE)
                .sub(K::Reference, C::ZERO_OR_ONE),
            def(K::Augment, Required(G::SchemaNodeId))
                .subs(DATA_DEF, C::ANY)
                .sub(K::Case, C::ANY)
                .sub(K::Action, C::ANY)
                .sub(K::Notification, C::ANY)
                .sub(K::IfFeature, C::ANY)
                .sub(K::When, C::ZERO_OR_ONE)
                .subs(META, C::ZERO_OR_ONE),
            // ---- operations -------------------------------------------
            def(K::Rpc, Required(G::Identifier))
                .ns(NamespaceKind::SchemaChild)
                .sub(K::Input, C::ZERO_OR_ONE)
                .sub(K::Output, C::ZERO_OR_ONE)
                .sub(K::Grouping, C::ANY)
                .sub(K::Typedef, C::ANY)
                .sub(K::IfFeature, C::ANY)
                .subs(META, C::ZERO_OR_ONE),
            def(K::Action, Required(G::Identifier))
                .ns(NamespaceKind::SchemaChild)
                .sub(K::Input, C::ZERO_OR_ONE)
                .sub(K::Output, C::ZERO_OR_ONE)
                .sub(K::Grouping, C::ANY)
                .sub(K::Typedef, C::ANY)
                .sub(K::IfFeature, C::ANY)
                .subs(META, C::ZERO_OR_ONE),
            body(def(K::Input, NoArg))
                .ns(NamespaceKind::SchemaChild)
                .sub(K::Must, C::ANY),
            body(def(K::Output, NoArg))
                .ns(NamespaceKind::SchemaChild)
                .sub(K::Must, C::ANY),
            body(def(K::Notification, Required(G::Identifier)))
                .ns(NamespaceKind::SchemaChild)
                .sub(K::Must, C::ANY)
                .sub(K::IfFeature, C::ANY)
                .subs(META, C::ZERO_OR_ONE),
            // ---- deviations -------------------------------------------
            def(K::Deviation, Required(G::SchemaNodeId))
                .sub(K::Deviate, C::AT_LEAST_ONE)
                .sub(K::Description, C::ZERO_OR_ONE)
                .sub(K::Reference, C::ZERO_OR_ONE),
            def(K::Deviate, Required(G::DeviateKind))
                .sub(K::Type, C::ZERO_OR_ONE)
                .sub(K::Units, C::ZERO_OR_ONE)
                .sub(K::Must, C::ANY)
                .sub(K::Unique, C::ANY)
                .sub(K::Default, C::ANY)
                .sub(K::Config, C::ZERO_OR_ONE)
                .sub(K::Mandatory, C::ZERO_OR_ONE)
                .sub(K::MinElements, C::ZERO_OR_ONE)
                .sub(K::MaxElements, C::ZERO_OR_ONE),
            // ---- constraints and leaves of the grammar ----------------
            def(K::Must, Required(G::Text))
                .sub(K::ErrorMessage, C::ZERO_OR_ONE)
                .sub(K::ErrorAppTag, C::ZERO_OR_ONE)
                .sub(K::Description, C::ZERO_OR_ONE)
                .sub(K::Reference, C::ZERO_OR_ONE),
            def(K::When, Required(G::Text))
                .sub(K::Description, C::ZERO_OR_ONE)
                .sub(K::Reference, C::ZERO_OR_ONE),
            def(K::Namespace, Required(G::Text)),
            def(K::Prefix, Required(G::Identifier)),
            def(K::YangVersion, Required(G::YangVersion)),
            def(K::Organization, Required(G::Text)),
            def(K::Contact, Required(G::Text)),
            def(K::Description, Required(G::Text)),
            def(K::Reference, Required(G::Text)),
            def(K::Status, Required(G::Status)),
            def(K::Presence, Required(G::Text)),
            def(K::Config, Required(G::Boolean)),
            def(K::Mandatory, Required(G::Boolean)),
            def(K::MinElements, Required(G::NonNegative)),
            def(K::MaxElements, Required(G::PositiveOrUnbounded)),
            def(K::OrderedBy, Required(G::OrderedBy)),
            def(K::Units, Required(G::Text)),
            def(K::Default, Required(G::Text)),
            def(K::Key, Required(G::Text)),
            def(K::Unique, Required(G::Text)),
            def(K::IfFeature, Required(G::IfFeatureExpr)),
            def(K::Base, Required(G::PrefixedIdentifier)),
            def(K::Path, Required(G::Text)),
            def(K::RequireInstance, Required(G::Boolean)),
            def(K::ErrorMessage, Required(G::Text)),
            def(K::ErrorAppTag, Required(G::Text)),
            def(K::FractionDigits, Required(G::NonNegative)),
            def(K::Value, Required(G::Text)),
            def(K::Position, Required(G::NonNegative)),
            def(K::Modifier, Required(G::Text)),
            def(K::RevisionDate, Required(G::Date)),
            def(K::YinElement, Required(G::Boolean)),
        ];

        let mut supports = FxHashMap::default();
        for d in defs {
            supports.insert(d.kind, d.support);
        }
        Self { supports }
    }

    pub fn support(&self, kind: &StatementKind) -> Option<&StatementSupport> {
        self.supports.get(kind)
    }

    /// Cardinality of `sub` under `parent`, when both are known kinds and
    /// the combination is allowed.
    pub fn cardinality(&self, parent: &StatementKind, sub: &StatementKind) -> Option<Cardinality> {
        self.support(parent).and_then(|s| s.cardinality_of(sub))
    }

    /// Structurally validate one declared tree: argument presence and (in
    /// strict mode) lexical shape, allowed substatements, cardinality.
    /// Unknown statements are admitted anywhere with any content.
    pub fn validate_tree(
        &self,
        decl: &DeclaredStatement,
        strict: bool,
    ) -> Result<(), SourceError> {
        let Some(support) = self.support(decl.kind()) else {
            // Extension instance: no declared grammar to enforce.
            for child in decl.children() {
                self.validate_tree(child, strict)?;
            }
            return Ok(());
        };

        match (&support.arg, decl.argument()) {
            (ArgumentSpec::None, Some(_)) => {
                return Err(SourceError::new(
                    decl.at(),
                    format!("statement \"{}\" does not take an argument", decl.kind()),
                ));
            }
            (ArgumentSpec::Required(_), None) => {
                return Err(SourceError::new(
                    decl.at(),
                    format!("statement \"{}\" requires an argument", decl.kind()),
                ));
            }
            (ArgumentSpec::Required(grammar) | ArgumentSpec::Optional(grammar), Some(arg))
                if strict =>
            {
                grammar
                    .validate(arg)
                    .map_err(|msg| SourceError::new(decl.at(), msg))?;
            }
            _ => {}
        }

        let mut counts: FxHashMap<&StatementKind, u32> = FxHashMap::default();
        for child in decl.children() {
            if child.kind().is_unknown() {
                self.validate_tree(child, strict)?;
                continue;
            }
            if support.cardinality_of(child.kind()).is_none() {
                return Err(SourceError::new(
                    child.at(),
                    format!(
                        "substatement \"{}\" is not allowed in \"{}\"",
                        child.kind(),
                        decl.kind()
                    ),
                ));
            }
            *counts.entry(child.kind()).or_default() += 1;
            self.validate_tree(child, strict)?;
        }

        for (kind, cardinality) in &support.substatements {
            let count = counts.get(kind).copied().unwrap_or(0);
            if !cardinality.allows(count) {
                return Err(SourceError::new(
                    decl.at(),
                    format!(
                        "\"{}\" allows {} \"{}\" substatement(s), found {}",
                        decl.kind(),
                        cardinality,
                        kind,
                        count
                    ),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::SourceId;
    use crate::stmt::build::{kw, stmt};

    fn registry() -> StatementRegistry {
        StatementRegistry::rfc7950()
    }

    fn source() -> SourceId {
        SourceId::from_raw(0)
    }

    #[test]
    fn test_valid_module_passes() {
        let root = stmt(K::Module)
            .arg("m")
            .child(kw("namespace").arg("urn:m"))
            .child(kw("prefix").arg("m"))
            .child(kw("container").arg("top").child(kw("leaf").arg("x").child(kw("type").arg("string"))))
            .build(source());
        assert!(registry().validate_tree(&root, true).is_ok());
    }

    #[test]
    fn test_missing_mandatory_substatement() {
        // leaf without type
        let root = stmt(K::Leaf).arg("x").build(source());
        let err = registry().validate_tree(&root, false).unwrap_err();
        assert!(err.message.contains("type"));
    }

    #[test]
    fn test_duplicate_single_substatement() {
        let root = stmt(K::Leaf)
            .arg("x")
            .child(kw("type").arg("string"))
            .child(kw("default").arg("a"))
            .child(kw("default").arg("b"))
            .build(source());
        let err = registry().validate_tree(&root, false).unwrap_err();
        assert!(err.message.contains("default"));
    }

    #[test]
    fn test_disallowed_substatement() {
        let root = stmt(K::Leaf)
            .arg("x")
            .child(kw("type").arg("string"))
            .child(kw("key").arg("k"))
            .build(source());
        let err = registry().validate_tree(&root, false).unwrap_err();
        assert!(err.message.contains("not allowed"));
    }

    #[test]
    fn test_strict_mode_checks_argument_grammar() {
        let root = stmt(K::Leaf)
            .arg("9bad")
            .child(kw("type").arg("string"))
            .build(source());
        assert!(registry().validate_tree(&root, false).is_ok());
        assert!(registry().validate_tree(&root, true).is_err());
    }

    #[test]
    fn test_unknown_statements_admitted_anywhere() {
        let root = stmt(K::Leaf)
            .arg("x")
            .child(kw("type").arg("string"))
            .child(kw("acme:annotation").arg("whatever"))
            .build(source());
        assert!(registry().validate_tree(&root, true).is_ok());
    }

    #[test]
    fn test_deviate_add_single_cardinality_query() {
        let r = registry();
        assert!(r.cardinality(&K::Leaf, &K::Units).unwrap().is_single());
        assert!(!r.cardinality(&K::LeafList, &K::Default).unwrap().is_single());
        assert!(r.cardinality(&K::Leaf, &K::Default).unwrap().is_single());
    }
}
