//! Argument grammars and substatement cardinalities.

use std::fmt;

/// How many substatements of one kind a parent may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cardinality {
    pub min: u32,
    pub max: Option<u32>,
}

impl Cardinality {
    pub const ZERO_OR_ONE: Cardinality = Cardinality {
        min: 0,
        max: Some(1),
    };
    pub const ONE: Cardinality = Cardinality {
        min: 1,
        max: Some(1),
    };
    pub const ANY: Cardinality = Cardinality { min: 0, max: None };
    pub const AT_LEAST_ONE: Cardinality = Cardinality { min: 1, max: None };

    pub fn allows(&self, count: u32) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }

    /// True when at most one instance may appear. Deviate-add uses this to
    /// reject re-adding an existing substatement.
    pub fn is_single(&self) -> bool {
        self.max == Some(1)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (min, Some(max)) if min == max => write!(f, "exactly {min}"),
            (min, Some(max)) => write!(f, "{min}..{max}"),
            (min, None) => write!(f, "at least {min}"),
        }
    }
}

/// Whether a statement takes an argument, and its lexical shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgumentSpec {
    /// The statement takes no argument (`input`, `output`).
    None,
    Required(ArgumentGrammar),
    Optional(ArgumentGrammar),
}

/// Lexical grammar of an argument, checked in strict parser mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgumentGrammar {
    /// YANG identifier: `[A-Za-z_][A-Za-z0-9_.-]*`.
    Identifier,
    /// Identifier with optional `prefix:`.
    PrefixedIdentifier,
    /// Free-form text (descriptions, patterns, must expressions, URIs).
    Text,
    /// `YYYY-MM-DD`.
    Date,
    /// `true` | `false`.
    Boolean,
    /// `current` | `deprecated` | `obsolete`.
    Status,
    /// `system` | `user`.
    OrderedBy,
    /// `not-supported` | `add` | `replace` | `delete`.
    DeviateKind,
    /// Non-negative decimal integer.
    NonNegative,
    /// Positive decimal integer or `unbounded`.
    PositiveOrUnbounded,
    /// Absolute or descendant schema-node-identifier.
    SchemaNodeId,
    /// if-feature-expr; full parse happens at resolution time.
    IfFeatureExpr,
    /// `1` | `1.1`.
    YangVersion,
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

fn is_prefixed_identifier(text: &str) -> bool {
    match text.split_once(':') {
        Some((prefix, local)) => is_identifier(prefix) && is_identifier(local),
        None => is_identifier(text),
    }
}

impl ArgumentGrammar {
    pub fn validate(&self, argument: &str) -> Result<(), String> {
        let ok = match self {
            ArgumentGrammar::Identifier => is_identifier(argument),
            ArgumentGrammar::PrefixedIdentifier => is_prefixed_identifier(argument),
            ArgumentGrammar::Text => true,
            ArgumentGrammar::Date => crate::base::Revision::parse(argument).is_some(),
            ArgumentGrammar::Boolean => matches!(argument, "true" | "false"),
            ArgumentGrammar::Status => {
                matches!(argument, "current" | "deprecated" | "obsolete")
            }
            ArgumentGrammar::OrderedBy => matches!(argument, "system" | "user"),
            ArgumentGrammar::DeviateKind => {
                matches!(argument, "not-supported" | "add" | "replace" | "delete")
            }
            ArgumentGrammar::NonNegative => {
                !argument.is_empty() && argument.bytes().all(|b| b.is_ascii_digit())
            }
            ArgumentGrammar::PositiveOrUnbounded => {
                argument == "unbounded"
                    || argument.parse::<u64>().map(|v| v > 0).unwrap_or(false)
            }
            ArgumentGrammar::SchemaNodeId => {
                !argument.is_empty()
                    && argument
                        .trim_start_matches('/')
                        .split('/')
                        .all(is_prefixed_identifier)
            }
            ArgumentGrammar::IfFeatureExpr => !argument.trim().is_empty(),
            ArgumentGrammar::YangVersion => matches!(argument, "1" | "1.1"),
        };
        if ok {
            Ok(())
        } else {
            Err(format!("invalid {self:?} argument: \"{argument}\""))
        }
    }
}
