//! If-feature gating.
//!
//! An `if-feature` argument is a boolean expression over feature names with
//! `not` binding tightest, then `and`, then `or`, plus parentheses. A
//! statement whose conjunction of if-feature expressions is false is pruned
//! from the effective tree together with its subtree. A reference to a
//! feature that no reachable module defines fails the build; gating must
//! never silently treat a typo as "unsupported".

use tracing::debug;

use crate::errors::{InferenceError, ReactorError};
use crate::reactor::{BuildState, CtxId, ModelPhase};
use crate::registry::NamespaceKind;
use crate::stmt::StatementKind;

/// Prune every statement whose if-feature condition evaluates false.
///
/// Runs twice per build: once before the task fixpoint (so pruned uses,
/// augments and deviations never execute) and once after it (copied subtrees
/// carry their own if-feature statements).
pub(crate) fn gate_all(state: &mut BuildState) -> Result<(), ReactorError> {
    let mut pruned = Vec::new();
    for index in 0..state.arena.len() {
        let id = CtxId::from_raw(index as u32);
        let ctx = state.arena.get(id);
        if ctx.removed || ctx.kind == StatementKind::IfFeature {
            continue;
        }
        let conditions: Vec<CtxId> = state
            .arena
            .children_of_kind(id, &StatementKind::IfFeature)
            .collect();
        if conditions.is_empty() {
            continue;
        }
        let mut supported = true;
        for condition in conditions {
            if !evaluate_condition(state, condition)? {
                supported = false;
                break;
            }
        }
        if !supported {
            pruned.push(id);
        }
    }
    debug!(count = pruned.len(), "feature gating pruned statements");
    for id in pruned {
        state.arena.mark_removed(id);
    }
    Ok(())
}

fn evaluate_condition(state: &BuildState, condition: CtxId) -> Result<bool, InferenceError> {
    let at = state.arena.get(condition).at;
    let raw = state
        .arena
        .get(condition)
        .argument
        .clone()
        .unwrap_or_default();
    let expr = Expr::parse(&raw)
        .map_err(|detail| {
            InferenceError::new(
                ModelPhase::FullDeclaration,
                at,
                format!("invalid if-feature expression \"{raw}\": {detail}"),
            )
        })?;
    expr.evaluate(state, condition, &mut Vec::new())
}

/// Parsed if-feature expression.
#[derive(Debug)]
enum Expr {
    Ref(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn parse(input: &str) -> Result<Expr, String> {
        let tokens = tokenize(input)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.or_expr()?;
        match parser.peek() {
            None => Ok(expr),
            Some(tok) => Err(format!("unexpected \"{tok}\"")),
        }
    }

    fn evaluate(
        &self,
        state: &BuildState,
        condition: CtxId,
        visiting: &mut Vec<CtxId>,
    ) -> Result<bool, InferenceError> {
        let at = state.arena.get(condition).at;
        match self {
            Expr::Ref(name) => {
                let Some(feature) = state.resolve_ns_ref(
                    condition,
                    NamespaceKind::Feature,
                    name,
                    ModelPhase::FullDeclaration,
                )?
                else {
                    return Err(InferenceError::new(
                        ModelPhase::FullDeclaration,
                        at,
                        format!("reference to undefined feature \"{name}\""),
                    ));
                };
                feature_supported(state, feature, visiting)
            }
            Expr::Not(inner) => Ok(!inner.evaluate(state, condition, visiting)?),
            Expr::And(lhs, rhs) => Ok(lhs.evaluate(state, condition, visiting)?
                && rhs.evaluate(state, condition, visiting)?),
            Expr::Or(lhs, rhs) => Ok(lhs.evaluate(state, condition, visiting)?
                || rhs.evaluate(state, condition, visiting)?),
        }
    }
}

/// A feature is supported when the configured set contains it and its own
/// if-feature conditions hold in turn.
fn feature_supported(
    state: &BuildState,
    feature: CtxId,
    visiting: &mut Vec<CtxId>,
) -> Result<bool, InferenceError> {
    let ctx = state.arena.get(feature);
    if visiting.contains(&feature) {
        return Err(InferenceError::new(
            ModelPhase::FullDeclaration,
            ctx.at,
            format!(
                "feature \"{}\" depends on itself",
                ctx.argument.as_deref().unwrap_or_default()
            ),
        ));
    }
    let Some(qname) = ctx.qname.clone() else {
        return Ok(false);
    };
    if !state.config.features.is_supported(&qname) {
        return Ok(false);
    }
    visiting.push(feature);
    let conditions: Vec<CtxId> = state
        .arena
        .children_of_kind(feature, &StatementKind::IfFeature)
        .collect();
    let mut supported = true;
    for condition in conditions {
        if !condition_holds(state, condition, visiting)? {
            supported = false;
            break;
        }
    }
    visiting.pop();
    Ok(supported)
}

fn condition_holds(
    state: &BuildState,
    condition: CtxId,
    visiting: &mut Vec<CtxId>,
) -> Result<bool, InferenceError> {
    let at = state.arena.get(condition).at;
    let raw = state
        .arena
        .get(condition)
        .argument
        .clone()
        .unwrap_or_default();
    let expr = Expr::parse(&raw).map_err(|detail| {
        InferenceError::new(
            ModelPhase::FullDeclaration,
            at,
            format!("invalid if-feature expression \"{raw}\": {detail}"),
        )
    })?;
    expr.evaluate(state, condition, visiting)
}

// ----------------------------------------------------------------------
// Expression grammar: or-expr > and-expr > not-expr > atom.
// ----------------------------------------------------------------------

fn tokenize(input: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some(&(start, c)) = chars.peek() {
        match c {
            '(' | ')' => {
                tokens.push(c.to_string());
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            _ => {
                let mut end = start;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_whitespace() || c == '(' || c == ')' {
                        break;
                    }
                    end = i + c.len_utf8();
                    chars.next();
                }
                tokens.push(input[start..end].to_string());
            }
        }
    }
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<String>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.pos).map(|s| s.as_str())
    }

    fn bump(&mut self) -> Option<String> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn or_expr(&mut self) -> Result<Expr, String> {
        let mut lhs = self.and_expr()?;
        while self.peek() == Some("or") {
            self.bump();
            let rhs = self.and_expr()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, String> {
        let mut lhs = self.not_expr()?;
        while self.peek() == Some("and") {
            self.bump();
            let rhs = self.not_expr()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Expr, String> {
        if self.peek() == Some("not") {
            self.bump();
            return Ok(Expr::Not(Box::new(self.not_expr()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr, String> {
        match self.bump().as_deref() {
            Some("(") => {
                let expr = self.or_expr()?;
                match self.bump().as_deref() {
                    Some(")") => Ok(expr),
                    _ => Err("missing closing parenthesis".to_string()),
                }
            }
            Some(")") => Err("unexpected \")\"".to_string()),
            Some("and") | Some("or") => Err("operator in place of a feature name".to_string()),
            Some(name) => Ok(Expr::Ref(name.to_string())),
            None => Err("expression ends early".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parses(input: &str) -> Expr {
        Expr::parse(input).unwrap()
    }

    #[test]
    fn test_precedence_not_over_and_over_or() {
        // a or not b and c == a or ((not b) and c)
        let expr = parses("a or not b and c");
        match expr {
            Expr::Or(lhs, rhs) => {
                assert!(matches!(*lhs, Expr::Ref(ref n) if n == "a"));
                match *rhs {
                    Expr::And(l, r) => {
                        assert!(matches!(*l, Expr::Not(_)));
                        assert!(matches!(*r, Expr::Ref(ref n) if n == "c"));
                    }
                    other => panic!("expected and, got {other:?}"),
                }
            }
            other => panic!("expected or, got {other:?}"),
        }
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let expr = parses("(a or b) and c");
        assert!(matches!(expr, Expr::And(_, _)));
    }

    #[test]
    fn test_prefixed_names_are_single_tokens() {
        let expr = parses("ext:turbo");
        assert!(matches!(expr, Expr::Ref(ref n) if n == "ext:turbo"));
    }

    #[test]
    fn test_malformed_expressions_rejected() {
        assert!(Expr::parse("").is_err());
        assert!(Expr::parse("a or").is_err());
        assert!(Expr::parse("(a or b").is_err());
        assert!(Expr::parse("and a").is_err());
        assert!(Expr::parse("a b").is_err());
    }
}
