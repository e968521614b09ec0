//! Interpretation of a grammar syntax tree through the rule algebra.
//!
//! Each grammar rule becomes a rule in a [`RuleSet`]. Results have the same
//! shape as those of a parser generated from the same tree: a sequence nested
//! inside another sequence keeps its own tuple, so nested sequences are given
//! a name to stop flattening from splicing them.

use compact_str::{CompactString, format_compact};
use tracing::debug;

use super::ast::{Expr, Grammar, Modifier};
use crate::error::GrammarError;
use crate::rule::{Parser, RuleNode, RuleSet};

/// Build a rule set with one rule per grammar rule
///
/// References to rules the grammar does not define fail when they are
/// reached during a parse, not here.
///
/// # Errors
///
/// Returns [`GrammarError::DuplicateRule`] if two rules share a name.
///
/// # Example
///
/// ```rust
/// use weft::grammar::{lower, parse_grammar};
/// use weft::Value;
///
/// let grammar = parse_grammar("word = letter+; letter = 'a' | 'b' | 'c';").unwrap();
/// let parser = lower(&grammar).unwrap().build().unwrap();
///
/// let value = parser.parse("word", "abc").unwrap();
/// assert_eq!(value, Value::List(vec!["a".into(), "b".into(), "c".into()]));
/// assert!(parser.parse("word", "abcd").is_err());
/// ```
pub fn lower(grammar: &Grammar) -> Result<RuleSet, GrammarError> {
    let mut rules = RuleSet::new();
    let ids = grammar
        .rules
        .iter()
        .map(|rule| rules.declare(&rule.name))
        .collect::<Vec<_>>();

    for (rule, id) in grammar.rules.iter().zip(ids) {
        let mut lowering = Lowering {
            rule: &rule.name,
            rules: &rules,
            nested: 0,
        };
        let body = lowering.expr(&rule.body, false);
        rules.define(id, body)?;
    }

    debug!(rules = grammar.rules.len(), "lowered grammar");
    Ok(rules)
}

/// Lower and build in one step
///
/// # Errors
///
/// See [`lower`] and [`RuleSet::build`].
pub fn interpret(grammar: &Grammar) -> Result<Parser, GrammarError> {
    lower(grammar)?.build()
}

struct Lowering<'a> {
    rule: &'a str,
    rules: &'a RuleSet,
    nested: usize,
}

impl Lowering<'_> {
    fn expr(&mut self, expr: &Expr, in_sequence: bool) -> RuleNode {
        match expr {
            Expr::Sequence(members) if members.len() == 1 => self.expr(&members[0], in_sequence),
            Expr::Sequence(members) => {
                let members = members.iter().map(|member| self.expr(member, true)).collect();
                let node = RuleNode::sequence(members);
                if in_sequence {
                    self.nested += 1;
                    node.named(&format_compact!("{}/seq{}", self.rule, self.nested))
                } else {
                    node
                }
            }
            Expr::Choice(alternatives) => RuleNode::choice(
                alternatives
                    .iter()
                    .map(|alternative| self.expr(alternative, false))
                    .collect(),
            ),
            Expr::Modified { inner, modifier } => {
                let inner = self.expr(inner, false);
                match modifier {
                    Modifier::Optional => RuleNode::optional(inner),
                    Modifier::OneOrMore => RuleNode::one_or_more(inner),
                    Modifier::ZeroOrMore => RuleNode::zero_or_more(inner),
                }
            }
            Expr::Labelled { label, inner } => self.expr(inner, in_sequence).alias(label),
            Expr::Identifier(name) => self.reference(name),
            Expr::Literal(value) => RuleNode::from(value.as_str()),
        }
    }

    fn reference(&self, name: &CompactString) -> RuleNode {
        if let Some(id) = self.rules.id(name) {
            return RuleNode::reference(id);
        }
        undefined(name.clone())
    }
}

fn undefined(name: CompactString) -> RuleNode {
    RuleNode::leaf(move |cursor| cursor.fail(format!("undefined rule '{name}'")))
}
