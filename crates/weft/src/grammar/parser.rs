//! Parser for grammar text, written with the rule algebra itself.
//!
//! ```text
//! grammar    := rule+
//! rule       := identifier '=' choice ';'
//! choice     := sequence ('|' sequence)*
//! sequence   := modified+
//! modified   := primary ('*' | '+' | '?')?
//! primary    := '(' choice ')' | identifier (':' modified)? | string
//! identifier := [A-Za-z0-9]+
//! string     := '\'' ... '\'' | '"' ... '"'
//! ```
//!
//! Whitespace is skipped between tokens but kept inside string literals.
//! Every rule carries a transformer that turns its raw match into a node of
//! the syntax tree, carried through the engine as a custom [`Value`].

use tracing::debug;

use super::ast::{Expr, Grammar, Modifier, Rule};
use crate::cursor::{CursorConfig, SkipMode, TextCursor};
use crate::error::{GrammarError, ParseError, ParseOutcome, Rejection};
use crate::rule::{Parser, RuleNode, RuleSet};
use crate::value::Value;

/// Parser for the grammar description language
///
/// # Example
///
/// ```rust
/// use weft::grammar::{Expr, GrammarTextParser};
///
/// let parser = GrammarTextParser::new().unwrap();
/// let grammar = parser.parse("greeting = 'hello' name:word;").unwrap();
///
/// assert_eq!(grammar.rules[0].name, "greeting");
/// assert!(matches!(grammar.rules[0].body, Expr::Sequence(_)));
/// ```
#[derive(Debug)]
pub struct GrammarTextParser {
    parser: Parser,
}

impl GrammarTextParser {
    /// Build the parser
    ///
    /// # Errors
    ///
    /// Returns a [`GrammarError`] if the rule set is inconsistent.
    pub fn new() -> Result<Self, GrammarError> {
        Ok(Self {
            parser: grammar_rules()?.build()?,
        })
    }

    /// Parse grammar text into a syntax tree
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::NoMatch`] when no rule can be read at all, and
    /// [`ParseError::TrailingInput`] when a rule fails part way through the
    /// text. In the latter case [`ParseError::furthest`] points at the
    /// offending token.
    pub fn parse(&self, text: &str) -> Result<Grammar, ParseError> {
        let cursor = TextCursor::with_config(text, &CursorConfig::whitespace());
        let value = self.parser.parse_with("grammar", cursor)?;
        let grammar = value.into_custom::<Grammar>().map_err(|_| {
            GrammarError::Malformed("grammar rule did not produce a syntax tree".into())
        })?;

        debug!(rules = grammar.rules.len(), "parsed grammar text");
        Ok(grammar)
    }
}

/// Parse grammar text into a syntax tree
///
/// # Errors
///
/// See [`GrammarTextParser::parse`].
pub fn parse_grammar(text: &str) -> Result<Grammar, ParseError> {
    GrammarTextParser::new()?.parse(text)
}

fn grammar_rules() -> Result<RuleSet, GrammarError> {
    let mut rules = RuleSet::new();
    let grammar = rules.declare("grammar");
    let rule = rules.declare("rule");
    let choice = rules.declare("choice");
    let sequence = rules.declare("sequence");
    let modified = rules.declare("modified");
    let primary = rules.declare("primary");
    let identifier = rules.declare("identifier");
    let string = rules.declare("string");

    rules.define(
        grammar,
        RuleNode::one_or_more(rule).transform(|value| {
            let rules = list(value)?
                .into_iter()
                .map(custom::<Rule>)
                .collect::<Result<_, _>>()?;
            Ok(Value::custom(Grammar::new(rules)))
        }),
    )?;

    rules.define(
        rule,
        (identifier.into_node() & "=" & choice & ";").transform(|value| {
            let [name, _, body, _] = members::<4>(value)?;
            Ok(Value::custom(Rule::new(text(&name)?, expr(body)?)))
        }),
    )?;

    rules.define(
        choice,
        (sequence.into_node() & RuleNode::zero_or_more(RuleNode::from("|") & sequence)).transform(
            |value| {
                let [first, rest] = members::<2>(value)?;
                let mut alternatives = vec![expr(first)?];
                for item in list(rest)? {
                    let [_, alternative] = members::<2>(item)?;
                    alternatives.push(expr(alternative)?);
                }
                Ok(Value::custom(Expr::choice(alternatives)))
            },
        ),
    )?;

    rules.define(
        sequence,
        RuleNode::one_or_more(modified).transform(|value| {
            let members = list(value)?
                .into_iter()
                .map(expr)
                .collect::<Result<_, _>>()?;
            Ok(Value::custom(Expr::sequence(members)))
        }),
    )?;

    rules.define(
        modified,
        (primary.into_node() & RuleNode::optional(RuleNode::charset(['*', '+', '?'])?)).transform(
            |value| {
                let [inner, symbol] = members::<2>(value)?;
                let inner = expr(inner)?;
                let Some(symbol) = symbol.as_text() else {
                    return Ok(Value::custom(inner));
                };
                let modifier = symbol
                    .chars()
                    .next()
                    .and_then(Modifier::from_symbol)
                    .ok_or_else(|| Rejection::new(format!("unknown modifier '{symbol}'")))?;
                Ok(Value::custom(Expr::modified(inner, modifier)))
            },
        ),
    )?;

    let group = (RuleNode::from("(") & choice.into_node().alias("inner") & ")").transform(|value| {
        value
            .get_label("inner")
            .cloned()
            .ok_or_else(|| Rejection::new("group has no body"))
    });
    let reference = (identifier.into_node()
        & RuleNode::optional(RuleNode::from(":") & modified))
    .transform(|value| {
        let [name, tail] = members::<2>(value)?;
        let name = text(&name)?;
        if tail.is_absent() {
            return Ok(Value::custom(Expr::identifier(name)));
        }
        let [_, inner] = members::<2>(tail)?;
        Ok(Value::custom(Expr::labelled(name, expr(inner)?)))
    });
    rules.define(primary, group | reference | string)?;

    rules.define(
        identifier,
        RuleNode::leaf(|cursor| {
            cursor
                .take_while1(|ch| ch.is_ascii_alphanumeric(), "identifier")
                .map(Value::Text)
        }),
    )?;

    rules.define(string, RuleNode::leaf(string_literal))?;

    Ok(rules)
}

fn string_literal(cursor: &mut TextCursor<'_>) -> ParseOutcome<Value> {
    let quote = cursor.next(1, SkipMode::Always);
    let delimiter = match quote.as_str() {
        "'" => '\'',
        "\"" => '"',
        "" => return cursor.fail("expected string literal, got end of input"),
        other => return cursor.fail(format!("expected string literal, got '{other}'")),
    };
    let value = cursor.take_until(delimiter)?;
    Ok(Value::custom(Expr::Literal(value)))
}

fn members<const N: usize>(value: Value) -> Result<[Value; N], Rejection> {
    match value {
        Value::Tuple(tuple) => <[Value; N]>::try_from(tuple.into_values()).map_err(|values| {
            Rejection::new(format!("expected {N} members, got {}", values.len()))
        }),
        other => Err(Rejection::new(format!("expected a sequence, got {other:?}"))),
    }
}

fn list(value: Value) -> Result<Vec<Value>, Rejection> {
    match value {
        Value::List(items) => Ok(items),
        other => Err(Rejection::new(format!("expected a list, got {other:?}"))),
    }
}

fn text(value: &Value) -> Result<&str, Rejection> {
    value
        .as_text()
        .ok_or_else(|| Rejection::new(format!("expected text, got {value:?}")))
}

fn custom<T: Clone + 'static>(value: Value) -> Result<T, Rejection> {
    value.into_custom::<T>().map_err(|other| {
        Rejection::new(format!(
            "expected {}, got {other:?}",
            std::any::type_name::<T>()
        ))
    })
}

fn expr(value: Value) -> Result<Expr, Rejection> {
    custom::<Expr>(value)
}
