//! Compilation of rule nodes into parse closures.
//!
//! Every closure either succeeds or leaves the cursor where it found it.
//! Leaves and sequences run inside a scoped attempt, choices wrap each
//! alternative in one, and modifiers rely on their inner closure.

use std::rc::Rc;

use compact_str::CompactString;

use super::set::RuleTable;
use super::{Charset, RuleKind, RuleNode};
use crate::cursor::{SkipMode, TextCursor};
use crate::error::{ParseError, ParseOutcome};
use crate::value::{ResultTuple, Value};

pub(crate) type ParseFn = Rc<dyn Fn(&mut TextCursor<'_>, &RuleTable) -> ParseOutcome<Value>>;

fn parse_fn(
    f: impl Fn(&mut TextCursor<'_>, &RuleTable) -> ParseOutcome<Value> + 'static,
) -> ParseFn {
    Rc::new(f)
}

/// Compile a node, applying its transformer after the structural match
pub(crate) fn compile(node: &RuleNode) -> ParseFn {
    let raw = compile_kind(&node.kind);

    let Some(transformer) = node.transformer.clone() else {
        return raw;
    };

    parse_fn(move |cursor, table| {
        cursor.attempt(|cursor| {
            let value = raw(cursor, table)?;
            match transformer(value) {
                Ok(transformed) => Ok(transformed),
                Err(rejection) => cursor.fail(rejection.0),
            }
        })
    })
}

fn compile_kind(kind: &RuleKind) -> ParseFn {
    match kind {
        RuleKind::Literal(text) => literal(text.clone()),
        RuleKind::Charset(set) => charset(set.clone()),
        RuleKind::Functional(leaf) => {
            let leaf = Rc::clone(leaf);
            parse_fn(move |cursor, _| cursor.attempt(|cursor| leaf(cursor)))
        }
        RuleKind::Optional(inner) => {
            let inner = compile(inner);
            parse_fn(move |cursor, table| Ok(inner(cursor, table).unwrap_or(Value::Absent)))
        }
        RuleKind::Repeat1(inner) => repeat(compile(inner), true),
        RuleKind::Repeat0(inner) => repeat(compile(inner), false),
        RuleKind::Choice(alternatives) => choice(alternatives.iter().map(compile).collect()),
        RuleKind::Sequence(members) => sequence(
            members
                .iter()
                .map(|member| (member.alias.clone(), compile(member)))
                .collect(),
        ),
        RuleKind::Reference(id) => {
            let id = *id;
            parse_fn(move |cursor, table| table.call(id, cursor))
        }
    }
}

fn literal(text: CompactString) -> ParseFn {
    parse_fn(move |cursor, _| cursor.expect(&text).map(Value::Text))
}

fn charset(set: Charset) -> ParseFn {
    let expected = ParseError::format_expected_list(
        &set.chars()
            .iter()
            .map(|ch| format!("'{ch}'"))
            .collect::<Vec<_>>(),
    );

    parse_fn(move |cursor, _| {
        cursor.attempt(|cursor| {
            let found = cursor.next(1, SkipMode::Always);
            match found.chars().next() {
                Some(ch) if set.contains(ch) => Ok(Value::Text(found)),
                Some(_) => cursor.fail(format!("expected one of {expected}, got '{found}'")),
                None => cursor.fail(format!("expected one of {expected}, got end of input")),
            }
        })
    })
}

/// Greedy repetition
///
/// An iteration that succeeds without consuming input is kept and ends the
/// loop, since repeating it would never make progress.
fn repeat(inner: ParseFn, at_least_one: bool) -> ParseFn {
    parse_fn(move |cursor, table| {
        cursor.attempt(|cursor| {
            let mut matches = Vec::new();
            loop {
                let before = cursor.offset();
                match inner(cursor, table) {
                    Ok(value) => {
                        matches.push(value);
                        if cursor.offset() == before {
                            break;
                        }
                    }
                    Err(failure) if at_least_one && matches.is_empty() => return Err(failure),
                    Err(_) => break,
                }
            }
            Ok(Value::List(matches))
        })
    })
}

/// Ordered choice; the last alternative's failure is the one reported
fn choice(alternatives: Vec<ParseFn>) -> ParseFn {
    parse_fn(move |cursor, table| {
        let mut last_failure = None;
        for alternative in &alternatives {
            match cursor.attempt(|cursor| alternative(cursor, table)) {
                Ok(value) => return Ok(value),
                Err(failure) => last_failure = Some(failure),
            }
        }
        match last_failure {
            Some(failure) => Err(failure),
            None => cursor.fail("no alternatives to choose from"),
        }
    })
}

fn sequence(members: Vec<(Option<CompactString>, ParseFn)>) -> ParseFn {
    parse_fn(move |cursor, table| {
        cursor.attempt(|cursor| {
            let mut tuple = ResultTuple::new();
            for (label, member) in &members {
                let value = member(cursor, table)?;
                tuple.push(label.as_deref(), value);
            }
            Ok(Value::Tuple(tuple))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::CursorConfig;
    use crate::error::Rejection;

    fn run(node: &RuleNode, input: &str) -> (ParseOutcome<Value>, usize) {
        let table = RuleTable::default();
        let mut cursor = TextCursor::with_config(input, &CursorConfig::whitespace());
        let outcome = compile(node)(&mut cursor, &table);
        assert_eq!(cursor.depth(), 0);
        (outcome, cursor.offset())
    }

    fn letters() -> RuleNode {
        RuleNode::charset(['a', 'b', 'c']).unwrap()
    }

    #[test]
    fn test_literal_consumes_exactly() {
        let (outcome, offset) = run(&RuleNode::from("abc"), "abcd");
        assert_eq!(outcome.unwrap(), Value::from("abc"));
        assert_eq!(offset, 3);
    }

    #[test]
    fn test_literal_failure_leaves_offset() {
        let (outcome, offset) = run(&RuleNode::from("abc"), "abd");
        let failure = outcome.unwrap_err();
        assert_eq!(failure.message, "expected 'abc', got 'abd'");
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_charset_message() {
        let (outcome, _) = run(&letters(), "x");
        assert_eq!(
            outcome.unwrap_err().message,
            "expected one of 'a', 'b', or 'c', got 'x'"
        );
    }

    #[test]
    fn test_optional_never_fails() {
        let node = RuleNode::optional("a");
        assert_eq!(run(&node, "a").0.unwrap(), Value::from("a"));
        assert_eq!(run(&node, "b"), (Ok(Value::Absent), 0));
    }

    #[test]
    fn test_repeat0_empty_on_mismatch() {
        let node = RuleNode::zero_or_more(letters());
        assert_eq!(run(&node, "xyz"), (Ok(Value::List(Vec::new())), 0));
        assert_eq!(run(&node, "ab c").1, 4);
    }

    #[test]
    fn test_repeat1_fails_without_advancing() {
        let node = RuleNode::one_or_more(letters());
        let (outcome, offset) = run(&node, "xyz");
        assert!(outcome.is_err());
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_repeat_stops_on_zero_width_match() {
        let node = RuleNode::zero_or_more(RuleNode::optional("a"));
        let (outcome, offset) = run(&node, "aab");
        assert_eq!(
            outcome.unwrap(),
            Value::List(vec!["a".into(), "a".into(), Value::Absent])
        );
        assert_eq!(offset, 2);
    }

    #[test]
    fn test_choice_first_success_wins() {
        let node = RuleNode::from("a") | "ab";
        let (outcome, offset) = run(&node, "ab");
        assert_eq!(outcome.unwrap(), Value::from("a"));
        assert_eq!(offset, 1);
    }

    #[test]
    fn test_choice_reports_last_failure() {
        let node = RuleNode::from("a") | "b";
        let (outcome, _) = run(&node, "c");
        assert_eq!(outcome.unwrap_err().message, "expected 'b', got 'c'");
    }

    #[test]
    fn test_empty_choice_fails() {
        let (outcome, _) = run(&RuleNode::choice(Vec::new()), "a");
        assert!(outcome.is_err());
    }

    #[test]
    fn test_sequence_restores_on_failure() {
        let node = RuleNode::from("a") & "b" & "c";
        let (outcome, offset) = run(&node.flatten(), "abx");
        let failure = outcome.unwrap_err();
        assert_eq!(failure.message, "expected 'c', got 'x'");
        assert_eq!(failure.position.offset, 2);
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_sequence_labels() {
        let node = RuleNode::sequence(vec![letters().alias("first"), letters().alias("second")]);
        let value = run(&node, "ab").0.unwrap();
        assert_eq!(value.get_label("first"), Some(&Value::from("a")));
        assert_eq!(value.get_label("second"), Some(&Value::from("b")));
    }

    #[test]
    fn test_transformer_applied_after_match() {
        let node = RuleNode::one_or_more(letters())
            .transform(|value| Ok(Value::Text(value.concat_text())));
        assert_eq!(run(&node, "a b c").0.unwrap(), Value::from("abc"));
    }

    #[test]
    fn test_transformer_rejection_is_a_failure() {
        let node = RuleNode::from("a").transform(|_| Err(Rejection::new("not allowed")));
        let (outcome, offset) = run(&(node | "ab"), "ab");
        assert_eq!(outcome.unwrap(), Value::from("ab"));
        assert_eq!(offset, 2);

        let node = RuleNode::from("a").transform(|_| Err(Rejection::new("not allowed")));
        let (outcome, offset) = run(&node, " a");
        let failure = outcome.unwrap_err();
        assert_eq!(failure.message, "not allowed");
        assert_eq!(failure.position.offset, 1);
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_functional_leaf_restores_on_failure() {
        let node = RuleNode::leaf(|cursor| {
            cursor.next(2, SkipMode::Always);
            cursor.fail("leaf gave up")
        });
        let (outcome, offset) = run(&node, "abc");
        assert_eq!(outcome.unwrap_err().message, "leaf gave up");
        assert_eq!(offset, 0);
    }
}
