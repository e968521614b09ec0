//! Tests for parsers generated by `grammar!`
//!
//! Each generated parser is checked on its own and against the interpreter
//! for the same grammar text.

use proptest::prelude::*;
use weft::grammar::interpret;
use weft::runtime::GeneratedParser;
use weft::{CursorConfig, ParseError, TextCursor, Value, parse_grammar};
use weft_macros::grammar;

const AB: &str = "start = \"a\" \"b\";";
const WORD: &str = "word = letter+; letter = \"a\"|\"b\"|\"c\";";
const PAIR: &str = "pair = first:letter second:letter; letter = 'a' | 'b';";
const MODIFIERS: &str = "maybe = 'x'? 'y';";
const ARITHMETIC: &str = "expr = lhs:term rest:(op term)*; op = '+' | '-'; \
                          term = digit+ | '(' expr ')'; digit = '0' | '1' | '2';";

grammar!(pub AbParser, "start = \"a\" \"b\";");
grammar!(WordParser, "word = letter+; letter = \"a\"|\"b\"|\"c\";");
grammar!(PairParser, "pair = first:letter second:letter; letter = 'a' | 'b';");
grammar!(pub(crate) MaybeParser, "maybe = 'x'? 'y';");
grammar!(ManyParser, "many = 'x'*;");
grammar!(LoopParser, "loop = ('x'?)*;");
grammar!(OrderedParser, "pick = 'a' | 'ab';");
grammar!(LastFailureParser, "pick = 'x' | 'y';");
grammar!(
    ArithmeticParser,
    "expr = lhs:term rest:(op term)*; op = '+' | '-'; \
     term = digit+ | '(' expr ')'; digit = '0' | '1' | '2';"
);
grammar!(NestParser, "nest = '(' nest? ')';");
grammar!(
    StartOptionParser,
    "letter = 'a' | 'b'; pair = first:letter second:letter;",
    start = pair
);

fn texts(items: &[&str]) -> Value {
    Value::List(items.iter().map(|&item| Value::from(item)).collect())
}

fn interpreted(grammar: &str, start: &str, input: &str) -> Result<Value, ParseError> {
    interpret(&parse_grammar(grammar).unwrap())
        .unwrap()
        .parse(start, input)
}

#[test]
fn test_two_literal_sequence() {
    let value = AbParser::parse("ab").unwrap();
    let tuple = value.as_tuple().unwrap();
    assert_eq!(tuple.len(), 2);
    assert_eq!(tuple[0], Value::from("a"));
    assert_eq!(tuple[1], Value::from("b"));

    assert!(matches!(AbParser::parse("ac"), Err(ParseError::NoMatch { .. })));
    assert_eq!(AbParser::parse("ab").ok(), interpreted(AB, "start", "ab").ok());
}

#[test]
fn test_repetition_and_trailing_input() {
    assert_eq!(WordParser::parse("abc").unwrap(), texts(&["a", "b", "c"]));
    assert!(matches!(
        WordParser::parse("abcd"),
        Err(ParseError::TrailingInput { .. })
    ));
    assert_eq!(
        WordParser::parse("abcd").unwrap_err(),
        interpreted(WORD, "word", "abcd").unwrap_err()
    );
}

#[test]
fn test_labels_address_members() {
    let value = PairParser::parse("ab").unwrap();
    assert_eq!(value.get(0), Some(&Value::from("a")));
    assert_eq!(value.get(1), Some(&Value::from("b")));
    assert_eq!(value.get_label("first"), Some(&Value::from("a")));
    assert_eq!(value.get_label("second"), Some(&Value::from("b")));
    assert_eq!(Ok(value), interpreted(PAIR, "pair", "ab"));
}

#[test]
fn test_optional_yields_absent() {
    let value = MaybeParser::parse("y").unwrap();
    assert_eq!(value.get(0), Some(&Value::Absent));
    assert_eq!(MaybeParser::parse("xy").unwrap().get(0), Some(&Value::from("x")));
    assert_eq!(Ok(value), interpreted(MODIFIERS, "maybe", "y"));
}

#[test]
fn test_zero_or_more_accepts_nothing() {
    assert_eq!(ManyParser::parse("").unwrap(), Value::List(Vec::new()));
    assert_eq!(ManyParser::parse("xxx").unwrap(), texts(&["x", "x", "x"]));
}

#[test]
fn test_zero_width_repetition_terminates() {
    assert_eq!(LoopParser::parse("").unwrap(), Value::List(vec![Value::Absent]));
    assert_eq!(
        LoopParser::parse("xx").unwrap(),
        Value::List(vec!["x".into(), "x".into(), Value::Absent])
    );
}

#[test]
fn test_choice_is_ordered() {
    assert_eq!(OrderedParser::parse("a").unwrap(), Value::from("a"));
    assert!(matches!(
        OrderedParser::parse("ab"),
        Err(ParseError::TrailingInput { .. })
    ));
}

#[test]
fn test_choice_reports_last_failure() {
    let error = LastFailureParser::parse("z").unwrap_err();
    let ParseError::NoMatch { failure, .. } = error else {
        panic!("expected no match");
    };
    assert_eq!(failure.message, "expected 'y', got 'z'");
}

#[test]
fn test_nested_fragments_match_interpreter() {
    for input in ["1", "1+2", "(1+2)-0", "12+(2-(1))", "1+", "(1", ")", ""] {
        assert_eq!(
            ArithmeticParser::parse(input),
            interpreted(ARITHMETIC, "expr", input),
            "results differ on {input:?}"
        );
    }
}

#[test]
fn test_rule_methods_and_names() {
    assert_eq!(ArithmeticParser::RULE_NAMES, &["expr", "op", "term", "digit"]);

    let mut parser = ArithmeticParser::new("2+1");
    assert_eq!(parser.parse_digit(), Ok(Value::from("2")));
    assert_eq!(parser.parse_op(), Ok(Value::from("+")));
    assert!(parser.parse_op().is_err());
    assert_eq!(parser.offset(), 2);
    assert_eq!(parser.cursor().depth(), 0);
}

#[test]
fn test_custom_cursor() {
    let cursor = TextCursor::with_config(" a b\n c ", &CursorConfig::whitespace());
    let value = WordParser::from_cursor(cursor).run().unwrap();
    assert_eq!(value, texts(&["a", "b", "c"]));
}

#[test]
fn test_into_cursor_keeps_position() {
    let mut parser = WordParser::new("abz");
    assert!(parser.parse_word().is_ok());
    assert_eq!(parser.into_cursor().remaining(), "z");
}

#[test]
fn test_start_option() {
    let value = StartOptionParser::parse("ba").unwrap();
    assert_eq!(value.get_label("first"), Some(&Value::from("b")));
}

#[test]
fn test_recursion_respects_max_depth() {
    let config = CursorConfig {
        max_depth: 24,
        ..CursorConfig::default()
    };

    let shallow = TextCursor::with_config("(())", &config);
    assert!(NestParser::from_cursor(shallow).run().is_ok());

    let source = "(".repeat(10_000);
    let deep = TextCursor::with_config(&source, &config);
    assert!(matches!(
        NestParser::from_cursor(deep).run(),
        Err(ParseError::NoMatch { .. })
    ));
}

proptest! {
    #[test]
    fn generated_agrees_with_interpreter(input in "[012+\\-()]{0,12}") {
        prop_assert_eq!(
            ArithmeticParser::parse(&input),
            interpreted(ARITHMETIC, "expr", &input)
        );
    }
}
