use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use weft::grammar::interpret;
use weft::{CursorConfig, GrammarTextParser, Parser, TextCursor, parse_grammar};

const ARITHMETIC: &str = "
    expr = term rest:(op term)*;
    op = '+' | '-';
    term = factor (mul factor)*;
    mul = '*' | '/';
    factor = digit+ | '(' expr ')';
    digit = '0' | '1' | '2' | '3' | '4' | '5' | '6' | '7' | '8' | '9';
";

fn arithmetic_parser() -> Parser {
    interpret(&parse_grammar(ARITHMETIC).unwrap()).unwrap()
}

fn arithmetic_input(terms: usize) -> String {
    (0..terms)
        .map(|i| format!("({i} * {} - 7)", i + 1))
        .collect::<Vec<_>>()
        .join(" + ")
}

fn bench_grammar_text(c: &mut Criterion) {
    let parser = GrammarTextParser::new().unwrap();

    c.bench_function("grammar_text_parse", |b| {
        b.iter(|| black_box(parser.parse(black_box(ARITHMETIC))));
    });

    c.bench_function("grammar_text_parser_build", |b| {
        b.iter(|| black_box(GrammarTextParser::new()));
    });
}

fn bench_interpreter(c: &mut Criterion) {
    let parser = arithmetic_parser();

    let mut group = c.benchmark_group("interpreted_arithmetic");
    for terms in [1, 10, 100] {
        let input = arithmetic_input(terms);
        group.bench_function(format!("{terms}_terms"), |b| {
            b.iter(|| {
                let cursor = TextCursor::with_config(black_box(&input), &CursorConfig::whitespace());
                black_box(parser.parse_with("expr", cursor))
            });
        });
    }
    group.finish();
}

fn bench_backtracking(c: &mut Criterion) {
    // Every alternative shares a long prefix, so each failure rewinds far
    let grammar = (0..8)
        .map(|i| format!("'{}{i}'", "a".repeat(32)))
        .collect::<Vec<_>>()
        .join(" | ");
    let parser = interpret(&parse_grammar(&format!("start = ({grammar})+;")).unwrap()).unwrap();
    let input = format!("{}7", "a".repeat(32)).repeat(16);

    c.bench_function("backtracking_choice", |b| {
        b.iter(|| black_box(parser.parse("start", black_box(&input))));
    });
}

criterion_group!(benches, bench_grammar_text, bench_interpreter, bench_backtracking);
criterion_main!(benches);
