#![no_main]
use libfuzzer_sys::fuzz_target;
use weft::grammar::interpret;
use weft::{GrammarTextParser, ParseError};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let Ok(parser) = GrammarTextParser::new() else {
        return;
    };

    match parser.parse(text) {
        Ok(grammar) => {
            // Printed grammars parse back to the same tree
            let printed = grammar.to_string();
            assert_eq!(parser.parse(&printed).ok(), Some(grammar.clone()));

            // Left-recursive grammars are accepted here, so they are built but never run
            let _ = interpret(&grammar);
        }
        Err(error) => {
            let _ = error.format_with_context(text);
            assert!(!matches!(error, ParseError::Grammar(_)));
        }
    }
});
