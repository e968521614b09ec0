//! Support for generated parsers.
//!
//! `weft_codegen` emits a struct holding a [`TextCursor`] with one method per
//! grammar rule. The struct implements [`GeneratedParser`], which supplies the
//! primitives the emitted methods are written against: scoped attempts,
//! literal matching and failure reporting.

use crate::cursor::TextCursor;
use crate::error::{ParseError, ParseOutcome};
use crate::value::Value;

/// Primitives used by generated rule methods
///
/// # Example
///
/// A hand-written implementation for the grammar `start = 'a' 'b'?;`:
///
/// ```rust
/// use weft::runtime::GeneratedParser;
/// use weft::{ParseOutcome, ResultTuple, TextCursor, Value};
///
/// struct AbParser<'src> {
///     cursor: TextCursor<'src>,
/// }
///
/// impl<'src> GeneratedParser<'src> for AbParser<'src> {
///     fn cursor(&self) -> &TextCursor<'src> {
///         &self.cursor
///     }
///
///     fn cursor_mut(&mut self) -> &mut TextCursor<'src> {
///         &mut self.cursor
///     }
///
///     fn parse_start(&mut self) -> ParseOutcome<Value> {
///         self.attempt(|this| {
///             let first = this.expect("a")?;
///             let second = this.attempt(|this| this.expect("b")).unwrap_or(Value::Absent);
///             Ok(Value::Tuple(ResultTuple::from_entries([(None, first), (None, second)])))
///         })
///     }
/// }
///
/// let value = AbParser { cursor: TextCursor::new("a") }.run().unwrap();
/// assert_eq!(value.get(1), Some(&Value::Absent));
/// ```
pub trait GeneratedParser<'src> {
    fn cursor(&self) -> &TextCursor<'src>;

    fn cursor_mut(&mut self) -> &mut TextCursor<'src>;

    /// Run the start rule without the end-of-input check
    fn parse_start(&mut self) -> ParseOutcome<Value>;

    /// Run `f` inside a scoped attempt, rewinding the cursor if it fails
    ///
    /// Fails without running `f` once the cursor's nesting limit is reached.
    fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseOutcome<T>) -> ParseOutcome<T>
    where
        Self: Sized,
    {
        let mark = self.cursor_mut().try_scoped_attempt()?;
        let outcome = f(self);
        match outcome {
            Ok(_) => self.cursor_mut().commit(mark),
            Err(_) => self.cursor_mut().abandon(mark),
        }
        outcome
    }

    /// Match `literal` exactly
    fn expect(&mut self, literal: &str) -> ParseOutcome<Value> {
        self.cursor_mut().expect(literal).map(Value::Text)
    }

    /// Fail the current attempt
    fn fail<T>(&mut self, message: impl Into<String>) -> ParseOutcome<T>
    where
        Self: Sized,
    {
        self.cursor_mut().fail(message)
    }

    /// Current byte offset
    fn offset(&self) -> usize {
        self.cursor().offset()
    }

    /// Run the start rule and require all input to be consumed
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::NoMatch`] if the start rule fails and
    /// [`ParseError::TrailingInput`] if input remains after it.
    fn run(mut self) -> Result<Value, ParseError>
    where
        Self: Sized,
    {
        let outcome = self.parse_start();
        self.cursor_mut().finish(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::CursorConfig;

    struct Repeating<'src> {
        cursor: TextCursor<'src>,
    }

    impl<'src> GeneratedParser<'src> for Repeating<'src> {
        fn cursor(&self) -> &TextCursor<'src> {
            &self.cursor
        }

        fn cursor_mut(&mut self) -> &mut TextCursor<'src> {
            &mut self.cursor
        }

        // start = 'x'+;
        fn parse_start(&mut self) -> ParseOutcome<Value> {
            let mut matches = Vec::new();
            loop {
                let before = self.offset();
                match self.attempt(|this| this.expect("x")) {
                    Ok(value) => {
                        matches.push(value);
                        if self.offset() == before {
                            break;
                        }
                    }
                    Err(failure) if matches.is_empty() => return Err(failure),
                    Err(_) => break,
                }
            }
            Ok(Value::List(matches))
        }
    }

    fn repeating(source: &str) -> Repeating<'_> {
        Repeating {
            cursor: TextCursor::with_config(source, &CursorConfig::whitespace()),
        }
    }

    #[test]
    fn test_run_consumes_all_input() {
        let value = repeating("x x x ").run().unwrap();
        assert_eq!(value.as_list().map(<[Value]>::len), Some(3));
    }

    #[test]
    fn test_run_rejects_trailing_input() {
        assert!(matches!(
            repeating("xxy").run(),
            Err(ParseError::TrailingInput { .. })
        ));
    }

    #[test]
    fn test_run_reports_no_match() {
        let error = repeating("y").run().unwrap_err();
        assert_eq!(
            error.furthest().map(|failure| failure.message.as_str()),
            Some("expected 'x', got 'y'")
        );
    }

    #[test]
    fn test_attempt_restores_cursor() {
        let mut parser = repeating("xy");
        let outcome = parser.attempt(|this| {
            this.expect("x")?;
            this.expect("x")
        });
        assert!(outcome.is_err());
        assert_eq!(parser.offset(), 0);
        assert_eq!(parser.cursor().depth(), 0);
    }

    struct Nesting<'src> {
        cursor: TextCursor<'src>,
    }

    impl<'src> GeneratedParser<'src> for Nesting<'src> {
        fn cursor(&self) -> &TextCursor<'src> {
            &self.cursor
        }

        fn cursor_mut(&mut self) -> &mut TextCursor<'src> {
            &mut self.cursor
        }

        // start = '(' start? ')';
        fn parse_start(&mut self) -> ParseOutcome<Value> {
            self.attempt(|this| {
                let open = this.expect("(")?;
                let inner = this
                    .attempt(|this| this.parse_start())
                    .unwrap_or(Value::Absent);
                let close = this.expect(")")?;
                Ok(Value::List(vec![open, inner, close]))
            })
        }
    }

    #[test]
    fn test_attempt_stops_at_nesting_limit() {
        let config = CursorConfig {
            max_depth: 32,
            ..CursorConfig::default()
        };
        let shallow = Nesting {
            cursor: TextCursor::with_config("((()))", &config),
        };
        assert!(shallow.run().is_ok());

        let source = "(".repeat(10_000);
        let deep = Nesting {
            cursor: TextCursor::with_config(&source, &config),
        };
        assert!(matches!(deep.run(), Err(ParseError::NoMatch { .. })));
    }

    #[test]
    fn test_fail_uses_cursor_position() {
        let mut parser = repeating("x\nx");
        parser.expect("x").unwrap();
        parser.expect("x").unwrap();
        let failure = parser.fail::<()>("custom").unwrap_err();
        assert_eq!(failure.position.line, 2);
    }
}
