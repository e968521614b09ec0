//! Two-phase rule registration and the compiled parser.
//!
//! Rules are declared first, which hands out a [`RuleId`] that other rules
//! can reference before the body exists. Bodies are supplied afterwards with
//! [`RuleSet::define`], and [`RuleSet::build`] checks, flattens and compiles
//! everything into a [`Parser`].

use ahash::RandomState;
use compact_str::CompactString;
use hashbrown::HashMap;
use tracing::{debug, trace};

use super::compile::{ParseFn, compile};
use super::RuleNode;
use crate::cursor::{CursorConfig, TextCursor};
use crate::error::{GrammarError, ParseError, ParseOutcome};
use crate::value::Value;

/// Handle to a declared rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub(crate) usize);

impl RuleId {
    /// Position of the rule in declaration order
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct RuleSlot {
    name: CompactString,
    body: Option<RuleNode>,
}

/// Rules under construction
///
/// # Example
///
/// ```rust
/// use weft::rule::{RuleNode, RuleSet};
///
/// let mut rules = RuleSet::new();
/// let list = rules.declare("list");
/// let item = rules.declare("item");
///
/// // list = item ("," list)?
/// rules.define(list, item.into_node() & RuleNode::optional(RuleNode::from(",") & list)).unwrap();
/// rules.define(item, RuleNode::charset('a'..='z').unwrap()).unwrap();
///
/// let parser = rules.build().unwrap();
/// assert!(parser.parse("list", "a,b,c").is_ok());
/// assert!(parser.parse("list", "a,b,").is_err());
/// ```
#[derive(Debug, Default)]
pub struct RuleSet {
    slots: Vec<RuleSlot>,
    by_name: HashMap<CompactString, RuleId, RandomState>,
}

impl RuleId {
    /// A node referencing this rule
    #[must_use]
    pub const fn into_node(self) -> RuleNode {
        RuleNode::reference(self)
    }
}

impl RuleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule name, returning its handle
    ///
    /// Declaring a name twice returns the existing handle.
    pub fn declare(&mut self, name: &str) -> RuleId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = RuleId(self.slots.len());
        self.slots.push(RuleSlot {
            name: name.into(),
            body: None,
        });
        self.by_name.insert(name.into(), id);
        id
    }

    /// Supply the body of a declared rule
    ///
    /// The body takes the rule's name unless it already has one.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::DuplicateRule`] if the rule already has a body,
    /// or [`GrammarError::UnknownRule`] for a handle from another set.
    pub fn define(&mut self, id: RuleId, body: impl Into<RuleNode>) -> Result<(), GrammarError> {
        let slot = self
            .slots
            .get_mut(id.0)
            .ok_or_else(|| GrammarError::UnknownRule(format!("#{}", id.0).into()))?;

        if slot.body.is_some() {
            return Err(GrammarError::DuplicateRule(slot.name.clone()));
        }

        let mut body = body.into();
        if body.name.is_none() {
            body.name = Some(slot.name.clone());
        }
        slot.body = Some(body);
        Ok(())
    }

    /// Declare and define in one step
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::DuplicateRule`] if the rule already has a body.
    pub fn rule(&mut self, name: &str, body: impl Into<RuleNode>) -> Result<RuleId, GrammarError> {
        let id = self.declare(name);
        self.define(id, body)?;
        Ok(id)
    }

    /// A node referencing the rule called `name`, declaring it if needed
    pub fn reference(&mut self, name: &str) -> RuleNode {
        RuleNode::reference(self.declare(name))
    }

    /// Look up a declared rule
    #[must_use]
    pub fn id(&self, name: &str) -> Option<RuleId> {
        self.by_name.get(name).copied()
    }

    /// Check, flatten and compile every rule
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::UndefinedRule`] if a declared rule has no body.
    pub fn build(self) -> Result<Parser, GrammarError> {
        let mut names = Vec::with_capacity(self.slots.len());
        let mut bodies = Vec::with_capacity(self.slots.len());

        for slot in self.slots {
            let body = slot
                .body
                .ok_or_else(|| GrammarError::UndefinedRule(slot.name.clone()))?;
            bodies.push(compile(&body.flatten()));
            names.push(slot.name);
        }

        debug!(rules = names.len(), "built rule set");

        Ok(Parser {
            table: RuleTable { names, bodies },
            by_name: self.by_name,
        })
    }
}

/// Compiled rule bodies, indexed by [`RuleId`]
#[derive(Default)]
pub(crate) struct RuleTable {
    names: Vec<CompactString>,
    bodies: Vec<ParseFn>,
}

impl RuleTable {
    pub(crate) fn call(&self, id: RuleId, cursor: &mut TextCursor<'_>) -> ParseOutcome<Value> {
        let (Some(name), Some(body)) = (self.names.get(id.0), self.bodies.get(id.0)) else {
            return cursor.fail(format!("unknown rule #{}", id.0));
        };
        trace!(rule = %name, offset = cursor.offset(), "enter rule");
        body(cursor, self)
    }
}

/// A compiled grammar
///
/// Rule closures are reference counted, so a parser stays on the thread that
/// built it.
pub struct Parser {
    table: RuleTable,
    by_name: HashMap<CompactString, RuleId, RandomState>,
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("rules", &self.table.names)
            .finish_non_exhaustive()
    }
}

impl Parser {
    /// Handle of the rule called `name`
    #[must_use]
    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.by_name.get(name).copied()
    }

    /// Rule names in declaration order
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.table.names.iter().map(CompactString::as_str)
    }

    fn start(&self, name: &str) -> Result<RuleId, ParseError> {
        self.rule_id(name)
            .ok_or_else(|| GrammarError::UnknownRule(name.into()).into())
    }

    /// Parse `text` with rule `start`, requiring all input to be consumed
    ///
    /// The cursor skips nothing; use [`Parser::parse_with`] to supply a skip set.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::NoMatch`] if the rule fails,
    /// [`ParseError::TrailingInput`] if input remains, or
    /// [`ParseError::Grammar`] if there is no rule called `start`.
    pub fn parse(&self, start: &str, text: &str) -> Result<Value, ParseError> {
        self.parse_with(start, TextCursor::with_config(text, &CursorConfig::default()))
    }

    /// Parse with a prepared cursor, requiring all input to be consumed
    ///
    /// # Errors
    ///
    /// See [`Parser::parse`].
    pub fn parse_with(&self, start: &str, mut cursor: TextCursor<'_>) -> Result<Value, ParseError> {
        let id = self.start(start)?;
        let outcome = self.table.call(id, &mut cursor);
        cursor.finish(outcome)
    }

    /// Run rule `start` at the cursor without the end-of-input check
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::NoMatch`] if the rule fails, or
    /// [`ParseError::Grammar`] if there is no rule called `start`.
    pub fn parse_prefix(&self, start: &str, cursor: &mut TextCursor<'_>) -> Result<Value, ParseError> {
        let id = self.start(start)?;
        self.table
            .call(id, cursor)
            .map_err(|failure| ParseError::NoMatch {
                furthest: cursor
                    .take_furthest()
                    .filter(|deeper| deeper.is_beyond(&failure)),
                failure,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_is_idempotent() {
        let mut rules = RuleSet::new();
        let first = rules.declare("a");
        let second = rules.declare("a");
        assert_eq!(first, second);
        assert_eq!(rules.id("a"), Some(first));
        assert_eq!(rules.id("b"), None);
    }

    #[test]
    fn test_define_twice_is_an_error() {
        let mut rules = RuleSet::new();
        let id = rules.declare("a");
        rules.define(id, "x").unwrap();
        assert_eq!(
            rules.define(id, "y"),
            Err(GrammarError::DuplicateRule("a".into()))
        );
    }

    #[test]
    fn test_build_rejects_undefined_rule() {
        let mut rules = RuleSet::new();
        let missing = rules.reference("missing");
        rules.rule("start", missing).unwrap();

        assert_eq!(
            rules.build().unwrap_err(),
            GrammarError::UndefinedRule("missing".into())
        );
    }

    #[test]
    fn test_define_names_the_body() {
        let mut rules = RuleSet::new();
        let id = rules.declare("greeting");
        rules.define(id, "hi").unwrap();
        assert_eq!(
            rules.slots[0].body.as_ref().and_then(|b| b.name.as_deref()),
            Some("greeting")
        );
    }

    #[test]
    fn test_mutual_recursion() {
        // nested = "(" nested ")" | "x"
        let mut rules = RuleSet::new();
        let nested = rules.declare("nested");
        rules
            .define(
                nested,
                (RuleNode::from("(") & nested & ")") | "x",
            )
            .unwrap();
        let parser = rules.build().unwrap();

        assert!(parser.parse("nested", "((x))").is_ok());
        assert!(parser.parse("nested", "((x)").is_err());
    }

    #[test]
    fn test_parse_unknown_start_rule() {
        let mut rules = RuleSet::new();
        rules.rule("a", "a").unwrap();
        let parser = rules.build().unwrap();

        assert_eq!(
            parser.parse("b", "a").unwrap_err(),
            ParseError::Grammar(GrammarError::UnknownRule("b".into()))
        );
    }

    #[test]
    fn test_parse_prefix_leaves_rest() {
        let mut rules = RuleSet::new();
        rules.rule("a", "a").unwrap();
        let parser = rules.build().unwrap();

        let mut cursor = TextCursor::new("aab");
        assert_eq!(parser.parse_prefix("a", &mut cursor).unwrap(), Value::from("a"));
        assert_eq!(cursor.remaining(), "ab");
    }

    #[test]
    fn test_rule_names_in_declaration_order() {
        let mut rules = RuleSet::new();
        let b = rules.declare("b");
        rules.rule("a", "a").unwrap();
        rules.define(b, "b").unwrap();
        let parser = rules.build().unwrap();

        assert_eq!(parser.rule_names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(parser.rule_id("a").map(RuleId::index), Some(1));
    }
}
