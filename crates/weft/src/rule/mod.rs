//! # Rule Nodes
//!
//! Composable matchers and the algebra for combining them.
//!
//! ## Overview
//!
//! A [`RuleNode`] is a tree of matchers:
//!
//! - **Leaves**: [`RuleKind::Literal`], [`RuleKind::Charset`] and
//!   [`RuleKind::Functional`] consume input directly
//! - **Modifiers**: [`RuleKind::Optional`], [`RuleKind::Repeat1`] and
//!   [`RuleKind::Repeat0`] wrap a single inner node
//! - **Combinators**: [`RuleKind::Sequence`] and [`RuleKind::Choice`] hold an
//!   ordered list of members
//! - **References**: [`RuleKind::Reference`] points at a rule declared in a
//!   [`RuleSet`], which is how recursive grammars are written
//!
//! Nodes are built with [`RuleNode::create`] or with the `&` (sequence) and `|`
//! (choice) operators, then handed to a [`RuleSet`] which flattens and
//! compiles them into a [`Parser`].
//!
//! ## Example
//!
//! ```rust
//! use weft::rule::{RuleNode, RuleSet};
//! use weft::Value;
//!
//! let mut rules = RuleSet::new();
//! let greeting = rules.declare("greeting");
//! rules
//!     .define(greeting, RuleNode::from("hello") & (RuleNode::from("world") | "there"))
//!     .unwrap();
//!
//! let parser = rules.build().unwrap();
//! let value = parser.parse("greeting", "hellothere").unwrap();
//! assert_eq!(value.get(1), Some(&Value::from("there")));
//! ```

mod compile;
mod flatten;
mod set;

pub use set::{Parser, RuleId, RuleSet};

use std::fmt;
use std::ops::{BitAnd, BitOr};
use std::rc::Rc;

use ahash::RandomState;
use compact_str::CompactString;
use hashbrown::HashSet;

use crate::cursor::TextCursor;
use crate::error::{GrammarError, ParseOutcome, Rejection};
use crate::value::Value;

/// Matcher that receives the cursor directly
pub type LeafFn = Rc<dyn Fn(&mut TextCursor<'_>) -> ParseOutcome<Value>>;

/// Post-processing step applied to a node's raw result
pub type Transformer = Rc<dyn Fn(Value) -> Result<Value, Rejection>>;

/// Deferred constructor for a node
pub type Thunk = Rc<dyn Fn() -> RuleNode>;

/// Set of single characters, any one of which matches
#[derive(Clone)]
pub struct Charset {
    members: HashSet<char, RandomState>,
    ordered: Vec<char>,
}

impl Charset {
    /// Create a charset, keeping the first occurrence of each character
    #[must_use]
    pub fn new(chars: impl IntoIterator<Item = char>) -> Self {
        let mut members = HashSet::with_hasher(RandomState::new());
        let ordered = chars.into_iter().filter(|&ch| members.insert(ch)).collect();
        Self { members, ordered }
    }

    #[must_use]
    pub fn contains(&self, ch: char) -> bool {
        self.members.contains(&ch)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Members in the order they were given
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.ordered
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(&self.ordered).finish()
    }
}

impl PartialEq for Charset {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

/// What a node matches
#[derive(Clone)]
pub enum RuleKind {
    Literal(CompactString),
    Charset(Charset),
    Functional(LeafFn),
    Optional(Box<RuleNode>),
    Repeat1(Box<RuleNode>),
    Repeat0(Box<RuleNode>),
    Choice(Vec<RuleNode>),
    Sequence(Vec<RuleNode>),
    Reference(RuleId),
}

impl RuleKind {
    /// Short name of the variant, used in logs and debug output
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Literal(_) => "literal",
            Self::Charset(_) => "charset",
            Self::Functional(_) => "functional",
            Self::Optional(_) => "optional",
            Self::Repeat1(_) => "repeat1",
            Self::Repeat0(_) => "repeat0",
            Self::Choice(_) => "choice",
            Self::Sequence(_) => "sequence",
            Self::Reference(_) => "reference",
        }
    }
}

impl fmt::Debug for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Self::Charset(set) => f.debug_tuple("Charset").field(set).finish(),
            Self::Functional(_) => f.write_str("Functional(..)"),
            Self::Optional(inner) => f.debug_tuple("Optional").field(inner).finish(),
            Self::Repeat1(inner) => f.debug_tuple("Repeat1").field(inner).finish(),
            Self::Repeat0(inner) => f.debug_tuple("Repeat0").field(inner).finish(),
            Self::Choice(members) => f.debug_tuple("Choice").field(members).finish(),
            Self::Sequence(members) => f.debug_tuple("Sequence").field(members).finish(),
            Self::Reference(id) => f.debug_tuple("Reference").field(id).finish(),
        }
    }
}

/// A matcher with optional identity and post-processing
#[derive(Clone)]
pub struct RuleNode {
    pub kind: RuleKind,
    /// Debug identity; a named node is never spliced into its parent
    pub name: Option<CompactString>,
    /// Label under which a sequence exposes this member's result
    pub alias: Option<CompactString>,
    pub transformer: Option<Transformer>,
}

impl fmt::Debug for RuleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut node = f.debug_struct("RuleNode");
        node.field("kind", &self.kind);
        if let Some(name) = &self.name {
            node.field("name", name);
        }
        if let Some(alias) = &self.alias {
            node.field("alias", alias);
        }
        if self.transformer.is_some() {
            node.field("transformer", &"..");
        }
        node.finish()
    }
}

/// Anything a node can be built from
#[derive(Clone)]
pub enum RuleSource {
    /// Exact text
    Literal(CompactString),
    /// Any single character from the collection
    Charset(Vec<char>),
    /// A function receiving the cursor
    Leaf(LeafFn),
    /// A function that builds the node when invoked
    Thunk(Thunk),
    /// An existing node, reused as is
    Node(RuleNode),
}

impl RuleSource {
    pub fn leaf(f: impl Fn(&mut TextCursor<'_>) -> ParseOutcome<Value> + 'static) -> Self {
        Self::Leaf(Rc::new(f))
    }

    pub fn thunk(f: impl Fn() -> RuleNode + 'static) -> Self {
        Self::Thunk(Rc::new(f))
    }
}

impl From<&str> for RuleSource {
    fn from(text: &str) -> Self {
        Self::Literal(text.into())
    }
}

impl From<String> for RuleSource {
    fn from(text: String) -> Self {
        Self::Literal(text.into())
    }
}

impl From<CompactString> for RuleSource {
    fn from(text: CompactString) -> Self {
        Self::Literal(text)
    }
}

impl From<Vec<char>> for RuleSource {
    fn from(chars: Vec<char>) -> Self {
        Self::Charset(chars)
    }
}

impl From<&[char]> for RuleSource {
    fn from(chars: &[char]) -> Self {
        Self::Charset(chars.to_vec())
    }
}

impl<const N: usize> From<[char; N]> for RuleSource {
    fn from(chars: [char; N]) -> Self {
        Self::Charset(chars.to_vec())
    }
}

impl From<RuleNode> for RuleSource {
    fn from(node: RuleNode) -> Self {
        Self::Node(node)
    }
}

/// Options applied by [`RuleNode::create`]
///
/// # Example
///
/// ```rust
/// use weft::rule::{RuleKind, RuleNode, RuleOptions};
///
/// let digits = RuleNode::create(
///     ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'],
///     RuleOptions::default().named("digits").multiple(),
/// )
/// .unwrap();
///
/// assert!(matches!(digits.kind, RuleKind::Repeat1(_)));
/// assert_eq!(digits.name.as_deref(), Some("digits"));
/// ```
#[derive(Clone, Default)]
pub struct RuleOptions {
    pub name: Option<CompactString>,
    pub transformer: Option<Transformer>,
    /// With `multiple`: zero or more. Alone: zero or one.
    pub optional: bool,
    /// One or more
    pub multiple: bool,
}

impl RuleOptions {
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn transform(
        mut self,
        transformer: impl Fn(Value) -> Result<Value, Rejection> + 'static,
    ) -> Self {
        self.transformer = Some(Rc::new(transformer));
        self
    }

    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    #[must_use]
    pub const fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }
}

impl RuleNode {
    /// Create an anonymous node of the given kind
    #[must_use]
    pub const fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            name: None,
            alias: None,
            transformer: None,
        }
    }

    /// Resolve a source into a node and apply `options`
    ///
    /// When `optional` or `multiple` is set the resolved node is wrapped, and
    /// the name and transformer go on the wrapper. Otherwise they replace the
    /// resolved node's own, where given.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::Malformed`] for an empty literal or charset.
    pub fn create(
        source: impl Into<RuleSource>,
        options: RuleOptions,
    ) -> Result<Self, GrammarError> {
        let resolved = match source.into() {
            RuleSource::Literal(text) if text.is_empty() => {
                return Err(GrammarError::Malformed("empty literal".into()));
            }
            RuleSource::Literal(text) => Self::new(RuleKind::Literal(text)),
            RuleSource::Charset(chars) if chars.is_empty() => {
                return Err(GrammarError::Malformed("empty charset".into()));
            }
            RuleSource::Charset(chars) => Self::new(RuleKind::Charset(Charset::new(chars))),
            RuleSource::Leaf(leaf) => Self::new(RuleKind::Functional(leaf)),
            RuleSource::Thunk(build) => build(),
            RuleSource::Node(node) => node,
        };

        let mut node = match (options.multiple, options.optional) {
            (true, true) => Self::new(RuleKind::Repeat0(Box::new(resolved))),
            (true, false) => Self::new(RuleKind::Repeat1(Box::new(resolved))),
            (false, true) => Self::new(RuleKind::Optional(Box::new(resolved))),
            (false, false) => resolved,
        };

        if let Some(name) = options.name {
            node.name = Some(name);
        }
        if let Some(transformer) = options.transformer {
            node.transformer = Some(transformer);
        }

        Ok(node)
    }

    /// Match a single character from `chars`
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::Malformed`] when `chars` is empty.
    pub fn charset(chars: impl IntoIterator<Item = char>) -> Result<Self, GrammarError> {
        Self::create(chars.into_iter().collect::<Vec<_>>(), RuleOptions::default())
    }

    /// Match with a function receiving the cursor
    pub fn leaf(f: impl Fn(&mut TextCursor<'_>) -> ParseOutcome<Value> + 'static) -> Self {
        Self::new(RuleKind::Functional(Rc::new(f)))
    }

    /// Match the rule declared as `id`
    #[must_use]
    pub const fn reference(id: RuleId) -> Self {
        Self::new(RuleKind::Reference(id))
    }

    /// Match `inner`, or produce [`Value::Absent`]
    pub fn optional(inner: impl Into<Self>) -> Self {
        Self::new(RuleKind::Optional(Box::new(inner.into())))
    }

    /// Match `inner` at least once
    pub fn one_or_more(inner: impl Into<Self>) -> Self {
        Self::new(RuleKind::Repeat1(Box::new(inner.into())))
    }

    /// Match `inner` any number of times
    pub fn zero_or_more(inner: impl Into<Self>) -> Self {
        Self::new(RuleKind::Repeat0(Box::new(inner.into())))
    }

    #[must_use]
    pub const fn sequence(members: Vec<Self>) -> Self {
        Self::new(RuleKind::Sequence(members))
    }

    #[must_use]
    pub const fn choice(alternatives: Vec<Self>) -> Self {
        Self::new(RuleKind::Choice(alternatives))
    }

    /// Give the node a debug name
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Return a copy labelled for use inside a sequence
    #[must_use]
    pub fn alias(&self, label: &str) -> Self {
        let mut labelled = self.clone();
        labelled.alias = Some(label.into());
        labelled
    }

    /// Post-process the node's result
    #[must_use]
    pub fn transform(
        mut self,
        transformer: impl Fn(Value) -> Result<Value, Rejection> + 'static,
    ) -> Self {
        self.transformer = Some(Rc::new(transformer));
        self
    }

    /// Whether the node has neither a name nor an alias
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.name.is_none() && self.alias.is_none()
    }
}

impl From<&str> for RuleNode {
    fn from(text: &str) -> Self {
        Self::new(RuleKind::Literal(text.into()))
    }
}

impl From<String> for RuleNode {
    fn from(text: String) -> Self {
        Self::new(RuleKind::Literal(text.into()))
    }
}

impl From<char> for RuleNode {
    fn from(ch: char) -> Self {
        let mut text = CompactString::default();
        text.push(ch);
        Self::new(RuleKind::Literal(text))
    }
}

impl From<RuleId> for RuleNode {
    fn from(id: RuleId) -> Self {
        Self::reference(id)
    }
}

impl<R: Into<RuleNode>> BitAnd<R> for RuleNode {
    type Output = RuleNode;

    fn bitand(self, rhs: R) -> RuleNode {
        RuleNode::sequence(vec![self, rhs.into()])
    }
}

impl<R: Into<RuleNode>> BitOr<R> for RuleNode {
    type Output = RuleNode;

    fn bitor(self, rhs: R) -> RuleNode {
        RuleNode::choice(vec![self, rhs.into()])
    }
}

impl BitAnd<RuleNode> for &str {
    type Output = RuleNode;

    fn bitand(self, rhs: RuleNode) -> RuleNode {
        RuleNode::sequence(vec![self.into(), rhs])
    }
}

impl BitOr<RuleNode> for &str {
    type Output = RuleNode;

    fn bitor(self, rhs: RuleNode) -> RuleNode {
        RuleNode::choice(vec![self.into(), rhs])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_from_literal() {
        let node = RuleNode::create("abc", RuleOptions::default()).unwrap();
        assert!(matches!(&node.kind, RuleKind::Literal(text) if text == "abc"));
        assert!(node.is_anonymous());
    }

    #[test]
    fn test_create_from_charset() {
        let node = RuleNode::create(vec!['a', 'b', 'a'], RuleOptions::default()).unwrap();
        match &node.kind {
            RuleKind::Charset(set) => {
                assert_eq!(set.chars(), &['a', 'b']);
                assert!(set.contains('b'));
                assert!(!set.contains('c'));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_create_rejects_empty_sources() {
        assert!(matches!(
            RuleNode::create("", RuleOptions::default()),
            Err(GrammarError::Malformed(_))
        ));
        assert!(matches!(
            RuleNode::create(Vec::<char>::new(), RuleOptions::default()),
            Err(GrammarError::Malformed(_))
        ));
    }

    #[test]
    fn test_create_from_thunk_invokes_it() {
        let node = RuleNode::create(
            RuleSource::thunk(|| RuleNode::from("x") | "y"),
            RuleOptions::default().named("xy"),
        )
        .unwrap();

        assert!(matches!(&node.kind, RuleKind::Choice(alts) if alts.len() == 2));
        assert_eq!(node.name.as_deref(), Some("xy"));
    }

    #[test]
    fn test_create_reconfigures_existing_node() {
        let original = RuleNode::from("a").named("first");
        let node = RuleNode::create(original, RuleOptions::default()).unwrap();
        assert_eq!(node.name.as_deref(), Some("first"));

        let node = RuleNode::create(node, RuleOptions::default().named("second")).unwrap();
        assert_eq!(node.name.as_deref(), Some("second"));
    }

    #[test]
    fn test_create_modifier_flags() {
        let wrap = |options: RuleOptions| RuleNode::create("a", options).unwrap().kind.label();

        assert_eq!(wrap(RuleOptions::default().optional()), "optional");
        assert_eq!(wrap(RuleOptions::default().multiple()), "repeat1");
        assert_eq!(wrap(RuleOptions::default().multiple().optional()), "repeat0");
    }

    #[test]
    fn test_options_name_goes_on_wrapper() {
        let node = RuleNode::create("a", RuleOptions::default().named("as").multiple()).unwrap();
        assert_eq!(node.name.as_deref(), Some("as"));
        match &node.kind {
            RuleKind::Repeat1(inner) => assert!(inner.is_anonymous()),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_operators_build_anonymous_binary_nodes() {
        let seq = RuleNode::from("a") & "b" & "c";
        match &seq.kind {
            RuleKind::Sequence(members) => {
                assert_eq!(members.len(), 2);
                assert!(matches!(members[0].kind, RuleKind::Sequence(_)));
                assert!(members[0].is_anonymous());
            }
            other => panic!("unexpected kind: {other:?}"),
        }

        let alt = "a" | RuleNode::from("b");
        assert!(matches!(&alt.kind, RuleKind::Choice(alts) if alts.len() == 2));
    }

    #[test]
    fn test_alias_returns_labelled_copy() {
        let letter = RuleNode::from("a");
        let first = letter.alias("first");

        assert_eq!(first.alias.as_deref(), Some("first"));
        assert!(letter.is_anonymous());
        assert!(!first.is_anonymous());
    }
}
