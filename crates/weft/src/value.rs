//! # Match Results
//!
//! Every successful match produces a [`Value`]. Leaves produce text,
//! modifiers produce lists or [`Value::Absent`], and sequences produce a
//! [`ResultTuple`] whose members can be read by position or by label.

use std::any::Any;
use std::fmt;
use std::ops::Index;
use std::rc::Rc;

use ahash::RandomState;
use compact_str::CompactString;
use hashbrown::HashMap;

use crate::error::GrammarError;

/// Dynamic result of a match
#[derive(Clone, Default)]
pub enum Value {
    /// Text matched by a literal or a charset
    Text(CompactString),
    /// An optional match that did not happen
    #[default]
    Absent,
    /// Integer produced by a transformer
    Integer(i64),
    /// Matches collected by a repetition
    List(Vec<Value>),
    /// Members of a sequence
    Tuple(ResultTuple),
    /// Arbitrary transformer output
    Custom(Rc<dyn Any>),
}

impl Value {
    /// Wrap an arbitrary value produced by a transformer
    #[must_use]
    pub fn custom<T: Any>(value: T) -> Self {
        Self::Custom(Rc::new(value))
    }

    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_tuple(&self) -> Option<&ResultTuple> {
        match self {
            Self::Tuple(tuple) => Some(tuple),
            _ => None,
        }
    }

    /// Borrow a custom value as `T`
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Custom(inner) => inner.downcast_ref(),
            _ => None,
        }
    }

    /// Take a custom value out as `T`, cloning only if it is shared
    ///
    /// # Errors
    ///
    /// Returns the value unchanged when it is not a custom `T`.
    pub fn into_custom<T: Any + Clone>(self) -> Result<T, Self> {
        match self {
            Self::Custom(inner) => match inner.downcast::<T>() {
                Ok(owned) => Ok(Rc::try_unwrap(owned).unwrap_or_else(|shared| (*shared).clone())),
                Err(inner) => Err(Self::Custom(inner)),
            },
            other => Err(other),
        }
    }

    /// Positional access into a list or tuple
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        match self {
            Self::List(items) => items.get(index),
            Self::Tuple(tuple) => tuple.get(index),
            _ => None,
        }
    }

    /// Labelled access into a tuple
    #[must_use]
    pub fn get_label(&self, label: &str) -> Option<&Value> {
        self.as_tuple().and_then(|tuple| tuple.get_label(label))
    }

    /// Concatenate all text reachable from this value, in order
    ///
    /// Useful for turning the list produced by a charset repetition back into
    /// a single token.
    #[must_use]
    pub fn concat_text(&self) -> CompactString {
        let mut out = CompactString::default();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut CompactString) {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::List(items) => items.iter().for_each(|item| item.push_text(out)),
            Self::Tuple(tuple) => tuple.values().for_each(|item| item.push_text(out)),
            Self::Absent | Self::Integer(_) | Self::Custom(_) => {}
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text:?}"),
            Self::Absent => f.write_str("Absent"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::List(items) => f.debug_list().entries(items).finish(),
            Self::Tuple(tuple) => fmt::Debug::fmt(tuple, f),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Absent, Self::Absent) => true,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.into())
    }
}

impl From<CompactString> for Value {
    fn from(text: CompactString) -> Self {
        Self::Text(text)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<ResultTuple> for Value {
    fn from(tuple: ResultTuple) -> Self {
        Self::Tuple(tuple)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

/// Ordered members of a sequence match, optionally labelled
///
/// Each entry pairs a value with its label, so there is always exactly one
/// label slot per value. When two members share a label, lookup by that label
/// finds the later one.
///
/// # Example
///
/// ```rust
/// use weft::{ResultTuple, Value};
///
/// let tuple = ResultTuple::from_entries([
///     (Some("first"), Value::from("a")),
///     (None, Value::from("-")),
///     (Some("second"), Value::from("b")),
/// ]);
///
/// assert_eq!(tuple[0], Value::from("a"));
/// assert_eq!(tuple["second"], Value::from("b"));
/// assert_eq!(tuple.len(), 3);
/// ```
#[derive(Clone, Default)]
pub struct ResultTuple {
    entries: Vec<(Option<CompactString>, Value)>,
    index: HashMap<CompactString, usize, RandomState>,
}

impl ResultTuple {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tuple from `(label, value)` pairs
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Option<&'a str>, Value)>,
    {
        let mut tuple = Self::new();
        for (label, value) in entries {
            tuple.push(label, value);
        }
        tuple
    }

    /// Build a tuple from parallel label and value lists
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::LabelCountMismatch`] when the lists differ in length.
    pub fn zip(labels: Vec<Option<&str>>, values: Vec<Value>) -> Result<Self, GrammarError> {
        if labels.len() != values.len() {
            return Err(GrammarError::LabelCountMismatch {
                labels: labels.len(),
                values: values.len(),
            });
        }
        Ok(Self::from_entries(labels.into_iter().zip(values)))
    }

    /// Append a member
    pub fn push(&mut self, label: Option<&str>, value: Value) {
        let label = label.map(CompactString::from);
        if let Some(label) = &label {
            self.index.insert(label.clone(), self.entries.len());
        }
        self.entries.push((label, value));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.entries.get(index).map(|(_, value)| value)
    }

    #[must_use]
    pub fn get_label(&self, label: &str) -> Option<&Value> {
        self.index.get(label).and_then(|&idx| self.get(idx))
    }

    /// Label of the member at `index`, if it has one
    #[must_use]
    pub fn label_at(&self, index: usize) -> Option<&str> {
        self.entries
            .get(index)
            .and_then(|(label, _)| label.as_deref())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &Value)> {
        self.entries
            .iter()
            .map(|(label, value)| (label.as_deref(), value))
    }

    /// Labels in member order, `None` for unlabelled members
    pub fn labels(&self) -> impl Iterator<Item = Option<&str>> {
        self.entries.iter().map(|(label, _)| label.as_deref())
    }

    /// Consume the tuple, keeping only the values
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.entries.into_iter().map(|(_, value)| value).collect()
    }
}

impl PartialEq for ResultTuple {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl fmt::Debug for ResultTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tuple = f.debug_tuple("");
        for (label, value) in self.iter() {
            match label {
                Some(label) => tuple.field(&format_args!("{label}: {value:?}")),
                None => tuple.field(value),
            };
        }
        tuple.finish()
    }
}

impl Index<usize> for ResultTuple {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.entries[index].1
    }
}

impl Index<&str> for ResultTuple {
    type Output = Value;

    fn index(&self, label: &str) -> &Value {
        match self.get_label(label) {
            Some(value) => value,
            None => panic!("no member labelled '{label}'"),
        }
    }
}
