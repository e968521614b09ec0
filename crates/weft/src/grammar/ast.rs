//! Grammar syntax tree
//!
//! The tree is built once per parse of grammar text and is not modified
//! afterwards. [`Expr::sequence`] and [`Expr::choice`] collapse singleton
//! lists, so a one-element sequence or choice never appears in a parsed tree.

use std::fmt;

use compact_str::CompactString;

/// A parsed grammar: rules in source order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grammar {
    pub rules: Vec<Rule>,
}

impl Grammar {
    #[must_use]
    pub const fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Find a rule by name
    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.name == name)
    }
}

/// `name = body;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: CompactString,
    pub body: Expr,
}

impl Rule {
    #[must_use]
    pub fn new(name: &str, body: Expr) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

/// Postfix repetition operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// `?`
    Optional,
    /// `+`
    OneOrMore,
    /// `*`
    ZeroOrMore,
}

impl Modifier {
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Optional => '?',
            Self::OneOrMore => '+',
            Self::ZeroOrMore => '*',
        }
    }

    #[must_use]
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '?' => Some(Self::Optional),
            '+' => Some(Self::OneOrMore),
            '*' => Some(Self::ZeroOrMore),
            _ => None,
        }
    }
}

/// Right-hand side of a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Members matched in order
    Sequence(Vec<Expr>),
    /// Alternatives tried in order
    Choice(Vec<Expr>),
    Modified {
        inner: Box<Expr>,
        modifier: Modifier,
    },
    /// `label:inner`
    Labelled {
        label: CompactString,
        inner: Box<Expr>,
    },
    /// Reference to another rule
    Identifier(CompactString),
    /// Quoted text
    Literal(CompactString),
}

impl Expr {
    /// A sequence, or the sole member itself
    #[must_use]
    pub fn sequence(mut members: Vec<Self>) -> Self {
        if members.len() == 1
            && let Some(only) = members.pop()
        {
            return only;
        }
        Self::Sequence(members)
    }

    /// A choice, or the sole alternative itself
    #[must_use]
    pub fn choice(mut alternatives: Vec<Self>) -> Self {
        if alternatives.len() == 1
            && let Some(only) = alternatives.pop()
        {
            return only;
        }
        Self::Choice(alternatives)
    }

    #[must_use]
    pub fn modified(inner: Self, modifier: Modifier) -> Self {
        Self::Modified {
            inner: Box::new(inner),
            modifier,
        }
    }

    #[must_use]
    pub fn labelled(label: &str, inner: Self) -> Self {
        Self::Labelled {
            label: label.into(),
            inner: Box::new(inner),
        }
    }

    #[must_use]
    pub fn identifier(name: &str) -> Self {
        Self::Identifier(name.into())
    }

    #[must_use]
    pub fn literal(value: &str) -> Self {
        Self::Literal(value.into())
    }

    /// Whether the expression is a direct call rather than a compound
    #[must_use]
    pub const fn is_call(&self) -> bool {
        matches!(self, Self::Identifier(_) | Self::Literal(_))
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {};", self.name, self.body)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, items: &[Expr], separator: &str| -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(separator)?;
                }
                match item {
                    Self::Sequence(_) | Self::Choice(_) => write!(f, "({item})")?,
                    _ => write!(f, "{item}")?,
                }
            }
            Ok(())
        };

        match self {
            Self::Sequence(members) => join(f, members, " "),
            Self::Choice(alternatives) => join(f, alternatives, " | "),
            Self::Modified { inner, modifier } => {
                if inner.is_call() {
                    write!(f, "{inner}{}", modifier.symbol())
                } else {
                    write!(f, "({inner}){}", modifier.symbol())
                }
            }
            Self::Labelled { label, inner } => {
                if matches!(**inner, Self::Sequence(_) | Self::Choice(_)) {
                    write!(f, "{label}:({inner})")
                } else {
                    write!(f, "{label}:{inner}")
                }
            }
            Self::Identifier(name) => f.write_str(name),
            Self::Literal(value) if value.contains('"') => write!(f, "'{value}'"),
            Self::Literal(value) => write!(f, "\"{value}\""),
        }
    }
}
