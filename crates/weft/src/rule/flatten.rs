//! Associativity rewrite for sequence and choice nodes.
//!
//! `a & b & c` builds `Sequence(Sequence(a, b), c)`. Flattening splices the
//! inner anonymous sequence into its parent so the result has one member per
//! operand. A child with a name, an alias or a transformer keeps its own
//! result shape and is left alone.

use super::{RuleKind, RuleNode};

impl RuleNode {
    /// Rewrite the tree bottom-up, splicing anonymous same-kind children
    #[must_use]
    pub fn flatten(self) -> Self {
        let Self {
            kind,
            name,
            alias,
            transformer,
        } = self;

        let kind = match kind {
            RuleKind::Sequence(members) => RuleKind::Sequence(splice(members, |kind| {
                match kind {
                    RuleKind::Sequence(inner) => Ok(inner),
                    other => Err(other),
                }
            })),
            RuleKind::Choice(alternatives) => RuleKind::Choice(splice(alternatives, |kind| {
                match kind {
                    RuleKind::Choice(inner) => Ok(inner),
                    other => Err(other),
                }
            })),
            RuleKind::Optional(inner) => RuleKind::Optional(Box::new(inner.flatten())),
            RuleKind::Repeat1(inner) => RuleKind::Repeat1(Box::new(inner.flatten())),
            RuleKind::Repeat0(inner) => RuleKind::Repeat0(Box::new(inner.flatten())),
            leaf => leaf,
        };

        Self {
            kind,
            name,
            alias,
            transformer,
        }
    }

    const fn is_spliceable(&self) -> bool {
        self.is_anonymous() && self.transformer.is_none()
    }
}

/// Flatten each child, then replace spliceable children of the parent's kind
/// with their members
fn splice(
    children: Vec<RuleNode>,
    same_kind: impl Fn(RuleKind) -> Result<Vec<RuleNode>, RuleKind>,
) -> Vec<RuleNode> {
    let mut spliced = Vec::with_capacity(children.len());

    for child in children {
        let child = child.flatten();
        if !child.is_spliceable() {
            spliced.push(child);
            continue;
        }

        let RuleNode {
            kind,
            name,
            alias,
            transformer,
        } = child;
        match same_kind(kind) {
            Ok(members) => spliced.extend(members),
            Err(kind) => spliced.push(RuleNode {
                kind,
                name,
                alias,
                transformer,
            }),
        }
    }

    spliced
}
