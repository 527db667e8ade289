//! Triple data model: nodes, triples and match patterns.

use std::fmt;
use std::sync::Arc;

/// A single position of a triple: an IRI, a literal or a blank node.
///
/// Nodes are immutable and cheap to clone (the label is reference-counted).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    /// A named resource, identified by an IRI.
    Iri(Arc<str>),
    /// A literal value in its lexical form.
    Literal(Arc<str>),
    /// An anonymous node with a store-local label.
    Blank(Arc<str>),
}

impl Node {
    /// Creates an IRI node.
    pub fn iri(value: impl Into<Arc<str>>) -> Self {
        Self::Iri(value.into())
    }

    /// Creates a literal node.
    pub fn literal(value: impl Into<Arc<str>>) -> Self {
        Self::Literal(value.into())
    }

    /// Creates a blank node with the given label.
    pub fn blank(label: impl Into<Arc<str>>) -> Self {
        Self::Blank(label.into())
    }

    /// Returns the textual label of the node.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Iri(v) | Self::Literal(v) | Self::Blank(v) => v,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(v) => write!(f, "<{v}>"),
            Self::Literal(v) => write!(f, "\"{v}\""),
            Self::Blank(v) => write!(f, "_:{v}"),
        }
    }
}

/// An immutable subject-predicate-object record.
///
/// Triples are structurally comparable; two triples are equal iff all three
/// positions are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    /// The subject position.
    pub subject: Node,
    /// The predicate position.
    pub predicate: Node,
    /// The object position.
    pub object: Node,
}

impl Triple {
    /// Creates a new triple.
    #[must_use]
    pub fn new(subject: Node, predicate: Node, object: Node) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

/// A match pattern over triples; `None` in a position matches any node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriplePattern {
    /// Required subject, or `None` for any.
    pub subject: Option<Node>,
    /// Required predicate, or `None` for any.
    pub predicate: Option<Node>,
    /// Required object, or `None` for any.
    pub object: Option<Node>,
}

impl TriplePattern {
    /// Creates a pattern from optional positions.
    #[must_use]
    pub fn new(subject: Option<Node>, predicate: Option<Node>, object: Option<Node>) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// The wildcard pattern matching every triple.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Returns `true` if every bound position equals the triple's node.
    #[must_use]
    pub fn matches(&self, triple: &Triple) -> bool {
        fn position(bound: &Option<Node>, actual: &Node) -> bool {
            bound.as_ref().map_or(true, |node| node == actual)
        }
        position(&self.subject, &triple.subject)
            && position(&self.predicate, &triple.predicate)
            && position(&self.object, &triple.object)
    }
}

impl From<&Triple> for TriplePattern {
    /// A fully bound pattern matching exactly this triple.
    fn from(triple: &Triple) -> Self {
        Self {
            subject: Some(triple.subject.clone()),
            predicate: Some(triple.predicate.clone()),
            object: Some(triple.object.clone()),
        }
    }
}
