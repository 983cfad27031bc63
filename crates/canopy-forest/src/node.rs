use std::fmt;

/// Index into the predicate registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct PredicateId(usize);

impl PredicateId {
    /// Create a predicate id from a zero-based registry position.
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based registry position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PredicateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into a tree's `Vec<Node>` arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into a tree's `Vec<Edge>` arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct EdgeIndex(usize);

impl EdgeIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A class label produced by a scoring node.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    /// Create a label from any string-like value.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Return the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Label {
    fn from(label: &str) -> Self {
        Self(label.to_string())
    }
}

impl From<String> for Label {
    fn from(label: String) -> Self {
        Self(label)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A vertex in a decision tree.
///
/// A node with a score is a scoring node: traversal stops there and returns
/// the score, even if the node also has outgoing edges.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub(crate) id: String,
    pub(crate) score: Option<Label>,
}

impl Node {
    pub(crate) fn new(id: String) -> Self {
        Self { id, score: None }
    }

    /// Return the node id from the model document.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Return the node's score, if it is a scoring node.
    #[must_use]
    pub fn score(&self) -> Option<&Label> {
        self.score.as_ref()
    }

    /// Return `true` if this node carries a score.
    #[must_use]
    pub fn is_scoring(&self) -> bool {
        self.score.is_some()
    }
}

/// A directed edge between two nodes of the same tree.
///
/// `order` is the creation sequence number within the tree and fixes the
/// iteration order over a node's outgoing edges. `predicate` is `None` until
/// the guarding predicate has been discovered; an edge that never receives
/// one is always eligible during traversal.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Edge {
    pub(crate) from: NodeIndex,
    pub(crate) to: NodeIndex,
    pub(crate) predicate: Option<PredicateId>,
    pub(crate) order: usize,
}

impl Edge {
    /// Return the source node.
    #[must_use]
    pub fn from(&self) -> NodeIndex {
        self.from
    }

    /// Return the target node.
    #[must_use]
    pub fn to(&self) -> NodeIndex {
        self.to
    }

    /// Return the guarding predicate, if one was attached.
    #[must_use]
    pub fn predicate(&self) -> Option<PredicateId> {
        self.predicate
    }

    /// Return the creation sequence number.
    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }
}
