//! Hierarchical model description handed over by the document parser.
//!
//! These types mirror the element structure of the source document: a node
//! carries an id, an optional score attribute, and an ordered list of child
//! elements which are either a predicate or a nested node. Element order is
//! kept because the tree builder attaches predicates to the edges that exist
//! at the moment the predicate element is reached.

/// A full model document: data dictionary plus one segment per tree.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelDocument {
    /// Input field names in declaration order.
    #[serde(default)]
    pub data_fields: Vec<String>,
    /// Name of the predicted field, if the document declares one.
    #[serde(default)]
    pub target: Option<String>,
    /// Tree segments in document order.
    pub segments: Vec<Segment>,
}

/// One tree of the ensemble.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Segment {
    /// Segment (tree) id.
    pub id: String,
    /// Root node of the tree.
    pub root: NodeSpec,
}

/// A node element of the source document.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeSpec {
    /// Node id, unique within its tree.
    pub id: String,
    /// Score attribute, if present.
    #[serde(default)]
    pub score: Option<String>,
    /// Child elements in document order.
    #[serde(default)]
    pub elements: Vec<NodeElement>,
}

/// A child element of a [`NodeSpec`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeElement {
    /// A simple comparison predicate.
    Predicate(PredicateSpec),
    /// A nested node.
    Node(NodeSpec),
}

/// A simple predicate element as written in the document.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PredicateSpec {
    /// Compared field.
    pub field: String,
    /// Operator name, e.g. `greaterThan`.
    pub operator: String,
    /// Constant as document text.
    pub value: String,
}

impl NodeSpec {
    /// Create a node with no score and no children.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            score: None,
            elements: Vec::new(),
        }
    }

    /// Set the score attribute.
    #[must_use]
    pub fn with_score(mut self, score: impl Into<String>) -> Self {
        self.score = Some(score.into());
        self
    }

    /// Append a predicate element.
    #[must_use]
    pub fn with_predicate(
        mut self,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        self.elements.push(NodeElement::Predicate(PredicateSpec {
            field: field.into(),
            operator: operator.into(),
            value: value.to_string(),
        }));
        self
    }

    /// Append a nested node element.
    #[must_use]
    pub fn with_child(mut self, child: NodeSpec) -> Self {
        self.elements.push(NodeElement::Node(child));
        self
    }

    /// Count this node and all nested nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children().map(NodeSpec::node_count).sum::<usize>()
    }

    /// Iterate over the nested node elements.
    pub fn children(&self) -> impl Iterator<Item = &NodeSpec> {
        self.elements.iter().filter_map(|e| match e {
            NodeElement::Node(n) => Some(n),
            NodeElement::Predicate(_) => None,
        })
    }
}
