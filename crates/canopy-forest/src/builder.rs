//! Two-phase tree construction: mutable arenas while building, a frozen
//! [`Tree`] once finished.

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::{
    ForestError, PredicateRegistry,
    document::{NodeElement, NodeSpec, PredicateSpec},
    node::{Edge, EdgeIndex, Label, Node, NodeIndex, PredicateId},
    predicate::{Operator, PredicateExpr},
    tree::Tree,
};

/// Incrementally assembles one [`Tree`] while interning its predicates into
/// a shared [`PredicateRegistry`].
///
/// Edges are created without a predicate; [`attach_predicate`](Self::attach_predicate)
/// stamps a predicate id onto the unlabeled edges already touching a node.
#[derive(Debug)]
pub struct TreeBuilder<'r> {
    tree_id: String,
    registry: &'r mut PredicateRegistry,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    incident: Vec<Vec<EdgeIndex>>,
    index: HashMap<String, NodeIndex>,
}

impl<'r> TreeBuilder<'r> {
    /// Start a tree whose root node has id `root_id`.
    pub fn new(
        tree_id: impl Into<String>,
        root_id: impl Into<String>,
        registry: &'r mut PredicateRegistry,
    ) -> Self {
        let root_id = root_id.into();
        let mut index = HashMap::new();
        index.insert(root_id.clone(), NodeIndex::new(0));
        Self {
            tree_id: tree_id.into(),
            registry,
            nodes: vec![Node::new(root_id)],
            edges: Vec::new(),
            incident: vec![Vec::new()],
            index,
        }
    }

    /// Return the root node index.
    #[must_use]
    pub fn root(&self) -> NodeIndex {
        NodeIndex::new(0)
    }

    /// Create a child of `parent` joined by a new, unlabeled edge.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::DuplicateNodeId`] if `id` already exists in
    /// this tree.
    pub fn add_child(
        &mut self,
        parent: NodeIndex,
        id: impl Into<String>,
    ) -> Result<NodeIndex, ForestError> {
        let id = id.into();
        if self.index.contains_key(&id) {
            return Err(ForestError::DuplicateNodeId {
                tree: self.tree_id.clone(),
                node: id,
            });
        }

        let child = NodeIndex::new(self.nodes.len());
        self.index.insert(id.clone(), child);
        self.nodes.push(Node::new(id));
        self.incident.push(Vec::new());

        let edge = EdgeIndex::new(self.edges.len());
        self.edges.push(Edge {
            from: parent,
            to: child,
            predicate: None,
            order: edge.index(),
        });
        self.incident[parent.index()].push(edge);
        self.incident[child.index()].push(edge);

        Ok(child)
    }

    /// Intern `expr` and attach it to every unlabeled edge touching `node`.
    ///
    /// Returns the interned id. Edges that already carry a predicate keep it.
    pub fn attach_predicate(&mut self, node: NodeIndex, expr: PredicateExpr) -> PredicateId {
        let id = self.registry.intern(expr);
        for &e in &self.incident[node.index()] {
            let edge = &mut self.edges[e.index()];
            if edge.predicate.is_none() {
                edge.predicate = Some(id);
            }
        }
        id
    }

    /// Record a score on `node`.
    pub fn set_score(&mut self, node: NodeIndex, score: Label) {
        self.nodes[node.index()].score = Some(score);
    }

    /// Freeze the arenas into a [`Tree`].
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::UnknownPredicateId`] if an edge references a
    /// predicate the registry does not hold.
    pub fn finish(self) -> Result<Tree, ForestError> {
        let mut outgoing: Vec<Vec<EdgeIndex>> = vec![Vec::new(); self.nodes.len()];
        for (i, edge) in self.edges.iter().enumerate() {
            if let Some(p) = edge.predicate
                && !self.registry.contains(p)
            {
                return Err(ForestError::UnknownPredicateId {
                    id: p.index(),
                    len: self.registry.len(),
                });
            }
            outgoing[edge.from.index()].push(EdgeIndex::new(i));
        }
        for out in &mut outgoing {
            out.sort_by_key(|e| self.edges[e.index()].order);
        }

        Ok(Tree {
            id: self.tree_id,
            root: NodeIndex::new(0),
            nodes: self.nodes,
            edges: self.edges,
            outgoing,
            index: self.index,
        })
    }

    /// Depth-first walk over the element list of `spec`, which describes `node`.
    fn build_node(&mut self, spec: &NodeSpec, node: NodeIndex) -> Result<(), ForestError> {
        for element in &spec.elements {
            match element {
                NodeElement::Predicate(pred) => {
                    let expr = parse_predicate(pred)?;
                    self.attach_predicate(node, expr);
                    if let Some(score) = &spec.score {
                        self.set_score(node, Label::new(score.as_str()));
                    }
                }
                NodeElement::Node(child_spec) => {
                    let child = self.add_child(node, child_spec.id.as_str())?;
                    self.build_node(child_spec, child)?;
                }
            }
        }
        Ok(())
    }
}

/// Convert a document predicate into a [`PredicateExpr`].
fn parse_predicate(spec: &PredicateSpec) -> Result<PredicateExpr, ForestError> {
    let operator = Operator::parse(&spec.operator, &spec.field)?;
    let constant: f64 = spec
        .value
        .trim()
        .parse()
        .map_err(|_| ForestError::InvalidConstant {
            field: spec.field.clone(),
            raw: spec.value.clone(),
        })?;
    Ok(PredicateExpr::new(spec.field.as_str(), operator, constant))
}

/// Build one tree from its root node description.
///
/// Predicates are interned into `registry`, which is shared by every tree of
/// the forest.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ForestError::UnsupportedOperator`] | operator other than `greaterThan` / `lessOrEqual` |
/// | [`ForestError::InvalidConstant`] | predicate value is not a number |
/// | [`ForestError::DuplicateNodeId`] | node id repeats within the tree |
#[instrument(skip(spec, registry), fields(n_nodes = spec.node_count()))]
pub fn build_tree(
    tree_id: &str,
    spec: &NodeSpec,
    registry: &mut PredicateRegistry,
) -> Result<Tree, ForestError> {
    let mut builder = TreeBuilder::new(tree_id, spec.id.as_str(), registry);
    let root = builder.root();
    builder.build_node(spec, root)?;
    let tree = builder.finish()?;

    debug!(
        n_nodes = tree.n_nodes(),
        n_edges = tree.n_edges(),
        depth = tree.depth(),
        "tree built"
    );

    Ok(tree)
}
