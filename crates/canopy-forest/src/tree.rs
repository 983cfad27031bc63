//! Frozen decision tree: arena storage and iterative traversal.

use std::collections::{HashMap, HashSet};

use crate::{
    ForestError, PredicateRegistry,
    node::{Edge, EdgeIndex, Label, Node, NodeIndex},
};

/// A built decision tree.
///
/// Nodes and edges live in arenas addressed by [`NodeIndex`] and
/// [`EdgeIndex`]; each node's outgoing edges are kept sorted by creation
/// order. A `Tree` is produced by [`TreeBuilder`](crate::TreeBuilder) and is
/// immutable afterwards.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Tree {
    pub(crate) id: String,
    pub(crate) root: NodeIndex,
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) outgoing: Vec<Vec<EdgeIndex>>,
    pub(crate) index: HashMap<String, NodeIndex>,
}

impl Tree {
    /// Walk the tree for one record and return the reached score.
    ///
    /// `predicate_results[i]` is the truth value of predicate id `i` for the
    /// record being scored. At each node a score, if present, is returned
    /// immediately. Otherwise the first outgoing edge (in creation order)
    /// whose predicate holds, or which has no predicate, is followed.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::NoMatchingBranch`] | unscored node with no eligible edge |
    /// | [`ForestError::UnknownPredicateId`] | edge predicate outside `predicate_results` |
    pub fn classify(&self, predicate_results: &[bool]) -> Result<&Label, ForestError> {
        let mut current = self.root;
        loop {
            let node = &self.nodes[current.index()];
            if let Some(score) = &node.score {
                return Ok(score);
            }
            current = self
                .select_edge(current, predicate_results)?
                .ok_or_else(|| ForestError::NoMatchingBranch {
                    tree: self.id.clone(),
                    node: node.id.clone(),
                })?;
        }
    }

    /// Check that the arenas form a rooted tree over `registry`.
    ///
    /// Trees from [`TreeBuilder`](crate::TreeBuilder) hold by construction;
    /// decoded trees are checked before use. Every index must be in range,
    /// each outgoing list must hold only edges leaving its node, every edge
    /// must be listed once, the root must have no incoming edge and every
    /// other node exactly one, every node must be reachable from the root,
    /// and every predicate id must resolve in `registry`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::MalformedTree`] | any structural check fails |
    /// | [`ForestError::UnknownPredicateId`] | an edge predicate is not registered |
    pub(crate) fn validate(&self, registry: &PredicateRegistry) -> Result<(), ForestError> {
        let malformed = |reason: String| ForestError::MalformedTree {
            tree: self.id.clone(),
            reason,
        };
        let n_nodes = self.nodes.len();

        if self.root.index() >= n_nodes {
            return Err(malformed(format!(
                "root {} out of range for {n_nodes} nodes",
                self.root
            )));
        }
        if self.outgoing.len() != n_nodes {
            return Err(malformed(format!(
                "{} outgoing lists for {n_nodes} nodes",
                self.outgoing.len()
            )));
        }
        if let Some((id, &at)) = self.index.iter().find(|(_, i)| i.index() >= n_nodes) {
            return Err(malformed(format!("node id \"{id}\" maps to missing node {at}")));
        }

        let mut incoming = vec![0usize; n_nodes];
        for (i, edge) in self.edges.iter().enumerate() {
            if edge.from.index() >= n_nodes || edge.to.index() >= n_nodes {
                return Err(malformed(format!("edge {i} joins a node out of range")));
            }
            if let Some(p) = edge.predicate
                && !registry.contains(p)
            {
                return Err(ForestError::UnknownPredicateId {
                    id: p.index(),
                    len: registry.len(),
                });
            }
            incoming[edge.to.index()] += 1;
        }
        for (n, &count) in incoming.iter().enumerate() {
            let expected = usize::from(n != self.root.index());
            if count != expected {
                return Err(malformed(format!(
                    "node {n} has {count} incoming edges, expected {expected}"
                )));
            }
        }

        let mut listed = vec![false; self.edges.len()];
        for (n, out) in self.outgoing.iter().enumerate() {
            for &e in out {
                let edge = self
                    .edges
                    .get(e.index())
                    .ok_or_else(|| malformed(format!("node {n} lists missing edge {}", e.index())))?;
                if edge.from.index() != n || std::mem::replace(&mut listed[e.index()], true) {
                    return Err(malformed(format!("edge {} misplaced in outgoing lists", e.index())));
                }
            }
        }
        if let Some(e) = listed.iter().position(|&seen| !seen) {
            return Err(malformed(format!("edge {e} is not listed as outgoing")));
        }

        // With one parent per node, reaching every node from the root rules out cycles.
        let mut seen = vec![false; n_nodes];
        let mut stack = vec![self.root];
        let mut reached = 0;
        while let Some(node) = stack.pop() {
            if std::mem::replace(&mut seen[node.index()], true) {
                continue;
            }
            reached += 1;
            stack.extend(self.outgoing[node.index()].iter().map(|e| self.edges[e.index()].to));
        }
        if reached != n_nodes {
            return Err(malformed(format!(
                "{} of {n_nodes} nodes unreachable from the root",
                n_nodes - reached
            )));
        }
        Ok(())
    }

    /// Return the target of the first eligible outgoing edge of `node`.
    fn select_edge(
        &self,
        node: NodeIndex,
        predicate_results: &[bool],
    ) -> Result<Option<NodeIndex>, ForestError> {
        for &e in &self.outgoing[node.index()] {
            let edge = &self.edges[e.index()];
            let eligible = match edge.predicate {
                None => true,
                Some(p) => *predicate_results.get(p.index()).ok_or(
                    ForestError::UnknownPredicateId {
                        id: p.index(),
                        len: predicate_results.len(),
                    },
                )?,
            };
            if eligible {
                return Ok(Some(edge.to));
            }
        }
        Ok(None)
    }

    /// Return the tree (segment) id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Return the root node index.
    #[must_use]
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Return the node at `index`.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.index()]
    }

    /// Look up a node by its document id.
    #[must_use]
    pub fn node_by_id(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Return all nodes in creation order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return all edges in creation order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Iterate over the outgoing edges of `node` in creation order.
    pub fn outgoing(&self, node: NodeIndex) -> impl Iterator<Item = &Edge> {
        self.outgoing[node.index()]
            .iter()
            .map(|e| &self.edges[e.index()])
    }

    /// Return the number of nodes.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of edges.
    #[must_use]
    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    /// Return the number of nodes without outgoing edges.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.outgoing.iter().filter(|out| out.is_empty()).count()
    }

    /// Return the distinct scores in node creation order.
    #[must_use]
    pub fn scores(&self) -> Vec<&Label> {
        let mut seen = HashSet::new();
        self.nodes
            .iter()
            .filter_map(Node::score)
            .filter(|s| seen.insert(*s))
            .collect()
    }

    /// Return the maximum depth (root has depth 0).
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self.root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            for edge in self.outgoing(node) {
                stack.push((edge.to, depth + 1));
            }
        }
        max_depth
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        ForestError, PredicateRegistry,
        builder::build_tree,
        document::NodeSpec,
        node::{EdgeIndex, Label, NodeIndex},
    };

    /// root -> a (x > 5, score "hi")
    ///      -> b (x <= 5) -> c (y > 1, score "mid")
    ///                    -> d (y <= 1, score "lo")
    fn sample_spec() -> NodeSpec {
        NodeSpec::new("root")
            .with_child(
                NodeSpec::new("a")
                    .with_score("hi")
                    .with_predicate("x", "greaterThan", 5),
            )
            .with_child(
                NodeSpec::new("b")
                    .with_predicate("x", "lessOrEqual", 5)
                    .with_child(
                        NodeSpec::new("c")
                            .with_score("mid")
                            .with_predicate("y", "greaterThan", 1),
                    )
                    .with_child(
                        NodeSpec::new("d")
                            .with_score("lo")
                            .with_predicate("y", "lessOrEqual", 1),
                    ),
            )
    }

    #[test]
    fn follows_first_true_edge() {
        let mut reg = PredicateRegistry::new();
        let tree = build_tree("t", &sample_spec(), &mut reg).unwrap();
        // ids: 0 = x>5, 1 = x<=5, 2 = y>1, 3 = y<=1
        assert_eq!(tree.classify(&[true, false, false, true]).unwrap(), &Label::from("hi"));
        assert_eq!(tree.classify(&[false, true, true, false]).unwrap(), &Label::from("mid"));
        assert_eq!(tree.classify(&[false, true, false, true]).unwrap(), &Label::from("lo"));
    }

    #[test]
    fn traversal_is_deterministic() {
        let mut reg = PredicateRegistry::new();
        let tree = build_tree("t", &sample_spec(), &mut reg).unwrap();
        let results = [false, true, true, false];
        let first = tree.classify(&results).unwrap().clone();
        let second = tree.classify(&results).unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(tree.n_nodes(), 5);
        assert_eq!(tree.n_edges(), 4);
    }

    #[test]
    fn dead_end_is_no_matching_branch() {
        let mut reg = PredicateRegistry::new();
        let tree = build_tree("t7", &sample_spec(), &mut reg).unwrap();
        let err = tree.classify(&[false, true, false, false]).unwrap_err();
        assert!(matches!(
            err,
            ForestError::NoMatchingBranch { ref tree, ref node } if tree == "t7" && node == "b"
        ));
    }

    #[test]
    fn short_result_vector_is_unknown_predicate() {
        let mut reg = PredicateRegistry::new();
        let tree = build_tree("t", &sample_spec(), &mut reg).unwrap();
        let err = tree.classify(&[false]).unwrap_err();
        assert!(matches!(err, ForestError::UnknownPredicateId { id: 1, len: 1 }));
    }

    #[test]
    fn scored_interior_node_preempts_descent() {
        let spec = NodeSpec::new("root").with_child(
            NodeSpec::new("mid")
                .with_score("stop")
                .with_predicate("x", "greaterThan", 0)
                .with_child(
                    NodeSpec::new("deep")
                        .with_score("never")
                        .with_predicate("x", "greaterThan", 10),
                ),
        );
        let mut reg = PredicateRegistry::new();
        let tree = build_tree("t", &spec, &mut reg).unwrap();
        assert_eq!(tree.classify(&[true, true]).unwrap().as_str(), "stop");
    }

    #[test]
    fn shape_accessors() {
        let mut reg = PredicateRegistry::new();
        let tree = build_tree("t", &sample_spec(), &mut reg).unwrap();
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.n_leaves(), 3);
        let scores: Vec<&str> = tree.scores().iter().map(|l| l.as_str()).collect();
        assert_eq!(scores, vec!["hi", "mid", "lo"]);
        let b = tree.node_by_id("b").unwrap();
        assert_eq!(tree.outgoing(b).count(), 2);
        assert_eq!(tree.node(tree.root()).id(), "root");
    }

    #[test]
    fn built_tree_validates() {
        let mut reg = PredicateRegistry::new();
        let tree = build_tree("t", &sample_spec(), &mut reg).unwrap();
        tree.validate(&reg).unwrap();
    }

    #[test]
    fn validate_rejects_dangling_outgoing_edge() {
        let mut reg = PredicateRegistry::new();
        let mut tree = build_tree("t", &sample_spec(), &mut reg).unwrap();
        tree.outgoing[0] = vec![EdgeIndex::new(99)];
        let err = tree.validate(&reg).unwrap_err();
        assert!(matches!(err, ForestError::MalformedTree { ref tree, .. } if tree == "t"));
    }

    #[test]
    fn validate_rejects_cycle() {
        let mut reg = PredicateRegistry::new();
        let mut tree = build_tree("t", &sample_spec(), &mut reg).unwrap();
        // Point b -> c back at the root instead.
        let c = tree.node_by_id("c").unwrap();
        let e = tree.edges.iter().position(|e| e.to == c).unwrap();
        tree.edges[e].to = tree.root;
        let err = tree.validate(&reg).unwrap_err();
        assert!(matches!(err, ForestError::MalformedTree { .. }));
    }

    #[test]
    fn validate_rejects_edge_listed_under_wrong_node() {
        let mut reg = PredicateRegistry::new();
        let mut tree = build_tree("t", &sample_spec(), &mut reg).unwrap();
        // Self-loop through the outgoing list: a lists the edge that enters it.
        let a = tree.node_by_id("a").unwrap();
        let into_a = tree.edges.iter().position(|e| e.to == a).unwrap();
        tree.outgoing[a.index()].push(EdgeIndex::new(into_a));
        let err = tree.validate(&reg).unwrap_err();
        assert!(matches!(err, ForestError::MalformedTree { .. }));
    }

    #[test]
    fn validate_rejects_root_out_of_range() {
        let mut reg = PredicateRegistry::new();
        let mut tree = build_tree("t", &sample_spec(), &mut reg).unwrap();
        tree.root = NodeIndex::new(40);
        assert!(matches!(
            tree.validate(&reg).unwrap_err(),
            ForestError::MalformedTree { .. }
        ));
    }

    #[test]
    fn validate_rejects_unregistered_predicate() {
        let mut reg = PredicateRegistry::new();
        let tree = build_tree("t", &sample_spec(), &mut reg).unwrap();
        let err = tree.validate(&PredicateRegistry::new()).unwrap_err();
        assert!(matches!(err, ForestError::UnknownPredicateId { len: 0, .. }));
    }
}
