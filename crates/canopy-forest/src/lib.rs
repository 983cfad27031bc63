//! Decision-forest scoring: build trees from a model description, score
//! records by majority vote.
//!
//! Predicates are interned once per forest into a [`PredicateRegistry`];
//! scoring a record evaluates every predicate exactly once, walks each
//! [`Tree`] using the resulting truth vector, and tallies the reached labels.

mod builder;
mod confusion;
mod document;
mod error;
mod forest;
mod node;
mod predicate;
mod record;
mod registry;
mod serialize;
mod tree;
mod vote;

pub use builder::{TreeBuilder, build_tree};
pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use document::{ModelDocument, NodeElement, NodeSpec, PredicateSpec, Segment};
pub use error::ForestError;
pub use forest::Forest;
pub use node::{Edge, EdgeIndex, Label, Node, NodeIndex, PredicateId};
pub use predicate::{Operator, PredicateExpr};
pub use record::{BoundRecord, Record, Schema};
pub use registry::PredicateRegistry;
pub use tree::Tree;
pub use vote::Vote;
