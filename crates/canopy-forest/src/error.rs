use std::path::PathBuf;

/// Errors from building and scoring a decision forest.
#[derive(Debug, thiserror::Error)]
pub enum ForestError {
    /// Returned when a predicate uses an operator outside the supported set.
    #[error("unsupported predicate operator \"{operator}\" on field \"{field}\"")]
    UnsupportedOperator {
        /// The operator name as written in the model document.
        operator: String,
        /// The field the predicate compares.
        field: String,
    },

    /// Returned when a predicate constant is not a number.
    #[error("predicate on field \"{field}\" has non-numeric constant \"{raw}\"")]
    InvalidConstant {
        /// The field the predicate compares.
        field: String,
        /// The raw constant text.
        raw: String,
    },

    /// Returned when the same node id appears twice within one tree.
    #[error("duplicate node id \"{node}\" in tree \"{tree}\"")]
    DuplicateNodeId {
        /// Id of the tree being built.
        tree: String,
        /// The repeated node id.
        node: String,
    },

    /// Returned when a model document contains no tree segments.
    #[error("model contains no trees")]
    EmptyForest,

    /// Returned when a predicate references a field missing from the data dictionary.
    #[error("predicate field \"{field}\" is not declared in the data dictionary")]
    UndeclaredField {
        /// The undeclared field name.
        field: String,
    },

    /// Returned when a record lacks a field referenced by a predicate.
    #[error("record has no value for field \"{field}\"")]
    MissingField {
        /// The missing field name.
        field: String,
    },

    /// Returned when a predicate id does not resolve in the registry.
    #[error("unknown predicate id {id} (registry holds {len} predicates)")]
    UnknownPredicateId {
        /// The offending id.
        id: usize,
        /// Number of predicates available.
        len: usize,
    },

    /// Returned when traversal reaches a node with no eligible branch and no score.
    #[error("no matching branch at node \"{node}\" in tree \"{tree}\"")]
    NoMatchingBranch {
        /// Id of the tree being traversed.
        tree: String,
        /// Id of the dead-end node.
        node: String,
    },

    /// Returned when a positional row does not match the schema width.
    #[error("row has {got} values, schema declares {expected} fields")]
    RowLengthMismatch {
        /// Number of fields in the schema.
        expected: usize,
        /// Number of values in the row.
        got: usize,
    },

    /// Returned when a confusion matrix is requested over zero labels.
    #[error("cannot build a confusion matrix from zero labels")]
    EmptyLabels,

    /// Returned when actual and predicted label slices differ in length.
    #[error("got {predicted} predictions for {actual} actual labels")]
    LabelCountMismatch {
        /// Number of actual labels.
        actual: usize,
        /// Number of predicted labels.
        predicted: usize,
    },

    /// Returned when a decoded tree's arenas do not form a rooted tree.
    #[error("malformed tree \"{tree}\": {reason}")]
    MalformedTree {
        /// Id of the offending tree.
        tree: String,
        /// What the structural check found.
        reason: String,
    },

    /// Returned when a decoded predicate list holds the same expression twice.
    #[error("predicate {duplicate} repeats predicate {first}")]
    DuplicatePredicate {
        /// Id of the first occurrence.
        first: usize,
        /// Id of the repeated entry.
        duplicate: usize,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },
}
