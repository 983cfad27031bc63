//! Forest construction and majority-vote scoring.

use rayon::iter::{IntoParallelIterator, IntoParallelRefIterator, ParallelIterator};
use tracing::{info, instrument};

use crate::builder::build_tree;
use crate::document::{ModelDocument, Segment};
use crate::error::ForestError;
use crate::node::Label;
use crate::record::{Record, Schema};
use crate::registry::PredicateRegistry;
use crate::tree::Tree;
use crate::vote::{Vote, tally};

/// An immutable ensemble of decision trees sharing one predicate registry.
///
/// Built once from the model description and read-only afterwards, so a
/// single `Forest` can be scored from many threads at the same time.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Forest {
    pub(crate) registry: PredicateRegistry,
    pub(crate) trees: Vec<Tree>,
    pub(crate) data_fields: Vec<String>,
    pub(crate) target: Option<String>,
}

impl Forest {
    /// Build a forest with one tree per segment, in segment order.
    ///
    /// Either every tree builds or no forest is produced.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::EmptyForest`] | `segments` is empty |
    /// | [`ForestError::UnsupportedOperator`] | unknown predicate operator |
    /// | [`ForestError::InvalidConstant`] | non-numeric predicate value |
    /// | [`ForestError::DuplicateNodeId`] | node id repeats within a tree |
    #[instrument(skip_all, fields(n_segments = segments.len()))]
    pub fn build(segments: &[Segment]) -> Result<Self, ForestError> {
        if segments.is_empty() {
            return Err(ForestError::EmptyForest);
        }

        let mut registry = PredicateRegistry::new();
        let trees = segments
            .iter()
            .map(|segment| build_tree(&segment.id, &segment.root, &mut registry))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            n_trees = trees.len(),
            n_predicates = registry.len(),
            "forest built"
        );

        Ok(Self {
            registry,
            trees,
            data_fields: Vec::new(),
            target: None,
        })
    }

    /// Build a forest from a full model document.
    ///
    /// When the document declares data fields, every predicate field must be
    /// among them.
    ///
    /// # Errors
    ///
    /// Everything [`Forest::build`] returns, plus
    /// [`ForestError::UndeclaredField`] for a predicate field missing from a
    /// non-empty data dictionary.
    pub fn from_document(document: &ModelDocument) -> Result<Self, ForestError> {
        let mut forest = Self::build(&document.segments)?;

        if !document.data_fields.is_empty()
            && let Some(field) = forest
                .registry
                .fields()
                .into_iter()
                .find(|f| !document.data_fields.iter().any(|d| d == f))
        {
            return Err(ForestError::UndeclaredField {
                field: field.to_string(),
            });
        }

        forest.data_fields = document.data_fields.clone();
        forest.target = document.target.clone();
        Ok(forest)
    }

    /// Evaluate every registered predicate against `record`, indexed by id.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::MissingField`] if the record lacks a field any
    /// predicate references.
    pub fn evaluate_predicates<R: Record + ?Sized>(
        &self,
        record: &R,
    ) -> Result<Vec<bool>, ForestError> {
        self.registry.evaluate_all(record)
    }

    /// Score `record` and return the winning label with its tally.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::MissingField`] | record lacks a referenced field |
    /// | [`ForestError::NoMatchingBranch`] | a tree reached a dead end |
    /// | [`ForestError::UnknownPredicateId`] | a tree references an unregistered predicate |
    /// | [`ForestError::EmptyForest`] | the forest holds no trees |
    pub fn vote<R: Record + ?Sized>(&self, record: &R) -> Result<Vote, ForestError> {
        let predicate_results = self.evaluate_predicates(record)?;
        let labels = self
            .trees
            .iter()
            .map(|tree| tree.classify(&predicate_results))
            .collect::<Result<Vec<&Label>, _>>()?;
        tally(labels).ok_or(ForestError::EmptyForest)
    }

    /// Score `record` and return the majority label.
    ///
    /// Ties go to the label that reached the winning count first, in tree
    /// order.
    ///
    /// # Errors
    ///
    /// Same as [`Forest::vote`].
    pub fn classify<R: Record + ?Sized>(&self, record: &R) -> Result<Label, ForestError> {
        Ok(self.vote(record)?.into_label())
    }

    /// Score a batch of records in parallel, preserving input order.
    ///
    /// # Errors
    ///
    /// Returns the error of a failing record; no partial result is returned.
    #[instrument(skip_all, fields(n_records = records.len()))]
    pub fn classify_batch<R: Record + Sync>(&self, records: &[R]) -> Result<Vec<Label>, ForestError> {
        records
            .par_iter()
            .map(|record| self.classify(record))
            .collect()
    }

    /// Score positional rows, naming their columns with `schema`.
    ///
    /// # Errors
    ///
    /// [`ForestError::RowLengthMismatch`] for a row whose width differs from
    /// the schema, otherwise the same as [`Forest::classify_batch`].
    #[instrument(skip_all, fields(n_rows = rows.len(), n_fields = schema.len()))]
    pub fn classify_rows(
        &self,
        schema: &Schema,
        rows: &[Vec<f64>],
    ) -> Result<Vec<Label>, ForestError> {
        rows.into_par_iter()
            .map(|row| self.classify(&schema.bind(row)?))
            .collect()
    }

    /// Return the shared predicate registry.
    #[must_use]
    pub fn registry(&self) -> &PredicateRegistry {
        &self.registry
    }

    /// Return the trees in segment order.
    #[must_use]
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the declared input fields (empty if the source declared none).
    #[must_use]
    pub fn data_fields(&self) -> &[String] {
        &self.data_fields
    }

    /// Return the declared target field, if any.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Return the distinct labels any tree can produce, in first-seen order.
    #[must_use]
    pub fn labels(&self) -> Vec<&Label> {
        let mut out: Vec<&Label> = Vec::new();
        for label in self.trees.iter().flat_map(Tree::scores) {
            if !out.contains(&label) {
                out.push(label);
            }
        }
        out
    }
}
