//! Confusion matrix and per-class metrics over string labels.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::error::ForestError;
use crate::node::Label;

/// A confusion matrix over the labels seen in actual and predicted values.
///
/// Classes are sorted. Entry `matrix[a][p]` counts records whose actual
/// label is `classes[a]` and whose predicted label is `classes[p]`.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    classes: Vec<Label>,
    matrix: Vec<Vec<usize>>,
}

/// Per-class precision, recall, and F1 score.
#[derive(Debug, Clone)]
pub struct ClassMetrics {
    /// The class label.
    pub class: Label,
    /// Precision: TP / (TP + FP). 0.0 if no predictions for this class.
    pub precision: f64,
    /// Recall: TP / (TP + FN). 0.0 if no actual records of this class.
    pub recall: f64,
    /// F1: 2 * precision * recall / (precision + recall). 0.0 if both are zero.
    pub f1: f64,
    /// Number of actual records of this class.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Build a confusion matrix from paired actual and predicted labels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::EmptyLabels`] | zero labels provided |
    /// | [`ForestError::LabelCountMismatch`] | slices differ in length |
    pub fn from_labels(actual: &[Label], predicted: &[Label]) -> Result<Self, ForestError> {
        if actual.len() != predicted.len() {
            return Err(ForestError::LabelCountMismatch {
                actual: actual.len(),
                predicted: predicted.len(),
            });
        }
        if actual.is_empty() {
            return Err(ForestError::EmptyLabels);
        }

        let classes: Vec<Label> = actual
            .iter()
            .chain(predicted)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let position: HashMap<&Label, usize> =
            classes.iter().enumerate().map(|(i, l)| (l, i)).collect();

        let n = classes.len();
        let mut matrix = vec![vec![0usize; n]; n];
        for (a, p) in actual.iter().zip(predicted) {
            matrix[position[a]][position[p]] += 1;
        }

        Ok(Self { classes, matrix })
    }

    /// Overall accuracy: proportion of correct predictions.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.classes.len()).map(|i| self.matrix[i][i]).sum();
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        }
    }

    /// Total number of scored records.
    #[must_use]
    pub fn total(&self) -> usize {
        self.matrix.iter().flat_map(|row| row.iter()).sum()
    }

    /// Return the count for an `(actual, predicted)` pair.
    #[must_use]
    pub fn count(&self, actual: &Label, predicted: &Label) -> usize {
        let a = self.classes.binary_search(actual);
        let p = self.classes.binary_search(predicted);
        match (a, p) {
            (Ok(a), Ok(p)) => self.matrix[a][p],
            _ => 0,
        }
    }

    /// Per-class precision, recall, F1, and support.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        let n = self.classes.len();
        (0..n)
            .map(|c| {
                let tp = self.matrix[c][c];
                let fp: usize = (0..n).filter(|&i| i != c).map(|i| self.matrix[i][c]).sum();
                let fn_: usize = (0..n).filter(|&j| j != c).map(|j| self.matrix[c][j]).sum();
                let support = tp + fn_;
                let precision = if tp + fp == 0 {
                    0.0
                } else {
                    tp as f64 / (tp + fp) as f64
                };
                let recall = if support == 0 {
                    0.0
                } else {
                    tp as f64 / support as f64
                };
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassMetrics {
                    class: self.classes[c].clone(),
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Return the sorted class labels.
    #[must_use]
    pub fn classes(&self) -> &[Label] {
        &self.classes
    }

    /// Return the underlying matrix rows.
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.as_str().len())
            .max()
            .unwrap_or(0)
            .max(7);

        write!(f, "{:>width$}", "actual")?;
        for class in &self.classes {
            write!(f, " {:>width$}", class.as_str())?;
        }
        writeln!(f)?;

        for (class, row) in self.classes.iter().zip(&self.matrix) {
            write!(f, "{:>width$}", class.as_str())?;
            for val in row {
                write!(f, " {val:>width$}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}
