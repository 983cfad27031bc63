//! Domain types for canopy-io.

use canopy_forest::{Label, Schema};

use crate::IoError;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric records read from a delimited file.
///
/// `rows[i][j]` is the value of column `columns[j]` in record `i`. When the
/// reader was given a label column, `labels[i]` is that record's label and
/// the label column is not part of `columns`.
#[derive(Debug)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
    labels: Option<Vec<Label>>,
}

impl RecordSet {
    pub(crate) fn new(columns: Vec<String>, rows: Vec<Vec<f64>>, labels: Option<Vec<Label>>) -> Self {
        Self {
            columns,
            rows,
            labels,
        }
    }

    /// Return the value column names in file order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Return the value rows.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Return the labels, if a label column was read.
    pub fn labels(&self) -> Option<&[Label]> {
        self.labels.as_deref()
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Return `true` if there are no records.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Build a [`Schema`] naming the value columns, for binding rows.
    pub fn schema(&self) -> Schema {
        Schema::new(self.columns.iter().cloned())
    }
}
