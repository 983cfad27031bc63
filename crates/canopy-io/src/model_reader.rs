//! JSON model document reader.

use std::path::{Path, PathBuf};

use canopy_forest::{Forest, ModelDocument};
use tracing::{info, instrument};

use crate::IoError;

/// Reads a forest description from a JSON model document.
///
/// The document mirrors the PMML segment layout: a list of declared data
/// fields, an optional target field, and one segment per tree whose root is
/// a nested node with `predicate` and `node` elements in document order.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::JsonParse`] | Not valid JSON for a model document |
/// | [`IoError::Model`] | Document parses but the forest cannot be built |
pub struct ModelReader {
    path: PathBuf,
}

impl ModelReader {
    /// Create a new reader for the given JSON file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and parse the model document without building trees.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read_document(&self) -> Result<ModelDocument, IoError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        let document: ModelDocument =
            serde_json::from_str(&text).map_err(|e| IoError::JsonParse {
                path: self.path.clone(),
                line: e.line(),
                column: e.column(),
                source: e,
            })?;

        info!(
            n_segments = document.segments.len(),
            n_data_fields = document.data_fields.len(),
            "model document loaded"
        );
        Ok(document)
    }

    /// Read the model document and build the forest it describes.
    pub fn read(&self) -> Result<Forest, IoError> {
        let document = self.read_document()?;
        Forest::from_document(&document).map_err(|e| IoError::Model {
            path: self.path.clone(),
            source: e,
        })
    }
}
