//! Compiled-model cache via bincode.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::ForestError;
use crate::forest::Forest;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope written by [`Forest::save`].
#[derive(serde::Serialize)]
struct ModelEnvelopeRef<'a> {
    format_version: u32,
    n_trees: usize,
    n_predicates: usize,
    forest: &'a Forest,
}

/// Owned counterpart of [`ModelEnvelopeRef`] read by [`Forest::load`].
#[derive(serde::Deserialize)]
struct ModelEnvelope {
    format_version: u32,
    n_trees: usize,
    n_predicates: usize,
    forest: Forest,
}

impl Forest {
    /// Save the built forest to a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::SerializeModel`] | bincode encoding failed |
    /// | [`ForestError::WriteModel`] | file write failed |
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ForestError> {
        let path = path.as_ref();

        let envelope = ModelEnvelopeRef {
            format_version: FORMAT_VERSION,
            n_trees: self.trees.len(),
            n_predicates: self.registry.len(),
            forest: self,
        };

        let bytes = bincode::serialize(&envelope)
            .map_err(|e| ForestError::SerializeModel { source: e })?;

        std::fs::write(path, &bytes).map_err(|e| ForestError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(
            size_bytes = bytes.len(),
            n_trees = self.trees.len(),
            "model saved"
        );

        Ok(())
    }

    /// Load a forest previously written by [`Forest::save`].
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::ReadModel`] | file read failed |
    /// | [`ForestError::DeserializeModel`] | bincode decoding failed |
    /// | [`ForestError::IncompatibleModelVersion`] | format version mismatch |
    /// | [`ForestError::MalformedTree`] | a decoded tree is not a rooted tree |
    /// | [`ForestError::UnknownPredicateId`] | a decoded edge references an unregistered predicate |
    /// | [`ForestError::EmptyForest`] | the file holds no trees |
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ForestError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| ForestError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        let envelope: ModelEnvelope = bincode::deserialize(&bytes).map_err(|e| {
            ForestError::DeserializeModel {
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(ForestError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        let forest = envelope.forest;
        for tree in &forest.trees {
            tree.validate(&forest.registry)?;
        }
        if forest.trees.is_empty() {
            return Err(ForestError::EmptyForest);
        }

        debug!(
            n_trees = envelope.n_trees,
            n_predicates = envelope.n_predicates,
            "model loaded"
        );

        Ok(forest)
    }
}
