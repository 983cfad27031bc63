//! JSON result writer for scoring and evaluation outputs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use canopy_forest::{ConfusionMatrix, Label};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Writes scoring and evaluation results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_predictions.json` and
/// `{experiment}_evaluate.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Path of the predictions artifact.
    pub fn predictions_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_predictions.json", self.experiment.as_str()))
    }

    /// Path of the evaluation artifact.
    pub fn evaluation_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_evaluate.json", self.experiment.as_str()))
    }

    /// Write per-record predictions to `{experiment}_predictions.json`.
    ///
    /// When `actual` is given it must be aligned with `predicted`; each entry
    /// then carries the record's actual label as well.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all, fields(n_records = predicted.len()))]
    pub fn write_predictions(
        &self,
        predicted: &[Label],
        actual: Option<&[Label]>,
    ) -> Result<PathBuf, IoError> {
        let path = self.predictions_path();

        let mut class_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for label in predicted {
            *class_counts.entry(label.as_str()).or_default() += 1;
        }

        let predictions = predicted
            .iter()
            .enumerate()
            .map(|(index, label)| PredictionEntry {
                index,
                predicted: label.as_str(),
                actual: actual.and_then(|a| a.get(index)).map(Label::as_str),
            })
            .collect();

        let artifact = PredictionsArtifact {
            experiment: self.experiment.as_str(),
            n_records: predicted.len(),
            class_counts,
            predictions,
        };

        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "predictions written");
        Ok(path)
    }

    /// Write evaluation results to `{experiment}_evaluate.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_evaluation(
        &self,
        n_trees: usize,
        n_predicates: usize,
        confusion: &ConfusionMatrix,
    ) -> Result<PathBuf, IoError> {
        let path = self.evaluation_path();

        let per_class = confusion
            .class_metrics()
            .into_iter()
            .map(|m| ClassMetricsEntry {
                class: m.class.as_str().to_string(),
                precision: m.precision,
                recall: m.recall,
                f1: m.f1,
                support: m.support,
            })
            .collect();

        let artifact = EvaluateArtifact {
            experiment: self.experiment.as_str(),
            n_trees,
            n_predicates,
            n_records: confusion.total(),
            accuracy: confusion.accuracy(),
            classes: confusion.classes().iter().map(Label::as_str).collect(),
            confusion_matrix: confusion.as_rows(),
            per_class,
        };

        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "evaluation result written");
        Ok(path)
    }

    fn write_json<T: Serialize>(&self, path: &Path, artifact: &T) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::EncodeResult {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, &json).map_err(|e| IoError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

// ---------------------------------------------------------------------------
// Serialization shadow structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PredictionsArtifact<'a> {
    experiment: &'a str,
    n_records: usize,
    class_counts: BTreeMap<&'a str, usize>,
    predictions: Vec<PredictionEntry<'a>>,
}

#[derive(Serialize)]
struct PredictionEntry<'a> {
    index: usize,
    predicted: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual: Option<&'a str>,
}

#[derive(Serialize)]
struct EvaluateArtifact<'a> {
    experiment: &'a str,
    n_trees: usize,
    n_predicates: usize,
    n_records: usize,
    accuracy: f64,
    classes: Vec<&'a str>,
    confusion_matrix: &'a [Vec<usize>],
    per_class: Vec<ClassMetricsEntry>,
}

#[derive(Serialize)]
struct ClassMetricsEntry {
    class: String,
    precision: f64,
    recall: f64,
    f1: f64,
    support: usize,
}
