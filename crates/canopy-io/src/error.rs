//! I/O error types for canopy-io.

use std::path::PathBuf;

use canopy_forest::ForestError;

/// Errors from reading model documents and records, and writing results.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a model document is not valid JSON for the expected shape.
    #[error("invalid model document {path} at line {line}, column {column}")]
    JsonParse {
        /// Path to the JSON file.
        path: PathBuf,
        /// One-based line of the error.
        line: usize,
        /// One-based column of the error.
        column: usize,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when the model document parses but the forest cannot be built.
    #[error("cannot build forest from {path}")]
    Model {
        /// Path to the model document.
        path: PathBuf,
        /// Underlying build error.
        source: ForestError,
    },

    /// Returned when the delimited-text parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the records file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the records file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the records file.
        path: PathBuf,
    },

    /// Returned when the header names no value columns.
    #[error("no value columns in {path}")]
    NoFeatureColumns {
        /// Path to the records file.
        path: PathBuf,
    },

    /// Returned when the configured label column is absent from the header.
    #[error("label column \"{column}\" not found in {path}")]
    MissingLabelColumn {
        /// Path to the records file.
        path: PathBuf,
        /// The configured label column name.
        column: String,
    },

    /// Returned when selected value columns are absent from the header.
    #[error("columns not found in {path}: {}", .columns.join(", "))]
    MissingColumns {
        /// Path to the records file.
        path: PathBuf,
        /// The selected column names missing from the header.
        columns: Vec<String>,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the records file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when a cell value is NaN, Inf, or otherwise not a finite float.
    #[error("non-finite value in {path}: row {row_index}, column \"{column}\", raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the records file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Header name of the offending column.
        column: String,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when the experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a result artifact cannot be encoded as JSON.
    #[error("cannot encode result for {path}")]
    EncodeResult {
        /// Destination path of the artifact.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
