//! Delimited-text record reader with full input validation.

use std::path::{Path, PathBuf};

use canopy_forest::Label;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::RecordSet;

/// Reads numeric records from a delimited text file.
///
/// Expected format:
/// - Header row required, naming every column
/// - Every value column holds a finite float in every row
/// - An optional label column holds the actual class of each record
///
/// Columns are tab-separated unless [`with_delimiter`](Self::with_delimiter)
/// says otherwise. By default every non-label column is a value column;
/// [`with_value_columns`](Self::with_value_columns) restricts parsing to the
/// named columns and ignores the rest, which may then hold arbitrary text.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed record |
/// | [`IoError::MissingLabelColumn`] | Configured label column not in header |
/// | [`IoError::MissingColumns`] | Selected value columns not in header |
/// | [`IoError::NoFeatureColumns`] | Header has no value columns |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
pub struct RecordReader {
    path: PathBuf,
    delimiter: u8,
    label_column: Option<String>,
    value_columns: Option<Vec<String>>,
}

impl RecordReader {
    /// Create a new reader for the given file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            delimiter: b'\t',
            label_column: None,
            value_columns: None,
        }
    }

    /// Set the column delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read `column` as record labels instead of as a value column.
    #[must_use]
    pub fn with_label_column(mut self, column: impl Into<String>) -> Self {
        self.label_column = Some(column.into());
        self
    }

    /// Parse only `columns` as values; other non-label columns are skipped.
    #[must_use]
    pub fn with_value_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Read and validate the file, returning a [`RecordSet`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<RecordSet, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so that short rows hit InconsistentRowLength
        // rather than a generic CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let expected_cols = header.len();

        let label_index = match &self.label_column {
            Some(column) => Some(header.iter().position(|h| h == column).ok_or_else(|| {
                IoError::MissingLabelColumn {
                    path: self.path.clone(),
                    column: column.clone(),
                }
            })?),
            None => None,
        };

        if let Some(selected) = &self.value_columns {
            let missing: Vec<String> = selected
                .iter()
                .filter(|c| !header.iter().any(|h| h == c.as_str()))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(IoError::MissingColumns {
                    path: self.path.clone(),
                    columns: missing,
                });
            }
        }

        let value_indices: Vec<usize> = (0..expected_cols)
            .filter(|&i| Some(i) != label_index)
            .filter(|&i| {
                self.value_columns
                    .as_ref()
                    .is_none_or(|selected| selected.iter().any(|c| c == &header[i]))
            })
            .collect();
        if value_indices.is_empty() && self.value_columns.is_none() {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
            });
        }
        let columns: Vec<String> = value_indices
            .iter()
            .map(|&i| header[i].to_string())
            .collect();
        debug!(expected_cols, has_labels = label_index.is_some(), "read header");

        let mut rows = Vec::new();
        let mut labels = label_index.map(|_| Vec::new());

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let mut values = Vec::with_capacity(value_indices.len());
            for (&col_index, column) in value_indices.iter().zip(&columns) {
                let raw = record.get(col_index).unwrap_or("");
                let value = raw
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IoError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        column: column.clone(),
                        raw: raw.to_string(),
                    })?;
                values.push(value);
            }
            rows.push(values);

            if let (Some(i), Some(labels)) = (label_index, labels.as_mut()) {
                labels.push(Label::new(record.get(i).unwrap_or("").trim()));
            }
        }

        if rows.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(
            n_records = rows.len(),
            n_columns = columns.len(),
            "records loaded"
        );

        Ok(RecordSet::new(columns, rows, labels))
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn read_tab_separated() {
        let f = write_file("x\ty\n1.0\t2.0\n3.5\t-4.25\n");
        let set = RecordReader::new(f.path()).read().unwrap();
        assert_eq!(set.columns(), ["x", "y"]);
        assert_eq!(set.rows(), [vec![1.0, 2.0], vec![3.5, -4.25]]);
        assert!(set.labels().is_none());
    }

    #[test]
    fn read_comma_separated_with_labels() {
        let f = write_file("x,class,y\n1,a,2\n3,b,4\n");
        let set = RecordReader::new(f.path())
            .with_delimiter(b',')
            .with_label_column("class")
            .read()
            .unwrap();
        assert_eq!(set.columns(), ["x", "y"]);
        assert_eq!(set.rows()[1], vec![3.0, 4.0]);
        let labels: Vec<&str> = set.labels().unwrap().iter().map(Label::as_str).collect();
        assert_eq!(labels, ["a", "b"]);
    }

    #[test]
    fn labels_may_be_numeric_text() {
        let f = write_file("x\ty\n0.5\t1\n");
        let set = RecordReader::new(f.path())
            .with_label_column("y")
            .read()
            .unwrap();
        assert_eq!(set.labels().unwrap()[0].as_str(), "1");
        assert_eq!(set.columns(), ["x"]);
    }

    #[test]
    fn missing_file() {
        let err = RecordReader::new(Path::new("/nonexistent/records.tsv"))
            .read()
            .unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }

    #[test]
    fn header_only_is_empty() {
        let f = write_file("x\ty\n");
        let err = RecordReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::EmptyDataset { .. }));
    }

    #[test]
    fn missing_label_column() {
        let f = write_file("x\ty\n1\t2\n");
        let err = RecordReader::new(f.path())
            .with_label_column("class")
            .read()
            .unwrap_err();
        match err {
            IoError::MissingLabelColumn { column, .. } => assert_eq!(column, "class"),
            other => panic!("expected MissingLabelColumn, got {other:?}"),
        }
    }

    #[test]
    fn label_only_header_has_no_values() {
        let f = write_file("class\na\n");
        let err = RecordReader::new(f.path())
            .with_label_column("class")
            .read()
            .unwrap_err();
        assert!(matches!(err, IoError::NoFeatureColumns { .. }));
    }

    #[test]
    fn short_row_rejected() {
        let f = write_file("x\ty\n1\t2\n3\n");
        let err = RecordReader::new(f.path()).read().unwrap_err();
        match err {
            IoError::InconsistentRowLength {
                row_index,
                expected,
                got,
                ..
            } => {
                assert_eq!(row_index, 1);
                assert_eq!(expected, 2);
                assert_eq!(got, 1);
            }
            other => panic!("expected InconsistentRowLength, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_values_rejected() {
        for bad in ["NaN", "inf", "abc", ""] {
            let f = write_file(&format!("x\ty\n1\t{bad}\n"));
            let err = RecordReader::new(f.path()).read().unwrap_err();
            match err {
                IoError::NonFiniteValue { column, raw, .. } => {
                    assert_eq!(column, "y");
                    assert_eq!(raw, bad);
                }
                other => panic!("expected NonFiniteValue for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn selected_columns_skip_text_columns() {
        let f = write_file("id\tx\tnote\ty\nr1\t1.5\tfirst row\t2\nr2\t-3\t\t4\n");
        let set = RecordReader::new(f.path())
            .with_value_columns(["y", "x"])
            .read()
            .unwrap();
        assert_eq!(set.columns(), ["x", "y"]);
        assert_eq!(set.rows(), [vec![1.5, 2.0], vec![-3.0, 4.0]]);
    }

    #[test]
    fn selected_columns_must_exist() {
        let f = write_file("x\ty\n1\t2\n");
        let err = RecordReader::new(f.path())
            .with_value_columns(["x", "z", "w"])
            .read()
            .unwrap_err();
        match err {
            IoError::MissingColumns { columns, .. } => assert_eq!(columns, ["z", "w"]),
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn selected_columns_still_require_finite_values() {
        let f = write_file("id\tx\nabc\tNaN\n");
        let err = RecordReader::new(f.path())
            .with_value_columns(["x"])
            .read()
            .unwrap_err();
        assert!(matches!(err, IoError::NonFiniteValue { ref column, .. } if column == "x"));
    }
}
