//! File I/O and validation for the canopy scorer: model documents, record
//! files, and JSON result artifacts.

mod domain;
mod error;
mod model_reader;
mod record_reader;
mod writer;

pub use domain::{ExperimentName, RecordSet};
pub use error::IoError;
pub use model_reader::ModelReader;
pub use record_reader::RecordReader;
pub use writer::ResultWriter;
