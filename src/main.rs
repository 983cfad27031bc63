use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use canopy_forest::{ConfusionMatrix, Forest, Label};
use canopy_io::{ExperimentName, ModelReader, RecordReader, RecordSet, ResultWriter};

#[derive(Parser)]
#[command(name = "canopy")]
#[command(about = "Majority-vote scoring of pre-trained decision forests")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel scoring (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Print a summary of a model's trees and predicates
    Inspect {
        /// Path to the model (JSON document, or compiled `.bin`)
        #[arg(long)]
        model: PathBuf,
    },

    /// Build a model document once and save it as a compiled binary
    Compile {
        /// Path to the model JSON document
        #[arg(long)]
        model: PathBuf,

        /// Output path for the compiled model
        #[arg(long)]
        out: PathBuf,
    },

    /// Score every record of a data file
    Score {
        /// Path to the model (JSON document, or compiled `.bin`)
        #[arg(long)]
        model: PathBuf,

        /// Path to the delimited records file
        #[arg(long)]
        data: PathBuf,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Column delimiter of the records file
        #[arg(long, default_value_t = '\t')]
        delimiter: char,

        /// Column holding actual labels, copied next to each prediction
        #[arg(long)]
        label_column: Option<String>,
    },

    /// Score labeled records and report accuracy and a confusion matrix
    Evaluate {
        /// Path to the model (JSON document, or compiled `.bin`)
        #[arg(long)]
        model: PathBuf,

        /// Path to the delimited records file
        #[arg(long)]
        data: PathBuf,

        /// Column holding the actual labels
        #[arg(long)]
        label_column: String,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Column delimiter of the records file
        #[arg(long, default_value_t = '\t')]
        delimiter: char,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct InspectOutput<'a> {
    n_trees: usize,
    n_predicates: usize,
    data_fields: &'a [String],
    target: Option<&'a str>,
    referenced_fields: Vec<&'a str>,
    labels: Vec<&'a str>,
    predicates: Vec<String>,
    trees: Vec<TreeOutput<'a>>,
}

#[derive(Serialize)]
struct TreeOutput<'a> {
    id: &'a str,
    n_nodes: usize,
    n_edges: usize,
    n_leaves: usize,
    depth: usize,
}

#[derive(Serialize)]
struct CompileOutput {
    path: PathBuf,
    n_trees: usize,
    n_predicates: usize,
}

#[derive(Serialize)]
struct ScoreOutput {
    experiment: String,
    n_records: usize,
    n_trees: usize,
    predictions_path: PathBuf,
}

#[derive(Serialize)]
struct EvaluateOutput {
    experiment: String,
    n_records: usize,
    n_trees: usize,
    n_classes: usize,
    accuracy: f64,
}

fn load_forest(path: &Path) -> Result<Forest> {
    let forest = if path.extension().is_some_and(|ext| ext == "bin") {
        Forest::load(path).context("failed to load compiled model")?
    } else {
        ModelReader::new(path)
            .read()
            .context("failed to read model document")?
    };
    info!(
        n_trees = forest.n_trees(),
        n_predicates = forest.registry().len(),
        "model loaded"
    );
    Ok(forest)
}

fn parse_delimiter(delimiter: char) -> Result<u8> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .with_context(|| format!("delimiter must be a single ASCII character, got {delimiter:?}"))
}

/// Read the records file, parsing only the columns the model references.
fn read_records(
    forest: &Forest,
    data: &Path,
    delimiter: char,
    label_column: Option<&str>,
) -> Result<RecordSet> {
    let mut reader = RecordReader::new(data)
        .with_delimiter(parse_delimiter(delimiter)?)
        .with_value_columns(forest.registry().fields());
    if let Some(column) = label_column {
        reader = reader.with_label_column(column);
    }
    reader.read().context("failed to read records file")
}

fn score(forest: &Forest, records: &RecordSet) -> Result<Vec<Label>> {
    let predicted = forest
        .classify_rows(&records.schema(), records.rows())
        .context("scoring failed")?;
    info!(n_records = predicted.len(), "records scored");
    Ok(predicted)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Inspect { model } => {
            let forest = load_forest(&model)?;
            let output = InspectOutput {
                n_trees: forest.n_trees(),
                n_predicates: forest.registry().len(),
                data_fields: forest.data_fields(),
                target: forest.target(),
                referenced_fields: forest.registry().fields().into_iter().collect(),
                labels: forest.labels().into_iter().map(Label::as_str).collect(),
                predicates: forest
                    .registry()
                    .iter()
                    .map(|(id, expr)| format!("expr[{}]: {expr}", id.index()))
                    .collect(),
                trees: forest
                    .trees()
                    .iter()
                    .map(|t| TreeOutput {
                        id: t.id(),
                        n_nodes: t.n_nodes(),
                        n_edges: t.n_edges(),
                        n_leaves: t.n_leaves(),
                        depth: t.depth(),
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Compile { model, out } => {
            let forest = ModelReader::new(&model)
                .read()
                .context("failed to read model document")?;
            forest.save(&out).context("failed to save compiled model")?;
            info!(path = %out.display(), "compiled model saved");

            let output = CompileOutput {
                path: out,
                n_trees: forest.n_trees(),
                n_predicates: forest.registry().len(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Score {
            model,
            data,
            experiment,
            output_dir,
            delimiter,
            label_column,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;
            let forest = load_forest(&model)?;
            let records = read_records(&forest, &data, delimiter, label_column.as_deref())?;

            let predicted = score(&forest, &records)?;

            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            let predictions_path = writer.write_predictions(&predicted, records.labels())?;

            let output = ScoreOutput {
                experiment,
                n_records: predicted.len(),
                n_trees: forest.n_trees(),
                predictions_path,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Evaluate {
            model,
            data,
            label_column,
            experiment,
            output_dir,
            delimiter,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;
            let forest = load_forest(&model)?;
            let records = read_records(&forest, &data, delimiter, Some(&label_column))?;
            let actual = records
                .labels()
                .context("records file has no label column")?;

            let predicted = score(&forest, &records)?;
            let confusion = ConfusionMatrix::from_labels(actual, &predicted)
                .context("failed to build confusion matrix")?;
            info!(accuracy = confusion.accuracy(), "evaluation complete");

            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            writer.write_predictions(&predicted, Some(actual))?;
            writer.write_evaluation(forest.n_trees(), forest.registry().len(), &confusion)?;

            if !cli.quiet {
                eprintln!("{confusion}");
            }

            let output = EvaluateOutput {
                experiment,
                n_records: confusion.total(),
                n_trees: forest.n_trees(),
                n_classes: confusion.n_classes(),
                accuracy: confusion.accuracy(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
