use std::{fs, path::Path, path::PathBuf};

use anyhow::{ensure, Context, Result};
use binary_xent::{LossBinaryXent, LossFunction};
use clap::Parser;
use log::info;
use ndarray::{array, Array2};
use serde::Deserialize;

/// Evaluate the binary cross-entropy score and gradient of a batch.
#[derive(Debug, Parser)]
struct Args {
    /// JSON loss configuration, e.g. {"weights":[1.0,2.0]}.
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON batch with `labels`, `pre_output` and an optional `mask`.
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long, default_value = "sigmoid")]
    activation: String,
    /// Divide the total score by the number of examples.
    #[arg(long)]
    average: bool,
}

#[derive(Debug, Deserialize)]
struct Batch {
    labels: Vec<Vec<f64>>,
    pre_output: Vec<Vec<f64>>,
    #[serde(default)]
    mask: Option<Vec<f64>>,
}

fn to_matrix(rows: Vec<Vec<f64>>, name: &str) -> Result<Array2<f64>> {
    let cols = rows.first().map_or(0, Vec::len);
    ensure!(
        rows.iter().all(|row| row.len() == cols),
        "{name} rows must all have the same length"
    );
    let shape = (rows.len(), cols);
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Ok(Array2::from_shape_vec(shape, flat)?)
}

fn load_batch(path: &Path) -> Result<(Array2<f64>, Array2<f64>, Option<Array2<f64>>)> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("unable to read batch file {}", path.display()))?;
    let batch: Batch = serde_json::from_str(&text)
        .with_context(|| format!("unable to parse batch file {}", path.display()))?;

    let labels = to_matrix(batch.labels, "labels")?;
    let pre_output = to_matrix(batch.pre_output, "pre_output")?;
    let mask = batch
        .mask
        .map(|m| Array2::from_shape_vec((m.len(), 1), m))
        .transpose()?;
    Ok((labels, pre_output, mask))
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    let loss = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("unable to read config file {}", path.display()))?;
            LossBinaryXent::<f64>::from_json(&text)?
        }
        None => LossBinaryXent::default(),
    };
    info!("using {} with weights {:?}", loss, loss.weights());

    let (labels, pre_output, mask) = match &args.input {
        Some(path) => load_batch(path)?,
        None => (
            array![[1.0, 0.0], [0.0, 1.0]],
            array![[0.5, -1.0], [2.0, 0.0]],
            None,
        ),
    };
    info!(
        "evaluating {} examples x {} units with activation '{}'",
        pre_output.nrows(),
        pre_output.ncols(),
        args.activation
    );

    let (score, gradient) = loss.compute_gradient_and_score(
        &labels,
        &pre_output,
        &args.activation,
        mask.as_ref(),
        args.average,
    )?;
    let per_example =
        loss.compute_score_array(&labels, &pre_output, &args.activation, mask.as_ref())?;

    println!("score: {score}");
    println!("per-example score:\n{per_example}");
    println!("gradient:\n{gradient}");
    Ok(())
}
