use std::fmt;

use log::{debug, warn};
use ndarray::{Array1, Array2, Zip};
use num_traits::Float;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{
    activation::{log_softmax, softmax, Activation, Transform},
    error::LossError,
    ops::{muli_column_vector, muli_row_vector, row_sum},
};

/// A loss over a batch of `N` examples with `C` output units.
///
/// `labels` and `pre_output` are both (N x C); `pre_output` holds the values
/// fed into `activation_fn`. `mask`, when present, is an (N x 1) column that
/// scales each example's contribution.
pub trait LossFunction<T: Float + From<f64>> {
    /// Negated total log-likelihood; divided by `N` when `average` is set.
    fn compute_score(
        &self,
        labels: &Array2<T>,
        pre_output: &Array2<T>,
        activation_fn: &str,
        mask: Option<&Array2<T>>,
        average: bool,
    ) -> Result<T, LossError>;

    /// Per-example negated log-likelihood, as an (N x 1) column.
    fn compute_score_array(
        &self,
        labels: &Array2<T>,
        pre_output: &Array2<T>,
        activation_fn: &str,
        mask: Option<&Array2<T>>,
    ) -> Result<Array2<T>, LossError>;

    /// Gradient of the score with respect to `pre_output`, shaped like it.
    fn compute_gradient(
        &self,
        labels: &Array2<T>,
        pre_output: &Array2<T>,
        activation_fn: &str,
        mask: Option<&Array2<T>>,
    ) -> Result<Array2<T>, LossError>;

    fn compute_gradient_and_score(
        &self,
        labels: &Array2<T>,
        pre_output: &Array2<T>,
        activation_fn: &str,
        mask: Option<&Array2<T>>,
        average: bool,
    ) -> Result<(T, Array2<T>), LossError> {
        // TODO: fuse the activation pass shared by score and gradient.
        let score = self.compute_score(labels, pre_output, activation_fn, mask, average)?;
        let gradient = self.compute_gradient(labels, pre_output, activation_fn, mask)?;
        Ok((score, gradient))
    }
}

/// Binary cross-entropy with optional per-unit weights.
///
/// With any element-wise activation every unit is an independent binary
/// outcome. With `"softmax"` each row is read as one categorical
/// distribution, and the score becomes `labels * log_softmax(pre_output)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct LossBinaryXent<T> {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::nn::row_vector"
    )]
    weights: Option<Array1<T>>,
}

impl<T> Default for LossBinaryXent<T> {
    fn default() -> Self {
        Self { weights: None }
    }
}

impl<T> LossBinaryXent<T>
where
    T: Float + From<f64>,
{
    /// `weights`, if given, must be a (1 x C) row vector.
    pub fn new(weights: Option<Array2<T>>) -> Result<Self, LossError> {
        let weights = match weights {
            None => None,
            Some(w) => {
                let (rows, cols) = w.dim();
                if rows != 1 {
                    return Err(LossError::InvalidWeights { rows, cols });
                }
                Some(w.row(0).to_owned())
            }
        };
        Ok(Self { weights })
    }

    pub fn with_weights(weights: Array1<T>) -> Self {
        Self {
            weights: Some(weights),
        }
    }

    pub fn weights(&self) -> Option<&Array1<T>> {
        self.weights.as_ref()
    }

    fn checked_weights(&self, columns: usize) -> Result<Option<&Array1<T>>, LossError> {
        match &self.weights {
            Some(w) if w.len() != columns => {
                warn!(
                    "weights vector has {} entries but the batch has {} output units",
                    w.len(),
                    columns
                );
                Err(LossError::WeightsLengthMismatch {
                    length: w.len(),
                    columns,
                })
            }
            weights => Ok(weights.as_ref()),
        }
    }

    /// Per-element log-likelihood, (N x C), before negation and reduction.
    fn score_array(
        &self,
        labels: &Array2<T>,
        pre_output: &Array2<T>,
        activation_fn: &str,
        mask: Option<&Array2<T>>,
    ) -> Result<Array2<T>, LossError> {
        check_shapes(labels, pre_output, mask)?;

        let score_arr = match Transform::resolve(activation_fn)? {
            Transform::Softmax => log_softmax(pre_output) * labels,
            Transform::Elementwise(act) => {
                let output = act.forward(pre_output);
                let first_term = output.mapv(T::ln) * labels;
                let second_term =
                    output.mapv(|a| (T::one() - a).ln()) * &labels.mapv(|y| T::one() - y);
                first_term + &second_term
            }
        };

        let score_arr = match self.checked_weights(pre_output.ncols())? {
            Some(w) => {
                debug!("applying {} unit weights to score", w.len());
                muli_row_vector(score_arr, w)
            }
            None => score_arr,
        };

        Ok(match mask {
            Some(m) => muli_column_vector(score_arr, m),
            None => score_arr,
        })
    }
}

impl<T> LossBinaryXent<T>
where
    T: Float + From<f64> + Serialize + DeserializeOwned,
{
    pub fn from_json(json: &str) -> Result<Self, LossError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, LossError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<T> LossFunction<T> for LossBinaryXent<T>
where
    T: Float + From<f64>,
{
    fn compute_score(
        &self,
        labels: &Array2<T>,
        pre_output: &Array2<T>,
        activation_fn: &str,
        mask: Option<&Array2<T>>,
        average: bool,
    ) -> Result<T, LossError> {
        let score_arr = self.score_array(labels, pre_output, activation_fn, mask)?;
        let mut score = -score_arr.sum();
        if average {
            let examples: T = (score_arr.nrows() as f64).into();
            score = score / examples;
        }
        Ok(score)
    }

    fn compute_score_array(
        &self,
        labels: &Array2<T>,
        pre_output: &Array2<T>,
        activation_fn: &str,
        mask: Option<&Array2<T>>,
    ) -> Result<Array2<T>, LossError> {
        let score_arr = self.score_array(labels, pre_output, activation_fn, mask)?;
        Ok(row_sum(&score_arr).mapv_into(|v| -v))
    }

    fn compute_gradient(
        &self,
        labels: &Array2<T>,
        pre_output: &Array2<T>,
        activation_fn: &str,
        mask: Option<&Array2<T>>,
    ) -> Result<Array2<T>, LossError> {
        check_shapes(labels, pre_output, mask)?;

        let grad = match Transform::resolve(activation_fn)? {
            Transform::Softmax => {
                let output = softmax(pre_output);
                match self.checked_weights(output.ncols())? {
                    Some(w) => {
                        let weighted_labels = muli_row_vector(labels.to_owned(), w);
                        let row_weight_sum = row_sum(&weighted_labels);
                        muli_column_vector(output, &row_weight_sum) - &weighted_labels
                    }
                    None => output - labels,
                }
            }
            Transform::Elementwise(act) => {
                // With a = act(z): d/dz of -(y ln a + (1 - y) ln(1 - a)) is
                // a' (a - y) / (a (1 - a)). No clamping near a = 0 or a = 1.
                let output = act.forward(pre_output);
                let mut grad = act.derivative(pre_output);
                Zip::from(&mut grad)
                    .and(&output)
                    .and(labels)
                    .for_each(|g, &a, &y| *g = *g * (a - y) / (a * (T::one() - a)));

                match self.checked_weights(output.ncols())? {
                    Some(w) => muli_row_vector(grad, w),
                    None => grad,
                }
            }
        };

        Ok(match mask {
            Some(m) => muli_column_vector(grad, m),
            None => grad,
        })
    }
}

impl<T> fmt::Display for LossBinaryXent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LossBinaryXENT()")
    }
}

fn check_shapes<T>(
    labels: &Array2<T>,
    pre_output: &Array2<T>,
    mask: Option<&Array2<T>>,
) -> Result<(), LossError> {
    if labels.dim() != pre_output.dim() {
        return Err(LossError::ShapeMismatch {
            what: "labels",
            expected: pre_output.dim(),
            actual: labels.dim(),
        });
    }
    if let Some(m) = mask {
        let expected = (pre_output.nrows(), 1);
        if m.dim() != expected {
            return Err(LossError::ShapeMismatch {
                what: "mask",
                expected,
                actual: m.dim(),
            });
        }
    }
    Ok(())
}
