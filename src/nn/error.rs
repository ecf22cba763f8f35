use thiserror::Error;

/// Coarse classification of a [`LossError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller handed in something unusable (bad weights shape, bad
    /// operand shapes, unknown activation).
    InvalidArgument,
    /// The loss configuration does not fit the batch being evaluated.
    InvalidState,
    /// Encoding or decoding the loss configuration failed.
    Config,
}

#[derive(Debug, Error)]
pub enum LossError {
    #[error("Weights array must be a row vector, got shape {rows}x{cols}")]
    InvalidWeights { rows: usize, cols: usize },

    #[error("Weights vector (length {length}) does not match output.size(1)={columns}")]
    WeightsLengthMismatch { length: usize, columns: usize },

    #[error("{what} has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("unknown activation function '{name}'")]
    UnknownActivation { name: String },

    #[error("invalid loss configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl LossError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LossError::InvalidWeights { .. }
            | LossError::ShapeMismatch { .. }
            | LossError::UnknownActivation { .. } => ErrorKind::InvalidArgument,
            LossError::WeightsLengthMismatch { .. } => ErrorKind::InvalidState,
            LossError::Json(_) => ErrorKind::Config,
        }
    }
}
