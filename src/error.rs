//! Error types in dcec
//!

use thiserror::Error;

use ndarray::ShapeError;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("invalid parameter {0}")]
    Parameters(String),
    #[error("shape mismatch: {what} has dimension {found}, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
    #[error("not enough samples: got {found}, need at least {needed}")]
    NotEnoughSamples { found: usize, needed: usize },
    #[error("label vectors are empty")]
    EmptyLabels,
}

impl Error {
    /// Shorthand for a shape mismatch between an observed and an expected dimension
    pub fn shape_mismatch(what: &'static str, expected: usize, found: usize) -> Self {
        Error::ShapeMismatch {
            what,
            expected,
            found,
        }
    }
}
