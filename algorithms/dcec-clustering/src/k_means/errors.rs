use thiserror::Error;

use crate::{SoftAssignmentError, SoftAssignmentParamsError};

/// An error when checking the k-means settings of a clustering layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KMeansParamsError {
    #[error("a clustering layer needs at least one cluster")]
    NoClusters,
    #[error("k-means needs at least one initialisation")]
    NoRestarts,
    #[error("convergence tolerance must be finite and strictly positive")]
    Tolerance,
    #[error("every initialisation needs at least one iteration")]
    NoIterations,
    #[error("clustering layer: {0}")]
    Layer(#[from] SoftAssignmentParamsError),
}

/// An error when placing the initial cluster centers with k-means
#[derive(Error, Debug, Clone)]
pub enum KMeansError {
    #[error("Invalid hyperparameter: {0}")]
    InvalidParams(#[from] KMeansParamsError),
    /// The best initialisation did not settle within `max_iter` iterations
    #[error("none of the {n_init} initialisations settled within {max_iter} iterations")]
    NotConverged { n_init: usize, max_iter: usize },
    /// Every initialisation ended with an infinite or NaN inertia
    #[error("k-means inertia is not finite, the embeddings contain NaN or infinite values")]
    NonFiniteInertia,
    #[error(transparent)]
    Layer(#[from] SoftAssignmentError),
    #[error(transparent)]
    BaseCrate(#[from] dcec::Error),
}
