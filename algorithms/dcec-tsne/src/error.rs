use thiserror::Error;

pub type Result<T> = std::result::Result<T, TSneError>;

/// Errors of the t-SNE projection
#[derive(Error, Debug, Clone)]
pub enum TSneError {
    #[error("map dimensionality must be 1, 2 or 3, got {0}")]
    Dims(usize),
    #[error("perplexity must be positive and finite")]
    Perplexity,
    #[error("Barnes-Hut threshold must be non-negative and finite")]
    Theta,
    #[error("a t-SNE run needs at least one iteration")]
    NoIterations,
    #[error("exaggeration phase of {exaggeration} iterations exceeds the {total} iterations")]
    ExaggerationIter { exaggeration: usize, total: usize },
    #[error("perplexity {perplexity} needs at least {needed} samples, got {found}")]
    PerplexityTooLarge {
        perplexity: f64,
        needed: usize,
        found: usize,
    },
    #[error("a {dims}-dimensional map cannot be drawn from {features} features")]
    DimsTooLarge { dims: usize, features: usize },
    #[error("invalid shaped array {0}")]
    InvalidShape(#[from] ndarray::ShapeError),
    #[error(transparent)]
    BaseCrate(#[from] dcec::Error),
}
