use thiserror::Error;

/// An error when checking the hyperparameters of the soft assignment
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SoftAssignmentParamsError {
    #[error("alpha (degrees of freedom) must be finite and strictly positive")]
    Alpha,
}

/// An error when evaluating the clustering layer
#[derive(Error, Debug, Clone)]
pub enum SoftAssignmentError {
    /// When any of the hyperparameters are set the wrong value
    #[error("Invalid hyperparameter: {0}")]
    InvalidParams(#[from] SoftAssignmentParamsError),
    /// When the center matrix holds no cluster
    #[error("the cluster center matrix needs at least one cluster")]
    NoClusters,
    #[error(transparent)]
    BaseCrate(#[from] dcec::Error),
}
