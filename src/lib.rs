//! `dcec` provides the building blocks of deep embedded clustering for image scans.
//!
//! A convolutional encoder (supplied by the caller through the [`Embed`](traits::Embed) trait)
//! maps every scan to a low-dimensional embedding. A clustering layer then assigns each
//! embedding a soft membership over `K` cluster centers with a Student's t-distribution kernel,
//! the same similarity used by t-SNE.
//!
//! The workspace is organised like this:
//! * `dcec` (this crate) holds the shared numeric bounds, hyperparameter guards, traits, errors
//!   and clustering metrics (cluster accuracy, NMI, ARI),
//! * `dcec-clustering` implements the soft assignment, its self-training target and the k-means
//!   initialisation of cluster centers,
//! * `dcec-tsne` projects embeddings onto the plane for inspection,
//! * `dcec-plot` renders training curves, embeddings and confusion matrices to image files.

pub mod dataset;
pub mod error;
mod metrics_clustering;
mod param_guard;
pub mod prelude;
pub mod traits;

pub use dataset::Float;
pub use error::{Error, Result};
pub use param_guard::ParamGuard;

/// Common metrics functions for clustering
pub mod metrics {
    pub use crate::metrics_clustering::{
        adjusted_rand_index, best_label_mapping, cluster_accuracy, normalized_mutual_info,
        ConfusionMatrix,
    };
}
