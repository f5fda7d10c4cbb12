//! Provide traits for different classes of algorithms
//!

use crate::error::Result;
use ndarray::{Array2, ArrayView3};
use std::error::Error;

/// Transformation algorithms
///
/// A transformer takes a dataset and transforms it into a different one. It has no concept of
/// state and provides therefore no method to predict new data. A typical example are embedding
/// projections, which map high-dimensional records onto a lower-dimensional plane.
pub trait Transformer<X, Y> {
    fn transform(&self, x: X) -> Y;
}

/// Fittable algorithms
///
/// A fittable algorithm takes a set of records and creates a concept of some kind about it. This
/// is the generic trait for fitting; the returned object holds the learned state, for example
/// the centroids of a k-means run.
pub trait Fit<R, E: Error> {
    type Object;

    fn fit(&self, records: &R) -> std::result::Result<Self::Object, E>;
}

/// Predict with a fitted model
///
/// Models like the clustering layer or k-means assign labels to new records.
pub trait Predict<X, Y> {
    fn predict(&self, x: X) -> Y;
}

/// Feature extractor
///
/// Maps a batch of `N` single-channel images with shape `(N, height, width)` to an embedding
/// matrix with shape `(N, n_features)`. The network behind it (a convolutional encoder with
/// pretrained weights) lives outside of this workspace; this trait is the seam where it plugs in.
pub trait Embed<F> {
    fn embed(&self, images: ArrayView3<F>) -> Result<Array2<F>>;
}
