//! Utility functions for randomly generating datasets

use ndarray::{s, Array, Array1, Array2, Array3, ArrayBase, Data, Ix1, Ix2};
use ndarray_rand::{
    rand::Rng,
    rand_distr::{Distribution, Normal, StandardNormal},
    RandomExt,
};

/// Special case of `blobs_with_distribution` with a standard normal distribution.
pub fn blobs(
    blob_size: usize,
    blob_centroids: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    rng: &mut impl Rng,
) -> Array2<f64> {
    blobs_with_distribution(blob_size, blob_centroids, StandardNormal, rng)
}

/// Given an input matrix `blob_centroids`, with shape `(n_blobs, n_features)`,
/// generate `blob_size` data points (a "blob") around each of the blob centroids.
///
/// More specifically, each blob is formed by `blob_size` points sampled from a distribution
/// centered in the blob centroid. Points of blob `i` occupy rows
/// `i * blob_size..(i + 1) * blob_size`.
///
/// `blobs` can be used to quickly assemble a synthetic embedding matrix to test or
/// benchmark the clustering layer on a best-case scenario input.
pub fn blobs_with_distribution(
    blob_size: usize,
    blob_centroids: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    distribution: impl Distribution<f64> + Clone,
    rng: &mut impl Rng,
) -> Array2<f64> {
    let (n_centroids, n_features) = blob_centroids.dim();
    let mut blobs: Array2<f64> = Array2::zeros((n_centroids * blob_size, n_features));

    for (blob_index, blob_centroid) in blob_centroids.rows().into_iter().enumerate() {
        let blob = make_blob(blob_size, &blob_centroid, distribution.clone(), rng);

        let indexes = s![blob_index * blob_size..(blob_index + 1) * blob_size, ..];
        blobs.slice_mut(indexes).assign(&blob);
    }
    blobs
}

/// Labels matching the row layout of `blobs`: `blob_size` times `0`, then `1`, and so on.
pub fn blob_labels(blob_size: usize, n_blobs: usize) -> Array1<usize> {
    Array1::from_shape_fn(blob_size * n_blobs, |i| i / blob_size)
}

/// Generate `blob_size` data points (a "blob") around `blob_centroid` using the given distribution.
fn make_blob(
    blob_size: usize,
    blob_centroid: &ArrayBase<impl Data<Elem = f64>, Ix1>,
    distribution: impl Distribution<f64>,
    rng: &mut impl Rng,
) -> Array2<f64> {
    let shape = (blob_size, blob_centroid.len());
    let origin_blob: Array2<f64> = Array::random_using(shape, distribution, rng);
    origin_blob + blob_centroid
}

/// Generate `n_per_class * n_classes` noisy single-channel scans with shape `(side, side)`.
///
/// Class `c` lights up the `c`-th horizontal band of the image, the remaining pixels carry
/// low-amplitude gaussian noise. Returns the image stack with shape `(n, side, side)` and the
/// class of every image.
///
/// # Panics
///
/// If `n_classes` is zero or larger than `side`.
pub fn scans(
    n_per_class: usize,
    n_classes: usize,
    side: usize,
    rng: &mut impl Rng,
) -> (Array3<f64>, Array1<usize>) {
    assert!(n_classes > 0 && n_classes <= side);

    let noise = Normal::new(0.0, 0.05).unwrap();
    let mut images: Array3<f64> =
        Array::random_using((n_per_class * n_classes, side, side), noise, rng);
    let labels = blob_labels(n_per_class, n_classes);
    let band = side / n_classes;

    for (mut image, class) in images.outer_iter_mut().zip(labels.iter()) {
        image
            .slice_mut(s![class * band..(class + 1) * band, ..])
            .mapv_inplace(|x| x + 1.0);
    }

    (images, labels)
}
