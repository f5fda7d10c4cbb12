use crate::soft_assignment::{ClusterCenters, SoftAssignmentParams, SoftAssignmentValidParams};
use crate::SoftAssignmentError;

use dcec::traits::{Predict, Transformer};
use dcec::{Error, Float, ParamGuard};
use ndarray::{
    Array1, Array2, ArrayBase, ArrayView1, ArrayView2, ArrayViewMut1, Data, Ix1, Ix2, Zip,
};

/// Soft assignment of embeddings to cluster centers, the clustering layer of deep embedded
/// clustering.
///
/// Every embedded sample `x` is compared to each cluster center `mu_j` with the kernel of a
/// Student's t-distribution, the same similarity t-SNE uses in its low-dimensional map:
///
/// ```text
/// u_j = (1 + ||x - mu_j||^2 / alpha) ^ (-(alpha + 1) / 2)
/// q_j = u_j / sum_k u_k
/// ```
///
/// `q_j` can be read as the probability of assigning the sample to cluster `j`. The degrees of
/// freedom `alpha` default to `1.0`.
///
/// ## Ownership
///
/// The cluster centers are a parameter learned by a training loop outside of this crate. They
/// are held in a [`ClusterCenters`] value which the evaluation only borrows, so a training loop can
/// update them in place between evaluations.
///
/// ## Parallelisation
///
/// Samples are independent of each other: the batch evaluation fills the output rows in parallel
/// thanks to the `rayon` feature in `ndarray`, and produces the same values as evaluating every
/// sample on its own.
///
/// ## Example
///
/// ```
/// use dcec::ParamGuard;
/// use dcec_clustering::{ClusterCenters, SoftAssignment};
/// use ndarray::array;
/// use approx::assert_abs_diff_eq;
///
/// let centers = ClusterCenters::new(array![[0., 0.], [3., 4.]]).unwrap();
/// let params = SoftAssignment::params().check().unwrap();
///
/// let q = params.evaluate(&array![0., 0.], &centers).unwrap();
/// assert_abs_diff_eq!(q, array![26. / 27., 1. / 27.], epsilon = 1e-12);
/// ```
pub struct SoftAssignment;

impl SoftAssignment {
    /// Hyperparameters with the default `alpha = 1.0`
    pub fn params<F: Float>() -> SoftAssignmentParams<F> {
        SoftAssignmentParams::new()
    }

    pub fn params_with_alpha<F: Float>(alpha: F) -> SoftAssignmentParams<F> {
        SoftAssignmentParams::new().alpha(alpha)
    }
}

impl<F: Float> SoftAssignmentValidParams<F> {
    /// Soft assignment of a single embedding with shape `(n_features,)`
    pub fn evaluate(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix1>,
        centers: &ClusterCenters<F>,
    ) -> Result<Array1<F>, SoftAssignmentError> {
        if x.len() != centers.n_features() {
            return Err(
                Error::shape_mismatch("embedding dimension", centers.n_features(), x.len()).into(),
            );
        }

        let mut q = Array1::zeros(centers.n_clusters());
        student_t_assignment(x.view(), centers.view(), self.alpha(), q.view_mut());

        Ok(q)
    }

    /// Soft assignment of a batch of embeddings with shape `(n_samples, n_features)`
    ///
    /// Returns a matrix with shape `(n_samples, n_clusters)` whose rows sum to one.
    pub fn evaluate_batch(
        &self,
        x: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
        centers: &ClusterCenters<F>,
    ) -> Result<Array2<F>, SoftAssignmentError> {
        if x.ncols() != centers.n_features() {
            return Err(
                Error::shape_mismatch("embedding dimension", centers.n_features(), x.ncols())
                    .into(),
            );
        }

        let mut q = Array2::zeros((x.nrows(), centers.n_clusters()));
        let centers = centers.view();
        let alpha = self.alpha();

        Zip::from(q.rows_mut())
            .and(x.rows())
            .par_for_each(|q_row, x_row| student_t_assignment(x_row, centers, alpha, q_row));

        Ok(q)
    }
}

/// Soft assignment of one embedding `x` to the rows of `centers`
///
/// Plain function form of the clustering layer: validates `alpha` and the shapes, then evaluates
/// the Student's t kernel.
pub fn soft_assign<F: Float>(
    x: &ArrayBase<impl Data<Elem = F>, Ix1>,
    centers: &ArrayBase<impl Data<Elem = F>, Ix2>,
    alpha: F,
) -> Result<Array1<F>, SoftAssignmentError> {
    let params = SoftAssignment::params_with_alpha(alpha).check()?;
    let centers = ClusterCenters::new(centers.to_owned())?;

    params.evaluate(x, &centers)
}

/// Writes the normalized Student's t affinities of `x` to every center into `out`.
///
/// The affinities are computed in the log domain and shifted by their maximum before
/// exponentiation, so that far away embeddings do not underflow all affinities to zero.
/// Non-finite inputs propagate to non-finite outputs.
pub(crate) fn student_t_assignment<F: Float>(
    x: ArrayView1<F>,
    centers: ArrayView2<F>,
    alpha: F,
    mut out: ArrayViewMut1<F>,
) {
    let exponent = -(alpha + F::one()) / F::cast(2.0);
    let ln_alpha = alpha.ln();

    for (center, q) in centers.rows().into_iter().zip(out.iter_mut()) {
        *q = exponent * ln_1p_scaled_distance(x, center, ln_alpha);
    }

    let max = out.iter().copied().fold(F::neg_infinity(), F::max);
    out.mapv_inplace(|log_u| (log_u - max).exp());

    let total = out.sum();
    out.mapv_inplace(|u| u / total);
}

/// `ln(1 + ||x - c||^2 / alpha)` without forming the squared distance
///
/// The distance is accumulated from half differences scaled by their largest magnitude, which
/// keeps every intermediate finite for finite inputs:
///
/// ```text
/// h_i = x_i / 2 - c_i / 2,  m = max_i |h_i|
/// ln(d / alpha) = ln 4 + 2 ln m + ln sum_i (h_i / m)^2 - ln alpha
/// ```
///
/// For `r = d / alpha > 1` the identity `ln(1 + r) = ln r + ln(1 + 1 / r)` avoids evaluating `r`.
fn ln_1p_scaled_distance<F: Float>(x: ArrayView1<F>, center: ArrayView1<F>, ln_alpha: F) -> F {
    let half = F::cast(0.5);
    let mut scale = F::zero();
    for (a, b) in x.iter().zip(center.iter()) {
        let h = *a * half - *b * half;
        if h.is_nan() {
            return h;
        }
        scale = scale.max(h.abs());
    }

    if scale.is_zero() {
        return F::zero();
    }

    let sum = x
        .iter()
        .zip(center.iter())
        .map(|(a, b)| {
            let h = (*a * half - *b * half) / scale;
            h * h
        })
        .sum::<F>();
    let ln_ratio = F::cast(4.0).ln() + F::cast(2.0) * scale.ln() + sum.ln() - ln_alpha;

    if ln_ratio > F::zero() {
        ln_ratio + (-ln_ratio).exp().ln_1p()
    } else {
        ln_ratio.exp().ln_1p()
    }
}

/// Index of the largest entry of every row, ties go to the lowest index
pub(crate) fn argmax_rows<F: Float>(q: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array1<usize> {
    q.rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, F::neg_infinity()), |(best, best_val), (idx, val)| {
                    if *val > best_val {
                        (idx, *val)
                    } else {
                        (best, best_val)
                    }
                })
                .0
        })
        .collect()
}

/// The clustering layer of a deep embedded clustering model
///
/// Bundles checked hyperparameters with the cluster centers it owns. As a
/// [`Transformer`](dcec::traits::Transformer) it maps embeddings to soft labels, as a
/// [`Predict`](dcec::traits::Predict) it maps them to the index of the most likely cluster.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusteringLayer<F: Float> {
    params: SoftAssignmentValidParams<F>,
    centers: ClusterCenters<F>,
}

impl<F: Float> ClusteringLayer<F> {
    pub fn new(
        params: SoftAssignmentParams<F>,
        centers: ClusterCenters<F>,
    ) -> Result<Self, SoftAssignmentError> {
        Ok(ClusteringLayer {
            params: params.check()?,
            centers,
        })
    }

    pub fn alpha(&self) -> F {
        self.params.alpha()
    }

    pub fn n_clusters(&self) -> usize {
        self.centers.n_clusters()
    }

    pub fn centers(&self) -> &ClusterCenters<F> {
        &self.centers
    }

    /// Hand the centers to an optimiser for an in-place update
    pub fn centers_mut(&mut self) -> &mut ClusterCenters<F> {
        &mut self.centers
    }

    pub fn into_centers(self) -> ClusterCenters<F> {
        self.centers
    }
}

impl<F: Float, D: Data<Elem = F> + Sync>
    Transformer<&ArrayBase<D, Ix2>, Result<Array2<F>, SoftAssignmentError>> for ClusteringLayer<F>
{
    /// Soft labels with shape `(n_samples, n_clusters)`
    fn transform(&self, x: &ArrayBase<D, Ix2>) -> Result<Array2<F>, SoftAssignmentError> {
        self.params.evaluate_batch(x, &self.centers)
    }
}

impl<F: Float, D: Data<Elem = F> + Sync>
    Predict<&ArrayBase<D, Ix2>, Result<Array1<usize>, SoftAssignmentError>> for ClusteringLayer<F>
{
    /// Hard labels, the most likely cluster of every sample
    fn predict(&self, x: &ArrayBase<D, Ix2>) -> Result<Array1<usize>, SoftAssignmentError> {
        let q = self.params.evaluate_batch(x, &self.centers)?;
        Ok(argmax_rows(&q))
    }
}
