//! Self-training target of the clustering layer
//!
//! Deep embedded clustering refines the cluster centers by pulling the soft assignments `Q`
//! towards a sharpened version of themselves, the target distribution `P`. The loss between
//! both is the Kullback-Leibler divergence. The gradients of that loss are left to the training
//! framework; this module provides the values a training loop logs and compares.
use crate::SoftAssignmentError;

use dcec::{Error, Float};
use ndarray::{Array2, ArrayBase, Axis, Data, Ix1, Ix2, Zip};

/// Sharpen a batch of soft assignments with shape `(n_samples, n_clusters)`
///
/// ```text
/// p_ij = (q_ij^2 / f_j) / sum_k (q_ik^2 / f_k)    with f_j = sum_i q_ij
/// ```
///
/// Squaring emphasises confident assignments while dividing by the soft cluster frequency `f_j`
/// keeps large clusters from absorbing everything. Clusters without any mass contribute zero.
pub fn target_distribution<F: Float>(q: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array2<F> {
    let frequency = q.sum_axis(Axis(0));

    let mut p = q.mapv(|x| x * x);
    for mut row in p.rows_mut() {
        Zip::from(&mut row).and(&frequency).for_each(|p, &f| {
            *p = if f > F::zero() { *p / f } else { F::zero() };
        });

        let total = row.sum();
        if total > F::zero() {
            row.mapv_inplace(|x| x / total);
        }
    }

    p
}

/// Kullback-Leibler divergence `KL(P || Q)`, averaged over the samples of the batch
///
/// Terms with `p_ij = 0` contribute nothing.
pub fn kl_divergence<F: Float>(
    p: &ArrayBase<impl Data<Elem = F>, Ix2>,
    q: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Result<F, SoftAssignmentError> {
    if p.dim() != q.dim() {
        let (expected, found) = if p.nrows() != q.nrows() {
            (p.nrows(), q.nrows())
        } else {
            (p.ncols(), q.ncols())
        };
        return Err(Error::shape_mismatch("soft assignments", expected, found).into());
    }
    if p.nrows() == 0 {
        return Err(Error::NotEnoughSamples { found: 0, needed: 1 }.into());
    }

    let mut sum = F::zero();
    Zip::from(p).and(q).for_each(|&p, &q| {
        if p > F::zero() {
            sum += p * (p / q).ln();
        }
    });

    Ok(sum / F::cast(p.nrows()))
}

/// Fraction of samples whose hard label differs between two evaluations
///
/// Training loops stop refining the centers once this falls below a tolerance.
pub fn label_delta(
    previous: &ArrayBase<impl Data<Elem = usize>, Ix1>,
    current: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Result<f32, SoftAssignmentError> {
    if previous.len() != current.len() {
        return Err(Error::shape_mismatch("labels", previous.len(), current.len()).into());
    }
    if previous.is_empty() {
        return Err(Error::EmptyLabels.into());
    }

    let changed = previous
        .iter()
        .zip(current.iter())
        .filter(|(a, b)| a != b)
        .count();

    Ok(changed as f32 / previous.len() as f32)
}
