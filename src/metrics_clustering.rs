//! Common metrics for clustering
//!
//! Clustering labels are arbitrary: cluster `2` of a model may correspond to class `0` of the
//! ground truth. The metrics in this module are therefore either invariant to label permutations
//! (NMI, ARI) or search the best one-to-one mapping first (cluster accuracy).
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayBase, Axis, Data, Ix1};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Confusion matrix between ground truth labels and clustering labels
///
/// A confusion matrix shows predictions in a matrix, where rows correspond to the true label and
/// columns to the clustering label. The matrix is square with side `max(label) + 1`, so that
/// labels which never occur simply have empty rows or columns.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    matrix: Array2<usize>,
}

impl ConfusionMatrix {
    /// Count the co-occurrences of true and predicted labels
    pub fn new(
        y_true: &ArrayBase<impl Data<Elem = usize>, Ix1>,
        y_pred: &ArrayBase<impl Data<Elem = usize>, Ix1>,
    ) -> Result<Self> {
        check_labels(y_true, y_pred)?;

        let side = y_true
            .iter()
            .chain(y_pred.iter())
            .copied()
            .max()
            .map(|x| x + 1)
            .unwrap_or(0);

        let mut matrix = Array2::zeros((side, side));
        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            matrix[(*t, *p)] += 1;
        }

        Ok(ConfusionMatrix { matrix })
    }

    /// The raw counts, rows are true labels and columns clustering labels
    pub fn matrix(&self) -> &Array2<usize> {
        &self.matrix
    }

    /// Number of distinct label values covered by the matrix
    pub fn n_labels(&self) -> usize {
        self.matrix.nrows()
    }

    /// Total number of samples
    pub fn n_samples(&self) -> usize {
        self.matrix.sum()
    }

    /// Fraction of samples where the clustering label equals the true label verbatim
    pub fn accuracy(&self) -> f32 {
        self.matrix.diag().sum() as f32 / self.n_samples() as f32
    }

    /// Find the mapping from clustering labels to true labels which maximizes the number of
    /// agreeing samples
    ///
    /// Returns pairs of `(clustering label, true label)`, one for every clustering label.
    pub fn best_mapping(&self) -> Vec<(usize, usize)> {
        // rows of the cost matrix are clustering labels, hence the transpose
        let cost = self.matrix.t().mapv(|x| -(x as i64));

        hungarian(&cost)
            .into_iter()
            .enumerate()
            .collect()
    }

    /// Fraction of agreeing samples under the best label mapping
    pub fn cluster_accuracy(&self) -> f32 {
        let matched: usize = self
            .best_mapping()
            .into_iter()
            .map(|(pred, truth)| self.matrix[(truth, pred)])
            .sum();

        matched as f32 / self.n_samples() as f32
    }
}

fn check_labels(
    y_true: &ArrayBase<impl Data<Elem = usize>, Ix1>,
    y_pred: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(Error::shape_mismatch(
            "predicted labels",
            y_true.len(),
            y_pred.len(),
        ));
    }
    if y_true.is_empty() {
        return Err(Error::EmptyLabels);
    }

    Ok(())
}

/// Solve the square linear assignment problem, minimizing the summed cost
///
/// Kuhn-Munkres with row and column potentials, runs in `O(n^3)`. Returns for every row the
/// column assigned to it.
pub(crate) fn hungarian(cost: &Array2<i64>) -> Vec<usize> {
    let n = cost.nrows();
    debug_assert_eq!(n, cost.ncols());

    // potentials and matching use 1-based indices, column 0 is a virtual start node
    let mut u = vec![0i64; n + 1];
    let mut v = vec![0i64; n + 1];
    let mut matched_row = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for row in 1..=n {
        matched_row[0] = row;
        let mut col0 = 0;
        let mut min_slack = vec![i64::MAX; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[col0] = true;
            let row0 = matched_row[col0];
            let mut delta = i64::MAX;
            let mut col1 = 0;

            for col in 1..=n {
                if used[col] {
                    continue;
                }
                let cur = cost[(row0 - 1, col - 1)] - u[row0] - v[col];
                if cur < min_slack[col] {
                    min_slack[col] = cur;
                    way[col] = col0;
                }
                if min_slack[col] < delta {
                    delta = min_slack[col];
                    col1 = col;
                }
            }

            for col in 0..=n {
                if used[col] {
                    u[matched_row[col]] += delta;
                    v[col] -= delta;
                } else {
                    min_slack[col] -= delta;
                }
            }

            col0 = col1;
            if matched_row[col0] == 0 {
                break;
            }
        }

        // augment along the alternating path
        loop {
            let col1 = way[col0];
            matched_row[col0] = matched_row[col1];
            col0 = col1;
            if col0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0; n];
    for col in 1..=n {
        if matched_row[col] != 0 {
            assignment[matched_row[col] - 1] = col - 1;
        }
    }

    assignment
}

/// Best one-to-one mapping from clustering labels to true labels
///
/// Returns `(clustering label, true label)` pairs, see [`ConfusionMatrix::best_mapping`].
pub fn best_label_mapping(
    y_true: &ArrayBase<impl Data<Elem = usize>, Ix1>,
    y_pred: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Result<Vec<(usize, usize)>> {
    Ok(ConfusionMatrix::new(y_true, y_pred)?.best_mapping())
}

/// Unsupervised clustering accuracy
///
/// Each clustering label is mapped to the true label it agrees with most often, under the
/// constraint that the mapping is one-to-one, then the fraction of agreeing samples is returned.
pub fn cluster_accuracy(
    y_true: &ArrayBase<impl Data<Elem = usize>, Ix1>,
    y_pred: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Result<f32> {
    Ok(ConfusionMatrix::new(y_true, y_pred)?.cluster_accuracy())
}

/// Normalized mutual information with arithmetic mean normalization
///
/// Two labelings with a single cluster each are considered identical and score `1.0`.
pub fn normalized_mutual_info(
    y_true: &ArrayBase<impl Data<Elem = usize>, Ix1>,
    y_pred: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Result<f64> {
    let cm = ConfusionMatrix::new(y_true, y_pred)?;
    let counts = cm.matrix().mapv(|x| x as f64);
    let n = cm.n_samples() as f64;

    let row_sums = counts.sum_axis(Axis(1));
    let col_sums = counts.sum_axis(Axis(0));

    let entropy = |sums: &ndarray::Array1<f64>| -> f64 {
        sums.iter()
            .filter(|x| **x > 0.0)
            .map(|x| {
                let p = x / n;
                -p * p.ln()
            })
            .sum()
    };
    let h_true = entropy(&row_sums);
    let h_pred = entropy(&col_sums);

    if h_true == 0.0 && h_pred == 0.0 {
        return Ok(1.0);
    }

    let mut mutual_info = 0.0;
    for ((i, j), n_ij) in counts.indexed_iter() {
        if *n_ij > 0.0 {
            mutual_info += n_ij / n * (n * n_ij / (row_sums[i] * col_sums[j])).ln();
        }
    }

    let normalizer = (h_true + h_pred) / 2.0;
    Ok((mutual_info / normalizer).max(0.0))
}

/// Adjusted rand index
///
/// The rand index counts agreeing pairs of samples and is corrected for chance, so that random
/// labelings score close to `0.0` and identical labelings (up to permutation) score `1.0`.
pub fn adjusted_rand_index(
    y_true: &ArrayBase<impl Data<Elem = usize>, Ix1>,
    y_pred: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Result<f64> {
    let cm = ConfusionMatrix::new(y_true, y_pred)?;
    let comb2 = |x: usize| -> f64 {
        let x = x as f64;
        x * (x - 1.0) / 2.0
    };

    let sum_comb: f64 = cm.matrix().iter().map(|x| comb2(*x)).sum();
    let sum_true: f64 = cm.matrix().sum_axis(Axis(1)).iter().map(|x| comb2(*x)).sum();
    let sum_pred: f64 = cm.matrix().sum_axis(Axis(0)).iter().map(|x| comb2(*x)).sum();

    let expected = sum_true * sum_pred / comb2(cm.n_samples()).max(1.0);
    let max_index = (sum_true + sum_pred) / 2.0;

    if (max_index - expected).abs() < f64::EPSILON {
        return Ok(1.0);
    }

    Ok((sum_comb - expected) / (max_index - expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1};
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn test_confusion_matrix_counts() {
        let y_true = array![0, 0, 1, 1, 2];
        let y_pred = array![0, 1, 1, 1, 0];

        let cm = ConfusionMatrix::new(&y_true, &y_pred).unwrap();
        assert_eq!(
            cm.matrix(),
            &array![[1, 1, 0], [0, 2, 0], [1, 0, 0]]
        );
        assert_eq!(cm.n_samples(), 5);
        assert_abs_diff_eq!(cm.accuracy(), 0.6);
    }

    #[test]
    fn test_length_mismatch() {
        let res = ConfusionMatrix::new(&array![0, 1], &array![0]);
        assert!(matches!(res, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_empty_labels() {
        let empty: Array1<usize> = Array1::zeros(0);
        let res = cluster_accuracy(&empty, &empty);
        assert!(matches!(res, Err(Error::EmptyLabels)));
    }

    #[test]
    fn test_hungarian_minimizes_cost() {
        let cost = array![[4, 1, 3], [2, 0, 5], [3, 2, 2]];
        let assignment = hungarian(&cost);
        let total: i64 = assignment
            .iter()
            .enumerate()
            .map(|(row, col)| cost[(row, *col)])
            .sum();
        assert_eq!(total, 5);
        assert_eq!(assignment, vec![1, 0, 2]);
    }

    fn cheapest_permutation(cost: &Array2<i64>, row: usize, used: &mut [bool]) -> i64 {
        if row == cost.nrows() {
            return 0;
        }
        let mut best = i64::MAX;
        for col in 0..cost.ncols() {
            if !used[col] {
                used[col] = true;
                let total = cost[(row, col)] + cheapest_permutation(cost, row + 1, used);
                used[col] = false;
                best = best.min(total);
            }
        }
        best
    }

    #[test]
    fn test_hungarian_matches_exhaustive_search() {
        let mut rng = Xoshiro256Plus::seed_from_u64(7);
        for n in 1..=6 {
            // narrow ranges produce many ties
            for &(low, high) in &[(-50i64, 50i64), (0, 3)] {
                for _ in 0..20 {
                    let cost = Array2::random_using((n, n), Uniform::new(low, high), &mut rng);
                    let assignment = hungarian(&cost);

                    let mut cols = assignment.clone();
                    cols.sort_unstable();
                    assert_eq!(cols, (0..n).collect::<Vec<_>>());

                    let total: i64 = assignment
                        .iter()
                        .enumerate()
                        .map(|(row, col)| cost[(row, *col)])
                        .sum();
                    assert_eq!(total, cheapest_permutation(&cost, 0, &mut vec![false; n]));
                }
            }
        }
    }

    #[test]
    fn test_accuracy_is_permutation_invariant() {
        let y_true = array![0, 0, 1, 1, 2, 2];
        let y_pred = array![2, 2, 0, 0, 1, 1];

        assert_abs_diff_eq!(cluster_accuracy(&y_true, &y_pred).unwrap(), 1.0);

        let mut mapping = best_label_mapping(&y_true, &y_pred).unwrap();
        mapping.sort();
        assert_eq!(mapping, vec![(0, 1), (1, 2), (2, 0)]);
    }

    #[test]
    fn test_accuracy_partial_agreement() {
        let y_true = array![0, 0, 0, 1, 1, 1];
        let y_pred = array![1, 1, 0, 0, 0, 0];

        // cluster 1 -> class 0 (2 samples), cluster 0 -> class 1 (3 samples)
        assert_abs_diff_eq!(
            cluster_accuracy(&y_true, &y_pred).unwrap(),
            5.0 / 6.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_nmi_and_ari_of_permuted_labels() {
        let y_true = array![0, 0, 1, 1, 2, 2];
        let y_pred = array![1, 1, 2, 2, 0, 0];

        assert_abs_diff_eq!(
            normalized_mutual_info(&y_true, &y_pred).unwrap(),
            1.0,
            epsilon = 1e-10
        );
        assert_abs_diff_eq!(
            adjusted_rand_index(&y_true, &y_pred).unwrap(),
            1.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_nmi_of_independent_labels() {
        let y_true = array![0, 0, 1, 1];
        let y_pred = array![0, 1, 0, 1];

        assert_abs_diff_eq!(
            normalized_mutual_info(&y_true, &y_pred).unwrap(),
            0.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_single_cluster_labelings() {
        let y_true = array![3, 3, 3];
        let y_pred = array![0, 0, 0];

        assert_abs_diff_eq!(normalized_mutual_info(&y_true, &y_pred).unwrap(), 1.0);
        assert_abs_diff_eq!(adjusted_rand_index(&y_true, &y_pred).unwrap(), 1.0);
    }

    #[test]
    fn test_ari_known_value() {
        // value checked against the closed form of the contingency table
        let y_true = array![0, 0, 1, 1];
        let y_pred = array![0, 0, 1, 2];

        assert_abs_diff_eq!(
            adjusted_rand_index(&y_true, &y_pred).unwrap(),
            4.0 / 7.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_random_labelings_score_near_zero() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let y_true = Array1::random_using(2000, Uniform::new(0usize, 5), &mut rng);
        let y_pred = Array1::random_using(2000, Uniform::new(0usize, 5), &mut rng);

        assert!(adjusted_rand_index(&y_true, &y_pred).unwrap().abs() < 0.02);
        assert!(normalized_mutual_info(&y_true, &y_pred).unwrap() < 0.02);
        // a permutation still recovers at least the share of the largest class
        assert!(cluster_accuracy(&y_true, &y_pred).unwrap() > 0.2);
    }
}
