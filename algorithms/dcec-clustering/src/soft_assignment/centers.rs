use crate::SoftAssignmentError;

use dcec::{Error, Float};
use ndarray::{Array2, ArrayBase, ArrayView1, ArrayView2, ArrayViewMut2, Data, Ix2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
/// The learned cluster centers, a matrix with shape `(n_clusters, n_features)`
///
/// The centers are owned by whoever trains them. Evaluating the clustering layer only borrows
/// them, while a training loop may overwrite them in place between two evaluations through
/// [`centers_mut`](ClusterCenters::centers_mut) or [`assign`](ClusterCenters::assign). The shape
/// is fixed at construction.
pub struct ClusterCenters<F> {
    centers: Array2<F>,
}

impl<F: Float> ClusterCenters<F> {
    /// Wrap a center matrix, one center per row
    ///
    /// Fails with [`SoftAssignmentError::NoClusters`] for a matrix without rows.
    pub fn new(centers: Array2<F>) -> Result<Self, SoftAssignmentError> {
        if centers.nrows() == 0 {
            return Err(SoftAssignmentError::NoClusters);
        }

        Ok(ClusterCenters { centers })
    }

    /// Centers which were produced by a routine that guarantees at least one row
    pub(crate) fn from_nonempty(centers: Array2<F>) -> Self {
        debug_assert!(centers.nrows() > 0);
        ClusterCenters { centers }
    }

    pub fn n_clusters(&self) -> usize {
        self.centers.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.centers.ncols()
    }

    /// Borrow the center matrix
    pub fn view(&self) -> ArrayView2<'_, F> {
        self.centers.view()
    }

    /// The center of cluster `idx`
    ///
    /// # Panics
    ///
    /// If `idx >= n_clusters`.
    pub fn center(&self, idx: usize) -> ArrayView1<'_, F> {
        self.centers.row(idx)
    }

    /// Mutable access for an external optimiser, the shape cannot change through it
    pub fn centers_mut(&mut self) -> ArrayViewMut2<'_, F> {
        self.centers.view_mut()
    }

    /// Overwrite all centers with new values of the same shape
    pub fn assign(
        &mut self,
        centers: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<(), SoftAssignmentError> {
        if centers.nrows() != self.n_clusters() {
            return Err(Error::shape_mismatch(
                "number of clusters",
                self.n_clusters(),
                centers.nrows(),
            )
            .into());
        }
        if centers.ncols() != self.n_features() {
            return Err(Error::shape_mismatch(
                "center dimension",
                self.n_features(),
                centers.ncols(),
            )
            .into());
        }

        self.centers.assign(centers);
        Ok(())
    }

    /// Release the center matrix
    pub fn into_inner(self) -> Array2<F> {
        self.centers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn empty_center_matrix_is_rejected() {
        let res = ClusterCenters::<f64>::new(Array2::zeros((0, 3)));
        assert!(matches!(res, Err(SoftAssignmentError::NoClusters)));
    }

    #[test]
    fn centers_are_mutable_in_place() {
        let mut centers = ClusterCenters::new(array![[0., 0.], [1., 1.]]).unwrap();
        centers.centers_mut().row_mut(1).fill(5.);

        assert_eq!(centers.center(1), array![5., 5.]);
        assert_eq!(centers.n_clusters(), 2);
        assert_eq!(centers.n_features(), 2);
    }

    #[test]
    fn assign_checks_shape() {
        let mut centers = ClusterCenters::new(array![[0., 0.], [1., 1.]]).unwrap();

        let res = centers.assign(&array![[0., 0., 0.], [1., 1., 1.]]);
        assert!(matches!(
            res,
            Err(SoftAssignmentError::BaseCrate(Error::ShapeMismatch {
                expected: 2,
                found: 3,
                ..
            }))
        ));

        centers.assign(&array![[2., 2.], [3., 3.]]).unwrap();
        assert_eq!(centers.into_inner(), array![[2., 2.], [3., 3.]]);
    }
}
