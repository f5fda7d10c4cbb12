use crate::{KMeansParamsError, SoftAssignmentParams};

use super::init::KMeansInit;
use dcec::{Float, ParamGuard};
use ndarray_rand::rand::Rng;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
/// Checked settings for seeding a [clustering layer](crate::ClusteringLayer) with
/// [k-means](crate::KMeans)
///
/// `n_clusters` is the number of rows of the resulting [`ClusterCenters`](crate::ClusterCenters),
/// i.e. the `K` of the layer.
pub struct KMeansValidParams<F: Float, R: Rng> {
    n_clusters: usize,
    n_init: usize,
    max_iter: usize,
    tolerance: F,
    init: KMeansInit,
    layer: SoftAssignmentParams<F>,
    rng: R,
}

impl<F: Float, R: Rng> KMeansValidParams<F, R> {
    /// Number of cluster centers handed to the layer
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Independent initialisations, the one with the lowest inertia wins
    pub fn n_init(&self) -> usize {
        self.n_init
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// A run has settled once its centroids move less than this (squared distance)
    pub fn tolerance(&self) -> F {
        self.tolerance
    }

    pub fn init(&self) -> KMeansInit {
        self.init
    }

    /// Degrees of freedom of the layer seeded from the centroids
    pub fn alpha(&self) -> F {
        self.layer.alpha_unchecked()
    }

    pub(crate) fn layer(&self) -> SoftAssignmentParams<F> {
        self.layer
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Builder for seeding a clustering layer with k-means
///
/// DCEC trains the autoencoder first and then runs k-means once on the embeddings of the whole
/// training set. The centroids become the centers of the clustering layer, so besides the
/// k-means settings this builder also carries the degrees of freedom of that layer.
///
/// | setting | default |
/// |---------|---------|
/// | `n_init` | 10 |
/// | `max_iter` | 300 |
/// | `tolerance` | 1e-4 |
/// | `init` | [`KMeansInit::KMeansPlusPlus`] |
/// | `alpha` | 1 |
///
/// ```
/// use dcec_clustering::KMeans;
/// use ndarray::array;
///
/// let embeddings = array![[0., 0.], [0.1, 0.], [10., 10.], [10.1, 10.]];
/// let layer = KMeans::params(2).alpha(1.0).init_layer(&embeddings)?;
///
/// assert_eq!(layer.n_clusters(), 2);
/// # Ok::<(), dcec_clustering::KMeansError>(())
/// ```
pub struct KMeansParams<F: Float, R: Rng>(KMeansValidParams<F, R>);

impl<F: Float, R: Rng> KMeansParams<F, R> {
    pub fn new(n_clusters: usize, rng: R) -> Self {
        Self(KMeansValidParams {
            n_clusters,
            n_init: 10,
            max_iter: 300,
            tolerance: F::cast(1e-4),
            init: KMeansInit::KMeansPlusPlus,
            layer: SoftAssignmentParams::new(),
            rng,
        })
    }

    pub fn n_init(mut self, n_init: usize) -> Self {
        self.0.n_init = n_init;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.0.max_iter = max_iter;
        self
    }

    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.0.tolerance = tolerance;
        self
    }

    pub fn init(mut self, init: KMeansInit) -> Self {
        self.0.init = init;
        self
    }

    /// Degrees of freedom of the Student's t kernel of the seeded layer
    pub fn alpha(mut self, alpha: F) -> Self {
        self.0.layer = self.0.layer.alpha(alpha);
        self
    }
}

impl<F: Float, R: Rng> ParamGuard for KMeansParams<F, R> {
    type Checked = KMeansValidParams<F, R>;
    type Error = KMeansParamsError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        let p = &self.0;
        if p.n_clusters == 0 {
            return Err(KMeansParamsError::NoClusters);
        }
        if p.n_init == 0 {
            return Err(KMeansParamsError::NoRestarts);
        }
        if !(p.tolerance > F::zero()) || !p.tolerance.is_finite() {
            return Err(KMeansParamsError::Tolerance);
        }
        if p.max_iter == 0 {
            return Err(KMeansParamsError::NoIterations);
        }
        p.layer.check_ref()?;

        Ok(p)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        KMeans, KMeansInit, KMeansParams, KMeansParamsError, KMeansValidParams,
        SoftAssignmentParamsError,
    };
    use dcec::ParamGuard;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<KMeansParams<f64, Xoshiro256Plus>>();
        has_autotraits::<KMeansValidParams<f64, Xoshiro256Plus>>();
    }

    #[test]
    fn layer_defaults() {
        let params = KMeans::<f32>::params(10).check().unwrap();

        assert_eq!(params.n_clusters(), 10);
        assert_eq!(params.n_init(), 10);
        assert_eq!(params.max_iter(), 300);
        assert_eq!(params.init(), KMeansInit::KMeansPlusPlus);
        assert_eq!(params.alpha(), 1.0);
    }

    #[test]
    fn layer_needs_a_cluster() {
        let res = KMeans::<f32>::params(0).check();
        assert!(matches!(res, Err(KMeansParamsError::NoClusters)));
    }

    #[test]
    fn tolerance_must_be_positive_and_finite() {
        for &tolerance in &[-1., 0., f64::NAN, f64::INFINITY] {
            let res = KMeans::params(1).tolerance(tolerance).check();
            assert!(matches!(res, Err(KMeansParamsError::Tolerance)));
        }
    }

    #[test]
    fn restarts_and_iterations_cannot_be_zero() {
        let res = KMeans::<f64>::params(1).n_init(0).check();
        assert!(matches!(res, Err(KMeansParamsError::NoRestarts)));

        let res = KMeans::<f64>::params(1).max_iter(0).check();
        assert!(matches!(res, Err(KMeansParamsError::NoIterations)));
    }

    #[test]
    fn layer_alpha_is_checked_with_kmeans() {
        let res = KMeans::params(3).alpha(0.0).check();
        assert!(matches!(
            res,
            Err(KMeansParamsError::Layer(SoftAssignmentParamsError::Alpha))
        ));

        let params = KMeans::params(3).alpha(5.0f64).check().unwrap();
        assert_eq!(params.alpha(), 5.0);
    }
}
