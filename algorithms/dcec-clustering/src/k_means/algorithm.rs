use crate::k_means::{KMeansError, KMeansParams, KMeansValidParams};
use crate::{ClusterCenters, ClusteringLayer};

use dcec::traits::{Fit, Predict, Transformer};
use dcec::{Error, Float, ParamGuard};
use ndarray::{Array1, Array2, ArrayBase, Data, DataMut, Ix1, Ix2, Zip};
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
/// K-means clustering of embeddings, used to place the initial cluster centers of the
/// clustering layer.
///
/// K-means partitions a set of unlabeled observations into clusters, where each observation
/// belongs to the cluster with the nearest mean (the *centroid*).
///
/// ## The algorithm
///
/// K-means is an iterative algorithm: it progressively refines the choice of centroids.
///
/// There are three steps in the standard algorithm:
/// - initialisation step: how do we choose our initial set of centroids?
/// - assignment step: assign each observation to the nearest cluster
///                    (minimum distance between the observation and the cluster's centroid);
/// - update step: recompute the centroid of each cluster.
///
/// Assignment and update are repeated until the squared euclidean distance between the old and
/// the new centroids is below `tolerance` or we exceed `max_iter`. The update step treats
/// the previous centroid as one more member of its cluster, so a cluster that loses all of its
/// observations keeps its previous centroid.
///
/// The assignment step does not require any coordination between observations and runs in
/// parallel thanks to the `rayon` feature in `ndarray`.
///
/// ## Example
///
/// ```
/// use dcec::traits::{Fit, Predict};
/// use dcec_clustering::{ClusterCenters, KMeans};
/// use dcec_datasets::generate;
/// use ndarray::array;
/// use ndarray_rand::rand::SeedableRng;
/// use rand_xoshiro::Xoshiro256Plus;
///
/// let mut rng = Xoshiro256Plus::seed_from_u64(42);
/// let expected_centroids = array![[0., 1.], [-10., 20.], [-1., 10.]];
/// let embeddings = generate::blobs(100, &expected_centroids, &mut rng);
///
/// let model = KMeans::params_with_rng(3, rng)
///     .n_init(4)
///     .fit(&embeddings)
///     .expect("KMeans fitted");
///
/// // Predict returns the index of the nearest centroid
/// let labels = model.predict(&embeddings);
/// assert_eq!(labels.len(), 300);
///
/// // The centroids seed the clustering layer
/// let centers: ClusterCenters<f64> = model.into();
/// assert_eq!(centers.n_clusters(), 3);
/// ```
pub struct KMeans<F: Float> {
    centroids: Array2<F>,
    cluster_count: Array1<F>,
    inertia: F,
}

impl<F: Float> KMeans<F> {
    /// Hyperparameters with a `Xoshiro256Plus` generator seeded with `42`
    pub fn params(n_clusters: usize) -> KMeansParams<F, Xoshiro256Plus> {
        KMeansParams::new(n_clusters, Xoshiro256Plus::seed_from_u64(42))
    }

    pub fn params_with_rng<R: Rng>(n_clusters: usize, rng: R) -> KMeansParams<F, R> {
        KMeansParams::new(n_clusters, rng)
    }

    /// Return the set of centroids as a 2-dimensional matrix with shape
    /// `(n_centroids, n_features)`.
    pub fn centroids(&self) -> &Array2<F> {
        &self.centroids
    }

    /// Return the number of training points belonging to each cluster
    pub fn cluster_count(&self) -> &Array1<F> {
        &self.cluster_count
    }

    /// Return the squared distance between each training point and its closest final
    /// centroid, averaged across all training points.
    pub fn inertia(&self) -> F {
        self.inertia
    }

    /// Hand the centroids over as the centers of a clustering layer
    pub fn into_centers(self) -> ClusterCenters<F> {
        ClusterCenters::from_nonempty(self.centroids)
    }
}

impl<F: Float> From<KMeans<F>> for ClusterCenters<F> {
    fn from(model: KMeans<F>) -> Self {
        model.into_centers()
    }
}

impl<F: Float, R: Rng + Clone, DA: Data<Elem = F> + Sync> Fit<ArrayBase<DA, Ix2>, KMeansError>
    for KMeansValidParams<F, R>
{
    type Object = KMeans<F>;

    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `fit` identifies `n_clusters` centroids based on the training data distribution.
    fn fit(&self, observations: &ArrayBase<DA, Ix2>) -> Result<Self::Object, KMeansError> {
        let n_samples = observations.nrows();
        if n_samples < self.n_clusters() {
            return Err(Error::NotEnoughSamples {
                found: n_samples,
                needed: self.n_clusters(),
            }
            .into());
        }

        let mut rng = self.rng().clone();
        let mut min_inertia = F::infinity();
        let mut best = None;
        let mut memberships = Array1::zeros(n_samples);
        let mut dists = Array1::zeros(n_samples);

        for run in 0..self.n_init() {
            let mut inertia = min_inertia;
            let mut centroids = self.init().run(self.n_clusters(), observations, &mut rng);
            let mut converged_iter: Option<usize> = None;

            for n_iter in 0..self.max_iter() {
                update_memberships_and_dists(
                    &centroids,
                    observations,
                    &mut memberships,
                    &mut dists,
                );
                let new_centroids = compute_centroids(&centroids, observations, &memberships);
                inertia = dists.sum();
                let distance = squared_distance(&centroids, &new_centroids);
                centroids = new_centroids;
                if distance < self.tolerance() {
                    converged_iter = Some(n_iter);
                    break;
                }
            }

            tracing::debug!(run, ?converged_iter, inertia = %inertia, "k-means run finished");

            // lowest inertia over all initialisations wins
            if inertia < min_inertia {
                min_inertia = inertia;
                best = Some((centroids, converged_iter));
            }
        }

        match best {
            Some((_, None)) => Err(KMeansError::NotConverged {
                n_init: self.n_init(),
                max_iter: self.max_iter(),
            }),
            Some((centroids, Some(_))) => {
                update_memberships_and_dists(
                    &centroids,
                    observations,
                    &mut memberships,
                    &mut dists,
                );
                let mut cluster_count = Array1::zeros(self.n_clusters());
                memberships
                    .iter()
                    .for_each(|&c| cluster_count[c] += F::one());

                Ok(KMeans {
                    centroids,
                    cluster_count,
                    inertia: dists.sum() / F::cast(n_samples),
                })
            }
            None => Err(KMeansError::NonFiniteInertia),
        }
    }
}

impl<F: Float, R: Rng + Clone> KMeansValidParams<F, R> {
    /// Run k-means on the embeddings of the training set and seed a clustering layer with the
    /// resulting centroids
    pub fn init_layer<DA: Data<Elem = F> + Sync>(
        &self,
        embeddings: &ArrayBase<DA, Ix2>,
    ) -> Result<ClusteringLayer<F>, KMeansError> {
        let model = self.fit(embeddings)?;
        tracing::debug!(
            n_clusters = self.n_clusters(),
            inertia = %model.inertia(),
            "seeding clustering layer"
        );

        Ok(ClusteringLayer::new(self.layer(), model.into_centers())?)
    }
}

impl<F: Float, R: Rng + Clone> KMeansParams<F, R> {
    /// Check the settings and seed a clustering layer, see [`KMeansValidParams::init_layer`]
    pub fn init_layer<DA: Data<Elem = F> + Sync>(
        &self,
        embeddings: &ArrayBase<DA, Ix2>,
    ) -> Result<ClusteringLayer<F>, KMeansError> {
        self.check_ref()?.init_layer(embeddings)
    }
}

impl<F: Float, DA: Data<Elem = F> + Sync> Transformer<&ArrayBase<DA, Ix2>, Array1<F>>
    for KMeans<F>
{
    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `transform` returns, for each observation, its squared distance to its centroid.
    fn transform(&self, observations: &ArrayBase<DA, Ix2>) -> Array1<F> {
        let mut dists = Array1::zeros(observations.nrows());
        update_min_dists(&self.centroids, observations, &mut dists);
        dists
    }
}

impl<F: Float, DA: Data<Elem = F> + Sync> Predict<&ArrayBase<DA, Ix2>, Array1<usize>>
    for KMeans<F>
{
    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `predict` returns, for each observation, the index of the closest cluster/centroid.
    ///
    /// # Panics
    ///
    /// If the feature dimension differs from the one of the centroids.
    fn predict(&self, observations: &ArrayBase<DA, Ix2>) -> Array1<usize> {
        assert_eq!(
            observations.ncols(),
            self.centroids.ncols(),
            "The number of features must match the dimension of the centroids."
        );

        let mut memberships = Array1::zeros(observations.nrows());
        let mut dists = Array1::zeros(observations.nrows());
        update_memberships_and_dists(
            &self.centroids,
            observations,
            &mut memberships,
            &mut dists,
        );
        memberships
    }
}

/// K-means is an iterative algorithm.
/// We will perform the assignment and update steps until we are satisfied
/// (according to our convergence criteria).
///
/// `compute_centroids` returns a 2-dimensional array,
/// where the i-th row corresponds to the i-th cluster.
fn compute_centroids<F: Float>(
    old_centroids: &Array2<F>,
    // (n_observations, n_features)
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    // (n_observations,)
    cluster_memberships: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Array2<F> {
    let n_clusters = old_centroids.nrows();
    let mut counts: Array1<usize> = Array1::ones(n_clusters);
    let mut centroids = Array2::zeros((n_clusters, observations.ncols()));

    Zip::from(observations.rows())
        .and(cluster_memberships)
        .for_each(|observation, &cluster_membership| {
            let mut centroid = centroids.row_mut(cluster_membership);
            centroid += &observation;
            counts[cluster_membership] += 1;
        });
    // m_k-means: Treat the old centroid like another point in the cluster
    centroids += old_centroids;

    Zip::from(centroids.rows_mut())
        .and(&counts)
        .for_each(|mut centroid, &cnt| centroid /= F::cast(cnt));
    centroids
}

fn squared_distance<F: Float>(a: &Array2<F>, b: &Array2<F>) -> F {
    Zip::from(a).and(b).fold(F::zero(), |acc, &x, &y| acc + (x - y) * (x - y))
}

// Updates `dists` with the distance of each observation from its closest centroid.
pub(crate) fn update_min_dists<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    dists: &mut ArrayBase<impl DataMut<Elem = F>, Ix1>,
) {
    Zip::from(observations.rows())
        .and(dists)
        .par_for_each(|observation, dist| *dist = closest_centroid(centroids, &observation).1);
}

// Updates `cluster_memberships` and `dists` with the closest centroid of each observation.
pub(crate) fn update_memberships_and_dists<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    cluster_memberships: &mut ArrayBase<impl DataMut<Elem = usize>, Ix1>,
    dists: &mut ArrayBase<impl DataMut<Elem = F>, Ix1>,
) {
    Zip::from(observations.rows())
        .and(cluster_memberships)
        .and(dists)
        .par_for_each(|observation, cluster_membership, dist| {
            let (m, d) = closest_centroid(centroids, &observation);
            *cluster_membership = m;
            *dist = d;
        });
}

/// Given a matrix of centroids with shape (n_centroids, n_features) and an observation,
/// return the index of the closest centroid (the index of the corresponding row in `centroids`)
/// and the squared euclidean distance to it.
pub(crate) fn closest_centroid<F: Float>(
    // (n_centroids, n_features)
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    // (n_features)
    observation: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> (usize, F) {
    let mut closest_index = 0;
    let mut minimum_distance = F::infinity();

    for (centroid_index, centroid) in centroids.rows().into_iter().enumerate() {
        let distance = centroid
            .iter()
            .zip(observation.iter())
            .map(|(a, b)| (*a - *b) * (*a - *b))
            .sum::<F>();
        if distance < minimum_distance {
            closest_index = centroid_index;
            minimum_distance = distance;
        }
    }
    (closest_index, minimum_distance)
}

#[cfg(test)]
mod tests {
    use super::super::KMeansInit;
    use super::*;
    use crate::KMeansParamsError;
    use approx::assert_abs_diff_eq;
    use dcec::metrics::cluster_accuracy;
    use dcec_datasets::generate;
    use ndarray::{array, concatenate, Array, Axis};
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;

    #[test]
    fn test_min_dists() {
        let centroids = array![[0.0, 1.0], [40.0, 10.0]];
        let observations = array![[3.0, 4.0], [1.0, 3.0], [25.0, 15.0]];
        let mut dists = Array1::zeros(observations.nrows());

        update_min_dists(&centroids, &observations, &mut dists);
        assert_abs_diff_eq!(dists, array![18.0, 5.0, 250.0]);
    }

    #[test]
    fn compute_centroids_works() {
        let cluster_size = 100;
        let n_features = 4;

        // Let's setup a synthetic set of observations, composed of two clusters with known means
        let cluster_1: Array2<f64> =
            Array::random((cluster_size, n_features), Uniform::new(-100., 100.));
        let memberships_1 = Array1::zeros(cluster_size);
        let expected_centroid_1 = cluster_1.sum_axis(Axis(0)) / (cluster_size + 1) as f64;

        let cluster_2: Array2<f64> =
            Array::random((cluster_size, n_features), Uniform::new(-100., 100.));
        let memberships_2 = Array1::ones(cluster_size);
        let expected_centroid_2 = cluster_2.sum_axis(Axis(0)) / (cluster_size + 1) as f64;

        let observations = concatenate(Axis(0), &[cluster_1.view(), cluster_2.view()]).unwrap();
        let memberships =
            concatenate(Axis(0), &[memberships_1.view(), memberships_2.view()]).unwrap();

        let old_centroids = Array2::zeros((2, n_features));
        let centroids = compute_centroids(&old_centroids, &observations, &memberships);
        assert_abs_diff_eq!(centroids.row(0), expected_centroid_1, epsilon = 1e-5);
        assert_abs_diff_eq!(centroids.row(1), expected_centroid_2, epsilon = 1e-5);
    }

    #[test]
    fn empty_cluster_keeps_its_centroid() {
        let observations = array![[1.0, 2.0]];
        let memberships = array![0];
        let old_centroids = Array2::ones((2, 2));
        let centroids = compute_centroids(&old_centroids, &observations, &memberships);
        assert_abs_diff_eq!(centroids, array![[1.0, 1.5], [1.0, 1.0]]);
    }

    #[test]
    fn oracle_test_for_closest_centroid() {
        let centroids = array![[0., 0.], [1., 2.], [20., 0.], [0., 20.],];
        let observations = array![[1., 0.6], [20., 2.], [20., 0.], [7., 20.],];
        let mut memberships = Array1::zeros(observations.nrows());
        let mut dists = Array1::zeros(observations.nrows());

        update_memberships_and_dists(&centroids, &observations, &mut memberships, &mut dists);
        assert_eq!(memberships, array![0, 2, 2, 3]);
    }

    #[test]
    fn recovers_blob_centers() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let expected_centroids = array![[0., 1.], [-10., 20.], [-1., 10.]];
        let data = generate::blobs(100, &expected_centroids, &mut rng);
        let labels = generate::blob_labels(100, 3);

        for init in &[KMeansInit::Random, KMeansInit::KMeansPlusPlus] {
            let model = KMeans::params_with_rng(3, rng.clone())
                .init(*init)
                .fit(&data)
                .expect("KMeans fitted");

            let predicted = model.predict(&data);
            assert!(cluster_accuracy(&labels, &predicted).unwrap() > 0.95);

            // every expected center has a fitted centroid close to it
            for expected in expected_centroids.rows() {
                let (_, dist) = closest_centroid(model.centroids(), &expected);
                assert!(dist < 0.5);
            }
            assert_abs_diff_eq!(model.cluster_count().sum(), 300.);

            let total_dist = model.transform(&data).sum();
            assert_abs_diff_eq!(model.inertia() * 300., total_dist, epsilon = 1e-5);
        }
    }

    #[test]
    fn not_enough_samples() {
        let data = array![[0., 0.], [1., 1.]];
        let res = KMeans::params(3).fit(&data);
        assert!(matches!(
            res,
            Err(KMeansError::BaseCrate(Error::NotEnoughSamples { found: 2, needed: 3 }))
        ));
    }

    #[test]
    fn invalid_params_are_reported_by_fit() {
        let data = array![[0., 0.], [1., 1.]];
        let res = KMeans::params(1).n_init(0).fit(&data);
        assert!(matches!(res, Err(KMeansError::InvalidParams(_))));
    }

    #[test]
    fn unconverged_fit_is_an_error() {
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let data: Array2<f64> = Array::random_using((200, 2), Uniform::new(0., 1.), &mut rng);
        let res = KMeans::params_with_rng(8, rng)
            .n_init(1)
            .max_iter(1)
            .tolerance(1e-12)
            .fit(&data);
        assert!(matches!(
            res,
            Err(KMeansError::NotConverged {
                n_init: 1,
                max_iter: 1
            })
        ));
    }

    #[test]
    fn nan_embeddings_have_no_inertia() {
        let data = array![[0., 0.], [f64::NAN, 1.], [10., 10.], [10.1, 10.]];
        let res = KMeans::params(2)
            .init(KMeansInit::Random)
            .n_init(2)
            .max_iter(5)
            .fit(&data);
        assert!(matches!(res, Err(KMeansError::NonFiniteInertia)));
    }

    #[test]
    fn seeds_clustering_layer() {
        let data = array![[0., 0.], [0.1, 0.], [10., 10.], [10.1, 10.]];
        let params = KMeans::params(2).check().unwrap();
        let centers: ClusterCenters<f64> = params.fit(&data).unwrap().into();

        assert_eq!(centers.n_clusters(), 2);
        assert_eq!(centers.n_features(), 2);
    }

    #[test]
    fn init_layer_takes_k_and_alpha_from_params() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let expected_centroids = array![[0., 1.], [-10., 20.], [-1., 10.]];
        let embeddings = generate::blobs(50, &expected_centroids, &mut rng);

        let layer = KMeans::params_with_rng(3, rng)
            .alpha(2.0)
            .init_layer(&embeddings)
            .unwrap();

        assert_eq!(layer.n_clusters(), 3);
        assert_eq!(layer.centers().n_features(), 2);
        assert_abs_diff_eq!(layer.alpha(), 2.0);

        // the most likely cluster of a blob center is the center seeded next to it
        let q = layer.transform(&expected_centroids).unwrap();
        for (row, expected) in q.rows().into_iter().zip(expected_centroids.rows()) {
            let best = argmax(&row);
            let (closest, _) = closest_centroid(&layer.centers().view(), &expected);
            assert_eq!(best, closest);
        }
    }

    #[test]
    fn init_layer_rejects_invalid_alpha() {
        let data = array![[0., 0.], [1., 1.]];
        let res = KMeans::params(2).alpha(-1.0).init_layer(&data);
        assert!(matches!(
            res,
            Err(KMeansError::InvalidParams(KMeansParamsError::Layer(_)))
        ));
    }

    fn argmax(row: &ndarray::ArrayView1<f64>) -> usize {
        row.iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (idx, &val)| {
                if val > best.1 {
                    (idx, val)
                } else {
                    best
                }
            })
            .0
    }
}
