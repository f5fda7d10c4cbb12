use super::algorithm::update_min_dists;
use dcec::Float;
use ndarray::{s, Array1, Array2, ArrayBase, Axis, Data, Ix2};
use ndarray_rand::rand;
use ndarray_rand::rand::distributions::{Distribution, WeightedIndex};
use ndarray_rand::rand::Rng;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
/// Specifies centroid initialization algorithm for k-means.
pub enum KMeansInit {
    /// Pick random points as centroids.
    Random,
    /// K-means++ algorithm. Using this over random initialization causes K-means to converge
    /// faster for almost all cases, since K-means++ produces better centroids.
    KMeansPlusPlus,
}

impl KMeansInit {
    /// Runs the chosen initialization routine
    pub(crate) fn run<F: Float>(
        &self,
        n_clusters: usize,
        observations: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
        rng: &mut impl Rng,
    ) -> Array2<F> {
        match self {
            Self::Random => random_init(n_clusters, observations, rng),
            Self::KMeansPlusPlus => k_means_plusplus(n_clusters, observations, rng),
        }
    }
}

/// Pick random points from the input matrix as centroids
fn random_init<F: Float>(
    n_clusters: usize,
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    rng: &mut impl Rng,
) -> Array2<F> {
    let (n_samples, _) = observations.dim();
    let indices = rand::seq::index::sample(rng, n_samples, n_clusters).into_vec();
    observations.select(Axis(0), &indices)
}

/// Selects centroids using the KMeans++ initialization algorithm. The weights determine the
/// likeliness of an input point to be selected as a centroid relative to other points. The higher
/// the weight, the more likely the point will be selected as a centroid.
fn k_means_plusplus<F: Float>(
    n_clusters: usize,
    observations: &ArrayBase<impl Data<Elem = F> + Sync, Ix2>,
    rng: &mut impl Rng,
) -> Array2<F> {
    let (n_samples, n_features) = observations.dim();
    let mut centroids = Array2::zeros((n_clusters, n_features));
    let first_idx = rng.gen_range(0..n_samples);
    centroids.row_mut(0).assign(&observations.row(first_idx));

    let mut dists = Array1::zeros(n_samples);
    for c_cnt in 1..n_clusters {
        update_min_dists(
            &centroids.slice(s![0..c_cnt, ..]),
            observations,
            &mut dists,
        );

        // all remaining points coincide with a centroid, any of them will do
        let centroid_idx = match WeightedIndex::<F>::new(dists.iter()) {
            Ok(weights) => weights.sample(rng),
            Err(_) => rng.gen_range(0..n_samples),
        };
        centroids
            .row_mut(c_cnt)
            .assign(&observations.row(centroid_idx));
    }
    centroids
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn random_init_picks_distinct_observations() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let obs = array![[0., 0.], [1., 1.], [2., 2.], [3., 3.]];
        let centroids = KMeansInit::Random.run(3, &obs, &mut rng);

        assert_eq!(centroids.dim(), (3, 2));
        for (i, a) in centroids.rows().into_iter().enumerate() {
            assert!(obs.rows().into_iter().any(|row| row == a));
            for b in centroids.rows().into_iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn plusplus_spreads_centroids() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        // two far apart groups, k-means++ puts one centroid in each
        let obs = array![[0., 0.], [0.1, 0.], [0., 0.1], [100., 100.], [100.1, 100.]];
        let centroids = KMeansInit::KMeansPlusPlus.run(2, &obs, &mut rng);

        let near_origin = centroids.rows().into_iter().filter(|c| c[0] < 50.).count();
        assert_eq!(near_origin, 1);
    }

    #[test]
    fn plusplus_handles_duplicate_points() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let obs = Array2::<f64>::ones((5, 2));
        let centroids = KMeansInit::KMeansPlusPlus.run(3, &obs, &mut rng);

        assert_eq!(centroids, Array2::ones((3, 2)));
    }
}
