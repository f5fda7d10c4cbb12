use dcec::{traits::Transformer, Float};
use ndarray::Array2;
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::Normal;

use crate::hyperparams::{check_perplexity, TSneValidParams};
use crate::{Result, TSneError};

impl<F: Float, R: Rng + Clone> Transformer<Array2<F>, Result<Array2<F>>> for TSneValidParams<F, R> {
    /// Project embeddings with shape `(n_samples, n_features)` onto a map with shape
    /// `(n_samples, dims)`
    fn transform(&self, data: Array2<F>) -> Result<Array2<F>> {
        let (nsamples, nfeatures) = data.dim();

        if let Some(announced) = self.n_samples() {
            if announced != nsamples {
                return Err(dcec::Error::shape_mismatch("samples", announced, nsamples).into());
            }
        }
        if self.dims() > nfeatures {
            return Err(TSneError::DimsTooLarge {
                dims: self.dims(),
                features: nfeatures,
            });
        }
        check_perplexity(self.perplexity(), nsamples)?;

        let exaggeration_iter = self.exaggeration_iter() as u64;
        let mut data = data.as_standard_layout().into_owned().into_raw_vec();

        let mut rng = self.rng().clone();
        let normal = Normal::new(0.0, 1e-4)
            .map_err(|_| dcec::Error::Parameters("initial map distribution".to_string()))?;
        let mut map: Vec<F> = (0..nsamples * self.dims())
            .map(|_| F::cast(rng.sample(&normal)))
            .collect();

        bhtsne::run(
            &mut data,
            nsamples,
            nfeatures,
            &mut map,
            self.dims(),
            self.perplexity(),
            self.theta(),
            true,
            self.max_iter() as u64,
            exaggeration_iter,
            exaggeration_iter,
        );

        Array2::from_shape_vec((nsamples, self.dims()), map).map_err(TSneError::from)
    }
}

#[cfg(test)]
mod tests {
    use crate::{TSneError, TSneParams};
    use dcec::traits::Transformer;
    use dcec_datasets::generate;
    use ndarray::{array, Array2, Axis};
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn dims_larger_than_features() {
        let res = TSneParams::<f64, _>::new()
            .dims(3)
            .transform(Array2::<f64>::zeros((100, 2)));
        assert!(matches!(
            res,
            Err(TSneError::DimsTooLarge {
                dims: 3,
                features: 2
            })
        ));
    }

    #[test]
    fn batch_too_small_for_perplexity() {
        let res = TSneParams::<f64, _>::new().transform(Array2::<f64>::zeros((50, 4)));
        assert!(matches!(
            res,
            Err(TSneError::PerplexityTooLarge {
                needed: 91,
                found: 50,
                ..
            })
        ));
    }

    #[test]
    fn batch_must_match_announced_size() {
        let res = TSneParams::<f64, _>::new()
            .perplexity(5.0)
            .n_samples(40)
            .transform(Array2::<f64>::zeros((50, 4)));
        assert!(matches!(
            res,
            Err(TSneError::BaseCrate(dcec::Error::ShapeMismatch {
                expected: 40,
                found: 50,
                ..
            }))
        ));
    }

    #[test]
    fn blobs_stay_separated() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let centroids = array![[0., 0., 0., 0.], [50., 50., 50., 50.]];
        let embeddings = generate::blobs(30, &centroids, &mut rng);

        let projected = TSneParams::<f64, _>::with_rng(rng)
            .n_samples(60)
            .perplexity(5.0)
            .max_iter(500)
            .transform(embeddings)
            .unwrap();

        assert_eq!(projected.dim(), (60, 2));
        assert!(projected.iter().all(|x| x.is_finite()));

        // nearest neighbour on the map comes from the same blob
        let mut same_blob = 0;
        for (i, point) in projected.axis_iter(Axis(0)).enumerate() {
            let nearest = projected
                .axis_iter(Axis(0))
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(j, other)| {
                    let dist: f64 = (&point - &other).mapv(|x| x * x).sum();
                    (j, dist)
                })
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
                .unwrap()
                .0;
            if nearest / 30 == i / 30 {
                same_blob += 1;
            }
        }
        assert!(same_blob >= 57);
    }
}
