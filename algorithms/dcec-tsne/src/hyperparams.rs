use dcec::{Float, ParamGuard};
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use crate::TSneError;

/// Checked settings of a t-SNE map
///
/// Obtained from [`TSneParams`] through [`ParamGuard`]. The map is computed by transforming an
/// embedding matrix with shape `(n_samples, n_features)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TSneValidParams<F, R> {
    dims: usize,
    perplexity: F,
    theta: F,
    max_iter: usize,
    exaggeration_iter: Option<usize>,
    n_samples: Option<usize>,
    rng: R,
}

impl<F: Float, R> TSneValidParams<F, R> {
    /// Dimensionality of the map
    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn perplexity(&self) -> F {
        self.perplexity
    }

    /// Barnes-Hut threshold, `0` computes the exact gradient
    pub fn theta(&self) -> F {
        self.theta
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Iterations with exaggerated input affinities and low momentum
    ///
    /// Unless set explicitly this is half of `max_iter`, capped at 250.
    pub fn exaggeration_iter(&self) -> usize {
        self.exaggeration_iter
            .unwrap_or_else(|| usize::min(self.max_iter / 2, 250))
    }

    /// Number of samples the settings were checked against, if announced
    pub fn n_samples(&self) -> Option<usize> {
        self.n_samples
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }
}

/// Builder for the t-SNE map of clustering embeddings
///
/// The encoder figures place every embedding on the plane, so the defaults describe a planar
/// map:
///
/// | setting | default |
/// |---------|---------|
/// | `dims` | 2 |
/// | `perplexity` | 30 |
/// | `theta` | 0.5 |
/// | `max_iter` | 1000 |
/// | `rng` | `Xoshiro256Plus` seeded with 42 |
///
/// Every point needs `3 * perplexity` neighbours. Announcing the batch size with
/// [`n_samples`](TSneParams::n_samples) lets [`ParamGuard::check`] reject a perplexity that is
/// too large before any work is done; the transformation checks the actual batch in any case.
///
/// ```no_run
/// use dcec::traits::Transformer;
/// use dcec_tsne::TSneParams;
/// use ndarray::Array2;
///
/// let embeddings = Array2::<f64>::zeros((200, 10));
///
/// let map = TSneParams::new()
///     .n_samples(embeddings.nrows())
///     .perplexity(20.0)
///     .transform(embeddings)?;
/// assert_eq!(map.ncols(), 2);
/// # Ok::<(), dcec_tsne::TSneError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TSneParams<F, R>(TSneValidParams<F, R>);

impl<F: Float> TSneParams<F, Xoshiro256Plus> {
    pub fn new() -> Self {
        Self::with_rng(Xoshiro256Plus::seed_from_u64(42))
    }
}

impl<F: Float> Default for TSneParams<F, Xoshiro256Plus> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float, R: Rng + Clone> TSneParams<F, R> {
    /// Default settings drawing the initial map from `rng`
    pub fn with_rng(rng: R) -> Self {
        Self(TSneValidParams {
            dims: 2,
            perplexity: F::cast(30.0),
            theta: F::cast(0.5),
            max_iter: 1000,
            exaggeration_iter: None,
            n_samples: None,
            rng,
        })
    }

    pub fn dims(mut self, dims: usize) -> Self {
        self.0.dims = dims;
        self
    }

    /// Effective number of neighbours each point keeps in the map
    pub fn perplexity(mut self, perplexity: F) -> Self {
        self.0.perplexity = perplexity;
        self
    }

    pub fn theta(mut self, theta: F) -> Self {
        self.0.theta = theta;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.0.max_iter = max_iter;
        self
    }

    pub fn exaggeration_iter(mut self, exaggeration_iter: usize) -> Self {
        self.0.exaggeration_iter = Some(exaggeration_iter);
        self
    }

    /// Announce the number of embeddings the map will be drawn from
    pub fn n_samples(mut self, n_samples: usize) -> Self {
        self.0.n_samples = Some(n_samples);
        self
    }
}

/// Smallest batch a map with the given perplexity can be drawn from
pub fn min_samples<F: Float>(perplexity: F) -> usize {
    (F::cast(3.0) * perplexity).ceil().as_() + 1
}

/// Rejects a perplexity that `n_samples` points cannot support
pub(crate) fn check_perplexity<F: Float>(perplexity: F, n_samples: usize) -> Result<(), TSneError> {
    let needed = min_samples(perplexity);
    if n_samples < needed {
        return Err(TSneError::PerplexityTooLarge {
            perplexity: perplexity.to_f64().unwrap_or(f64::NAN),
            needed,
            found: n_samples,
        });
    }

    Ok(())
}

impl<F: Float, R> ParamGuard for TSneParams<F, R> {
    type Checked = TSneValidParams<F, R>;
    type Error = TSneError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        let p = &self.0;
        if p.dims == 0 || p.dims > 3 {
            return Err(TSneError::Dims(p.dims));
        }
        if !(p.perplexity > F::zero()) || !p.perplexity.is_finite() {
            return Err(TSneError::Perplexity);
        }
        if !(p.theta >= F::zero()) || !p.theta.is_finite() {
            return Err(TSneError::Theta);
        }
        if p.max_iter == 0 {
            return Err(TSneError::NoIterations);
        }
        if let Some(exaggeration) = p.exaggeration_iter {
            if exaggeration > p.max_iter {
                return Err(TSneError::ExaggerationIter {
                    exaggeration,
                    total: p.max_iter,
                });
            }
        }
        if let Some(n_samples) = p.n_samples {
            check_perplexity(p.perplexity, n_samples)?;
        }

        Ok(p)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<TSneParams<f64, Xoshiro256Plus>>();
        has_autotraits::<TSneValidParams<f64, Xoshiro256Plus>>();
        has_autotraits::<TSneError>();
    }

    #[test]
    fn planar_defaults() {
        let params = TSneParams::<f64, _>::new().check().unwrap();

        assert_eq!(params.dims(), 2);
        assert_eq!(params.max_iter(), 1000);
        assert_eq!(params.exaggeration_iter(), 250);
        assert_eq!(params.n_samples(), None);
    }

    #[test]
    fn exaggeration_follows_short_runs() {
        let params = TSneParams::<f64, _>::new().max_iter(300).check().unwrap();
        assert_eq!(params.exaggeration_iter(), 150);
    }

    #[test]
    fn map_dims_are_bounded() {
        for dims in &[0, 4] {
            let res = TSneParams::<f64, _>::new().dims(*dims).check();
            assert!(matches!(res, Err(TSneError::Dims(d)) if d == *dims));
        }
        assert!(TSneParams::<f64, _>::new().dims(3).check().is_ok());
    }

    #[test]
    fn perplexity_must_be_positive() {
        for &perplexity in &[0.0, -10.0, f64::NAN, f64::INFINITY] {
            let res = TSneParams::new().perplexity(perplexity).check();
            assert!(matches!(res, Err(TSneError::Perplexity)));
        }
    }

    #[test]
    fn theta_cannot_be_negative() {
        let res = TSneParams::new().theta(-1.0f32).check();
        assert!(matches!(res, Err(TSneError::Theta)));
        assert!(TSneParams::new().theta(0.0f32).check().is_ok());
    }

    #[test]
    fn exaggeration_cannot_exceed_max_iter() {
        let res = TSneParams::<f64, _>::new()
            .max_iter(100)
            .exaggeration_iter(200)
            .check();
        assert!(matches!(
            res,
            Err(TSneError::ExaggerationIter {
                exaggeration: 200,
                total: 100
            })
        ));

        let res = TSneParams::<f64, _>::new().max_iter(0).check();
        assert!(matches!(res, Err(TSneError::NoIterations)));
    }

    #[test]
    fn announced_batch_limits_perplexity() {
        assert_eq!(min_samples(30.0f64), 91);
        assert_eq!(min_samples(2.5f32), 9);

        let res = TSneParams::<f64, _>::new().n_samples(90).check();
        assert!(matches!(
            res,
            Err(TSneError::PerplexityTooLarge {
                needed: 91,
                found: 90,
                ..
            })
        ));

        assert!(TSneParams::<f64, _>::new().n_samples(91).check().is_ok());
        assert!(TSneParams::new().perplexity(5.0).n_samples(16).check().is_ok());
    }
}
