use crate::SoftAssignmentParamsError;

use dcec::{Float, ParamGuard};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
/// The checked set of hyperparameters of the [soft assignment](crate::SoftAssignment).
pub struct SoftAssignmentValidParams<F: Float> {
    /// Degrees of freedom of the Student's t-distribution
    alpha: F,
}

impl<F: Float> SoftAssignmentValidParams<F> {
    /// Degrees of freedom of the Student's t-distribution
    pub fn alpha(&self) -> F {
        self.alpha
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
/// An helper struct used to construct a set of [valid hyperparameters](SoftAssignmentValidParams)
/// for the [soft assignment](crate::SoftAssignment) (using the builder pattern).
pub struct SoftAssignmentParams<F: Float>(SoftAssignmentValidParams<F>);

impl<F: Float> Default for SoftAssignmentParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> SoftAssignmentParams<F> {
    /// Defaults to `alpha = 1.0`, the Cauchy kernel used by t-SNE
    pub fn new() -> Self {
        Self(SoftAssignmentValidParams { alpha: F::one() })
    }

    /// Change the degrees of freedom of the kernel
    pub fn alpha(mut self, alpha: F) -> Self {
        self.0.alpha = alpha;
        self
    }

    pub(crate) fn alpha_unchecked(&self) -> F {
        self.0.alpha
    }
}

impl<F: Float> ParamGuard for SoftAssignmentParams<F> {
    type Checked = SoftAssignmentValidParams<F>;
    type Error = SoftAssignmentParamsError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        // also rejects NaN, which fails every comparison
        if !(self.0.alpha > F::zero()) || !self.0.alpha.is_finite() {
            Err(SoftAssignmentParamsError::Alpha)
        } else {
            Ok(&self.0)
        }
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
        has_autotraits::<SoftAssignmentParams<f64>>();
        has_autotraits::<SoftAssignmentValidParams<f64>>();
    }

    #[test]
    fn default_alpha_is_one() {
        let params = SoftAssignmentParams::<f64>::default().check().unwrap();
        assert_eq!(params.alpha(), 1.0);
    }

    #[test]
    fn alpha_cannot_be_zero() {
        let res = SoftAssignmentParams::new().alpha(0.0f32).check();
        assert_eq!(res, Err(SoftAssignmentParamsError::Alpha));
    }

    #[test]
    fn alpha_cannot_be_negative() {
        let res = SoftAssignmentParams::new().alpha(-2.0).check();
        assert_eq!(res, Err(SoftAssignmentParamsError::Alpha));
    }

    #[test]
    fn alpha_cannot_be_nan_or_infinite() {
        assert!(SoftAssignmentParams::new().alpha(f64::NAN).check().is_err());
        assert!(SoftAssignmentParams::new()
            .alpha(f64::INFINITY)
            .check()
            .is_err());
    }
}
