//! Projection of embeddings onto a two or three dimensional map with t-SNE.
//!
//! Deep embedded clustering works in an embedding space that is too large to look at. This crate
//! wraps the [bhtsne](https://github.com/frjnn/bhtsne) crate to project embeddings onto the
//! plane, where they can be scattered and coloured by their cluster.
mod algorithm;
mod error;
mod hyperparams;

pub use error::{Result, TSneError};
pub use hyperparams::{min_samples, TSneParams, TSneValidParams};
