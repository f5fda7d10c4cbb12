//! `dcec-clustering` implements the clustering side of deep embedded clustering.
//!
//! ## The big picture
//!
//! A convolutional encoder maps every scan to an embedding. This crate takes it from there:
//! * [`KMeans`] places the initial cluster centers in the embedding space,
//! * the clustering layer ([`SoftAssignment`], [`ClusteringLayer`]) turns an embedding into a
//!   soft assignment over the centers with a Student's t kernel,
//! * the [`target`] module derives the sharpened self-training distribution and the
//!   Kullback-Leibler loss a training loop minimises.
//!
//! Updating the centers from the loss gradients is left to the training framework; the centers
//! are a plain matrix ([`ClusterCenters`]) the framework is free to overwrite between
//! evaluations.
mod k_means;
mod soft_assignment;
pub mod target;

pub use k_means::*;
pub use soft_assignment::*;
