//! `dcec-datasets` generates synthetic data to exercise the `dcec` workspace in tests and
//! benchmarks.
//!
//! Real scans and trained encoders are not shipped with the workspace. Instead the generators
//! produce well separated embedding blobs with known labels, and small single-channel images
//! whose intensity pattern depends on the class, so that a trivial feature extractor already
//! separates them.

pub mod generate;
