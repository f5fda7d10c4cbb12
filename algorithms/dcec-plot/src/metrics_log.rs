//! Metric logs written by the training loops
//!
//! Both logs are CSV files with a header row. Columns the readers do not know about (an unnamed
//! index column, extra metrics) are skipped. A blank cell, e.g. a validation metric that was
//! not computed in that step, is read as NaN and left out of the curves.
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{PlotError, Result};

/// One epoch of autoencoder pretraining
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PretrainRecord {
    #[serde(deserialize_with = "blank_as_nan")]
    pub train_loss: f64,
    #[serde(deserialize_with = "blank_as_nan")]
    pub val_loss: f64,
}

/// One evaluation step of the clustering phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainRecord {
    #[serde(deserialize_with = "blank_as_nan")]
    pub iteration: f64,
    #[serde(deserialize_with = "blank_as_nan")]
    pub train_loss: f64,
    #[serde(deserialize_with = "blank_as_nan")]
    pub val_loss: f64,
    #[serde(deserialize_with = "blank_as_nan")]
    pub clustering_loss: f64,
    #[serde(deserialize_with = "blank_as_nan")]
    pub val_clustering_loss: f64,
    #[serde(deserialize_with = "blank_as_nan")]
    pub reconstruction_loss: f64,
    #[serde(deserialize_with = "blank_as_nan")]
    pub val_reconstruction_loss: f64,
    #[serde(deserialize_with = "blank_as_nan")]
    pub train_acc: f64,
    #[serde(deserialize_with = "blank_as_nan")]
    pub val_acc: f64,
    #[serde(deserialize_with = "blank_as_nan")]
    pub train_nmi: f64,
    #[serde(deserialize_with = "blank_as_nan")]
    pub val_nmi: f64,
    #[serde(deserialize_with = "blank_as_nan")]
    pub train_ari: f64,
    #[serde(deserialize_with = "blank_as_nan")]
    pub val_ari: f64,
}

/// Read a pretraining log with `train_loss` and `val_loss` columns
pub fn read_pretrain_log<P: AsRef<Path>>(path: P) -> Result<Vec<PretrainRecord>> {
    read_log(path.as_ref())
}

/// Read a clustering log with an `iteration` column and train/validation columns of the
/// losses, accuracy, NMI and ARI
pub fn read_train_log<P: AsRef<Path>>(path: P) -> Result<Vec<TrainRecord>> {
    read_log(path.as_ref())
}

fn blank_as_nan<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

fn read_log<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, csv::Error>>()?;

    if records.is_empty() {
        return Err(PlotError::EmptyLog(path.to_path_buf()));
    }

    Ok(records)
}
