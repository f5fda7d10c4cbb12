use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlotError>;

/// An error when checking the figure parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlotParamsError {
    #[error("figure width and height must be non-zero")]
    ZeroSize,
    #[error("caption font size must be non-zero")]
    ZeroFontSize,
    #[error("png output renders text and needs the `ttf` feature, use svg instead")]
    PngWithoutFonts,
}

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Invalid figure parameter: {0}")]
    InvalidParams(#[from] PlotParamsError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("could not read metric log: {0}")]
    Csv(#[from] csv::Error),
    #[error("metric log {0} contains no rows")]
    EmptyLog(PathBuf),
    #[error("nothing to draw: {0}")]
    EmptyData(&'static str),
    #[error("drawing failed: {0}")]
    Drawing(String),
    #[error(transparent)]
    Clustering(#[from] dcec_clustering::KMeansError),
    #[error(transparent)]
    Projection(#[from] dcec_tsne::TSneError),
    #[error(transparent)]
    BaseCrate(#[from] dcec::Error),
}

/// Flatten a backend specific drawing error into a [`PlotError`]
pub(crate) fn drawing<E: std::fmt::Display>(err: E) -> PlotError {
    PlotError::Drawing(err.to_string())
}
