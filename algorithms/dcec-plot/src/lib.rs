//! Figures for inspecting deep embedded clustering runs
//!
//! Every plot function writes a single file named `<stem>.<format>` into the output directory of
//! a [`PlotValidParams`] set and returns its path:
//!
//! * [`plot_pretrain_metrics`] and [`plot_train_metrics`] draw the CSV metric logs of the
//!   pretraining and clustering phases,
//! * [`plot_encoder_tsne`] embeds a batch of scans, labels it with k-means and draws a t-SNE map
//!   of the embeddings, [`plot_embedding_scatter`] draws points that are already projected,
//! * [`plot_confusion_matrix`] compares cluster labels with ground truth,
//! * [`plot_image_grid`] and [`plot_feature_maps`] show scans and encoder activations.
//!
//! Figures are SVG by default. PNG output rasterises text and needs the `ttf` feature.
//!
//! ```no_run
//! use dcec::ParamGuard;
//! use dcec_plot::{plot_train_metrics, PlotParams};
//!
//! let params = PlotParams::new("figures").check()?;
//! let [losses, scores] = plot_train_metrics("logs/train_metrics.csv", &params)?;
//! # Ok::<(), dcec_plot::PlotError>(())
//! ```
mod curves;
mod error;
mod grid;
mod heatmap;
mod hyperparams;
pub mod metrics_log;
mod render;
mod scatter;

pub use curves::{
    plot_pretrain_metrics, plot_pretrain_records, plot_train_metrics, plot_train_records,
};
pub use error::{PlotError, PlotParamsError, Result};
pub use grid::{plot_feature_maps, plot_image_grid};
pub use heatmap::{plot_confusion_matrix, ConfusionPlot};
pub use hyperparams::{ImageFormat, PlotParams, PlotValidParams};
pub use metrics_log::{PretrainRecord, TrainRecord};
pub use scatter::{plot_embedding_scatter, plot_encoder_tsne};
