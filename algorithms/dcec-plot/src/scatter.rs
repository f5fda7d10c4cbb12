//! Scatter plots of projected embeddings
use std::collections::BTreeSet;
use std::fmt::Display;
use std::path::PathBuf;

use dcec::traits::{Embed, Fit, Predict, Transformer};
use dcec::{Error, Float, ParamGuard};
use dcec_clustering::KMeans;
use dcec_tsne::TSneParams;
use ndarray::{ArrayView1, ArrayView2, ArrayView3, Axis};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::drawing;
use crate::render::{axis_range, caption_font, render, series_color, to_f64, Figure};
use crate::{PlotError, PlotValidParams, Result};

struct Scatter {
    title: String,
    points: Vec<(f64, f64)>,
    labels: Vec<usize>,
}

impl Figure for Scatter {
    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        params: &PlotValidParams,
    ) -> Result<()> {
        let x_range = axis_range(self.points.iter().map(|p| p.0))
            .ok_or(PlotError::EmptyData("finite points"))?;
        let y_range = axis_range(self.points.iter().map(|p| p.1))
            .ok_or(PlotError::EmptyData("finite points"))?;

        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, caption_font(params))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range, y_range)
            .map_err(drawing)?;

        chart.configure_mesh().draw().map_err(drawing)?;

        let clusters = self.labels.iter().copied().collect::<BTreeSet<_>>();
        for cluster in clusters {
            let style = series_color(cluster).filled();
            let members = self
                .points
                .iter()
                .zip(&self.labels)
                .filter(|(p, label)| **label == cluster && p.0.is_finite() && p.1.is_finite())
                .map(|(&p, _)| Circle::new(p, 3, style));

            chart
                .draw_series(members)
                .map_err(drawing)?
                .label(format!("cluster {}", cluster))
                .legend(move |(x, y)| Circle::new((x, y), 3, style));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.filled())
            .border_style(BLACK.stroke_width(1))
            .draw()
            .map_err(drawing)?;

        Ok(())
    }
}

/// Scatter plot of points on a plane, coloured by their cluster label
///
/// `points` has shape `(n_samples, 2)`, `labels` one entry per sample. Writes
/// `<stem>.<format>` into the output directory.
pub fn plot_embedding_scatter<F: Float>(
    points: ArrayView2<F>,
    labels: ArrayView1<usize>,
    stem: &str,
    params: &PlotValidParams,
) -> Result<PathBuf> {
    scatter(points, labels, stem.to_string(), stem, params)
}

fn scatter<F: Float>(
    points: ArrayView2<F>,
    labels: ArrayView1<usize>,
    title: String,
    stem: &str,
    params: &PlotValidParams,
) -> Result<PathBuf> {
    if points.ncols() != 2 {
        return Err(Error::shape_mismatch("projected point coordinates", 2, points.ncols()).into());
    }
    if points.nrows() != labels.len() {
        return Err(Error::shape_mismatch("cluster labels", points.nrows(), labels.len()).into());
    }

    let figure = Scatter {
        title,
        points: points
            .rows()
            .into_iter()
            .map(|p| (to_f64(p[0]), to_f64(p[1])))
            .collect(),
        labels: labels.to_vec(),
    };

    render(&figure, stem, params)
}

/// Inspect the embedding space of an encoder
///
/// Embeds the `images` with shape `(n_samples, height, width)`, clusters the embeddings with
/// k-means into `n_clusters` groups and projects them with a two-dimensional t-SNE (perplexity
/// 30, so at least 91 images are needed). The projection is written as scatter plot coloured by
/// cluster into `tsne_encoder_<epoch>.<format>`.
pub fn plot_encoder_tsne<F, E, T>(
    encoder: &E,
    images: ArrayView3<F>,
    n_clusters: usize,
    epoch: T,
    params: &PlotValidParams,
) -> Result<PathBuf>
where
    F: Float,
    E: Embed<F>,
    T: Display,
{
    let embeddings = encoder.embed(images)?;
    if embeddings.nrows() != images.len_of(Axis(0)) {
        return Err(Error::shape_mismatch(
            "embedded samples",
            images.len_of(Axis(0)),
            embeddings.nrows(),
        )
        .into());
    }

    let tsne = TSneParams::<F, _>::new()
        .n_samples(embeddings.nrows())
        .check()?;
    let labels = KMeans::<F>::params(n_clusters)
        .fit(&embeddings)?
        .predict(&embeddings);
    let projected = tsne.transform(embeddings)?;

    scatter(
        projected.view(),
        labels.view(),
        format!("t-SNE of encoder embeddings, epoch {}", epoch),
        &format!("tsne_encoder_{}", epoch),
        params,
    )
}
