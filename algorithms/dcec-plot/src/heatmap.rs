//! Confusion matrix of true labels against cluster labels
use std::path::PathBuf;

use dcec::metrics::ConfusionMatrix;
use ndarray::{ArrayBase, Data, Ix1};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::error::drawing;
use crate::render::{caption_font, render, Figure};
use crate::{PlotValidParams, Result};

/// Written confusion matrix figure
#[derive(Debug, Clone)]
pub struct ConfusionPlot {
    /// Path of the figure
    pub path: PathBuf,
    pub matrix: ConfusionMatrix,
    /// Best one-to-one `(cluster label, true label)` assignment
    pub mapping: Vec<(usize, usize)>,
}

struct Heatmap<'a> {
    matrix: &'a ConfusionMatrix,
}

/// Fill colour of a cell, white for empty cells and dark blue for the largest count
fn cell_color(count: usize, max: usize) -> RGBColor {
    let t = if max == 0 {
        0.0
    } else {
        count as f64 / max as f64
    };
    let mix = |from: f64, to: f64| (from + (to - from) * t).round() as u8;

    RGBColor(mix(247.0, 8.0), mix(251.0, 48.0), mix(255.0, 107.0))
}

impl<'a> Figure for Heatmap<'a> {
    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        params: &PlotValidParams,
    ) -> Result<()> {
        let counts = self.matrix.matrix();
        let n = self.matrix.n_labels();
        let max = counts.iter().copied().max().unwrap_or(0);
        let last = n as f64 - 1.0;

        // cell (i, j) is centered on (j, last - i) so that true label 0 is the top row
        let mut chart = ChartBuilder::on(root)
            .caption("Confusion matrix", caption_font(params))
            .margin(10)
            .x_label_area_size(50)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5..last + 0.5, -0.5..last + 0.5)
            .map_err(drawing)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(n)
            .y_labels(n)
            .x_label_formatter(&|x| format!("{:.0}", x))
            .y_label_formatter(&|y| format!("{:.0}", last - y))
            .x_desc("Clustering label")
            .y_desc("True label")
            .draw()
            .map_err(drawing)?;

        chart
            .draw_series(counts.indexed_iter().map(|((i, j), &count)| {
                let (x, y) = (j as f64, last - i as f64);
                Rectangle::new(
                    [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                    cell_color(count, max).filled(),
                )
            }))
            .map_err(drawing)?;

        let font_size = f64::from(params.caption_size()) * 0.8;
        chart
            .draw_series(counts.indexed_iter().map(|((i, j), &count)| {
                // light text on dark cells
                let color = if 2 * count > max { WHITE } else { BLACK };
                let style = ("sans-serif", font_size)
                    .into_font()
                    .color(&color)
                    .pos(Pos::new(HPos::Center, VPos::Center));

                Text::new(count.to_string(), (j as f64, last - i as f64), style)
            }))
            .map_err(drawing)?;

        Ok(())
    }
}

/// Plot the confusion matrix of true labels (rows) against cluster labels (columns) as an
/// annotated heatmap into `confusion_matrix.<format>`
///
/// Cluster labels carry no meaning of their own, so the best one-to-one mapping from cluster
/// label to true label is computed as well and returned with the matrix.
pub fn plot_confusion_matrix(
    y_true: &ArrayBase<impl Data<Elem = usize>, Ix1>,
    y_pred: &ArrayBase<impl Data<Elem = usize>, Ix1>,
    params: &PlotValidParams,
) -> Result<ConfusionPlot> {
    let matrix = ConfusionMatrix::new(y_true, y_pred)?;
    let mapping = matrix.best_mapping();
    tracing::debug!(?mapping, "best mapping of cluster labels to true labels");

    let path = render(&Heatmap { matrix: &matrix }, "confusion_matrix", params)?;

    Ok(ConfusionPlot {
        path,
        matrix,
        mapping,
    })
}
