//! Training curves from the metric logs
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::drawing;
use crate::metrics_log::{read_pretrain_log, read_train_log, PretrainRecord, TrainRecord};
use crate::render::{axis_range, caption_font, render, series_color, Figure};
use crate::{PlotError, PlotValidParams, Result};

struct Curve {
    label: &'static str,
    values: Vec<f64>,
}

struct Panel {
    title: &'static str,
    x_desc: &'static str,
    y_desc: &'static str,
    x: Vec<f64>,
    curves: Vec<Curve>,
}

/// Panels side by side in a single row
struct PanelRow {
    panels: Vec<Panel>,
}

impl Figure for PanelRow {
    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        params: &PlotValidParams,
    ) -> Result<()> {
        let areas = root.split_evenly((1, self.panels.len()));
        for (area, panel) in areas.iter().zip(&self.panels) {
            draw_panel(area, panel, params)?;
        }

        Ok(())
    }
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
    params: &PlotValidParams,
) -> Result<()> {
    let x_range =
        axis_range(panel.x.iter().copied()).ok_or(PlotError::EmptyData("curve positions"))?;
    let y_range = axis_range(panel.curves.iter().flat_map(|c| c.values.iter().copied()))
        .ok_or(PlotError::EmptyData("curve values"))?;

    let mut chart = ChartBuilder::on(area)
        .caption(panel.title, caption_font(params))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_range)
        .map_err(drawing)?;

    chart
        .configure_mesh()
        .x_desc(panel.x_desc)
        .y_desc(panel.y_desc)
        .draw()
        .map_err(drawing)?;

    for (idx, curve) in panel.curves.iter().enumerate() {
        let style = series_color(idx).stroke_width(2);
        let points = panel
            .x
            .iter()
            .copied()
            .zip(curve.values.iter().copied())
            .filter(|(x, y)| x.is_finite() && y.is_finite());

        chart
            .draw_series(LineSeries::new(points, style))
            .map_err(drawing)?
            .label(curve.label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.filled())
        .border_style(BLACK.stroke_width(1))
        .draw()
        .map_err(drawing)?;

    Ok(())
}

fn train_validation(train: Vec<f64>, validation: Vec<f64>) -> Vec<Curve> {
    vec![
        Curve {
            label: "Train",
            values: train,
        },
        Curve {
            label: "Validation",
            values: validation,
        },
    ]
}

/// Plot the training and validation loss of autoencoder pretraining against the epoch
///
/// Reads the CSV log at `log` and writes `pretrain_metrics.<format>`.
pub fn plot_pretrain_metrics<P: AsRef<Path>>(
    log: P,
    params: &PlotValidParams,
) -> Result<PathBuf> {
    let records = read_pretrain_log(log)?;
    plot_pretrain_records(&records, params)
}

/// Plot already parsed pretraining records, see [`plot_pretrain_metrics`]
pub fn plot_pretrain_records(
    records: &[PretrainRecord],
    params: &PlotValidParams,
) -> Result<PathBuf> {
    let figure = PanelRow {
        panels: vec![Panel {
            title: "Loss",
            x_desc: "Epoch",
            y_desc: "Loss",
            x: (0..records.len()).map(|epoch| epoch as f64).collect(),
            curves: vec![
                Curve {
                    label: "Training loss",
                    values: records.iter().map(|r| r.train_loss).collect(),
                },
                Curve {
                    label: "Validation loss",
                    values: records.iter().map(|r| r.val_loss).collect(),
                },
            ],
        }],
    };

    render(&figure, "pretrain_metrics", params)
}

/// Plot the metrics of the clustering phase against the logged iteration
///
/// Reads the CSV log at `log` and writes two figures of three panels each:
/// * `train_val_loss`: total loss, clustering loss and reconstruction loss,
/// * `train_val_acc_nmi_ari`: cluster accuracy, NMI and ARI.
///
/// Every panel compares the training with the validation split.
pub fn plot_train_metrics<P: AsRef<Path>>(
    log: P,
    params: &PlotValidParams,
) -> Result<[PathBuf; 2]> {
    let records = read_train_log(log)?;
    plot_train_records(&records, params)
}

/// Plot already parsed clustering records, see [`plot_train_metrics`]
pub fn plot_train_records(
    records: &[TrainRecord],
    params: &PlotValidParams,
) -> Result<[PathBuf; 2]> {
    let column = |f: fn(&TrainRecord) -> f64| records.iter().map(f).collect::<Vec<_>>();
    let panel = |title, y_desc, train: fn(&TrainRecord) -> f64, val: fn(&TrainRecord) -> f64| {
        Panel {
            title,
            x_desc: "Iteration",
            y_desc,
            x: column(|r| r.iteration),
            curves: train_validation(column(train), column(val)),
        }
    };

    let losses = PanelRow {
        panels: vec![
            panel("L", "Loss", |r| r.train_loss, |r| r.val_loss),
            panel(
                "Lc: clustering loss",
                "Loss",
                |r| r.clustering_loss,
                |r| r.val_clustering_loss,
            ),
            panel(
                "Lr: reconstruction loss",
                "Loss",
                |r| r.reconstruction_loss,
                |r| r.val_reconstruction_loss,
            ),
        ],
    };

    let scores = PanelRow {
        panels: vec![
            panel("Accuracy", "Acc", |r| r.train_acc, |r| r.val_acc),
            panel("NMI", "NMI", |r| r.train_nmi, |r| r.val_nmi),
            panel("ARI", "ARI", |r| r.train_ari, |r| r.val_ari),
        ],
    };

    Ok([
        render(&losses, "train_val_loss", params)?,
        render(&scores, "train_val_acc_nmi_ari", params)?,
    ])
}
