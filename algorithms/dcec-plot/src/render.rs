use std::fs;
use std::ops::Range;
use std::path::PathBuf;

use num_traits::ToPrimitive;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::drawing;
use crate::{ImageFormat, PlotValidParams, Result};

/// Something that can be drawn onto a drawing area of any backend
pub(crate) trait Figure {
    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        params: &PlotValidParams,
    ) -> Result<()>;
}

/// Draw `figure` into the file `<stem>.<format>` of the output directory
///
/// The output directory is created when it does not exist yet. Returns the path of the written
/// file.
pub(crate) fn render<G: Figure>(
    figure: &G,
    stem: &str,
    params: &PlotValidParams,
) -> Result<PathBuf> {
    fs::create_dir_all(params.output_dir())?;
    let path = params.output_path(stem);

    match params.format() {
        ImageFormat::Svg => {
            let root = SVGBackend::new(&path, params.size()).into_drawing_area();
            draw_on(figure, &root, params)?;
        }
        ImageFormat::Png => {
            let root = BitMapBackend::new(&path, params.size()).into_drawing_area();
            draw_on(figure, &root, params)?;
        }
    }

    tracing::info!(path = %path.display(), "wrote figure");

    Ok(path)
}

fn draw_on<G: Figure, DB: DrawingBackend>(
    figure: &G,
    root: &DrawingArea<DB, Shift>,
    params: &PlotValidParams,
) -> Result<()> {
    root.fill(&WHITE).map_err(drawing)?;
    figure.draw(root, params)?;
    root.present().map_err(drawing)
}

/// Axis range covering all finite values with a small margin
///
/// Returns `None` if there is no finite value at all.
pub(crate) fn axis_range<I: IntoIterator<Item = f64>>(values: I) -> Option<Range<f64>> {
    let (min, max) = values
        .into_iter()
        .filter(|x| x.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, x| match acc {
            None => Some((x, x)),
            Some((min, max)) => Some((min.min(x), max.max(x))),
        })?;

    let margin = if max > min {
        (max - min) * 0.05
    } else {
        f64::max(min.abs() * 0.05, 0.5)
    };

    Some(min - margin..max + margin)
}

pub(crate) fn to_f64<F: ToPrimitive>(x: F) -> f64 {
    x.to_f64().unwrap_or(f64::NAN)
}

pub(crate) fn caption_font(params: &PlotValidParams) -> FontDesc<'static> {
    ("sans-serif", f64::from(params.caption_size())).into_font()
}

/// Distinct colour of a series or cluster
pub(crate) fn series_color(idx: usize) -> RGBAColor {
    Palette99::pick(idx).to_rgba()
}
