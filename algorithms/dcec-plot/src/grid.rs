//! Greyscale mosaics of scans and feature maps
use std::path::PathBuf;

use dcec::{Error, Float};
use ndarray::{ArrayView2, ArrayView3, Axis};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::drawing;
use crate::render::{render, to_f64, Figure};
use crate::{PlotError, PlotValidParams, Result};

struct ImageGrid {
    /// Images scaled to `[0, 1]`, `None` for blank tiles
    tiles: Vec<Option<Vec<Vec<f64>>>>,
    rows: usize,
    cols: usize,
}

/// Scale an image to `[0, 1]` by its own minimum and maximum
///
/// Constant images become black, non-finite pixels are drawn black as well.
fn normalize<F: Float>(image: ArrayView2<F>) -> Vec<Vec<f64>> {
    let (min, max) = image
        .iter()
        .map(|&x| to_f64(x))
        .filter(|x| x.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), x| {
            (min.min(x), max.max(x))
        });
    let span = max - min;

    image
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .map(|&x| {
                    let x = to_f64(x);
                    if x.is_finite() && span > 0.0 {
                        (x - min) / span
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect()
}

impl Figure for ImageGrid {
    fn draw<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        _params: &PlotValidParams,
    ) -> Result<()> {
        let areas = root.margin(5, 5, 5, 5).split_evenly((self.rows, self.cols));

        for (area, tile) in areas.iter().zip(&self.tiles) {
            let pixels = match tile {
                Some(pixels) => pixels,
                None => continue,
            };
            let height = pixels.len();
            let width = pixels.first().map_or(0, |row| row.len());
            if height == 0 || width == 0 {
                continue;
            }

            let inner = area.margin(2, 2, 2, 2);
            let mut chart = ChartBuilder::on(&inner)
                .build_cartesian_2d(0.0..width as f64, 0.0..height as f64)
                .map_err(drawing)?;

            // first image row at the top
            chart
                .draw_series(pixels.iter().enumerate().flat_map(|(r, row)| {
                    let y = (height - r) as f64;
                    row.iter().enumerate().map(move |(c, &v)| {
                        let level = (v * 255.0).round() as u8;
                        Rectangle::new(
                            [(c as f64, y - 1.0), (c as f64 + 1.0, y)],
                            RGBColor(level, level, level).filled(),
                        )
                    })
                }))
                .map_err(drawing)?;
        }

        Ok(())
    }
}

/// Plot images with shape `(n_images, height, width)` as greyscale mosaic of `rows` x `cols`
/// tiles into `<stem>.<format>`
///
/// Tiles are filled row by row. Without enough images the remaining tiles stay blank, surplus
/// images are left out. Every image is scaled by its own intensity range.
pub fn plot_image_grid<F: Float>(
    images: ArrayView3<F>,
    rows: usize,
    cols: usize,
    stem: &str,
    params: &PlotValidParams,
) -> Result<PathBuf> {
    if rows == 0 || cols == 0 {
        return Err(Error::Parameters(format!(
            "image grid needs at least one tile, got {} x {}",
            rows, cols
        ))
        .into());
    }
    if images.len_of(Axis(0)) == 0 {
        return Err(PlotError::EmptyData("images"));
    }

    let mut tiles = images
        .outer_iter()
        .take(rows * cols)
        .map(|image| Some(normalize(image)))
        .collect::<Vec<_>>();
    tiles.resize(rows * cols, None);

    render(&ImageGrid { tiles, rows, cols }, stem, params)
}

/// Plot the channels of a single sample's feature maps with shape `(height, width, depth)`
///
/// The channels are laid out on a square grid with side `ceil(sqrt(depth))`, see
/// [`plot_image_grid`].
pub fn plot_feature_maps<F: Float>(
    maps: ArrayView3<F>,
    stem: &str,
    params: &PlotValidParams,
) -> Result<PathBuf> {
    let depth = maps.len_of(Axis(2));
    let side = grid_side(depth);

    plot_image_grid(maps.permuted_axes([2, 0, 1]), side, side, stem, params)
}

/// Smallest side of a square grid with at least `n` tiles
fn grid_side(n: usize) -> usize {
    let mut side = (n as f64).sqrt() as usize;
    while side * side < n {
        side += 1;
    }

    side
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlotParams;
    use approx::assert_abs_diff_eq;
    use dcec::ParamGuard;
    use dcec_datasets::generate;
    use ndarray::{array, Array3};
    use rand_xoshiro::rand_core::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;
    use std::fs;

    #[test]
    fn square_grid_sides() {
        assert_eq!(grid_side(1), 1);
        assert_eq!(grid_side(4), 2);
        assert_eq!(grid_side(5), 3);
        assert_eq!(grid_side(32), 6);
        assert_eq!(grid_side(64), 8);
    }

    #[test]
    fn images_are_scaled_to_unit_range() {
        let image = array![[2.0, 4.0], [6.0, f64::NAN]];
        let scaled = normalize(image.view());

        assert_abs_diff_eq!(scaled[0][0], 0.0);
        assert_abs_diff_eq!(scaled[0][1], 0.5);
        assert_abs_diff_eq!(scaled[1][0], 1.0);
        assert_abs_diff_eq!(scaled[1][1], 0.0);

        let constant = normalize(Array3::<f32>::ones((1, 2, 2)).index_axis(Axis(0), 0));
        assert!(constant.iter().flatten().all(|&x| x == 0.0));
    }

    #[test]
    fn scan_mosaic_is_written() {
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let (scans, _) = generate::scans(3, 2, 8, &mut rng);

        let dir = tempfile::tempdir().unwrap();
        let params = PlotParams::new(dir.path().join("scans")).check().unwrap();

        // six scans on a 3 x 3 grid leave three blank tiles
        let path = plot_image_grid(scans.view(), 3, 3, "scans", &params).unwrap();

        assert_eq!(path, dir.path().join("scans").join("scans.svg"));
        let svg = fs::read_to_string(path).unwrap();
        assert!(svg.contains("<rect"));
    }

    #[test]
    fn grid_needs_tiles_and_images() {
        let dir = tempfile::tempdir().unwrap();
        let params = PlotParams::new(dir.path()).check().unwrap();
        let images = Array3::<f64>::zeros((2, 4, 4));

        assert!(matches!(
            plot_image_grid(images.view(), 0, 2, "grid", &params),
            Err(PlotError::BaseCrate(Error::Parameters(_)))
        ));
        assert!(matches!(
            plot_image_grid(Array3::<f64>::zeros((0, 4, 4)).view(), 2, 2, "grid", &params),
            Err(PlotError::EmptyData(_))
        ));
    }

    #[test]
    fn feature_maps_fill_a_square() {
        let dir = tempfile::tempdir().unwrap();
        let params = PlotParams::new(dir.path()).check().unwrap();

        let maps = Array3::from_shape_fn((6, 6, 5), |(r, c, k)| (r * c + k) as f32);
        let path = plot_feature_maps(maps.view(), "encoder_feature_maps", &params).unwrap();

        assert!(path.ends_with("encoder_feature_maps.svg"));
        assert!(fs::metadata(path).unwrap().len() > 0);
    }
}
