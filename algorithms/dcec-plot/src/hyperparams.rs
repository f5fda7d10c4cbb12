use std::path::{Path, PathBuf};

use dcec::ParamGuard;
use serde::{Deserialize, Serialize};

use crate::PlotParamsError;

/// File format of the written figures
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Svg,
    Png,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
        }
    }
}

/// Verified figure settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotValidParams {
    output_dir: PathBuf,
    format: ImageFormat,
    width: u32,
    height: u32,
    caption_size: u32,
}

impl PlotValidParams {
    /// Directory all figures are written into
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Figure size in pixels, `(width, height)`
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn caption_size(&self) -> u32 {
        self.caption_size
    }

    /// Path of the figure with file stem `stem` in the output directory
    pub fn output_path(&self, stem: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", stem, self.format.extension()))
    }
}

/// Builder for the figure settings shared by every plot function
///
/// ```
/// use dcec::ParamGuard;
/// use dcec_plot::{ImageFormat, PlotParams};
///
/// let params = PlotParams::new("figures/run-3")
///     .format(ImageFormat::Svg)
///     .size(1200, 400)
///     .check()
///     .unwrap();
///
/// assert!(params.output_path("pretrain_metrics").ends_with("pretrain_metrics.svg"));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotParams(PlotValidParams);

impl Default for PlotParams {
    fn default() -> Self {
        Self::new("figures")
    }
}

impl PlotParams {
    /// Figure settings writing into `output_dir`
    ///
    /// # Defaults to:
    ///  * `format`: svg
    ///  * `size`: 800 x 600
    ///  * `caption_size`: 20
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self(PlotValidParams {
            output_dir: output_dir.into(),
            format: ImageFormat::Svg,
            width: 800,
            height: 600,
            caption_size: 20,
        })
    }

    pub fn format(mut self, format: ImageFormat) -> Self {
        self.0.format = format;
        self
    }

    /// Set the figure size in pixels
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.0.width = width;
        self.0.height = height;
        self
    }

    /// Set the font size of figure and panel captions
    pub fn caption_size(mut self, caption_size: u32) -> Self {
        self.0.caption_size = caption_size;
        self
    }
}

impl ParamGuard for PlotParams {
    type Checked = PlotValidParams;
    type Error = PlotParamsError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.width == 0 || self.0.height == 0 {
            Err(PlotParamsError::ZeroSize)
        } else if self.0.caption_size == 0 {
            Err(PlotParamsError::ZeroFontSize)
        } else if self.0.format == ImageFormat::Png && !cfg!(feature = "ttf") {
            Err(PlotParamsError::PngWithoutFonts)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}
