//! Watermark overlay for published photos.
//!
//! The watermark is scaled to a fixed share of the photo width (keeping its
//! aspect ratio), placed in the top-right corner with a fixed margin and
//! alpha-composited over the photo. The result is saved without alpha.

use image::imageops::{self, FilterType};
use image::io::Reader as ImageReader;
use image::{DynamicImage, GenericImageView, ImageError, RgbaImage};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Watermark width relative to the photo width
pub const WATERMARK_WIDTH_RATIO: f64 = 0.20;
/// Distance from the top and right edges in pixels
pub const WATERMARK_MARGIN: i64 = 30;

/// Errors that can occur while watermarking a photo
#[derive(Error, Debug)]
pub enum WatermarkError {
    /// Photo or watermark could not be read or decoded
    #[error("Failed to open image {path}: {source}")]
    Open {
        /// Image that failed to load
        path: PathBuf,
        /// Underlying decode or I/O error
        source: ImageError,
    },
    /// Result could not be encoded or written
    #[error("Failed to save watermarked image {path}: {source}")]
    Save {
        /// Destination path
        path: PathBuf,
        /// Underlying encode or I/O error
        source: ImageError,
    },
    /// Scaled watermark would have a zero dimension
    #[error("Photo is too small for the watermark ({width}x{height})")]
    TooSmall {
        /// Photo width
        width: u32,
        /// Photo height
        height: u32,
    },
    /// Blocking worker failed before producing a result
    #[error("Watermark worker failed: {0}")]
    Task(String),
}

/// Size of the watermark scaled for a photo of `base_width` pixels.
///
/// Returns `None` when either side rounds down to zero.
#[must_use]
pub fn scaled_size(base_width: u32, mark_width: u32, mark_height: u32) -> Option<(u32, u32)> {
    if mark_width == 0 {
        return None;
    }
    let width = (f64::from(base_width) * WATERMARK_WIDTH_RATIO) as u32;
    let height = (f64::from(width) * f64::from(mark_height) / f64::from(mark_width)) as u32;
    (width > 0 && height > 0).then_some((width, height))
}

/// Top-left corner of the watermark on a photo of `base_width` pixels.
///
/// May be negative for photos narrower than the margin allows; the overlay
/// is clipped to the photo bounds.
#[must_use]
pub fn placement(base_width: u32, mark_width: u32) -> (i64, i64) {
    (
        i64::from(base_width) - i64::from(mark_width) - WATERMARK_MARGIN,
        WATERMARK_MARGIN,
    )
}

/// Composites `mark` over `base`.
///
/// # Errors
///
/// Returns [`WatermarkError::TooSmall`] if the scaled watermark would be empty.
pub fn compose(base: &DynamicImage, mark: &DynamicImage) -> Result<RgbaImage, WatermarkError> {
    let mut canvas = base.to_rgba8();
    let (width, height) = scaled_size(canvas.width(), mark.width(), mark.height()).ok_or(
        WatermarkError::TooSmall {
            width: canvas.width(),
            height: canvas.height(),
        },
    )?;

    let scaled = mark
        .resize_exact(width, height, FilterType::Lanczos3)
        .to_rgba8();
    let (x, y) = placement(canvas.width(), scaled.width());
    imageops::overlay(&mut canvas, &scaled, x, y);
    Ok(canvas)
}

/// Applies the configured watermark asset to photo files.
#[derive(Debug, Clone)]
pub struct Watermarker {
    asset: PathBuf,
}

impl Watermarker {
    /// Creates a watermarker for the asset at `asset`.
    ///
    /// The asset is read on every call so it can be replaced without a restart.
    #[must_use]
    pub fn new(asset: impl Into<PathBuf>) -> Self {
        Self {
            asset: asset.into(),
        }
    }

    /// Reads `source`, watermarks it and writes the result to `output`.
    ///
    /// The output format follows the extension of `output`.
    ///
    /// # Errors
    ///
    /// Returns an error if either image cannot be decoded, the photo is too
    /// small, or the output cannot be written.
    pub fn apply(&self, source: &Path, output: &Path) -> Result<(), WatermarkError> {
        let base = open(source)?;
        let mark = open(&self.asset)?;
        let composed = compose(&base, &mark)?;

        DynamicImage::ImageRgba8(composed)
            .to_rgb8()
            .save(output)
            .map_err(|source| WatermarkError::Save {
                path: output.to_path_buf(),
                source,
            })
    }
}

// Downloads are always named `.jpg`, so the format is sniffed from content.
fn open(path: &Path) -> Result<DynamicImage, WatermarkError> {
    let decode = || -> Result<DynamicImage, ImageError> {
        Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?)
    };
    decode().map_err(|source| WatermarkError::Open {
        path: path.to_path_buf(),
        source,
    })
}
