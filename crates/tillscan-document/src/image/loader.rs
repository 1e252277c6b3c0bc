// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Receipt image loader — decodes the source photo and produces the
// height-normalised working copy the region detector runs on.

use image::DynamicImage;
use image::imageops::FilterType;
use tillscan_core::ScaleRatio;
use tillscan_core::error::{Result, TillscanError};
use tracing::{debug, info, instrument};

/// A receipt photo at two resolutions.
///
/// Detection runs on `working`; rectification samples from `original` so the
/// flattened receipt keeps the full camera resolution. `ratio` converts
/// working-space coordinates back to original space.
#[derive(Debug, Clone)]
pub struct ReceiptImage {
    original: DynamicImage,
    working: DynamicImage,
    ratio: ScaleRatio,
}

impl ReceiptImage {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path and build its working copy.
    #[instrument(skip_all, fields(path = %path.as_ref().display(), working_height))]
    pub fn open(path: impl AsRef<std::path::Path>, working_height: u32) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            TillscanError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Receipt image loaded");
        Self::from_dynamic(img, working_height)
    }

    /// Decode raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8], working_height: u32) -> Result<Self> {
        let img = image::load_from_memory(data).map_err(|err| {
            TillscanError::ImageError(format!("failed to decode image: {}", err))
        })?;
        Self::from_dynamic(img, working_height)
    }

    /// Wrap an already-decoded image.
    pub fn from_dynamic(original: DynamicImage, working_height: u32) -> Result<Self> {
        if original.width() == 0 || original.height() == 0 {
            return Err(TillscanError::ImageError(format!(
                "image has no pixels ({}x{})",
                original.width(),
                original.height()
            )));
        }
        if working_height == 0 {
            return Err(TillscanError::InvalidConfig(
                "working height must be at least 1 pixel".into(),
            ));
        }

        let working = resize_to_height(&original, working_height);
        let ratio = ScaleRatio::from_widths(original.width(), working.width());
        debug!(
            working_w = working.width(),
            working_h = working.height(),
            ratio = ratio.value(),
            "Working copy prepared"
        );

        Ok(Self {
            original,
            working,
            ratio,
        })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn original(&self) -> &DynamicImage {
        &self.original
    }

    pub fn working(&self) -> &DynamicImage {
        &self.working
    }

    pub fn ratio(&self) -> ScaleRatio {
        self.ratio
    }
}

/// Resize to exactly `height` rows, scaling the width by the same factor.
fn resize_to_height(image: &DynamicImage, height: u32) -> DynamicImage {
    let factor = height as f64 / image.height() as f64;
    let width = ((image.width() as f64 * factor).round() as u32).max(1);
    image.resize_exact(width, height, FilterType::Triangle)
}

/// Resize to exactly `width` columns, scaling the height by the same factor.
pub(crate) fn resize_to_width(image: &DynamicImage, width: u32) -> DynamicImage {
    let factor = width as f64 / image.width().max(1) as f64;
    let height = ((image.height() as f64 * factor).round() as u32).max(1);
    image.resize_exact(width, height, FilterType::Triangle)
}
