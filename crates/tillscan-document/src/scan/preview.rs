// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Debug previews — the detected outline over the working image and the
// flattened receipt, written as PNGs for visual inspection.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;
use tillscan_core::ReceiptBoundary;
use tillscan_core::error::{Result, TillscanError};
use tracing::{info, instrument};

use crate::image::loader::resize_to_width;

pub const OUTLINE_FILE: &str = "receipt-outline.png";
pub const TRANSFORM_FILE: &str = "receipt-transform.png";

const OUTLINE_COLOUR: Rgba<u8> = Rgba([0, 255, 0, 255]);

/// Copy of `working` with the closed boundary polygon drawn 2 px wide in green.
pub fn outline_image(working: &DynamicImage, boundary: &ReceiptBoundary) -> RgbaImage {
    let mut canvas = working.to_rgba8();
    let points = boundary.points;
    for (i, start) in points.iter().enumerate() {
        let end = points[(i + 1) % points.len()];
        // Second stroke offset by one pixel on both axes gives the 2 px width.
        for offset in [0.0, 1.0] {
            draw_line_segment_mut(
                &mut canvas,
                (start.x + offset, start.y + offset),
                (end.x + offset, end.y + offset),
                OUTLINE_COLOUR,
            );
        }
    }
    canvas
}

/// Write `receipt-outline.png` into `dir`, creating the directory if needed.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn write_outline(
    dir: &Path,
    working: &DynamicImage,
    boundary: &ReceiptBoundary,
) -> Result<PathBuf> {
    let canvas = outline_image(working, boundary);
    save(dir, OUTLINE_FILE, &DynamicImage::ImageRgba8(canvas))
}

/// Write `receipt-transform.png`: the rectified receipt resized to `width`.
#[instrument(skip_all, fields(dir = %dir.display(), width))]
pub fn write_transform(dir: &Path, rectified: &DynamicImage, width: u32) -> Result<PathBuf> {
    let resized = resize_to_width(rectified, width.max(1));
    save(dir, TRANSFORM_FILE, &resized)
}

fn save(dir: &Path, name: &str, image: &DynamicImage) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    image
        .save_with_format(&path, ImageFormat::Png)
        .map_err(|err| {
            TillscanError::ImageError(format!("failed to write {}: {}", path.display(), err))
        })?;
    info!(path = %path.display(), "Preview written");
    Ok(path)
}
