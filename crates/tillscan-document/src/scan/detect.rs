// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Candidate region detection — produces the contours that boundary selection
// searches for the receipt outline.
//
// Two detectors are provided:
//
// - `ContourFileDetector` replays polygons exported by an external
//   segmentation model (JSON), filtered by the model's confidence.
// - `ThresholdContourDetector` is a classical fallback: blur, Otsu
//   binarization, border following. It works for a pale receipt on a darker
//   surface and needs no model files.

use std::path::Path;

use image::DynamicImage;
use imageproc::contours::{self, BorderType};
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use imageproc::filter::gaussian_blur_f32;
use serde::Deserialize;
use tillscan_core::config::DetectionConfig;
use tillscan_core::error::{Result, TillscanError};
use tillscan_core::{Contour, Point};
use tracing::{debug, info, instrument};

/// Source of candidate receipt outlines.
///
/// Implementations receive the height-normalised working image and return
/// candidate contours in working-image pixel coordinates. The order of the
/// returned contours is significant: boundary selection takes the first one
/// that reduces to four vertices.
pub trait RegionDetector {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn detect(&self, working: &DynamicImage) -> Result<Vec<Contour>>;
}

impl<T: RegionDetector + ?Sized> RegionDetector for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn detect(&self, working: &DynamicImage) -> Result<Vec<Contour>> {
        (**self).detect(working)
    }
}

// -- External model output ----------------------------------------------------

/// One region as exported by a segmentation model: a polygon (`[[x, y], ...]`)
/// and an optional confidence score.
#[derive(Debug, Deserialize)]
struct ExportedRegion {
    #[serde(default)]
    confidence: Option<f32>,
    points: Vec<[f32; 2]>,
}

/// Replays contours produced by an external segmentation model.
///
/// Regions whose confidence is below `min_confidence` are dropped; regions
/// without a confidence are kept. File order is preserved. Every kept region
/// must lie inside the working image, otherwise detection fails.
#[derive(Debug, Clone)]
pub struct ContourFileDetector {
    regions: Vec<Contour>,
    min_confidence: f32,
}

impl ContourFileDetector {
    /// Read a JSON array of `{"confidence": f32, "points": [[x, y], ...]}`.
    #[instrument(skip_all, fields(path = %path.as_ref().display(), min_confidence))]
    pub fn open(path: impl AsRef<Path>, min_confidence: f32) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|err| {
            TillscanError::DetectionError(format!(
                "failed to read contour file {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        Self::from_json(&raw, min_confidence)
    }

    /// Parse the JSON export format from a string.
    pub fn from_json(raw: &str, min_confidence: f32) -> Result<Self> {
        let exported: Vec<ExportedRegion> = serde_json::from_str(raw).map_err(|err| {
            TillscanError::DetectionError(format!("malformed contour file: {}", err))
        })?;
        let regions = exported
            .into_iter()
            .map(|region| {
                let points = region
                    .points
                    .into_iter()
                    .map(|[x, y]| Point::new(x, y))
                    .collect();
                match region.confidence {
                    Some(confidence) => Contour::with_confidence(points, confidence),
                    None => Contour::new(points),
                }
            })
            .collect();
        Ok(Self::from_regions(regions, min_confidence))
    }

    /// Wrap contours that are already in memory.
    pub fn from_regions(regions: Vec<Contour>, min_confidence: f32) -> Self {
        Self {
            regions,
            min_confidence,
        }
    }
}

impl RegionDetector for ContourFileDetector {
    fn name(&self) -> &'static str {
        "contour-file"
    }

    fn detect(&self, working: &DynamicImage) -> Result<Vec<Contour>> {
        let kept: Vec<Contour> = self
            .regions
            .iter()
            .filter(|c| c.confidence.is_none_or(|conf| conf >= self.min_confidence))
            .cloned()
            .collect();

        let (w, h) = (working.width() as f32, working.height() as f32);
        let inside = |p: &Point| {
            p.x.is_finite() && p.y.is_finite() && (0.0..=w).contains(&p.x) && (0.0..=h).contains(&p.y)
        };
        if let Some((index, point)) = kept
            .iter()
            .enumerate()
            .find_map(|(i, c)| c.points.iter().find(|p| !inside(p)).map(|p| (i, *p)))
        {
            return Err(TillscanError::DetectionError(format!(
                "region {index} has point {point} outside the {w}x{h} working image; \
                 contours must be in working-image coordinates"
            )));
        }

        info!(
            total = self.regions.len(),
            kept = kept.len(),
            min_confidence = self.min_confidence,
            working_w = working.width(),
            working_h = working.height(),
            "Loaded external contours"
        );
        Ok(kept)
    }
}

// -- Classical detector -------------------------------------------------------

/// Finds bright regions on a darker background and returns their outer
/// borders, largest first.
#[derive(Debug, Clone)]
pub struct ThresholdContourDetector {
    blur_sigma: f32,
    min_area_fraction: f32,
    max_candidates: usize,
}

impl ThresholdContourDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            blur_sigma: config.blur_sigma,
            min_area_fraction: config.min_area_fraction,
            max_candidates: config.max_candidates,
        }
    }
}

impl Default for ThresholdContourDetector {
    fn default() -> Self {
        Self::new(&DetectionConfig::default())
    }
}

impl RegionDetector for ThresholdContourDetector {
    fn name(&self) -> &'static str {
        "threshold-contours"
    }

    /// ## Pipeline
    ///
    /// 1. Convert to grayscale
    /// 2. Gaussian blur for noise reduction
    /// 3. Otsu binarization (bright pixels become foreground)
    /// 4. Border following via `imageproc::contours::find_contours`
    /// 5. Keep outer borders covering at least `min_area_fraction` of the image
    /// 6. Sort by enclosed area, largest first, and keep `max_candidates`
    #[instrument(skip_all, fields(width = working.width(), height = working.height()))]
    fn detect(&self, working: &DynamicImage) -> Result<Vec<Contour>> {
        let gray = working.to_luma8();
        let blurred = if self.blur_sigma > 0.0 {
            gaussian_blur_f32(&gray, self.blur_sigma)
        } else {
            gray
        };

        let level = otsu_level(&blurred);
        let binary = threshold(&blurred, level, ThresholdType::Binary);
        debug!(level, "Otsu threshold computed");

        let min_area = self.min_area_fraction * working.width() as f32 * working.height() as f32;
        let mut candidates: Vec<(f32, Contour)> = contours::find_contours::<i32>(&binary)
            .into_iter()
            .filter(|c| matches!(c.border_type, BorderType::Outer))
            .map(|c| {
                let points: Vec<Point> = c
                    .points
                    .iter()
                    .map(|p| Point::new(p.x as f32, p.y as f32))
                    .collect();
                (shoelace_area(&points), Contour::new(points))
            })
            .filter(|(area, _)| *area >= min_area)
            .collect();

        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
        candidates.truncate(self.max_candidates);

        info!(
            candidates = candidates.len(),
            largest_area = candidates.first().map(|(a, _)| *a).unwrap_or(0.0),
            "Candidate regions found"
        );
        Ok(candidates.into_iter().map(|(_, c)| c).collect())
    }
}

/// Area enclosed by a closed polygon (shoelace formula).
fn shoelace_area(points: &[Point]) -> f32 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f32 = (0..n)
        .map(|i| {
            let j = (i + 1) % n;
            points[i].x * points[j].y - points[j].x * points[i].y
        })
        .sum();
    twice.abs() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::boundary::select_boundary;
    use image::{GrayImage, Luma};

    /// Dark table with a pale rectangle from (x0, y0) to (x1, y1) exclusive.
    fn receipt_on_table(w: u32, h: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> DynamicImage {
        two_tone(w, h, (x0, y0, x1, y1), 30, 235)
    }

    fn two_tone(w: u32, h: u32, rect: (u32, u32, u32, u32), table: u8, paper: u8) -> DynamicImage {
        let (x0, y0, x1, y1) = rect;
        let mut img = GrayImage::from_pixel(w, h, Luma([table]));
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, Luma([paper]));
            }
        }
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn shoelace_area_rectangle() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(0.0, 5.0),
        ];
        assert!((shoelace_area(&pts) - 50.0).abs() < 1e-3);
    }

    #[test]
    fn low_contrast_receipt_is_still_separated() {
        // Greyish paper on a slightly darker table: a fixed mid-grey cut-off
        // would miss it, the Otsu level sits between the two tones.
        let working = two_tone(200, 300, (40, 50, 160, 250), 100, 140);
        let found = ThresholdContourDetector::default().detect(&working).unwrap();
        let boundary = select_boundary(&found, 0.02).unwrap();
        for p in boundary.points {
            assert!((35.0..=165.0).contains(&p.x), "{p}");
            assert!((45.0..=255.0).contains(&p.y), "{p}");
        }
    }

    #[test]
    fn threshold_detector_finds_pale_rectangle() {
        let working = receipt_on_table(300, 400, 60, 80, 240, 330);
        let found = ThresholdContourDetector::default().detect(&working).unwrap();
        assert!(!found.is_empty());

        let boundary = select_boundary(&found, 0.02).unwrap();
        assert_eq!(boundary.candidate_index, 0);
        for p in boundary.points {
            assert!((55.0..=245.0).contains(&p.x), "{p}");
            assert!((75.0..=335.0).contains(&p.y), "{p}");
        }
    }

    #[test]
    fn threshold_detector_on_uniform_image_sees_at_most_the_frame() {
        let blank = DynamicImage::ImageLuma8(GrayImage::from_pixel(100, 100, Luma([128u8])));
        let found = ThresholdContourDetector::default().detect(&blank).unwrap();
        assert!(found.len() <= 1, "{} candidates", found.len());
    }

    #[test]
    fn threshold_detector_respects_max_candidates() {
        let config = DetectionConfig {
            max_candidates: 1,
            min_area_fraction: 0.0,
            ..DetectionConfig::default()
        };
        let mut img = GrayImage::from_pixel(200, 200, Luma([20u8]));
        for (x0, y0) in [(10u32, 10u32), (120, 10), (10, 120), (120, 120)] {
            for y in y0..y0 + 60 {
                for x in x0..x0 + 60 {
                    img.put_pixel(x, y, Luma([240u8]));
                }
            }
        }
        let found = ThresholdContourDetector::new(&config)
            .detect(&DynamicImage::ImageLuma8(img))
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn contour_file_filters_by_confidence_and_keeps_order() {
        let json = r#"[
            {"confidence": 0.91, "points": [[0, 0], [50, 0], [50, 80], [0, 80]]},
            {"confidence": 0.30, "points": [[1, 1], [2, 1], [2, 2], [1, 2]]},
            {"points": [[5, 5], [60, 5], [60, 70]]}
        ]"#;
        let detector = ContourFileDetector::from_json(json, 0.6).unwrap();
        let blank = DynamicImage::ImageLuma8(GrayImage::new(100, 100));
        let found = detector.detect(&blank).unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].confidence, Some(0.91));
        assert_eq!(found[0].points[2], Point::new(50.0, 80.0));
        assert_eq!(found[1].confidence, None);
    }

    #[test]
    fn contour_outside_working_image_is_detection_error() {
        let json = r#"[{"confidence": 0.9, "points": [[0, 0], [9e9, 0], [9e9, 9e9], [0, 9e9]]}]"#;
        let detector = ContourFileDetector::from_json(json, 0.6).unwrap();
        let working = DynamicImage::ImageLuma8(GrayImage::new(100, 100));
        match detector.detect(&working).unwrap_err() {
            TillscanError::DetectionError(msg) => assert!(msg.contains("outside"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn contour_on_image_edge_is_accepted() {
        let quad = Contour::from(vec![(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)]);
        let detector = ContourFileDetector::from_regions(vec![quad], 0.6);
        let working = DynamicImage::ImageLuma8(GrayImage::new(100, 100));
        assert_eq!(detector.detect(&working).unwrap().len(), 1);
    }

    #[test]
    fn low_confidence_garbage_is_dropped_not_rejected() {
        let junk = Contour::with_confidence(vec![Point::new(f32::NAN, 5.0)], 0.1);
        let detector = ContourFileDetector::from_regions(vec![junk], 0.6);
        let working = DynamicImage::ImageLuma8(GrayImage::new(100, 100));
        assert!(detector.detect(&working).unwrap().is_empty());
    }

    #[test]
    fn contour_file_rejects_malformed_json() {
        let err = ContourFileDetector::from_json("{not json", 0.6).unwrap_err();
        assert!(matches!(err, TillscanError::DetectionError(_)));
    }

    #[test]
    fn contour_file_missing_is_detection_error() {
        let err = ContourFileDetector::open("/nonexistent/contours.json", 0.6).unwrap_err();
        assert!(matches!(err, TillscanError::DetectionError(_)));
    }

    #[test]
    fn boxed_detector_delegates() {
        let boxed: Box<dyn RegionDetector> =
            Box::new(ContourFileDetector::from_regions(Vec::new(), 0.5));
        assert_eq!(boxed.name(), "contour-file");
        let blank = DynamicImage::ImageLuma8(GrayImage::new(10, 10));
        assert!(boxed.detect(&blank).unwrap().is_empty());
    }
}
