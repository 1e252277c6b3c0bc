// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end receipt scan: load, detect, select outline, rectify, recognise,
// and filter priced lines.

use std::path::Path;

use serde::Serialize;
use tillscan_core::error::Result;
use tillscan_core::{Corners, ReceiptBoundary, ScaleRatio, ScanConfig};
use tracing::{info, instrument};

use super::boundary::select_boundary;
use super::detect::RegionDetector;
use super::ocr::TextRecognizer;
use super::preview;
use super::price::PriceFilter;
use super::rectify::{Rectified, rectify};
use crate::image::loader::ReceiptImage;

/// Runs the scanning pipeline with a given detector and recognizer.
///
/// ## Pipeline
///
/// 1. Load the photo and build a working copy `working_height` pixels tall
/// 2. Ask the [`RegionDetector`] for candidate contours on the working copy
/// 3. Take the first candidate that approximates to a quadrilateral
/// 4. Rectify that quadrilateral out of the full-resolution original
/// 5. Optionally write the outline and rectified previews
/// 6. Recognise text on the rectified receipt with the [`TextRecognizer`]
///
/// Any stage failure aborts the scan; nothing is retried.
pub struct ReceiptScanner<D, R> {
    config: ScanConfig,
    detector: D,
    recognizer: R,
    prices: PriceFilter,
}

impl<D: RegionDetector, R: TextRecognizer> ReceiptScanner<D, R> {
    /// Validate `config` and compile its price pattern.
    pub fn new(config: ScanConfig, detector: D, recognizer: R) -> Result<Self> {
        config.validate()?;
        let prices = PriceFilter::new(&config.price_pattern)?;
        Ok(Self {
            config,
            detector,
            recognizer,
            prices,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan the receipt photo at `path`.
    pub fn scan_path(&self, path: impl AsRef<Path>) -> Result<ScanReport> {
        let image = ReceiptImage::open(path, self.config.working_height)?;
        self.scan_image(&image)
    }

    /// Scan an already-loaded receipt image.
    #[instrument(skip_all, fields(
        detector = self.detector.name(),
        recognizer = self.recognizer.name(),
    ))]
    pub fn scan_image(&self, image: &ReceiptImage) -> Result<ScanReport> {
        let candidates = self.detector.detect(image.working())?;
        info!(candidates = candidates.len(), "Candidate regions detected");

        let boundary = select_boundary(&candidates, self.config.approx_epsilon_ratio)?;
        let rectified = rectify(image.original(), &boundary, image.ratio());

        if self.config.preview.enabled {
            let dir = &self.config.preview.directory;
            preview::write_outline(dir, image.working(), &boundary)?;
            preview::write_transform(dir, &rectified.image, self.config.preview.width)?;
        }

        let raw_text = self.recognizer.recognize(&rectified.image)?;
        info!(chars = raw_text.len(), "Receipt text recognised");

        Ok(ScanReport {
            boundary,
            ratio: image.ratio(),
            rectified,
            raw_text,
            prices: self.prices.clone(),
        })
    }
}

/// Everything a successful scan produced.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Selected outline in working-image coordinates.
    pub boundary: ReceiptBoundary,
    pub ratio: ScaleRatio,
    pub rectified: Rectified,
    /// Recognised text exactly as the recognizer returned it.
    pub raw_text: String,
    prices: PriceFilter,
}

impl ScanReport {
    /// Lines of `raw_text` that carry a price, in original order.
    pub fn priced_lines(&self) -> impl Iterator<Item = &str> {
        self.prices.filter(&self.raw_text)
    }

    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            candidate_index: self.boundary.candidate_index,
            corners: self.rectified.corners,
            width: self.rectified.width(),
            height: self.rectified.height(),
            raw_text: self.raw_text.clone(),
            priced_lines: self.priced_lines().map(str::to_owned).collect(),
        }
    }
}

/// Serializable view of a [`ScanReport`] for machine-readable output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanSummary {
    pub candidate_index: usize,
    /// Receipt corners in original-image coordinates.
    pub corners: Corners,
    pub width: u32,
    pub height: u32,
    pub raw_text: String,
    pub priced_lines: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};
    use std::cell::Cell;
    use tillscan_core::{Contour, TillscanError};

    struct FixedDetector(Vec<Contour>);

    impl RegionDetector for FixedDetector {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn detect(&self, _working: &DynamicImage) -> Result<Vec<Contour>> {
            Ok(self.0.clone())
        }
    }

    /// Returns canned text and remembers the size of the image it was given.
    struct CannedRecognizer {
        text: &'static str,
        seen: Cell<Option<(u32, u32)>>,
    }

    impl CannedRecognizer {
        fn new(text: &'static str) -> Self {
            Self {
                text,
                seen: Cell::new(None),
            }
        }
    }

    impl TextRecognizer for CannedRecognizer {
        fn name(&self) -> &'static str {
            "canned"
        }

        fn recognize(&self, image: &DynamicImage) -> Result<String> {
            self.seen.set(Some((image.width(), image.height())));
            Ok(self.text.to_string())
        }
    }

    /// 400x400 original; with a working height of 200 the ratio is 2.0.
    fn receipt() -> ReceiptImage {
        let original = DynamicImage::ImageLuma8(GrayImage::from_pixel(400, 400, Luma([220u8])));
        ReceiptImage::from_dynamic(original, 200).unwrap()
    }

    fn config() -> ScanConfig {
        ScanConfig {
            working_height: 200,
            ..ScanConfig::default()
        }
    }

    fn square() -> Contour {
        Contour::from(vec![
            (10.0, 10.0),
            (10.0, 100.0),
            (100.0, 100.0),
            (100.0, 10.0),
        ])
    }

    #[test]
    fn square_outline_is_scaled_and_flattened() {
        let recognizer = CannedRecognizer::new("SHOP\nMilk 3.49\nQty: 3\nTOTAL 3.49\n");
        let scanner =
            ReceiptScanner::new(config(), FixedDetector(vec![square()]), recognizer).unwrap();

        let report = scanner.scan_image(&receipt()).unwrap();
        assert_eq!(report.ratio.value(), 2.0);
        assert_eq!(report.boundary.candidate_index, 0);
        assert_eq!((report.rectified.width(), report.rectified.height()), (180, 180));
        assert_eq!(scanner.recognizer.seen.get(), Some((180, 180)));

        let corners = report.rectified.corners;
        assert_eq!(corners.top_left.as_tuple(), (20.0, 20.0));
        assert_eq!(corners.top_right.as_tuple(), (200.0, 20.0));
        assert_eq!(corners.bottom_right.as_tuple(), (200.0, 200.0));
        assert_eq!(corners.bottom_left.as_tuple(), (20.0, 200.0));

        let priced: Vec<&str> = report.priced_lines().collect();
        assert_eq!(priced, vec!["Milk 3.49", "TOTAL 3.49"]);
    }

    #[test]
    fn summary_carries_priced_lines() {
        let scanner = ReceiptScanner::new(
            config(),
            FixedDetector(vec![square()]),
            CannedRecognizer::new("Tea 2.10\nThanks"),
        )
        .unwrap();
        let summary = scanner.scan_image(&receipt()).unwrap().summary();
        assert_eq!(summary.candidate_index, 0);
        assert_eq!((summary.width, summary.height), (180, 180));
        assert_eq!(summary.priced_lines, vec!["Tea 2.10".to_string()]);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["raw_text"], "Tea 2.10\nThanks");
        assert_eq!(json["corners"]["top_left"]["x"], 20.0);
    }

    #[test]
    fn missing_outline_stops_before_recognition() {
        let triangle = Contour::from(vec![(0.0, 0.0), (50.0, 80.0), (100.0, 0.0)]);
        let recognizer = CannedRecognizer::new("never read");
        let scanner =
            ReceiptScanner::new(config(), FixedDetector(vec![triangle]), recognizer).unwrap();

        let err = scanner.scan_image(&receipt()).unwrap_err();
        assert!(matches!(err, TillscanError::BoundaryNotFound { candidates: 1 }));
        assert_eq!(scanner.recognizer.seen.get(), None);
    }

    #[test]
    fn contour_file_in_wrong_coordinates_fails_cleanly() {
        use crate::scan::detect::ContourFileDetector;

        let json = r#"[{"confidence": 0.9, "points": [[0, 0], [9e9, 0], [9e9, 9e9], [0, 9e9]]}]"#;
        let detector = ContourFileDetector::from_json(json, 0.6).unwrap();
        let recognizer = CannedRecognizer::new("never read");
        let scanner = ReceiptScanner::new(config(), detector, recognizer).unwrap();

        let err = scanner.scan_image(&receipt()).unwrap_err();
        assert!(matches!(err, TillscanError::DetectionError(_)), "{err:?}");
        assert_eq!(scanner.recognizer.seen.get(), None);
    }

    #[test]
    fn empty_text_is_not_an_error() {
        let scanner = ReceiptScanner::new(
            config(),
            FixedDetector(vec![square()]),
            CannedRecognizer::new(""),
        )
        .unwrap();
        let report = scanner.scan_image(&receipt()).unwrap();
        assert_eq!(report.raw_text, "");
        assert_eq!(report.priced_lines().count(), 0);
    }

    #[test]
    fn custom_price_pattern_is_used() {
        let config = ScanConfig {
            price_pattern: r"[0-9]+,[0-9]{2}".into(),
            ..config()
        };
        let scanner = ReceiptScanner::new(
            config,
            FixedDetector(vec![square()]),
            CannedRecognizer::new("Brot 1,99\nMilch 0.89"),
        )
        .unwrap();
        let report = scanner.scan_image(&receipt()).unwrap();
        assert_eq!(report.priced_lines().collect::<Vec<_>>(), vec!["Brot 1,99"]);
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = ScanConfig {
            price_pattern: "([0-9".into(),
            ..config()
        };
        let result = ReceiptScanner::new(
            config,
            FixedDetector(Vec::new()),
            CannedRecognizer::new(""),
        );
        assert!(matches!(result, Err(TillscanError::InvalidConfig(_))));
    }

    #[test]
    fn previews_are_written_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config();
        config.preview.enabled = true;
        config.preview.directory = dir.path().to_path_buf();

        let scanner = ReceiptScanner::new(
            config,
            FixedDetector(vec![square()]),
            CannedRecognizer::new("x 1.0"),
        )
        .unwrap();
        scanner.scan_image(&receipt()).unwrap();

        assert!(dir.path().join(preview::OUTLINE_FILE).is_file());
        let transform = image::open(dir.path().join(preview::TRANSFORM_FILE)).unwrap();
        assert_eq!((transform.width(), transform.height()), (500, 500));
    }

    #[test]
    fn scan_path_loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.png");
        DynamicImage::ImageLuma8(GrayImage::from_pixel(400, 400, Luma([220u8])))
            .save(&path)
            .unwrap();

        let scanner = ReceiptScanner::new(
            config(),
            FixedDetector(vec![square()]),
            CannedRecognizer::new("Milk 3.49"),
        )
        .unwrap();
        let report = scanner.scan_path(&path).unwrap();
        assert_eq!((report.rectified.width(), report.rectified.height()), (180, 180));
    }

    #[test]
    fn unreadable_image_is_image_error() {
        let scanner = ReceiptScanner::new(
            config(),
            FixedDetector(Vec::new()),
            CannedRecognizer::new(""),
        )
        .unwrap();
        let err = scanner.scan_path("/nonexistent/receipt.jpg").unwrap_err();
        assert!(matches!(err, TillscanError::ImageError(_)));
    }
}
